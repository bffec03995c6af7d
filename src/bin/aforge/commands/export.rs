use std::path::PathBuf;

use anyhow::{Context, Result};

use ann_forge::export::{CMAKE_FILE, DESCRIPTOR_FILE, DROPOUT_FILE, NETWORK_FILE};
use ann_forge::{Descriptor, Normalization, export};

use crate::cli::ExportArgs;
use crate::config::build_export_options;
use crate::display::{Context as DisplayContext, Progress, print_export_info, print_model_info};
use crate::io::{read_checkpoint, read_descriptor, read_normalization};

const TOTAL_STEPS: u8 = 3;

pub fn run_export(args: ExportArgs, ctx: DisplayContext) -> Result<()> {
    let options = build_export_options(&args.kim);
    let mut progress = Progress::new(ctx.interactive, TOTAL_STEPS);

    progress.step("Loading model");
    let model = read_checkpoint(&args.checkpoint)?;
    progress.complete_step(
        "Loading model",
        &[
            format!("{} layers", model.layers().len()),
            format!("{} parameters", model.parameter_count()),
        ],
    );

    if ctx.interactive {
        print_model_info(&model);
    }

    progress.step("Loading descriptor and statistics");
    let descriptor = read_descriptor(&args.descriptor.path)?;
    let normalization = match &args.normalization {
        Some(path) => read_normalization(path, descriptor.channel_count())?,
        None => {
            log::info!("exporting for raw fingerprints (--no-normalize)");
            Normalization::Disabled
        }
    };
    let stats_step = match normalization.stats() {
        Some(stats) => format!("Normalization over {} channels", stats.channel_count()),
        None => "Normalization disabled".to_string(),
    };
    progress.complete_step(
        "Loading descriptor and statistics",
        &[
            format!("{} channels per atom", descriptor.channel_count()),
            stats_step,
        ],
    );

    progress.step("Writing KIM model");
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&options.model_name));
    let dir = export(&model, &descriptor, &normalization, &output, &options)
        .context("Export failed")?;

    let files = [DESCRIPTOR_FILE, NETWORK_FILE, DROPOUT_FILE, CMAKE_FILE];
    let substeps: Vec<String> = files.iter().map(|f| format!("Write {}", f)).collect();
    progress.complete_step("Writing KIM model", &substeps);

    if ctx.interactive {
        print_export_info(&dir, &files);
    }

    progress.finish("Export complete");

    Ok(())
}
