use anyhow::{Context, Result};

use ann_forge::io::norm;
use ann_forge::{Descriptor, PreprocessConfig, preprocess};

use crate::cli::PreprocessArgs;
use crate::config::build_preprocess_config;
use crate::display::{Context as DisplayContext, Progress, print_dataset_info, print_records_info};
use crate::io::{read_configurations, read_descriptor};
use crate::util::convert::strategy_display_name;

const TOTAL_STEPS: u8 = 3;

pub fn run_preprocess(args: PreprocessArgs, ctx: DisplayContext) -> Result<()> {
    let config = build_preprocess_config(&args);
    let mut progress = Progress::new(ctx.interactive, TOTAL_STEPS);

    progress.step("Loading descriptor");
    let descriptor = read_descriptor(&args.descriptor.path)?;
    progress.complete_step(
        "Loading descriptor",
        &[
            format!("Cutoff function: {}", descriptor.cutoff_kind()),
            format!("Species: {}", descriptor.species().join(", ")),
            format!("{} channels per atom", descriptor.channel_count()),
        ],
    );

    progress.step("Reading configurations");
    let configs = read_configurations(&args.input)?;
    progress.complete_step(
        "Reading configurations",
        &[format!(
            "Parsed {} frames from {}",
            configs.len(),
            args.input.display()
        )],
    );

    if ctx.interactive {
        print_dataset_info("Training Set", &configs, descriptor.channel_count());
    }

    progress.step("Fingerprinting and serializing");
    let summary = preprocess(&configs, &descriptor, &args.output, &config)
        .context("Preprocessing failed")?;
    progress.complete_step("Fingerprinting and serializing", &build_substeps(&config));

    if ctx.interactive {
        print_records_info(&summary);
    }

    log::info!(
        "wrote {} training records to {}",
        summary.train_count,
        summary.train_path.display()
    );

    progress.finish("Preprocessing complete");

    Ok(())
}

fn build_substeps(config: &PreprocessConfig) -> Vec<String> {
    let mut steps = Vec::new();

    if config.validation_size > 0 {
        steps.push(format!(
            "Hold out {} configurations for validation",
            config.validation_size
        ));
    }

    if config.normalize {
        steps.push(format!(
            "Statistics: {}",
            strategy_display_name(config.strategy)
        ));
        steps.push(format!("Write {}", norm::FILE_NAME));
    } else {
        steps.push("Skip normalization".to_string());
    }

    steps.push(format!("Serialize records ({} precision)", config.precision));
    steps
}
