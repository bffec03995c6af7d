use anyhow::{Context, Result};

use ann_forge::{Descriptor, preprocess_test_set};

use crate::cli::TestSetArgs;
use crate::config::build_test_set_config;
use crate::display::{Context as DisplayContext, Progress, print_dataset_info};
use crate::io::{read_configurations, read_descriptor};

const TOTAL_STEPS: u8 = 3;

pub fn run_test_set(args: TestSetArgs, ctx: DisplayContext) -> Result<()> {
    let config = build_test_set_config(&args);
    let mut progress = Progress::new(ctx.interactive, TOTAL_STEPS);

    progress.step("Loading descriptor");
    let descriptor = read_descriptor(&args.descriptor.path)?;
    progress.complete_step(
        "Loading descriptor",
        &[format!("{} channels per atom", descriptor.channel_count())],
    );

    progress.step("Reading configurations");
    let configs = read_configurations(&args.input)?;
    progress.complete_step(
        "Reading configurations",
        &[format!("Parsed {} frames", configs.len())],
    );

    if ctx.interactive {
        print_dataset_info("Test Set", &configs, descriptor.channel_count());
    }

    progress.step("Fingerprinting and serializing");
    let path = preprocess_test_set(&configs, &descriptor, &args.dir, &config)
        .context("Test set preprocessing failed")?;
    let normalization_step = if config.normalize {
        "Apply training-set statistics".to_string()
    } else {
        "Skip normalization".to_string()
    };
    progress.complete_step(
        "Fingerprinting and serializing",
        &[normalization_step, format!("Write {}", path.display())],
    );

    progress.finish("Test set complete");

    Ok(())
}
