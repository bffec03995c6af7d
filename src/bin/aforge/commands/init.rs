use anyhow::Result;

use ann_forge::Descriptor;

use crate::cli::InitArgs;
use crate::config::build_model;
use crate::display::{Context as DisplayContext, Progress, print_model_info};
use crate::io::{read_descriptor, write_checkpoint};

const TOTAL_STEPS: u8 = 2;

pub fn run_init(args: InitArgs, ctx: DisplayContext) -> Result<()> {
    let mut progress = Progress::new(ctx.interactive, TOTAL_STEPS);

    progress.step("Building network");
    let descriptor = read_descriptor(&args.descriptor.path)?;
    let model = build_model(descriptor.channel_count(), &args.network)?;
    let widths: Vec<String> = args.network.hidden.iter().map(|w| w.to_string()).collect();
    progress.complete_step(
        "Building network",
        &[
            format!(
                "{} → [{}] → 1",
                descriptor.channel_count(),
                widths.join(", ")
            ),
            format!("{} parameters", model.parameter_count()),
        ],
    );

    if ctx.interactive {
        print_model_info(&model);
    }

    progress.step("Writing checkpoint");
    write_checkpoint(&args.output, &model)?;
    progress.complete_step(
        "Writing checkpoint",
        &[format!("Write {}", args.output.display())],
    );

    progress.finish("Checkpoint created");

    Ok(())
}
