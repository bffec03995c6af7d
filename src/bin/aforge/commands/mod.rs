mod export;
mod init;
mod preprocess;
mod test_set;

use export::run_export;
use init::run_init;
use preprocess::run_preprocess;
use test_set::run_test_set;

use anyhow::Result;

use crate::cli::Command;
use crate::display::Context;

pub fn dispatch(command: Command, ctx: Context) -> Result<()> {
    match command {
        Command::Preprocess(args) => run_preprocess(args, ctx),
        Command::TestSet(args) => run_test_set(args, ctx),
        Command::Init(args) => run_init(args, ctx),
        Command::Export(args) => run_export(args, ctx),
    }
}
