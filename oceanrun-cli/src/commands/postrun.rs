//! `post-run`: join per-worker output files.

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use oceanrun::command::NcjoinCommand;
use oceanrun::join::join_output;
use oceanrun::{PipelineError, Result};

#[derive(Args)]
pub struct PostRunArgs {
    /// Directory containing the model's per-worker output files
    #[arg(long)]
    output_dir: PathBuf,

    /// Join executable to invoke
    #[arg(long, default_value = "ncjoin")]
    ncjoin: String,
}

pub fn handle(args: PostRunArgs) -> Result<()> {
    if !args.output_dir.is_dir() {
        return Err(PipelineError::Precondition(format!(
            "output directory '{}' not found",
            args.output_dir.display()
        )));
    }
    let tool = NcjoinCommand::with_program(args.ncjoin);
    let joined = join_output(&args.output_dir, &tool)?;
    info!(groups = joined, "post-run stage complete");
    Ok(())
}
