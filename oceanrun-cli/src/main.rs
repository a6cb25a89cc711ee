//! oceanrun CLI - drives the run pipeline stage by stage.
//!
//! Each pipeline stage is a subcommand (`pre-run`, `run`, `post-run`),
//! so an interrupted case can be resumed at the failing stage without
//! re-doing the stages before it.

mod commands;
mod error;

use clap::{Parser, Subcommand};

use error::CliError;
use oceanrun::logging::{init_logging, DEFAULT_LOG_DIR, DEFAULT_LOG_FILE};

#[derive(Parser)]
#[command(name = "oceanrun")]
#[command(version = oceanrun::VERSION)]
#[command(about = "Run pipeline for domain-decomposed ocean-model simulations", long_about = None)]
struct Cli {
    /// Directory for session logs
    #[arg(long, default_value = DEFAULT_LOG_DIR, global = true)]
    log_dir: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Partition input datasets and resolve the namelist template
    PreRun(commands::prerun::PreRunArgs),
    /// Submit the model to a scheduler, or run and supervise it directly
    Run(commands::run::RunArgs),
    /// Join per-worker output files into unified files
    PostRun(commands::postrun::PostRunArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let _guard = match init_logging(&cli.log_dir, DEFAULT_LOG_FILE) {
        Ok(guard) => guard,
        Err(e) => CliError::LoggingInit(e.to_string()).exit(),
    };

    let result = match cli.command {
        Commands::PreRun(args) => commands::prerun::handle(args),
        Commands::Run(args) => commands::run::handle(args).await,
        Commands::PostRun(args) => commands::postrun::handle(args),
    };

    if let Err(e) = result {
        CliError::Pipeline(e).exit();
    }
}
