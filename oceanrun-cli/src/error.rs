//! CLI error handling with user-friendly messages.
//!
//! Centralizes error reporting for the CLI: consistent formatting, a
//! hint for the common configuration mistakes, and exit code 1.

use std::fmt;
use std::process;

use oceanrun::PipelineError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// A pipeline stage failed
    Pipeline(PipelineError),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Pipeline(PipelineError::Configuration(msg))
                if msg.contains("account key") =>
            {
                eprintln!();
                eprintln!("Batch schedulers bill runs to a project account;");
                eprintln!("pass yours with --account-key.");
            }
            CliError::Pipeline(PipelineError::Precondition(_)) => {
                eprintln!();
                eprintln!("A required local artifact is missing. Check that the");
                eprintln!("executable is built, input datasets are fetched, and the");
                eprintln!("pre-run stage has produced the working namelist.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Pipeline(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Pipeline(e) => Some(e),
            CliError::LoggingInit(_) => None,
        }
    }
}
