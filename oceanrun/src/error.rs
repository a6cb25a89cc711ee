//! Error types for the run pipeline.
//!
//! Every variant carries enough context (paths, dataset identity,
//! subprocess diagnostics) to re-run the specific failing stage without
//! re-doing the stages before it. No stage swallows one of these and
//! continues; partial progress already on disk is left in place and
//! recovery is re-invocation at the case level.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the pipeline stages.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required parameter is missing or invalid (account key, scheduler
    /// kind, cores per node, processor counts).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A required local artifact does not exist (executable not built,
    /// dataset not materialized, namelist missing).
    #[error("precondition not met: {0}")]
    Precondition(String),

    /// A single dataset's backing files span multiple directories.
    #[error("dataset '{dataset}' exists in multiple directories: {paths:?}")]
    InconsistentLayout {
        dataset: String,
        paths: Vec<PathBuf>,
    },

    /// The namelist references a companion file that does not exist.
    #[error("namelist references '{path}', but no such file was found")]
    MissingDependency { path: PathBuf },

    /// The partition tool failed on an input file.
    #[error("partitioning '{file}' failed with status {code}: {stderr}")]
    Partition {
        file: PathBuf,
        code: i32,
        stderr: String,
    },

    /// The supervised model process terminated abnormally.
    #[error("model run failed with exit code {code}; stderr saved to {log}")]
    ExecutionFailure { code: i32, log: PathBuf },

    /// The join tool failed on a group of per-worker output files.
    #[error("joining '{pattern}' failed with status {code}: {stderr}")]
    Join {
        pattern: String,
        code: i32,
        stderr: String,
    },

    /// Underlying filesystem or subprocess I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, PipelineError>;
