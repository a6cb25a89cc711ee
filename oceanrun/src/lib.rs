//! oceanrun - Execution pipeline for domain-decomposed ocean-model runs
//!
//! This library takes a compiled, parallel ocean-model configuration from
//! "built executable" to "completed run with unified output":
//!
//! 1. [`partition`] - split input datasets into one file per worker process
//!    and wire the resulting paths into the run-time namelist (pre-run)
//! 2. [`allocation`] / [`scheduler`] - compute the node allocation and
//!    generate a batch-scheduler submission script, or a direct command
//! 3. [`supervisor`] - submit the job, or run it directly while streaming
//!    and classifying the model's stdout for progress reporting
//! 4. [`join`] - merge per-worker output files back into unified files
//!    (post-run)
//!
//! Each stage is a discrete, independently retriable step; no stage
//! implicitly calls another. Partial progress (partitioned files,
//! substituted namelist tokens) is left on disk so a failed case can be
//! resumed by re-running the failing stage.

pub mod allocation;
pub mod command;
pub mod dataset;
pub mod discretization;
pub mod error;
pub mod join;
pub mod logging;
pub mod partition;
pub mod scheduler;
pub mod supervisor;
pub mod system;
pub mod template;

pub use error::{PipelineError, Result};

/// Version of the oceanrun library and CLI.
///
/// This is synchronized across all components in the workspace.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
