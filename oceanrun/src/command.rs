//! Default partition/join tools backed by the model's command-line
//! utilities (`partit` and `ncjoin`).

use std::path::{Path, PathBuf};
use std::process::Command;

use regex::Regex;
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::join::{JoinOutcome, JoinTool};
use crate::partition::PartitionTool;

/// Partition tool shelling out to the model's `partit` utility, which
/// writes `name.NNN.ext` files next to its input.
#[derive(Debug, Clone)]
pub struct PartitCommand {
    program: String,
}

impl PartitCommand {
    pub fn new() -> Self {
        Self {
            program: "partit".into(),
        }
    }

    /// Uses an alternative partition executable.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Discovers the partitions `partit` produced for `file`, in index
    /// order. The numbering scheme is the tool's own; only the
    /// `stem.<digits>.ext` shape is assumed.
    fn produced_partitions(&self, file: &Path) -> Result<Vec<PathBuf>> {
        let dir = file.parent().unwrap_or_else(|| Path::new("."));
        let stem = file
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let ext = file
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let pattern = Regex::new(&format!(
            r"^{}\.\d+\.{}$",
            regex::escape(stem),
            regex::escape(ext)
        ))
        .expect("partition pattern is valid");

        let mut produced: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| pattern.is_match(n))
            })
            .collect();
        produced.sort();
        Ok(produced)
    }
}

impl Default for PartitCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl PartitionTool for PartitCommand {
    fn partition(&self, file: &Path, n_procs_x: u32, n_procs_y: u32) -> Result<Vec<PathBuf>> {
        let dir = file.parent().unwrap_or_else(|| Path::new("."));
        let output = Command::new(&self.program)
            .arg(n_procs_x.to_string())
            .arg(n_procs_y.to_string())
            .arg(file)
            .current_dir(dir)
            .output()?;
        if !output.status.success() {
            return Err(PipelineError::Partition {
                file: file.to_path_buf(),
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        let produced = self.produced_partitions(file)?;
        debug!(file = %file.display(), count = produced.len(), "partitioned");
        Ok(produced)
    }
}

/// Join tool shelling out to `ncjoin`. The pattern is a shell glob, so
/// the command goes through `sh -c` for expansion.
#[derive(Debug, Clone)]
pub struct NcjoinCommand {
    program: String,
}

impl NcjoinCommand {
    pub fn new() -> Self {
        Self {
            program: "ncjoin".into(),
        }
    }

    /// Uses an alternative join executable.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for NcjoinCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl JoinTool for NcjoinCommand {
    fn join(&self, pattern: &str, cwd: &Path) -> Result<JoinOutcome> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(format!("{} {}", self.program, pattern))
            .current_dir(cwd)
            .output()?;
        Ok(JoinOutcome {
            exit_code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
