//! Post-run stage: joining per-worker output files.
//!
//! The model writes one output file per worker, named with a fixed-width
//! numeric worker index just before the final extension
//! (`avg.000.nc`, `avg.001.nc`, ...). This stage groups those files,
//! hands each group to an external join capability, and relocates the
//! consumed partitions into a `PARTITIONED` subdirectory so the unified
//! file is the sole file left at top level.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::info;

use crate::dataset::PARTITIONED_DIR;
use crate::error::{PipelineError, Result};

/// Result of one external join invocation.
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    pub exit_code: i32,
    pub stderr: String,
}

/// External capability that merges the per-worker files matching a glob
/// pattern, run with the given working directory.
pub trait JoinTool {
    fn join(&self, pattern: &str, cwd: &Path) -> Result<JoinOutcome>;
}

/// One group of per-worker output files sharing a base name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerFileGroup {
    /// Glob pattern covering the group (`avg.*.nc`).
    pub pattern: String,
    /// The member files, in worker-index order.
    pub files: Vec<PathBuf>,
}

/// Scans a directory for per-worker output files and groups them by
/// base name and extension, stripping the worker-index segment.
///
/// The index width is whatever the model produced; only its position
/// (immediately before the final extension) is assumed.
pub fn scan_worker_files(output_dir: &Path) -> Result<Vec<WorkerFileGroup>> {
    let worker_file = Regex::new(r"^(?P<base>.+)\.(?P<idx>\d+)\.(?P<ext>[^.]+)$")
        .expect("worker-file pattern is valid");

    let mut groups: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for entry in fs::read_dir(output_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if let Some(caps) = worker_file.captures(name) {
            let pattern = format!("{}.*.{}", &caps["base"], &caps["ext"]);
            groups.entry(pattern).or_default().push(entry.path());
        }
    }

    Ok(groups
        .into_iter()
        .map(|(pattern, mut files)| {
            files.sort();
            WorkerFileGroup { pattern, files }
        })
        .collect())
}

/// Joins every group of per-worker output files in `output_dir`.
///
/// Finding no worker files is informational, not an error. Successfully
/// joined partitions are moved (never deleted) into
/// `output_dir/PARTITIONED`, leaving each unified file alone at top
/// level. Returns the number of groups joined.
///
/// # Errors
///
/// [`PipelineError::Join`] carrying the tool's diagnostic output when a
/// join invocation exits non-zero.
pub fn join_output(output_dir: &Path, tool: &dyn JoinTool) -> Result<usize> {
    let groups = scan_worker_files(output_dir)?;
    if groups.is_empty() {
        info!(dir = %output_dir.display(), "no per-worker output found; nothing to join");
        return Ok(0);
    }

    let consumed_dir = output_dir.join(PARTITIONED_DIR);
    fs::create_dir_all(&consumed_dir)?;

    for group in &groups {
        info!(pattern = group.pattern.as_str(), "joining worker output");
        let outcome = tool.join(&group.pattern, output_dir)?;
        if outcome.exit_code != 0 {
            return Err(PipelineError::Join {
                pattern: group.pattern.clone(),
                code: outcome.exit_code,
                stderr: outcome.stderr,
            });
        }
        for file in &group.files {
            let name = file.file_name().expect("scanned entries have file names");
            fs::rename(file, consumed_dir.join(name))?;
        }
    }
    Ok(groups.len())
}
