//! Run supervision: batch submission and direct execution.
//!
//! For batch schedulers the supervisor hands the generated script to the
//! queue-submission command (`qsub`/`sbatch`) and returns as soon as the
//! queue has accepted or rejected it; it never blocks on job completion.
//!
//! For direct execution it launches the model as a child process,
//! consumes stdout line-by-line through the [`progress`] state machine,
//! and buffers stderr. A non-zero exit persists the captured stderr to a
//! timestamped log in the output directory and fails with an error
//! naming that file.

pub mod progress;

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;

use chrono::Local;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{error, info, warn};

use crate::error::{PipelineError, Result};
use crate::scheduler::{SchedulerKind, Submission};

use progress::{ProgressEvent, ProgressParser};

/// Submits a script-backed submission to its batch queue.
///
/// The queue command runs with the run directory as working directory.
/// The returned result reflects the submission command's own exit status
/// (accepted/rejected), not the job's eventual outcome; its stdout is
/// not parsed.
///
/// # Errors
///
/// Configuration error for a direct submission or a scheduler-less kind;
/// execution failure when the queue command itself exits non-zero.
pub fn submit_batch(submission: &Submission, kind: SchedulerKind, run_dir: &Path) -> Result<()> {
    let script = submission.script_path().ok_or_else(|| {
        PipelineError::Configuration(
            "direct submissions are not handed to a batch queue; use run_direct".into(),
        )
    })?;
    let queue_cmd = match kind {
        SchedulerKind::Pbs => "qsub",
        SchedulerKind::Slurm => "sbatch",
        SchedulerKind::None => {
            return Err(PipelineError::Configuration(
                "scheduler kind 'none' has no queue-submission command".into(),
            ))
        }
    };

    info!(command = queue_cmd, script = %script.display(), "submitting batch job");
    let status = std::process::Command::new(queue_cmd)
        .arg(script)
        .current_dir(run_dir)
        .status()?;
    if !status.success() {
        return Err(PipelineError::Configuration(format!(
            "'{}' rejected the submission (exit status {})",
            queue_cmd,
            status.code().unwrap_or(-1)
        )));
    }
    Ok(())
}

/// Runs the model directly and supervises it to completion.
///
/// Stdout is streamed line-at-a-time so progress is observable before
/// exit; stderr is fully buffered and only written to disk on failure.
/// The child is spawned with `kill_on_drop`, so cancelling the
/// supervising task also terminates the model.
///
/// A zero exit is reported as success. Known limitation inherited from
/// the model: it can exit 0 after a fatal internal error; this supervisor
/// makes no attempt to detect that from output content.
///
/// # Errors
///
/// [`PipelineError::ExecutionFailure`] referencing the stderr log when
/// the child exits non-zero (or dies to a signal).
pub async fn run_direct(
    command: &str,
    run_dir: &Path,
    output_dir: &Path,
    requested_steps: u64,
) -> Result<()> {
    fs::create_dir_all(output_dir)?;

    info!(%command, run_dir = %run_dir.display(), "launching model");
    let mut child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(run_dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    let stdout = child.stdout.take().ok_or_else(|| {
        PipelineError::Precondition("model process produced no stdout handle".into())
    })?;
    let stderr = child.stderr.take().ok_or_else(|| {
        PipelineError::Precondition("model process produced no stderr handle".into())
    })?;

    // Drain stderr concurrently so a chatty model cannot deadlock on a
    // full pipe while we read stdout.
    let stderr_task = tokio::spawn(async move {
        let mut buf = String::new();
        let mut reader = BufReader::new(stderr);
        let _ = reader.read_to_string(&mut buf).await;
        buf
    });

    let mut parser = ProgressParser::new(requested_steps);
    let mut lines = BufReader::new(stdout).lines();
    while let Some(line) = lines.next_line().await? {
        match parser.observe(&line, Instant::now()) {
            Some(ProgressEvent::Initializing) => info!("model initializing..."),
            Some(ProgressEvent::Step {
                completed,
                requested,
                elapsed,
                eta,
            }) => match eta {
                Some(eta) => info!(
                    "time step {} of {} ({:.1}s elapsed; ETA {:.1}s)",
                    completed,
                    requested,
                    elapsed.as_secs_f64(),
                    eta.as_secs_f64()
                ),
                None => info!("time step {} of {}", completed, requested),
            },
            None => {}
        }
    }

    let status = child.wait().await?;
    parser.finish();
    let stderr_text = stderr_task.await.unwrap_or_default();

    if status.success() {
        info!("model run completed");
        if !stderr_text.is_empty() {
            warn!("model wrote {} bytes to stderr", stderr_text.len());
        }
        return Ok(());
    }

    let code = status.code().unwrap_or(-1);
    let log = stderr_log_path(output_dir);
    fs::write(&log, &stderr_text)?;
    error!(code, log = %log.display(), "model run failed");
    Err(PipelineError::ExecutionFailure { code, log })
}

/// Timestamped stderr-log path inside the output directory.
fn stderr_log_path(output_dir: &Path) -> PathBuf {
    output_dir.join(format!(
        "run_stderr_{}.log",
        Local::now().format("%Y%m%d_%H%M%S")
    ))
}
