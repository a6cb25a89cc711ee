//! Scheduler submission generation.
//!
//! The batch back ends are a closed variant: each [`SchedulerKind`] has
//! exactly one script generator, and all of them produce a [`Submission`]
//! value. The generator never executes anything itself; handing the
//! submission to the queue (or launching it directly) belongs to the
//! [`supervisor`](crate::supervisor).

mod pbs;
mod slurm;

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::allocation::AllocationPlan;
use crate::error::{PipelineError, Result};
use crate::system::{MpiLauncher, SystemProfile};

/// Fixed file name of the generated PBS submission script.
pub const PBS_SCRIPT_NAME: &str = "oceanrun_job.pbs";
/// Fixed file name of the generated Slurm submission script.
pub const SLURM_SCRIPT_NAME: &str = "oceanrun_job.sh";

/// The batch-queue system used to execute the model on a given machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerKind {
    /// No scheduler: the model is launched directly.
    None,
    /// PBS Pro / OpenPBS (`qsub`).
    Pbs,
    /// Slurm (`sbatch`).
    Slurm,
}

impl fmt::Display for SchedulerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerKind::None => write!(f, "none"),
            SchedulerKind::Pbs => write!(f, "pbs"),
            SchedulerKind::Slurm => write!(f, "slurm"),
        }
    }
}

/// What to launch: the built executable, its resolved namelist, and the
/// total worker-process count.
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    pub exe_path: PathBuf,
    pub namelist_path: PathBuf,
    pub n_procs: u32,
}

impl LaunchSpec {
    /// The full launch command for a given MPI launcher.
    pub fn command(&self, launcher: MpiLauncher) -> String {
        format!(
            "{} -n {} {} {}",
            launcher.prefix(),
            self.n_procs,
            self.exe_path.display(),
            self.namelist_path.display()
        )
    }
}

/// Parameters of a single batch job.
#[derive(Debug, Clone)]
pub struct RunJob {
    /// Job name; also names the scheduler's `<name>.out` output file.
    pub name: String,
    /// Requested walltime `HH:MM:SS`; defaults to the system maximum.
    pub walltime: Option<String>,
    /// Account / billing key, required by the batch schedulers.
    pub account_key: Option<String>,
    /// Directory the job is submitted from and runs in.
    pub run_dir: PathBuf,
}

impl RunJob {
    fn account_key(&self) -> Result<&str> {
        self.account_key.as_deref().ok_or_else(|| {
            PipelineError::Configuration(
                "an account key is required to submit to a batch scheduler".into(),
            )
        })
    }

    fn walltime<'a>(&'a self, profile: &'a SystemProfile) -> Result<&'a str> {
        self.walltime
            .as_deref()
            .or(profile.max_walltime.as_deref())
            .ok_or_else(|| {
                PipelineError::Configuration(format!(
                    "no walltime requested and no system maximum known for '{}'",
                    profile.name
                ))
            })
    }
}

/// A generated submission: either a direct command or an on-disk script.
#[derive(Debug, Clone)]
pub enum Submission {
    /// Direct execution, no scheduler involved.
    Direct { command: String },
    /// A batch script written to the run directory, to be handed to the
    /// queue-submission command.
    Script { path: PathBuf, text: String },
}

impl Submission {
    /// The script path, when this submission is script-backed.
    pub fn script_path(&self) -> Option<&Path> {
        match self {
            Submission::Direct { .. } => None,
            Submission::Script { path, .. } => Some(path),
        }
    }
}

/// Builds the submission for a job on the given system.
///
/// For batch schedulers this computes the node allocation, renders the
/// scheduler-specific script, and writes it under its fixed name in the
/// run directory. For [`SchedulerKind::None`] it produces the direct
/// launch command and writes nothing.
///
/// # Errors
///
/// Configuration errors for a missing account key, unknown node width,
/// or unresolvable walltime; I/O errors if the script cannot be written.
pub fn build_submission(
    job: &RunJob,
    profile: &SystemProfile,
    launch: &LaunchSpec,
) -> Result<Submission> {
    let command = launch.command(profile.launcher);
    match profile.scheduler {
        SchedulerKind::None => Ok(Submission::Direct { command }),
        SchedulerKind::Pbs => {
            let plan = AllocationPlan::compute(launch.n_procs, profile.cores_per_node()?)?;
            let text = pbs::script_text(job, &plan, profile, &command)?;
            write_script(job, PBS_SCRIPT_NAME, text)
        }
        SchedulerKind::Slurm => {
            let plan = AllocationPlan::compute(launch.n_procs, profile.cores_per_node()?)?;
            let text = slurm::script_text(job, &plan, profile, &command)?;
            write_script(job, SLURM_SCRIPT_NAME, text)
        }
    }
}

fn write_script(job: &RunJob, file_name: &str, text: String) -> Result<Submission> {
    let path = job.run_dir.join(file_name);
    fs::write(&path, &text)?;
    debug!(script = %path.display(), "wrote submission script");
    Ok(Submission::Script { path, text })
}

fn queue<'a>(profile: &'a SystemProfile) -> Result<&'a str> {
    profile.default_queue.as_deref().ok_or_else(|| {
        PipelineError::Configuration(format!(
            "no default queue known for system '{}'",
            profile.name
        ))
    })
}
