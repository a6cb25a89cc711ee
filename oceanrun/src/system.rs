//! Execution-environment profiles.
//!
//! A [`SystemProfile`] describes the machine a run executes on: which
//! batch scheduler (if any) it uses, how wide its nodes are, which queue
//! and walltime to request by default, and how MPI jobs are launched.
//! Named profiles cover the supported HPC systems; [`SystemProfile::detect`]
//! produces a scheduler-less profile for a local workstation.

use std::thread;

use crate::error::{PipelineError, Result};
use crate::scheduler::SchedulerKind;

/// How MPI processes are launched on a given system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MpiLauncher {
    /// Plain `srun` (Slurm-native launch).
    Srun,
    /// `srun --mpi=pmi2` for systems whose MPI stack needs PMI-2.
    SrunPmi2,
    /// `mpirun` from the MPI distribution.
    Mpirun,
}

impl MpiLauncher {
    /// The command prefix placed before `-n <procs> <exe> <namelist>`.
    pub fn prefix(self) -> &'static str {
        match self {
            MpiLauncher::Srun => "srun",
            MpiLauncher::SrunPmi2 => "srun --mpi=pmi2",
            MpiLauncher::Mpirun => "mpirun",
        }
    }
}

/// Description of the system a run will execute on.
#[derive(Debug, Clone)]
pub struct SystemProfile {
    /// Short machine key, e.g. `"expanse"` or `"local"`.
    pub name: String,
    /// Batch scheduler in use, or [`SchedulerKind::None`] for direct runs.
    pub scheduler: SchedulerKind,
    /// Physical cores per compute node; `None` means unknown, which makes
    /// allocation planning (and therefore batch submission) impossible.
    pub cores_per_node: Option<u32>,
    /// Default queue / partition / QOS to submit to.
    pub default_queue: Option<String>,
    /// Maximum (and default) walltime request, `HH:MM:SS`.
    pub max_walltime: Option<String>,
    /// MPI launcher for this system.
    pub launcher: MpiLauncher,
    /// Slurm-only: request the queue via `--qos` (plus a CPU-architecture
    /// constraint) rather than `--partition`.
    pub queue_via_qos: bool,
    /// PBS-only: the scheduler does not start jobs in the submission
    /// directory, so the script must cd into `$PBS_O_WORKDIR`.
    pub pbs_workdir_cd: bool,
}

impl SystemProfile {
    /// SDSC Expanse: Slurm, 128-core AMD nodes, PMI-2 launch.
    pub fn expanse() -> Self {
        Self {
            name: "expanse".into(),
            scheduler: SchedulerKind::Slurm,
            cores_per_node: Some(128),
            default_queue: Some("compute".into()),
            max_walltime: Some("48:00:00".into()),
            launcher: MpiLauncher::SrunPmi2,
            queue_via_qos: false,
            pbs_workdir_cd: false,
        }
    }

    /// NERSC Perlmutter: Slurm with QOS-based queues, 128-core CPU nodes.
    pub fn perlmutter() -> Self {
        Self {
            name: "perlmutter".into(),
            scheduler: SchedulerKind::Slurm,
            cores_per_node: Some(128),
            default_queue: Some("regular".into()),
            max_walltime: Some("24:00:00".into()),
            launcher: MpiLauncher::Srun,
            queue_via_qos: true,
            pbs_workdir_cd: false,
        }
    }

    /// NCAR Derecho: PBS, 128-core nodes, mpirun launch.
    pub fn derecho() -> Self {
        Self {
            name: "derecho".into(),
            scheduler: SchedulerKind::Pbs,
            cores_per_node: Some(128),
            default_queue: Some("main".into()),
            max_walltime: Some("12:00:00".into()),
            launcher: MpiLauncher::Mpirun,
            queue_via_qos: false,
            pbs_workdir_cd: true,
        }
    }

    /// A scheduler-less workstation profile with the local core count.
    pub fn local() -> Self {
        let cores = thread::available_parallelism()
            .map(|n| n.get() as u32)
            .ok();
        Self {
            name: "local".into(),
            scheduler: SchedulerKind::None,
            cores_per_node: cores,
            default_queue: None,
            max_walltime: None,
            launcher: MpiLauncher::Mpirun,
            queue_via_qos: false,
            pbs_workdir_cd: false,
        }
    }

    /// Detects the profile for the current machine.
    ///
    /// Known HPC systems are selected by name; anything else falls back
    /// to the scheduler-less local profile.
    pub fn detect() -> Self {
        Self::local()
    }

    /// Looks up a named system profile.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the unsupported system when
    /// the key is unknown.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "expanse" => Ok(Self::expanse()),
            "perlmutter" => Ok(Self::perlmutter()),
            "derecho" => Ok(Self::derecho()),
            "local" => Ok(Self::local()),
            other => Err(PipelineError::Configuration(format!(
                "unsupported system '{}'; known systems: expanse, perlmutter, derecho, local",
                other
            ))),
        }
    }

    /// Cores per node, required for allocation planning.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the node width is unknown for
    /// this system.
    pub fn cores_per_node(&self) -> Result<u32> {
        self.cores_per_node.ok_or_else(|| {
            PipelineError::Configuration(format!(
                "cores per node is unknown for system '{}'; \
                 the execution environment is unsupported for batch allocation",
                self.name
            ))
        })
    }
}
