//! `run`: build the submission and execute or enqueue the model.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use tracing::info;

use oceanrun::discretization::Discretization;
use oceanrun::scheduler::{build_submission, LaunchSpec, RunJob, Submission};
use oceanrun::supervisor::{run_direct, submit_batch};
use oceanrun::system::SystemProfile;
use oceanrun::template::apply_runtime_parameters;
use oceanrun::{PipelineError, Result};

#[derive(Args)]
pub struct RunArgs {
    /// Path to the built model executable
    #[arg(long)]
    exe: PathBuf,

    /// Resolved working namelist (output of the pre-run stage)
    #[arg(long)]
    namelist: PathBuf,

    /// Processors along the x axis
    #[arg(long)]
    n_procs_x: u32,

    /// Processors along the y axis
    #[arg(long)]
    n_procs_y: u32,

    /// Model time step in seconds
    #[arg(long)]
    time_step: u32,

    /// Number of time steps to run
    #[arg(long)]
    n_steps: Option<u64>,

    /// Target system profile (expanse, perlmutter, derecho, local);
    /// defaults to detecting the current machine
    #[arg(long)]
    system: Option<String>,

    /// Job name; also names the scheduler output file
    #[arg(long, default_value = "marine_run")]
    job_name: String,

    /// Requested walltime HH:MM:SS (default: system maximum)
    #[arg(long)]
    walltime: Option<String>,

    /// Account key for batch-scheduler billing
    #[arg(long)]
    account_key: Option<String>,

    /// Directory for model output (default: the executable's directory)
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

pub async fn handle(args: RunArgs) -> Result<()> {
    if !args.exe.is_file() {
        return Err(PipelineError::Precondition(format!(
            "model executable '{}' not found; build it first",
            args.exe.display()
        )));
    }

    let profile = match args.system.as_deref() {
        Some(name) => SystemProfile::from_name(name)?,
        None => SystemProfile::detect(),
    };
    let discretization =
        Discretization::new(args.time_step, args.n_procs_x, args.n_procs_y)?;

    let n_steps =
        apply_runtime_parameters(&args.namelist, args.n_steps, discretization.time_step())?;

    let output_dir = match args.output_dir {
        Some(dir) => dir,
        None => args
            .exe
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    fs::create_dir_all(&output_dir)?;

    // The model runs in the output directory; run and output paths are
    // conceptually distinct but coincide here.
    let run_dir = output_dir.clone();
    let job = RunJob {
        name: args.job_name,
        walltime: args.walltime,
        account_key: args.account_key,
        run_dir: run_dir.clone(),
    };
    let launch = LaunchSpec {
        exe_path: args.exe,
        namelist_path: args.namelist,
        n_procs: discretization.n_procs_tot(),
    };

    let submission = build_submission(&job, &profile, &launch)?;
    match &submission {
        Submission::Direct { command } => {
            info!(system = profile.name.as_str(), "running model directly");
            run_direct(command, &run_dir, &output_dir, n_steps).await
        }
        Submission::Script { path, .. } => {
            info!(
                system = profile.name.as_str(),
                script = %path.display(),
                "submitting model to batch queue"
            );
            submit_batch(&submission, profile.scheduler, &run_dir)
        }
    }
}
