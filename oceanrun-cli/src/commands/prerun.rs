//! `pre-run`: partition input datasets and resolve the namelist.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use tracing::info;

use oceanrun::command::PartitCommand;
use oceanrun::dataset::{DatasetKind, InputDataset};
use oceanrun::discretization::Discretization;
use oceanrun::partition::prepare_run;
use oceanrun::template::working_copy_name;
use oceanrun::{PipelineError, Result};

use super::parse_date;

#[derive(Args)]
pub struct PreRunArgs {
    /// Namelist template (a `*_TEMPLATE` file is copied to its working
    /// name first; any other file is edited in place)
    #[arg(long)]
    namelist: PathBuf,

    /// Model grid file (singular)
    #[arg(long)]
    grid: Option<PathBuf>,

    /// Initial-conditions file (singular)
    #[arg(long)]
    initial_conditions: Option<PathBuf>,

    /// Tidal-forcing file; repeatable, one dataset per flag
    #[arg(long)]
    tidal_forcing: Vec<PathBuf>,

    /// Surface-forcing file; repeatable, one dataset per flag
    #[arg(long)]
    surface_forcing: Vec<PathBuf>,

    /// Boundary-forcing file; repeatable, one dataset per flag
    #[arg(long)]
    boundary_forcing: Vec<PathBuf>,

    /// Processors along the x axis
    #[arg(long)]
    n_procs_x: u32,

    /// Processors along the y axis
    #[arg(long)]
    n_procs_y: u32,

    /// Model time step in seconds
    #[arg(long)]
    time_step: u32,

    /// Simulation start date (YYYY-MM-DD), enables date filtering
    #[arg(long)]
    start_date: Option<String>,

    /// Simulation end date (YYYY-MM-DD)
    #[arg(long)]
    end_date: Option<String>,

    /// Partition executable to invoke
    #[arg(long, default_value = "partit")]
    partit: String,
}

pub fn handle(args: PreRunArgs) -> Result<()> {
    let discretization =
        Discretization::new(args.time_step, args.n_procs_x, args.n_procs_y)?;

    if !args.namelist.is_file() {
        return Err(PipelineError::Precondition(format!(
            "namelist template '{}' not found",
            args.namelist.display()
        )));
    }
    let namelist = match working_copy_name(&args.namelist) {
        Some(working) => {
            fs::copy(&args.namelist, &working)?;
            working
        }
        None => args.namelist.clone(),
    };

    let mut datasets = Vec::new();
    if let Some(grid) = args.grid {
        datasets.push(InputDataset::new("grid", DatasetKind::ModelGrid, vec![grid]));
    }
    if let Some(ic) = args.initial_conditions {
        datasets.push(InputDataset::new(
            "initial_conditions",
            DatasetKind::InitialConditions,
            vec![ic],
        ));
    }
    let families = [
        (DatasetKind::TidalForcing, &args.tidal_forcing),
        (DatasetKind::SurfaceForcing, &args.surface_forcing),
        (DatasetKind::BoundaryForcing, &args.boundary_forcing),
    ];
    for (kind, files) in families {
        for (i, file) in files.iter().enumerate() {
            let name = format!("{}_{}", kind.display().replace(' ', "_"), i);
            datasets.push(InputDataset::new(name, kind, vec![file.clone()]));
        }
    }

    let start = args.start_date.as_deref().map(parse_date).transpose()?;
    let end = args.end_date.as_deref().map(parse_date).transpose()?;

    let tool = PartitCommand::with_program(args.partit);
    prepare_run(&namelist, &mut datasets, &discretization, &tool, start, end)?;

    info!(
        namelist = %namelist.display(),
        datasets = datasets.len(),
        "pre-run stage complete"
    );
    Ok(())
}
