//! Time and domain discretization parameters.

use crate::error::{PipelineError, Result};

/// Time step and 2-D processor decomposition for a model run.
///
/// Immutable once constructed; the total worker count is always the
/// product of the two per-axis processor counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Discretization {
    time_step: u32,
    n_procs_x: u32,
    n_procs_y: u32,
}

impl Discretization {
    /// Creates a discretization from a time step (seconds) and the number
    /// of processors along each horizontal axis.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if any parameter is zero.
    pub fn new(time_step: u32, n_procs_x: u32, n_procs_y: u32) -> Result<Self> {
        if time_step == 0 {
            return Err(PipelineError::Configuration(
                "time_step must be a positive number of seconds".into(),
            ));
        }
        if n_procs_x == 0 || n_procs_y == 0 {
            return Err(PipelineError::Configuration(format!(
                "processor counts must be positive, got {}x{}",
                n_procs_x, n_procs_y
            )));
        }
        Ok(Self {
            time_step,
            n_procs_x,
            n_procs_y,
        })
    }

    /// Model time step in seconds.
    pub fn time_step(&self) -> u32 {
        self.time_step
    }

    /// Number of processors subdividing the x axis.
    pub fn n_procs_x(&self) -> u32 {
        self.n_procs_x
    }

    /// Number of processors subdividing the y axis.
    pub fn n_procs_y(&self) -> u32 {
        self.n_procs_y
    }

    /// Total number of worker processes required by this decomposition.
    pub fn n_procs_tot(&self) -> u32 {
        self.n_procs_x * self.n_procs_y
    }
}
