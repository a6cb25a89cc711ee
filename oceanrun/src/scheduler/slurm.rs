//! Slurm submission-script generation.

use crate::allocation::AllocationPlan;
use crate::error::Result;
use crate::system::SystemProfile;

use super::{queue, RunJob};

/// Renders the Slurm script for one job.
pub(super) fn script_text(
    job: &RunJob,
    plan: &AllocationPlan,
    profile: &SystemProfile,
    run_cmd: &str,
) -> Result<String> {
    let account = job.account_key()?;
    let walltime = job.walltime(profile)?;
    let queue = queue(profile)?;

    let mut script = String::from("#!/bin/bash\n");
    script.push_str(&format!("#SBATCH --job-name={}\n", job.name));
    script.push_str(&format!("#SBATCH --output={}.out\n", job.name));
    if profile.queue_via_qos {
        script.push_str(&format!("#SBATCH --qos={}\n", queue));
        script.push_str("#SBATCH -C cpu\n");
    } else {
        script.push_str(&format!("#SBATCH --partition={}\n", queue));
    }
    script.push_str(&format!("#SBATCH --nodes={}\n", plan.node_count));
    script.push_str(&format!(
        "#SBATCH --ntasks-per-node={}\n",
        plan.cores_per_node
    ));
    script.push_str(&format!("#SBATCH --account={}\n", account));
    script.push_str("#SBATCH --export=ALL\n");
    script.push_str("#SBATCH --mail-type=ALL\n");
    script.push_str(&format!("#SBATCH --time={}\n", walltime));
    script.push('\n');
    script.push_str(run_cmd);
    script.push('\n');
    Ok(script)
}
