//! PBS submission-script generation.

use crate::allocation::AllocationPlan;
use crate::error::Result;
use crate::system::SystemProfile;

use super::{queue, RunJob};

/// Renders the PBS script for one job.
pub(super) fn script_text(
    job: &RunJob,
    plan: &AllocationPlan,
    profile: &SystemProfile,
    run_cmd: &str,
) -> Result<String> {
    let account = job.account_key()?;
    let walltime = job.walltime(profile)?;
    let queue = queue(profile)?;

    let mut script = String::from("#PBS -S /bin/bash\n");
    script.push_str(&format!("#PBS -N {}\n", job.name));
    script.push_str(&format!("#PBS -o {}.out\n", job.name));
    script.push_str(&format!("#PBS -A {}\n", account));
    script.push_str(&format!(
        "#PBS -l select={}:ncpus={},walltime={}\n",
        plan.node_count, plan.cores_per_node, walltime
    ));
    script.push_str(&format!("#PBS -q {}\n", queue));
    script.push_str("#PBS -j oe\n");
    script.push_str("#PBS -k eod\n");
    script.push_str("#PBS -V\n");
    if profile.pbs_workdir_cd {
        // PBS starts the job in $HOME, not the submission directory.
        script.push_str("cd ${PBS_O_WORKDIR}\n");
    }
    script.push('\n');
    script.push_str(run_cmd);
    script.push('\n');
    Ok(script)
}
