//! Node allocation planning for batch schedulers.

use crate::error::{PipelineError, Result};

/// The node allocation requested from a scheduler to satisfy a total
/// worker-process requirement.
///
/// Invariant: `node_count * cores_per_node >= total_procs`, with
/// `node_count` the minimum integer satisfying this for the system's
/// per-node core cap. Whole nodes are always requested; partial-node
/// packing is not attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationPlan {
    /// Number of nodes to request.
    pub node_count: u32,
    /// Cores to request on each node (the system's full node width).
    pub cores_per_node: u32,
}

impl AllocationPlan {
    /// Computes the minimal full-node allocation covering `total_procs`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if either argument is zero.
    pub fn compute(total_procs: u32, cores_per_node: u32) -> Result<Self> {
        if total_procs == 0 {
            return Err(PipelineError::Configuration(
                "cannot plan an allocation for zero worker processes".into(),
            ));
        }
        if cores_per_node == 0 {
            return Err(PipelineError::Configuration(
                "cores_per_node must be positive".into(),
            ));
        }
        Ok(Self {
            node_count: total_procs.div_ceil(cores_per_node),
            cores_per_node,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_fit_uses_minimum_nodes() {
        let plan = AllocationPlan::compute(256, 128).unwrap();
        assert_eq!(plan.node_count, 2);
        assert_eq!(plan.cores_per_node, 128);
    }

    #[test]
    fn remainder_rounds_up_to_whole_node() {
        let plan = AllocationPlan::compute(129, 128).unwrap();
        assert_eq!(plan.node_count, 2);
    }

    #[test]
    fn single_process_still_gets_a_node() {
        let plan = AllocationPlan::compute(1, 128).unwrap();
        assert_eq!(plan.node_count, 1);
    }

    #[test]
    fn allocation_always_covers_total_procs() {
        for total in [1, 7, 64, 127, 128, 129, 1000] {
            for cores in [1, 16, 24, 128] {
                let plan = AllocationPlan::compute(total, cores).unwrap();
                assert!(plan.node_count * plan.cores_per_node >= total);
                // Minimality: one fewer node must not suffice.
                assert!((plan.node_count - 1) * plan.cores_per_node < total);
            }
        }
    }

    #[test]
    fn zero_inputs_are_rejected() {
        assert!(AllocationPlan::compute(0, 128).is_err());
        assert!(AllocationPlan::compute(64, 0).is_err());
    }
}
