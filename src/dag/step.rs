// src/dag/step.rs

//! Step result type for the readiness tracker.

use crate::dag::node_state::ReadyNode;

/// Structured result of applying one event to the tracker.
///
/// Lets tests drive the DAG by hand and assert on what changed.
#[derive(Debug, Clone)]
pub struct ReadinessStep {
    /// Nodes that became ready as a result of this step.
    pub newly_ready: Vec<ReadyNode>,
    /// Whether the run has nothing left to do.
    pub run_finished: bool,
}
