// src/engine/mod.rs

//! Orchestration engine.
//!
//! [`Scheduler::run_dag`] validates a node set, then drives it with one
//! coordinating loop that:
//! - launches ready nodes as independent Tokio tasks
//! - receives one [`RunEvent`] per settled node
//! - feeds it into the [`ReadinessTracker`](crate::dag::ReadinessTracker)
//!   and launches whatever became ready
//! - aborts the run on the first failure
//!
//! Results are collected in a [`RunReport`].

pub mod result;
pub mod scheduler;

use crate::exec::NodeRun;
use crate::types::NodeId;

/// Events flowing from node tasks into the coordinating loop.
#[derive(Debug)]
pub enum RunEvent {
    /// A node settled (succeeded, failed or observed cancellation).
    NodeFinished { node: NodeId, run: NodeRun },
}

pub use result::{ExecutionResult, NodeOutcome, RunReport};
pub use scheduler::Scheduler;
