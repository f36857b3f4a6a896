// src/dag/mod.rs

//! DAG representation and readiness tracking.
//!
//! - [`node`] holds the immutable per-node configuration.
//! - [`graph`] validates a node set and keeps adjacency information.
//! - [`readiness`] is the per-run state machine deciding which nodes are
//!   ready and what input they receive.
//! - [`node_state`] provides node run states and the ready-node hand-off.
//! - [`step`] defines the result type for tracker steps.

pub mod graph;
pub mod node;
pub mod node_state;
pub mod readiness;
pub mod step;

pub use graph::DagGraph;
pub use node::Node;
pub use node_state::{NodeRunState, ReadyNode};
pub use readiness::ReadinessTracker;
pub use step::ReadinessStep;
