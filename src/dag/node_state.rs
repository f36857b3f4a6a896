// src/dag/node_state.rs

//! Per-node run state and the hand-off type for nodes that became ready.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::dag::node::Node;
use crate::types::{NodeId, Payload};

/// Per-run state of a node.
///
/// `Pending -> Ready -> Running -> {Succeeded, Failed}`. Retries happen inside
/// `Running`; the tracker only sees the settled outcome. `Cancelled` is used
/// for in-flight nodes that observed an abort before reaching a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRunState {
    Pending,
    Ready,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

/// Static node configuration plus the mutable readiness bookkeeping.
#[derive(Debug, Clone)]
pub(crate) struct NodeInfo {
    pub node: Arc<Node>,
    pub run_state: NodeRunState,
    /// Dependencies that have not succeeded yet.
    pub pending_deps: HashSet<NodeId>,
    /// Initial payload with upstream outputs merged in completion order.
    pub input: Payload,
    /// Output text of each satisfied dependency, for the `pieces` list.
    pub dep_texts: HashMap<NodeId, String>,
}

impl NodeInfo {
    pub fn new(node: Arc<Node>, deps: &[NodeId], initial: &Payload) -> Self {
        Self {
            node,
            run_state: NodeRunState::Pending,
            pending_deps: deps.iter().cloned().collect(),
            input: initial.clone(),
            dep_texts: HashMap::new(),
        }
    }
}

/// A node whose dependencies are all satisfied, with the input its attempts
/// will reuse.
#[derive(Debug, Clone)]
pub struct ReadyNode {
    pub node: Arc<Node>,
    pub input: Payload,
}

impl ReadyNode {
    pub fn id(&self) -> &str {
        &self.node.id
    }
}
