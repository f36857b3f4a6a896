// src/dag/readiness.rs

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::dag::graph::DagGraph;
use crate::dag::node::Node;
use crate::dag::node_state::{NodeInfo, NodeRunState, ReadyNode};
use crate::dag::step::ReadinessStep;
use crate::errors::Result;
use crate::types::{NodeId, PIECES_KEY, Payload, payload_text};

/// Readiness bookkeeping for a single run.
///
/// Holds the validated DAG plus per-node state, and decides:
/// - which nodes are ready to launch (all dependencies succeeded)
/// - what input each ready node receives
/// - when the run is finished
///
/// It is synchronous and owned by exactly one coordinating task, which makes
/// it the single point of serialization for completions: two nodes finishing
/// together are applied one after the other.
#[derive(Debug)]
pub struct ReadinessTracker {
    graph: DagGraph,
    nodes: HashMap<NodeId, NodeInfo>,
    aborted: bool,
}

impl ReadinessTracker {
    /// Validate `nodes` and seed every node's input with `initial`.
    pub fn new(nodes: Vec<Node>, initial: &Payload) -> Result<Self> {
        let graph = DagGraph::build(&nodes)?;

        let infos = nodes
            .into_iter()
            .map(|node| {
                let deps = graph.dependencies_of(&node.id).to_vec();
                let id = node.id.clone();
                (id, NodeInfo::new(Arc::new(node), &deps, initial))
            })
            .collect();

        Ok(Self {
            graph,
            nodes: infos,
            aborted: false,
        })
    }

    pub fn graph(&self) -> &DagGraph {
        &self.graph
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Read-only view of a node's state.
    pub fn run_state_of(&self, id: &str) -> Option<NodeRunState> {
        self.nodes.get(id).map(|info| info.run_state)
    }

    /// Whether every dependency of `id` has succeeded.
    ///
    /// Returns `None` if the node is unknown.
    pub fn deps_satisfied(&self, id: &str) -> Option<bool> {
        let info = self.nodes.get(id)?;
        Some(
            self.graph
                .dependencies_of(id)
                .iter()
                .all(|dep| self.run_state_of(dep) == Some(NodeRunState::Succeeded))
                && info.pending_deps.is_empty(),
        )
    }

    /// Number of nodes currently `Running`.
    pub fn in_flight(&self) -> usize {
        self.nodes
            .values()
            .filter(|info| info.run_state == NodeRunState::Running)
            .count()
    }

    /// Release the root nodes.
    pub fn start(&mut self) -> ReadinessStep {
        let roots = self.graph.roots();
        info!(?roots, nodes = self.graph.len(), "starting DAG run");

        let newly_ready = roots.iter().filter_map(|id| self.promote(id)).collect();
        ReadinessStep {
            newly_ready,
            run_finished: self.is_finished(),
        }
    }

    /// Mark a ready node as dispatched.
    pub fn mark_running(&mut self, id: &str) {
        match self.nodes.get_mut(id) {
            Some(info) if info.run_state == NodeRunState::Ready => {
                info.run_state = NodeRunState::Running;
            }
            Some(info) => {
                warn!(node = %id, state = ?info.run_state, "mark_running on node that is not Ready");
            }
            None => warn!(node = %id, "mark_running for unknown node; ignoring"),
        }
    }

    /// Apply a successful completion: merge `output` into every dependent's
    /// input, drop the satisfied id from their pending sets and return those
    /// that became ready.
    ///
    /// After an abort the success is still recorded but nothing new is
    /// released.
    pub fn complete_success(&mut self, id: &str, output: &Payload) -> ReadinessStep {
        match self.nodes.get_mut(id) {
            Some(info) => {
                info.run_state = NodeRunState::Succeeded;
                debug!(node = %id, "node succeeded");
            }
            None => {
                warn!(node = %id, "completion for unknown node; ignoring");
                return self.idle_step();
            }
        }

        if self.aborted {
            debug!(node = %id, "run already aborted; not releasing dependents");
            return self.idle_step();
        }

        let text = payload_text(output).to_string();
        let dependents = self.graph.dependents_of(id).to_vec();
        let mut newly_ready = Vec::new();

        for dependent in dependents {
            let Some(info) = self.nodes.get_mut(&dependent) else {
                warn!(node = %dependent, "dependent missing from node map");
                continue;
            };

            // Shallow merge: later completions overwrite earlier keys.
            for (key, value) in output {
                info.input.insert(key.clone(), value.clone());
            }
            info.dep_texts.insert(id.to_string(), text.clone());
            info.pending_deps.remove(id);

            if info.pending_deps.is_empty() && info.run_state == NodeRunState::Pending {
                if let Some(ready) = self.promote(&dependent) {
                    newly_ready.push(ready);
                }
            }
        }

        ReadinessStep {
            newly_ready,
            run_finished: self.is_finished(),
        }
    }

    /// Record a node's final failure and abort the run.
    pub fn complete_failure(&mut self, id: &str) -> ReadinessStep {
        match self.nodes.get_mut(id) {
            Some(info) => info.run_state = NodeRunState::Failed,
            None => {
                warn!(node = %id, "failure for unknown node; ignoring");
                return self.idle_step();
            }
        }

        if !self.aborted {
            warn!(node = %id, "node failed; aborting run");
        }
        self.aborted = true;
        self.idle_step()
    }

    /// Record that an in-flight node stopped because the run was cancelled.
    pub fn complete_cancelled(&mut self, id: &str) -> ReadinessStep {
        if let Some(info) = self.nodes.get_mut(id) {
            info.run_state = NodeRunState::Cancelled;
        }
        self.idle_step()
    }

    /// The run is finished when nothing is in flight and either every node
    /// succeeded or the run was aborted.
    pub fn is_finished(&self) -> bool {
        let any_active = self
            .nodes
            .values()
            .any(|info| matches!(info.run_state, NodeRunState::Ready | NodeRunState::Running));
        if any_active {
            return false;
        }

        self.aborted
            || self
                .nodes
                .values()
                .all(|info| info.run_state == NodeRunState::Succeeded)
    }

    /// Nodes that never left `Pending`.
    pub fn never_started(&self) -> Vec<NodeId> {
        self.graph
            .nodes()
            .filter(|id| self.run_state_of(id) == Some(NodeRunState::Pending))
            .map(str::to_string)
            .collect()
    }

    fn idle_step(&self) -> ReadinessStep {
        ReadinessStep {
            newly_ready: Vec::new(),
            run_finished: self.is_finished(),
        }
    }

    /// Pending -> Ready, building the input the node's attempts will share.
    fn promote(&mut self, id: &str) -> Option<ReadyNode> {
        let deps = self.graph.dependencies_of(id).to_vec();
        let info = self.nodes.get_mut(id)?;
        if info.run_state != NodeRunState::Pending {
            return None;
        }

        let mut input = info.input.clone();
        if !deps.is_empty() {
            let pieces = deps
                .iter()
                .map(|dep| Value::String(info.dep_texts.get(dep).cloned().unwrap_or_default()))
                .collect();
            input.insert(PIECES_KEY.to_string(), Value::Array(pieces));
        }

        info.run_state = NodeRunState::Ready;
        debug!(node = %id, agent = %info.node.agent, "dependencies satisfied; node ready");

        Some(ReadyNode {
            node: Arc::clone(&info.node),
            input,
        })
    }
}
