// src/dag/node.rs

//! Immutable node configuration.

use std::time::Duration;

use serde_json::Value;

use crate::types::{NodeId, Payload};

pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// One configured unit of work in the DAG.
///
/// Construction performs no validation; duplicate ids, unknown dependencies
/// and cycles are rejected by [`DagGraph::build`](crate::dag::DagGraph::build)
/// when a run starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    /// Agent name, resolved against the registry at execution time.
    pub agent: String,
    /// Ids that must succeed before this node may start. Declaration order is
    /// kept: it decides the order of the `pieces` fan-in list.
    pub deps: Vec<NodeId>,
    pub guard_pre: bool,
    pub guard_post: bool,
    /// Wall-clock bound for one attempt, guard calls included.
    pub timeout_ms: u64,
    /// Additional attempts allowed after the first retryable failure.
    pub max_retries: u32,
    /// Extra keyword arguments merged over the input payload.
    pub params: Payload,
}

impl Node {
    /// A node with no dependencies, both guard phases enabled, the default
    /// timeout and no retries.
    pub fn new(id: impl Into<NodeId>, agent: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            agent: agent.into(),
            deps: Vec::new(),
            guard_pre: true,
            guard_post: true,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_retries: 0,
            params: Payload::new(),
        }
    }

    pub fn after(mut self, dep: impl Into<NodeId>) -> Self {
        self.deps.push(dep.into());
        self
    }

    pub fn guard_pre(mut self, enabled: bool) -> Self {
        self.guard_pre = enabled;
        self
    }

    pub fn guard_post(mut self, enabled: bool) -> Self {
        self.guard_post = enabled;
        self
    }

    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = ms;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Total attempts this node may consume.
    pub fn attempt_budget(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_keeps_declaration_order_of_deps() {
        let n = Node::new("reduce", "synth")
            .after("claim2")
            .after("claim1")
            .guard_pre(false)
            .max_retries(2)
            .param("k", json!(1));

        assert_eq!(n.deps, vec!["claim2".to_string(), "claim1".to_string()]);
        assert!(!n.guard_pre);
        assert!(n.guard_post);
        assert_eq!(n.attempt_budget(), 3);
        assert_eq!(n.timeout(), Duration::from_millis(DEFAULT_TIMEOUT_MS));
        assert_eq!(n.params.get("k"), Some(&json!(1)));
    }
}
