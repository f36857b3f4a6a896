#![allow(dead_code)]

use std::sync::Arc;

use serde_json::{json, Value};

use hybrid_dag::dag::Node;
use hybrid_dag::engine::Scheduler;
use hybrid_dag::guard::{AllowAll, Guard};
use hybrid_dag::registry::{Agent, Registry};
use hybrid_dag::types::Payload;

/// Payload from a JSON object literal. Panics on non-objects.
pub fn payload(value: Value) -> Payload {
    value
        .as_object()
        .cloned()
        .expect("payload literal must be a JSON object")
}

/// Payload holding only `text`.
pub fn text_payload(text: &str) -> Payload {
    payload(json!({ "text": text }))
}

/// Node with both guard phases disabled, for tests that don't care about
/// interposition.
pub fn plain_node(id: &str, agent: &str) -> Node {
    Node::new(id, agent).guard_pre(false).guard_post(false)
}

/// `n` independent unguarded roots named `node_0..node_{n-1}` all using `agent`.
pub fn wide_nodes(n: usize, agent: &str) -> Vec<Node> {
    (0..n).map(|i| plain_node(&format!("node_{i}"), agent)).collect()
}

/// Unguarded chain `node_0 -> node_1 -> ... -> node_{n-1}`.
pub fn chain_nodes(n: usize, agent: &str) -> Vec<Node> {
    (0..n)
        .map(|i| {
            let node = plain_node(&format!("node_{i}"), agent);
            if i == 0 {
                node
            } else {
                node.after(format!("node_{}", i - 1))
            }
        })
        .collect()
}

/// Fluent registry/scheduler setup for tests.
///
/// Agents are moved in; grab any instrumentation handles (`calls()`,
/// `inputs()`, ...) before handing them over.
pub struct SchedulerBuilder {
    registry: Registry,
    guard: Arc<dyn Guard>,
    max_concurrency: usize,
}

impl Default for SchedulerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SchedulerBuilder {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            guard: Arc::new(AllowAll),
            max_concurrency: 2,
        }
    }

    pub fn agent(mut self, name: &str, agent: impl Agent + 'static) -> Self {
        self.registry.register(name, Arc::new(agent));
        self
    }

    pub fn guard(mut self, guard: impl Guard + 'static) -> Self {
        self.guard = Arc::new(guard);
        self
    }

    pub fn max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = n;
        self
    }

    pub fn build(self) -> Scheduler {
        Scheduler::new(self.registry, self.guard, self.max_concurrency)
    }
}
