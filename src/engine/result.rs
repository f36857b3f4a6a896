// src/engine/result.rs

//! Per-node and per-run results.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::errors::{ErrorKind, NodeError};
use crate::exec::NodeRun;
use crate::guard::ModerationRecord;
use crate::types::{NodeId, Payload, payload_text};

/// Terminal outcome of a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeOutcome {
    Succeeded(Payload),
    Failed(NodeError),
}

/// Terminal state of one node. Immutable once recorded.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub node_id: NodeId,
    pub outcome: NodeOutcome,
    pub attempts: u32,
    /// From the first permit request to the settled outcome.
    pub elapsed: Duration,
    pub moderation: Vec<ModerationRecord>,
}

impl ExecutionResult {
    pub(crate) fn from_run(node_id: NodeId, run: NodeRun) -> Self {
        let outcome = match run.outcome {
            Ok(payload) => NodeOutcome::Succeeded(payload),
            Err(err) => NodeOutcome::Failed(err),
        };
        Self {
            node_id,
            outcome,
            attempts: run.attempts,
            elapsed: run.elapsed,
            moderation: run.moderation,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, NodeOutcome::Succeeded(_))
    }

    pub fn payload(&self) -> Option<&Payload> {
        match &self.outcome {
            NodeOutcome::Succeeded(p) => Some(p),
            NodeOutcome::Failed(_) => None,
        }
    }

    /// Output text of a successful node.
    pub fn text(&self) -> Option<&str> {
        self.payload().map(payload_text)
    }

    pub fn error(&self) -> Option<&NodeError> {
        match &self.outcome {
            NodeOutcome::Succeeded(_) => None,
            NodeOutcome::Failed(e) => Some(e),
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error().map(NodeError::kind)
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Every node that reached `Succeeded` or `Failed`.
    pub results: BTreeMap<NodeId, ExecutionResult>,
    /// The node whose failure aborted the run.
    pub aborted_by: Option<NodeId>,
    /// In-flight nodes that stopped on the abort signal without settling.
    pub cancelled: Vec<NodeId>,
    /// Nodes never launched because the run aborted first.
    pub not_started: Vec<NodeId>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.aborted_by.is_none()
    }

    pub fn get(&self, id: &str) -> Option<&ExecutionResult> {
        self.results.get(id)
    }

    pub fn text_of(&self, id: &str) -> Option<&str> {
        self.get(id).and_then(ExecutionResult::text)
    }

    /// The result that triggered the abort, if any.
    pub fn failure(&self) -> Option<&ExecutionResult> {
        self.aborted_by.as_deref().and_then(|id| self.get(id))
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
