// src/errors.rs

//! Crate-wide error types.
//!
//! - [`OrchestratorError`] covers everything that stops a run before (or
//!   instead of) executing it: bad config files, invalid DAGs, IO.
//! - [`NodeError`] is the per-node failure recorded in a node's
//!   [`ExecutionResult`](crate::engine::ExecutionResult).

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::types::NodeId;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Duplicate node id: {0}")]
    DuplicateNodeId(NodeId),

    #[error("Node '{node}' has unknown dependency '{dep}'")]
    UnknownDependency { node: NodeId, dep: NodeId },

    #[error("Cycle detected in DAG: {0}")]
    DependencyCycle(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// Classification of a node failure, as recorded in run results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    UnknownAgent,
    BlockedInput,
    BlockedOutput,
    AgentTimeout,
    AgentFailure,
    GuardFailure,
    Cancelled,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::UnknownAgent => "UnknownAgent",
            ErrorKind::BlockedInput => "BlockedInput",
            ErrorKind::BlockedOutput => "BlockedOutput",
            ErrorKind::AgentTimeout => "AgentTimeout",
            ErrorKind::AgentFailure => "AgentFailure",
            ErrorKind::GuardFailure => "GuardFailure",
            ErrorKind::Cancelled => "Cancelled",
        };
        f.write_str(s)
    }
}

/// Failure of a single node attempt.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NodeError {
    #[error("no agent registered under '{0}'")]
    UnknownAgent(String),

    #[error("input blocked by guard (actions: {actions:?})")]
    BlockedInput { actions: Vec<String> },

    #[error("output blocked by guard (actions: {actions:?})")]
    BlockedOutput { actions: Vec<String> },

    #[error("attempt exceeded {timeout_ms}ms")]
    AgentTimeout { timeout_ms: u64 },

    #[error("agent '{agent}' failed: {message}")]
    AgentFailure { agent: String, message: String },

    #[error("guard error: {0}")]
    GuardFailure(String),

    #[error("cancelled before completion")]
    Cancelled,
}

impl NodeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NodeError::UnknownAgent(_) => ErrorKind::UnknownAgent,
            NodeError::BlockedInput { .. } => ErrorKind::BlockedInput,
            NodeError::BlockedOutput { .. } => ErrorKind::BlockedOutput,
            NodeError::AgentTimeout { .. } => ErrorKind::AgentTimeout,
            NodeError::AgentFailure { .. } => ErrorKind::AgentFailure,
            NodeError::GuardFailure(_) => ErrorKind::GuardFailure,
            NodeError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Transient faults consume a retry; policy decisions and missing
    /// bindings settle the node immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            NodeError::AgentTimeout { .. }
                | NodeError::AgentFailure { .. }
                | NodeError::GuardFailure(_)
        )
    }
}
