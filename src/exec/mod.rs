// src/exec/mod.rs

//! Node execution layer.
//!
//! Everything that happens between "this node is ready" and "this node
//! settled" lives here:
//!
//! - [`attempt`] runs one attempt: guard-pre, agent call, guard-post.
//! - [`node_runner`] wraps attempts with the concurrency limiter, the
//!   per-attempt timeout, the retry budget and cancellation checks.
//!
//! Both only read shared state through [`ExecContext`]; readiness updates
//! are left to the coordinating task in [`crate::engine`].

pub mod attempt;
pub mod node_runner;

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::guard::Guard;
use crate::registry::Registry;

pub use node_runner::{NodeRun, run_node};

/// Shared, read-mostly state handed to every node task of one run.
#[derive(Clone)]
pub struct ExecContext {
    pub registry: Arc<Registry>,
    pub guard: Arc<dyn Guard>,
    /// One permit per in-flight attempt, across the whole DAG.
    pub limiter: Arc<Semaphore>,
    /// Advisory abort signal, checked at attempt boundaries.
    pub cancel: CancellationToken,
}

impl ExecContext {
    pub fn new(
        registry: Arc<Registry>,
        guard: Arc<dyn Guard>,
        max_concurrency: usize,
    ) -> Self {
        // Any cap above the semaphore's ceiling is effectively unbounded.
        let permits = max_concurrency.min(Semaphore::MAX_PERMITS);
        Self {
            registry,
            guard,
            limiter: Arc::new(Semaphore::new(permits)),
            cancel: CancellationToken::new(),
        }
    }
}
