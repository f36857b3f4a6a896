// src/engine/scheduler.rs

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::dag::{Node, ReadinessTracker, ReadyNode};
use crate::engine::result::{ExecutionResult, RunReport};
use crate::engine::RunEvent;
use crate::errors::{NodeError, OrchestratorError, Result};
use crate::exec::{ExecContext, NodeRun, run_node};
use crate::guard::Guard;
use crate::registry::Registry;
use crate::types::Payload;

/// Executes a DAG of nodes against a registry and a guard.
///
/// The scheduler itself holds no per-run state; every call to
/// [`run_dag`](Self::run_dag) gets a fresh limiter, cancellation token and
/// readiness tracker, so one instance can drive many runs.
pub struct Scheduler {
    registry: Arc<Registry>,
    guard: Arc<dyn Guard>,
    max_concurrency: usize,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("registry", &self.registry)
            .field("max_concurrency", &self.max_concurrency)
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    pub fn new(registry: Registry, guard: Arc<dyn Guard>, max_concurrency: usize) -> Self {
        Self {
            registry: Arc::new(registry),
            guard,
            max_concurrency,
        }
    }

    /// Run `nodes` to completion (or abort) starting from `initial`.
    ///
    /// - Validation errors (duplicate ids, unknown dependencies, cycles, a
    ///   zero concurrency cap) are returned before any node is launched.
    /// - Otherwise the returned report holds every terminal state reached.
    ///   The first node to settle as failed aborts the run: nothing new is
    ///   launched, in-flight nodes are asked to stop at their next boundary
    ///   and the run returns once they have all reported back.
    pub async fn run_dag(&self, nodes: Vec<Node>, initial: Payload) -> Result<RunReport> {
        if self.max_concurrency == 0 {
            return Err(OrchestratorError::ConfigError(
                "max_concurrency must be >= 1 (got 0)".to_string(),
            ));
        }

        let mut tracker = ReadinessTracker::new(nodes, &initial)?;
        let ctx = ExecContext::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.guard),
            self.max_concurrency,
        );
        let (event_tx, mut event_rx) = mpsc::channel::<RunEvent>(tracker.graph().len().max(1));

        let mut report = RunReport::default();

        let step = tracker.start();
        launch(&mut tracker, step.newly_ready, &ctx, &event_tx);
        let mut finished = step.run_finished;

        // Single coordinating loop: the only place the tracker and the
        // report are mutated.
        while !finished {
            let Some(event) = event_rx.recv().await else {
                warn!("run event channel closed before the run finished");
                break;
            };

            let RunEvent::NodeFinished { node, run } = event;

            let step = match &run.outcome {
                Ok(output) => tracker.complete_success(&node, output),
                Err(NodeError::Cancelled) => {
                    report.cancelled.push(node.clone());
                    tracker.complete_cancelled(&node)
                }
                Err(err) => {
                    if report.aborted_by.is_none() {
                        warn!(
                            node = %node,
                            kind = %err.kind(),
                            error = %err,
                            "node failed; cancelling in-flight attempts"
                        );
                        report.aborted_by = Some(node.clone());
                        ctx.cancel.cancel();
                    }
                    tracker.complete_failure(&node)
                }
            };

            if !matches!(run.outcome, Err(NodeError::Cancelled)) {
                report
                    .results
                    .insert(node.clone(), ExecutionResult::from_run(node, run));
            }

            launch(&mut tracker, step.newly_ready, &ctx, &event_tx);
            finished = step.run_finished;
        }

        report.not_started = tracker.never_started();

        if report.is_success() {
            info!(nodes = report.len(), "DAG run completed");
        } else {
            info!(
                aborted_by = ?report.aborted_by,
                completed = report.len(),
                cancelled = report.cancelled.len(),
                not_started = report.not_started.len(),
                "DAG run aborted"
            );
        }

        Ok(report)
    }
}

/// Spawn a task per ready node. Each task reports exactly one
/// [`RunEvent::NodeFinished`].
fn launch(
    tracker: &mut ReadinessTracker,
    ready: Vec<ReadyNode>,
    ctx: &ExecContext,
    event_tx: &mpsc::Sender<RunEvent>,
) {
    if ready.is_empty() {
        return;
    }

    let ids: Vec<_> = ready.iter().map(|r| r.id()).collect();
    debug!(?ids, "launching ready nodes");

    for node in ready {
        tracker.mark_running(node.id());

        let ctx = ctx.clone();
        let tx = event_tx.clone();
        tokio::spawn(async move {
            let id = node.id().to_string();
            let agent = node.node.agent.clone();
            // A panic here would leave the coordinator waiting forever.
            let run = match AssertUnwindSafe(run_node(ctx, node)).catch_unwind().await {
                Ok(run) => run,
                Err(_) => {
                    error!(node = %id, "node task panicked");
                    NodeRun {
                        outcome: Err(NodeError::AgentFailure {
                            agent,
                            message: "node task panicked".to_string(),
                        }),
                        attempts: 0,
                        elapsed: Duration::ZERO,
                        moderation: Vec::new(),
                    }
                }
            };
            if tx.send(RunEvent::NodeFinished { node: id.clone(), run }).await.is_err() {
                debug!(node = %id, "coordinator gone; dropping node result");
            }
        });
    }
}
