// src/exec/node_runner.rs

//! Per-node retry loop around [`run_attempt`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::dag::ReadyNode;
use crate::errors::NodeError;
use crate::exec::ExecContext;
use crate::exec::attempt::run_attempt;
use crate::guard::ModerationRecord;
use crate::types::Payload;

/// Settled outcome of a node, reported back to the coordinator.
#[derive(Debug, Clone)]
pub struct NodeRun {
    pub outcome: Result<Payload, NodeError>,
    /// Attempts that acquired a permit and started.
    pub attempts: u32,
    pub elapsed: Duration,
    /// Guard verdicts of the last attempt.
    pub moderation: Vec<ModerationRecord>,
}

/// Run a ready node to a settled outcome.
///
/// Every attempt (retries included) first acquires a permit from the shared
/// limiter and holds it until the attempt ends, so the cap applies to
/// attempts across the whole DAG. Each attempt reuses the input captured when
/// the node became ready and is bounded by the node's timeout, measured from
/// guard-pre through guard-post.
///
/// Retryable failures consume the node's retry budget; blocks and unknown
/// agents settle it immediately. If the run is cancelled while waiting for a
/// permit or between attempts, the outcome is [`NodeError::Cancelled`].
pub async fn run_node(ctx: ExecContext, ready: ReadyNode) -> NodeRun {
    let node = Arc::clone(&ready.node);
    let budget = node.attempt_budget();
    let started = Instant::now();
    let mut attempts = 0;
    let mut moderation = Vec::new();

    loop {
        let permit = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => None,
            permit = Arc::clone(&ctx.limiter).acquire_owned() => permit.ok(),
        };
        let Some(permit) = permit else {
            debug!(node = %node.id, "cancelled while waiting for a permit");
            return settle(Err(NodeError::Cancelled), attempts, started, moderation);
        };

        attempts += 1;
        moderation.clear();
        info!(node = %node.id, agent = %node.agent, attempt = attempts, "starting attempt");

        let result = match timeout(
            node.timeout(),
            run_attempt(&ctx, &node, &ready.input, &mut moderation),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(NodeError::AgentTimeout {
                timeout_ms: node.timeout_ms,
            }),
        };
        drop(permit);

        match result {
            Ok(output) => {
                info!(node = %node.id, attempts, "node succeeded");
                return settle(Ok(output), attempts, started, moderation);
            }
            Err(err) if err.is_retryable() && attempts < budget => {
                if ctx.cancel.is_cancelled() {
                    debug!(node = %node.id, error = %err, "run cancelled; not retrying");
                    return settle(Err(NodeError::Cancelled), attempts, started, moderation);
                }
                warn!(
                    node = %node.id,
                    attempt = attempts,
                    remaining = budget - attempts,
                    error = %err,
                    "attempt failed; retrying"
                );
            }
            Err(err) => {
                if err != NodeError::Cancelled {
                    warn!(node = %node.id, attempts, kind = %err.kind(), error = %err, "node failed");
                }
                return settle(Err(err), attempts, started, moderation);
            }
        }
    }
}

fn settle(
    outcome: Result<Payload, NodeError>,
    attempts: u32,
    started: Instant,
    moderation: Vec<ModerationRecord>,
) -> NodeRun {
    NodeRun {
        outcome,
        attempts,
        elapsed: started.elapsed(),
        moderation,
    }
}
