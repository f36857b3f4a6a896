// src/exec/attempt.rs

//! A single attempt of a node: guard-pre, agent call, guard-post.

use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, info};

use crate::dag::Node;
use crate::errors::NodeError;
use crate::exec::ExecContext;
use crate::guard::{ModerationRecord, Verdict};
use crate::registry::AgentError;
use crate::types::{GuardMode, Payload, TEXT_KEY, payload_text};

/// Run one attempt of `node` on `input`.
///
/// Guard verdicts are appended to `moderation` as they happen, so a caller
/// that times the attempt out still sees the checks that completed.
///
/// Cancellation is checked before each guard call and before the agent
/// call; a running agent call is never interrupted from here.
pub async fn run_attempt(
    ctx: &ExecContext,
    node: &Node,
    input: &Payload,
    moderation: &mut Vec<ModerationRecord>,
) -> Result<Payload, NodeError> {
    let mut payload = input.clone();

    if node.guard_pre {
        let verdict = check(ctx, payload_text(&payload), GuardMode::Input).await?;
        moderation.push(ModerationRecord::from_verdict(GuardMode::Input, &verdict));

        if !verdict.allowed {
            info!(node = %node.id, actions = ?verdict.actions, "input blocked by guard");
            return Err(NodeError::BlockedInput {
                actions: verdict.actions,
            });
        }
        payload.insert(TEXT_KEY.to_string(), Value::String(verdict.text));
    }

    // Node params take precedence over upstream keys.
    for (key, value) in &node.params {
        payload.insert(key.clone(), value.clone());
    }

    ensure_not_cancelled(ctx)?;
    debug!(node = %node.id, agent = %node.agent, "invoking agent");

    let mut output = match AssertUnwindSafe(ctx.registry.run(&node.agent, payload))
        .catch_unwind()
        .await
    {
        Ok(Ok(output)) => output,
        Ok(Err(AgentError::UnknownAgent(name))) => return Err(NodeError::UnknownAgent(name)),
        Ok(Err(AgentError::Failed { agent, source })) => {
            return Err(NodeError::AgentFailure {
                agent,
                message: format!("{source:#}"),
            });
        }
        Err(_) => {
            return Err(NodeError::AgentFailure {
                agent: node.agent.clone(),
                message: "agent panicked".to_string(),
            });
        }
    };

    if !output.get(TEXT_KEY).is_some_and(Value::is_string) {
        return Err(NodeError::AgentFailure {
            agent: node.agent.clone(),
            message: "output has no string `text` field".to_string(),
        });
    }

    if node.guard_post {
        let verdict = check(ctx, payload_text(&output), GuardMode::Output).await?;
        moderation.push(ModerationRecord::from_verdict(GuardMode::Output, &verdict));

        if !verdict.allowed {
            info!(node = %node.id, actions = ?verdict.actions, "output blocked by guard");
            return Err(NodeError::BlockedOutput {
                actions: verdict.actions,
            });
        }
        output.insert(TEXT_KEY.to_string(), Value::String(verdict.text));
    }

    Ok(output)
}

async fn check(ctx: &ExecContext, text: &str, mode: GuardMode) -> Result<Verdict, NodeError> {
    ensure_not_cancelled(ctx)?;
    match AssertUnwindSafe(ctx.guard.check(text, mode))
        .catch_unwind()
        .await
    {
        Ok(Ok(verdict)) => Ok(verdict),
        Ok(Err(e)) => Err(NodeError::GuardFailure(format!("{e:#}"))),
        Err(_) => Err(NodeError::GuardFailure(format!("guard panicked ({mode})"))),
    }
}

fn ensure_not_cancelled(ctx: &ExecContext) -> Result<(), NodeError> {
    if ctx.cancel.is_cancelled() {
        Err(NodeError::Cancelled)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::guard::{AllowAll, PiiGuard};
    use crate::registry::Registry;
    use serde_json::json;

    fn ctx_with(registry: Registry, guard: Arc<dyn crate::guard::Guard>) -> ExecContext {
        ExecContext::new(Arc::new(registry), guard, 1)
    }

    fn input(text: &str) -> Payload {
        json!({ "text": text }).as_object().cloned().unwrap()
    }

    fn echo_registry(calls: Arc<AtomicUsize>) -> Registry {
        let mut reg = Registry::new();
        reg.register_fn("echo", move |p: Payload| {
            let calls = Arc::clone(&calls);
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(p)
            }
        });
        reg
    }

    #[tokio::test]
    async fn pre_guard_text_reaches_agent_and_params_override() {
        let calls = Arc::new(AtomicUsize::new(0));
        let ctx = ctx_with(echo_registry(calls.clone()), Arc::new(PiiGuard::default()));
        let node = Node::new("n", "echo").param("mode", json!("fast"));

        let mut input = input("write to a@b.com");
        input.insert("mode".into(), json!("slow"));

        let mut moderation = Vec::new();
        let out = run_attempt(&ctx, &node, &input, &mut moderation).await.unwrap();

        assert_eq!(out["text"], json!("write to [REDACTED_EMAIL]"));
        assert_eq!(out["mode"], json!("fast"));
        assert_eq!(moderation.len(), 2);
        assert_eq!(moderation[0].phase, GuardMode::Input);
        assert_eq!(moderation[1].phase, GuardMode::Output);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn blocked_input_never_reaches_agent() {
        let calls = Arc::new(AtomicUsize::new(0));
        let ctx = ctx_with(echo_registry(calls.clone()), Arc::new(PiiGuard::blocking()));
        let node = Node::new("n", "echo");

        let mut moderation = Vec::new();
        let err = run_attempt(&ctx, &node, &input("a@b.com"), &mut moderation)
            .await
            .unwrap_err();

        assert!(matches!(err, NodeError::BlockedInput { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!moderation[0].allowed);
    }

    #[tokio::test]
    async fn missing_text_in_output_is_agent_failure() {
        let mut reg = Registry::new();
        reg.register_fn("bad", |_| async { Ok(Payload::new()) });
        let ctx = ctx_with(reg, Arc::new(AllowAll));

        let err = run_attempt(&ctx, &Node::new("n", "bad"), &input("x"), &mut Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, NodeError::AgentFailure { .. }));
    }

    #[tokio::test]
    async fn unknown_agent_maps_to_node_error() {
        let ctx = ctx_with(Registry::new(), Arc::new(AllowAll));
        let err = run_attempt(&ctx, &Node::new("n", "nope"), &input("x"), &mut Vec::new())
            .await
            .unwrap_err();
        assert_eq!(err, NodeError::UnknownAgent("nope".into()));
    }

    #[tokio::test]
    async fn cancelled_context_stops_before_agent() {
        let calls = Arc::new(AtomicUsize::new(0));
        let ctx = ctx_with(echo_registry(calls.clone()), Arc::new(AllowAll));
        ctx.cancel.cancel();

        let node = Node::new("n", "echo").guard_pre(false);
        let err = run_attempt(&ctx, &node, &input("x"), &mut Vec::new())
            .await
            .unwrap_err();
        assert_eq!(err, NodeError::Cancelled);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    struct PanickingGuard;

    #[async_trait::async_trait]
    impl crate::guard::Guard for PanickingGuard {
        async fn check(&self, _text: &str, _mode: GuardMode) -> anyhow::Result<Verdict> {
            panic!("moderation backend exploded");
        }
    }

    #[tokio::test]
    async fn guard_panic_is_a_guard_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let ctx = ctx_with(echo_registry(calls.clone()), Arc::new(PanickingGuard));

        let err = run_attempt(&ctx, &Node::new("n", "echo"), &input("x"), &mut Vec::new())
            .await
            .unwrap_err();

        assert_eq!(err, NodeError::GuardFailure("guard panicked (input)".into()));
        assert!(err.is_retryable());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
