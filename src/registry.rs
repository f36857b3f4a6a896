// src/registry.rs

//! Name-to-agent lookup.
//!
//! Agents are consumed through the [`Agent`] trait so the scheduler never
//! depends on a concrete implementation. Plain async closures can be bound
//! with [`Registry::register_fn`].

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use thiserror::Error;
use tracing::debug;

use crate::types::Payload;

/// A capability that turns keyword input into keyword output.
///
/// The returned payload must contain a string `text` field for the scheduler
/// to propagate downstream.
#[async_trait]
pub trait Agent: Send + Sync {
    async fn run(&self, input: Payload) -> anyhow::Result<Payload>;
}

type AgentFn = dyn Fn(Payload) -> BoxFuture<'static, anyhow::Result<Payload>> + Send + Sync;

/// Adapter turning an async closure into an [`Agent`].
pub struct FnAgent {
    f: Box<AgentFn>,
}

impl FnAgent {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Payload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Payload>> + Send + 'static,
    {
        Self {
            f: Box::new(move |input| Box::pin(f(input))),
        }
    }
}

#[async_trait]
impl Agent for FnAgent {
    async fn run(&self, input: Payload) -> anyhow::Result<Payload> {
        (self.f)(input).await
    }
}

/// Failure of [`Registry::run`].
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("unknown agent '{0}'")]
    UnknownAgent(String),

    #[error("agent '{agent}' failed: {source:#}")]
    Failed {
        agent: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Maps agent names to capabilities. Last registration for a name wins.
#[derive(Default, Clone)]
pub struct Registry {
    agents: HashMap<String, Arc<dyn Agent>>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("Registry").field("agents", &names).finish()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `agent`, replacing any previous binding.
    pub fn register(&mut self, name: impl Into<String>, agent: Arc<dyn Agent>) {
        let name = name.into();
        if self.agents.insert(name.clone(), agent).is_some() {
            debug!(agent = %name, "replacing existing agent binding");
        }
    }

    /// Bind `name` to an async closure.
    pub fn register_fn<F, Fut>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(Payload) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Payload>> + Send + 'static,
    {
        self.register(name, Arc::new(FnAgent::new(f)));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Agent>> {
        self.agents.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.agents.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.agents.keys().map(|s| s.as_str())
    }

    /// Invoke the agent bound to `name`.
    pub async fn run(&self, name: &str, input: Payload) -> Result<Payload, AgentError> {
        let agent = self
            .get(name)
            .ok_or_else(|| AgentError::UnknownAgent(name.to_string()))?;

        agent.run(input).await.map_err(|source| AgentError::Failed {
            agent: name.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text(s: &str) -> Payload {
        let mut p = Payload::new();
        p.insert("text".into(), json!(s));
        p
    }

    #[tokio::test]
    async fn runs_registered_closure() {
        let mut reg = Registry::new();
        reg.register_fn("upper", |input: Payload| async move {
            let t = input["text"].as_str().unwrap_or_default().to_uppercase();
            Ok(text(&t))
        });

        let out = reg.run("upper", text("abc")).await.unwrap();
        assert_eq!(out["text"], json!("ABC"));
    }

    #[tokio::test]
    async fn last_registration_wins() {
        let mut reg = Registry::new();
        reg.register_fn("a", |_| async { Ok(text("first")) });
        reg.register_fn("a", |_| async { Ok(text("second")) });

        let out = reg.run("a", Payload::new()).await.unwrap();
        assert_eq!(out["text"], json!("second"));
    }

    #[tokio::test]
    async fn unknown_agent_is_typed_error() {
        let reg = Registry::new();
        match reg.run("missing", Payload::new()).await {
            Err(AgentError::UnknownAgent(name)) => assert_eq!(name, "missing"),
            other => panic!("expected UnknownAgent, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn failure_is_annotated_with_agent_name() {
        let mut reg = Registry::new();
        reg.register_fn("flaky", |_| async { Err(anyhow::anyhow!("backend down")) });

        let err = reg.run("flaky", Payload::new()).await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("flaky"));
        assert!(msg.contains("backend down"));
    }
}
