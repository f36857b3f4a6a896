//! Deterministic agents with instrumentation for scheduler tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use hybrid_dag::registry::Agent;
use hybrid_dag::types::{payload_text, Payload};

use crate::builders::text_payload;

/// Returns `"<label>(<input text>)"` and records every input it receives.
pub struct RecordingAgent {
    label: String,
    inputs: Arc<Mutex<Vec<Payload>>>,
}

impl RecordingAgent {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            inputs: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Shared handle to the recorded inputs.
    pub fn inputs(&self) -> Arc<Mutex<Vec<Payload>>> {
        Arc::clone(&self.inputs)
    }
}

#[async_trait]
impl Agent for RecordingAgent {
    async fn run(&self, input: Payload) -> anyhow::Result<Payload> {
        let text = format!("{}({})", self.label, payload_text(&input));
        self.inputs.lock().unwrap().push(input);
        Ok(text_payload(&text))
    }
}

/// Counts invocations and fails the first `failures` of them.
pub struct FlakyAgent {
    failures: usize,
    calls: Arc<AtomicUsize>,
}

impl FlakyAgent {
    pub fn new(failures: usize) -> Self {
        Self {
            failures,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Never succeeds.
    pub fn always_failing() -> Self {
        Self::new(usize::MAX)
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl Agent for FlakyAgent {
    async fn run(&self, input: Payload) -> anyhow::Result<Payload> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.failures {
            anyhow::bail!("transient failure #{}", n + 1);
        }
        Ok(text_payload(&format!("ok({})", payload_text(&input))))
    }
}

/// Sleeps for `delay` while tracking how many calls are in flight at once.
pub struct ConcurrencyProbe {
    delay: Duration,
    current: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    calls: Arc<AtomicUsize>,
}

impl ConcurrencyProbe {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            current: Arc::new(AtomicUsize::new(0)),
            peak: Arc::new(AtomicUsize::new(0)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn peak(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.peak)
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl Agent for ConcurrencyProbe {
    async fn run(&self, input: Payload) -> anyhow::Result<Payload> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.delay).await;

        self.current.fetch_sub(1, Ordering::SeqCst);
        Ok(text_payload(payload_text(&input)))
    }
}

/// Sleeps for `delay` and returns `text`, plus any extra keys given.
pub struct DelayedAgent {
    delay: Duration,
    output: Payload,
    calls: Arc<AtomicUsize>,
}

impl DelayedAgent {
    pub fn new(delay: Duration, text: &str) -> Self {
        Self {
            delay,
            output: text_payload(text),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_key(mut self, key: &str, value: Value) -> Self {
        self.output.insert(key.to_string(), value);
        self
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl Agent for DelayedAgent {
    async fn run(&self, _input: Payload) -> anyhow::Result<Payload> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(self.output.clone())
    }
}
