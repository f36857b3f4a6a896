//! Guards with controllable verdicts for scheduler tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use hybrid_dag::guard::{Guard, Verdict};
use hybrid_dag::types::GuardMode;

/// Blocks any text containing `needle` in the configured mode(s) and records
/// every check it performs.
pub struct NeedleGuard {
    needle: String,
    mode: Option<GuardMode>,
    checks: Arc<Mutex<Vec<(GuardMode, String)>>>,
}

impl NeedleGuard {
    /// Block in both modes.
    pub fn new(needle: &str) -> Self {
        Self {
            needle: needle.to_string(),
            mode: None,
            checks: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Block only in `mode`.
    pub fn only(needle: &str, mode: GuardMode) -> Self {
        Self {
            mode: Some(mode),
            ..Self::new(needle)
        }
    }

    pub fn checks(&self) -> Arc<Mutex<Vec<(GuardMode, String)>>> {
        Arc::clone(&self.checks)
    }
}

#[async_trait]
impl Guard for NeedleGuard {
    async fn check(&self, text: &str, mode: GuardMode) -> anyhow::Result<Verdict> {
        self.checks.lock().unwrap().push((mode, text.to_string()));

        let applies = self.mode.is_none_or(|m| m == mode);
        let hit = applies && text.contains(&self.needle);

        let mut labels = BTreeMap::new();
        labels.insert("needle".to_string(), if hit { 1.0 } else { 0.0 });

        Ok(Verdict {
            allowed: !hit,
            text: text.to_string(),
            labels,
            actions: if hit { vec!["block".to_string()] } else { Vec::new() },
        })
    }
}

/// Fails with an infrastructure error for the first `failures` calls, then
/// allows everything.
pub struct UnreliableGuard {
    failures: usize,
    calls: Arc<AtomicUsize>,
}

impl UnreliableGuard {
    pub fn new(failures: usize) -> Self {
        Self {
            failures,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl Guard for UnreliableGuard {
    async fn check(&self, text: &str, _mode: GuardMode) -> anyhow::Result<Verdict> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n < self.failures {
            anyhow::bail!("guard backend unavailable");
        }
        Ok(Verdict::pass(text))
    }
}

/// Uppercases every text it sees; used to check that verdict text is adopted.
pub struct UppercaseGuard;

#[async_trait]
impl Guard for UppercaseGuard {
    async fn check(&self, text: &str, _mode: GuardMode) -> anyhow::Result<Verdict> {
        let mut verdict = Verdict::pass(text.to_uppercase());
        verdict.actions.push("rewrite".to_string());
        Ok(verdict)
    }
}

/// Panics on every check.
pub struct PanickingGuard;

#[async_trait]
impl Guard for PanickingGuard {
    async fn check(&self, _text: &str, mode: GuardMode) -> anyhow::Result<Verdict> {
        panic!("guard crashed during {mode} check");
    }
}
