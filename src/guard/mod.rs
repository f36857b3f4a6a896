// src/guard/mod.rs

//! Content-safety interposition.
//!
//! The scheduler only knows the [`Guard`] trait: it calls `check` before the
//! agent (input) and/or after it (output), blocks on `allowed == false` and
//! adopts `Verdict::text` otherwise. What a guard looks for is up to the
//! implementation; [`PiiGuard`] is the regex-based one shipped here.

pub mod pii;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;

use crate::types::GuardMode;

pub use pii::{PiiGuard, PiiPolicy};

/// Result of a guard check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub allowed: bool,
    /// Possibly-modified text (e.g. redacted).
    pub text: String,
    /// Classification scores in `[0, 1]`.
    pub labels: BTreeMap<String, f64>,
    /// Actions the guard took, e.g. `"redact"`.
    pub actions: Vec<String>,
}

impl Verdict {
    /// Allow `text` unchanged, with no labels.
    pub fn pass(text: impl Into<String>) -> Self {
        Self {
            allowed: true,
            text: text.into(),
            labels: BTreeMap::new(),
            actions: Vec::new(),
        }
    }
}

/// What the guard decided at one interposition point of a node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModerationRecord {
    pub phase: GuardMode,
    pub allowed: bool,
    pub actions: Vec<String>,
    pub labels: BTreeMap<String, f64>,
}

impl ModerationRecord {
    pub fn from_verdict(phase: GuardMode, verdict: &Verdict) -> Self {
        Self {
            phase,
            allowed: verdict.allowed,
            actions: verdict.actions.clone(),
            labels: verdict.labels.clone(),
        }
    }
}

/// Content-safety capability.
///
/// An `Err` means the guard itself could not reach a verdict (infrastructure
/// fault) and is retried; a `Verdict` with `allowed == false` is final.
#[async_trait]
pub trait Guard: Send + Sync {
    async fn check(&self, text: &str, mode: GuardMode) -> anyhow::Result<Verdict>;
}

/// Guard that allows everything unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait]
impl Guard for AllowAll {
    async fn check(&self, text: &str, _mode: GuardMode) -> anyhow::Result<Verdict> {
        Ok(Verdict::pass(text))
    }
}
