// src/guard/pii.rs

//! Regex-based PII guard (emails and phone numbers).

use std::collections::BTreeMap;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use tracing::debug;

use super::{Guard, Verdict};
use crate::types::GuardMode;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("email pattern compiles")
});

static PHONE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+?\d{1,3}[\s\-.]?)?(?:\(?\d{3}\)?[\s\-.]?)\d{3}[\s\-.]?\d{4}\b")
        .expect("phone pattern compiles")
});

pub const REDACTED_EMAIL: &str = "[REDACTED_EMAIL]";
pub const REDACTED_PHONE: &str = "[REDACTED_PHONE]";

/// What to do when PII is found.
///
/// - `Redact` (default): replace matches and allow the text through.
/// - `Block`: replace matches but report `allowed = false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PiiPolicy {
    #[default]
    Redact,
    Block,
}

impl PiiPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PiiPolicy::Redact => "redact",
            PiiPolicy::Block => "block",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PiiGuard {
    policy: PiiPolicy,
}

impl PiiGuard {
    pub fn new(policy: PiiPolicy) -> Self {
        Self { policy }
    }

    pub fn blocking() -> Self {
        Self::new(PiiPolicy::Block)
    }

    pub fn policy(&self) -> PiiPolicy {
        self.policy
    }

    /// Synchronous core of [`Guard::check`].
    pub fn inspect(&self, text: &str, mode: GuardMode) -> Verdict {
        let mut redactions = Vec::new();

        let no_email = EMAIL.replace_all(text, REDACTED_EMAIL);
        if no_email != text {
            redactions.push("PII.email");
        }
        let redacted = PHONE.replace_all(&no_email, REDACTED_PHONE);
        if redacted != no_email {
            redactions.push("PII.phone");
        }

        let found = !redactions.is_empty();
        if found {
            debug!(%mode, ?redactions, "pii guard redacted text");
        }

        let mut labels = BTreeMap::new();
        labels.insert("pii".to_string(), if found { 1.0 } else { 0.0 });

        let mut actions = Vec::new();
        if found {
            actions.push("redact".to_string());
            if self.policy == PiiPolicy::Block {
                actions.push("block".to_string());
            }
        }

        Verdict {
            allowed: !(found && self.policy == PiiPolicy::Block),
            text: redacted.into_owned(),
            labels,
            actions,
        }
    }
}

#[async_trait]
impl Guard for PiiGuard {
    async fn check(&self, text: &str, mode: GuardMode) -> anyhow::Result<Verdict> {
        Ok(self.inspect(text, mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_email_and_phone() {
        let g = PiiGuard::default();
        let v = g.inspect(
            "Contact me at test@example.com or 555-123-4567.",
            GuardMode::Input,
        );

        assert!(v.allowed);
        assert!(!v.text.contains("test@example.com"));
        assert!(v.text.contains(REDACTED_EMAIL));
        assert!(v.text.contains(REDACTED_PHONE));
        assert_eq!(v.labels["pii"], 1.0);
        assert_eq!(v.actions, vec!["redact".to_string()]);
    }

    #[test]
    fn clean_text_passes_unchanged() {
        let v = PiiGuard::default().inspect("BitNet enables efficient weights.", GuardMode::Output);
        assert!(v.allowed);
        assert_eq!(v.text, "BitNet enables efficient weights.");
        assert_eq!(v.labels["pii"], 0.0);
        assert!(v.actions.is_empty());
    }

    #[test]
    fn blocking_policy_disallows_pii() {
        let g = PiiGuard::blocking();
        let v = g.inspect("mail a@b.io", GuardMode::Input);
        assert!(!v.allowed);
        assert_eq!(v.actions, vec!["redact".to_string(), "block".to_string()]);

        let clean = g.inspect("nothing here", GuardMode::Input);
        assert!(clean.allowed);
    }
}
