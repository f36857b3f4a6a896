// src/agents/claimcheck.rs

use std::collections::HashSet;
use std::sync::LazyLock;

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;

use super::{required_str, text_output};
use crate::registry::Agent;
use crate::types::{Payload, TEXT_KEY};

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9]+").expect("token pattern compiles"));

/// Marks `claim` as supported when every one of its tokens occurs in `text`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClaimCheck;

#[async_trait]
impl Agent for ClaimCheck {
    async fn run(&self, input: Payload) -> Result<Payload> {
        let text = required_str(&input, TEXT_KEY)?;
        let claim = required_str(&input, "claim")?;

        let verdict = if is_supported(text, claim) {
            "supported"
        } else {
            "uncertain"
        };
        Ok(text_output(format!("Claim: {claim} → {verdict}")))
    }
}

fn tokens(s: &str) -> impl Iterator<Item = String> + '_ {
    TOKEN.find_iter(s).map(|m| m.as_str().to_lowercase())
}

pub fn is_supported(text: &str, claim: &str) -> bool {
    let known: HashSet<String> = tokens(text).collect();
    tokens(claim).all(|t| known.contains(&t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn support_requires_every_token() {
        assert!(is_supported("BitNet enables efficient weights", "bitnet WEIGHTS"));
        assert!(!is_supported("BitNet enables efficient weights", "BitNet uses 1.58-bit weights"));
    }

    #[tokio::test]
    async fn formats_verdict_line() {
        let input = json!({ "text": "TinyBERT helps safety.", "claim": "TinyBERT helps" })
            .as_object()
            .cloned()
            .unwrap();
        let out = ClaimCheck.run(input).await.unwrap();
        assert_eq!(out["text"], json!("Claim: TinyBERT helps → supported"));
    }

    #[tokio::test]
    async fn missing_claim_is_an_error() {
        let input = json!({ "text": "x" }).as_object().cloned().unwrap();
        assert!(ClaimCheck.run(input).await.is_err());
    }
}
