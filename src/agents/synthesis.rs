// src/agents/synthesis.rs

use anyhow::Result;
use async_trait::async_trait;

use super::text_output;
use crate::registry::Agent;
use crate::types::{PIECES_KEY, Payload};

/// Builds an executive brief from the first line of each upstream piece.
#[derive(Debug, Clone, Copy, Default)]
pub struct Synthesis;

#[async_trait]
impl Agent for Synthesis {
    async fn run(&self, input: Payload) -> Result<Payload> {
        let bullets: Vec<&str> = input
            .get(PIECES_KEY)
            .and_then(|v| v.as_array())
            .map(|pieces| {
                pieces
                    .iter()
                    .filter_map(|p| p.as_str())
                    .filter(|p| !p.trim().is_empty())
                    .map(|p| p.lines().next().unwrap_or_default())
                    .collect()
            })
            .unwrap_or_default();

        Ok(text_output(format!(
            "Executive Brief:\n- {}",
            bullets.join("\n- ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn takes_first_line_of_non_blank_pieces() {
        let input = json!({
            "text": "ignored",
            "pieces": ["Claim: a → supported\ndetail", "  ", "Claim: b → uncertain"]
        })
        .as_object()
        .cloned()
        .unwrap();

        let out = Synthesis.run(input).await.unwrap();
        assert_eq!(
            out["text"],
            json!("Executive Brief:\n- Claim: a → supported\n- Claim: b → uncertain")
        );
    }

    #[tokio::test]
    async fn no_pieces_yields_empty_brief() {
        let out = Synthesis.run(Payload::new()).await.unwrap();
        assert_eq!(out["text"], json!("Executive Brief:\n- "));
    }
}
