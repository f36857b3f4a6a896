// src/agents/summarizer.rs

use std::sync::LazyLock;

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;

use super::{required_str, text_output};
use crate::registry::Agent;
use crate::types::{Payload, TEXT_KEY};

const DEFAULT_MAX_SENTENCES: i64 = 3;

/// Sentence terminator followed by whitespace, or a run of newlines.
static BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+|\n+").expect("sentence boundary pattern compiles"));

/// Keeps the first `max_sentences` sentences of `text`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Summarizer;

#[async_trait]
impl Agent for Summarizer {
    async fn run(&self, input: Payload) -> Result<Payload> {
        let text = required_str(&input, TEXT_KEY)?;
        let max = max_sentences(&input).max(1);

        let keep: Vec<&str> = split_sentences(text)
            .into_iter()
            .take(usize::try_from(max).unwrap_or(usize::MAX))
            .collect();
        Ok(text_output(keep.join(" ")))
    }
}

/// Integral `max_sentences`, truncating floats. Negative values are kept so
/// the caller's lower bound applies to them.
fn max_sentences(input: &Payload) -> i64 {
    match input.get("max_sentences") {
        Some(v) => v
            .as_i64()
            .or_else(|| v.as_f64().map(|f| f as i64))
            .unwrap_or(DEFAULT_MAX_SENTENCES),
        None => DEFAULT_MAX_SENTENCES,
    }
}

/// Split on sentence boundaries, keeping the terminator with its sentence.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut last = 0;

    for m in BOUNDARY.find_iter(text) {
        let end = if m.as_str().starts_with('\n') {
            m.start()
        } else {
            m.start() + 1
        };
        push_trimmed(&mut out, &text[last..end]);
        last = m.end();
    }
    push_trimmed(&mut out, &text[last..]);
    out
}

fn push_trimmed<'a>(out: &mut Vec<&'a str>, s: &'a str) {
    let s = s.trim();
    if !s.is_empty() {
        out.push(s);
    }
}
