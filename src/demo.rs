// src/demo.rs

//! The built-in demo DAG: `parse → [claim1, claim2] → reduce`.

use serde_json::json;

use crate::agents::{CLAIMCHECK, SUMMARIZER, SYNTHESIS};
use crate::dag::Node;

pub const DEFAULT_INPUT: &str = "Contact me at test@example.com. BitNet b1.58 enables efficient ~1.58-bit weights. TinyBERT helps safety.";
pub const DEFAULT_CLAIM_1: &str = "BitNet uses 1.58-bit weights";
pub const DEFAULT_CLAIM_2: &str = "TinyBERT is effective for classification";
pub const DEFAULT_MAX_SENTENCES: u64 = 3;
pub const DEFAULT_MAX_CONCURRENCY: usize = 2;

/// The four-node demo pipeline with the given claims.
pub fn demo_nodes(claim1: &str, claim2: &str, max_sentences: u64) -> Vec<Node> {
    vec![
        Node::new("parse", SUMMARIZER)
            .timeout_ms(900)
            .param("max_sentences", json!(max_sentences)),
        Node::new("claim1", CLAIMCHECK)
            .after("parse")
            .guard_pre(false)
            .timeout_ms(600)
            .max_retries(1)
            .param("claim", json!(claim1)),
        Node::new("claim2", CLAIMCHECK)
            .after("parse")
            .guard_pre(false)
            .timeout_ms(600)
            .max_retries(1)
            .param("claim", json!(claim2)),
        Node::new("reduce", SYNTHESIS)
            .after("claim1")
            .after("claim2")
            .guard_pre(false)
            .timeout_ms(800),
    ]
}

/// [`demo_nodes`] with the default claims.
pub fn default_demo_nodes() -> Vec<Node> {
    demo_nodes(DEFAULT_CLAIM_1, DEFAULT_CLAIM_2, DEFAULT_MAX_SENTENCES)
}
