// src/agents/mod.rs

//! Demo agents for the parse → claims → reduce pipeline.
//!
//! These are ordinary [`Agent`](crate::registry::Agent) implementations;
//! the scheduler does not know about them.

pub mod claimcheck;
pub mod summarizer;
pub mod synthesis;

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::registry::Registry;
use crate::types::{Payload, TEXT_KEY};

pub use claimcheck::ClaimCheck;
pub use summarizer::Summarizer;
pub use synthesis::Synthesis;

pub const SUMMARIZER: &str = "bitnet.summarizer";
pub const CLAIMCHECK: &str = "bitnet.claimcheck";
pub const SYNTHESIS: &str = "bitnet.synthesis";

/// Bind the three demo agents under their conventional names.
pub fn register_demo_agents(registry: &mut Registry) {
    registry.register(SUMMARIZER, Arc::new(Summarizer));
    registry.register(CLAIMCHECK, Arc::new(ClaimCheck));
    registry.register(SYNTHESIS, Arc::new(Synthesis));
}

/// Build an output payload holding only `text`.
pub(crate) fn text_output(text: String) -> Payload {
    let mut out = Payload::new();
    out.insert(TEXT_KEY.to_string(), text.into());
    out
}

pub(crate) fn required_str<'a>(input: &'a Payload, key: &str) -> Result<&'a str> {
    input
        .get(key)
        .and_then(|v| v.as_str())
        .with_context(|| format!("missing string argument `{key}`"))
}
