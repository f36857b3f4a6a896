// src/config/model.rs

use serde::Deserialize;

use crate::dag::Node;
use crate::dag::node::DEFAULT_TIMEOUT_MS;
use crate::demo::DEFAULT_MAX_CONCURRENCY;
use crate::guard::PiiPolicy;
use crate::types::Payload;

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// [scheduler]
/// max_concurrency = 2
///
/// [guard]
/// policy = "redact"
///
/// [[node]]
/// id = "parse"
/// agent = "bitnet.summarizer"
/// params = { max_sentences = 3 }
///
/// [[node]]
/// id = "claim1"
/// agent = "bitnet.claimcheck"
/// after = ["parse"]
/// guard_pre = false
/// max_retries = 1
/// params = { claim = "BitNet uses 1.58-bit weights" }
/// ```
///
/// All sections are optional and have reasonable defaults. `[[node]]` is an
/// array so declaration order survives parsing.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub scheduler: SchedulerSection,

    #[serde(default)]
    pub guard: GuardSection,

    #[serde(default)]
    pub node: Vec<NodeConfig>,
}

/// Validated configuration. Only obtainable through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub scheduler: SchedulerSection,
    pub guard: GuardSection,
    pub node: Vec<NodeConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        scheduler: SchedulerSection,
        guard: GuardSection,
        node: Vec<NodeConfig>,
    ) -> Self {
        Self {
            scheduler,
            guard,
            node,
        }
    }

    /// Node configurations converted into scheduler nodes, in file order.
    pub fn nodes(&self) -> Vec<Node> {
        self.node.iter().map(NodeConfig::to_node).collect()
    }
}

/// `[scheduler]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSection {
    /// Maximum number of attempts executing at once, across the whole DAG.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
        }
    }
}

/// `[guard]` section for the built-in PII guard.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GuardSection {
    /// `"redact"` (default) or `"block"`.
    #[serde(default)]
    pub policy: PiiPolicy,
}

/// One `[[node]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    pub id: String,

    /// Registry name of the agent to invoke.
    pub agent: String,

    /// Ids this node waits for.
    #[serde(default, alias = "deps")]
    pub after: Vec<String>,

    #[serde(default = "default_true")]
    pub guard_pre: bool,

    #[serde(default = "default_true")]
    pub guard_post: bool,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default)]
    pub max_retries: u32,

    /// Extra keyword arguments for the agent.
    #[serde(default)]
    pub params: Payload,
}

fn default_true() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl NodeConfig {
    pub fn to_node(&self) -> Node {
        Node {
            id: self.id.clone(),
            agent: self.agent.clone(),
            deps: self.after.clone(),
            guard_pre: self.guard_pre,
            guard_post: self.guard_post,
            timeout_ms: self.timeout_ms,
            max_retries: self.max_retries,
            params: self.params.clone(),
        }
    }
}
