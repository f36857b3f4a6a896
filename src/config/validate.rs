// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::dag::DagGraph;
use crate::errors::{OrchestratorError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = OrchestratorError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.scheduler, raw.guard, raw.node))
    }
}

/// Run every check a raw config must pass before it is usable.
pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_nodes(cfg)?;
    validate_scheduler_section(cfg)?;
    validate_node_fields(cfg)?;
    validate_dag(cfg)?;
    Ok(())
}

fn ensure_has_nodes(cfg: &RawConfigFile) -> Result<()> {
    if cfg.node.is_empty() {
        return Err(OrchestratorError::ConfigError(
            "config must contain at least one [[node]] entry".to_string(),
        ));
    }
    Ok(())
}

fn validate_scheduler_section(cfg: &RawConfigFile) -> Result<()> {
    if cfg.scheduler.max_concurrency == 0 {
        return Err(OrchestratorError::ConfigError(
            "[scheduler].max_concurrency must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_node_fields(cfg: &RawConfigFile) -> Result<()> {
    for node in &cfg.node {
        if node.id.trim().is_empty() {
            return Err(OrchestratorError::ConfigError(
                "node id must not be empty".to_string(),
            ));
        }
        if node.agent.trim().is_empty() {
            return Err(OrchestratorError::ConfigError(format!(
                "node '{}' must name an agent",
                node.id
            )));
        }
        if node.timeout_ms == 0 {
            return Err(OrchestratorError::ConfigError(format!(
                "node '{}' has timeout_ms = 0; must be >= 1",
                node.id
            )));
        }
    }
    Ok(())
}

/// Duplicate ids, unknown dependencies and cycles: same rules the scheduler
/// applies at run start.
fn validate_dag(cfg: &RawConfigFile) -> Result<()> {
    let nodes: Vec<_> = cfg.node.iter().map(|n| n.to_node()).collect();
    DagGraph::build(&nodes).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> RawConfigFile {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn defaults_are_applied() {
        let raw = parse(
            r#"
[[node]]
id = "a"
agent = "x"
"#,
        );
        let cfg = ConfigFile::try_from(raw).unwrap();
        assert_eq!(cfg.scheduler.max_concurrency, 2);

        let node = &cfg.nodes()[0];
        assert!(node.guard_pre && node.guard_post);
        assert_eq!(node.timeout_ms, 1000);
        assert_eq!(node.max_retries, 0);
        assert!(node.params.is_empty());
    }

    #[test]
    fn params_and_deps_alias_are_read() {
        let raw = parse(
            r#"
[[node]]
id = "a"
agent = "x"

[[node]]
id = "b"
agent = "y"
deps = ["a"]
params = { claim = "c", n = 3 }
"#,
        );
        let cfg = ConfigFile::try_from(raw).unwrap();
        let b = &cfg.nodes()[1];
        assert_eq!(b.deps, vec!["a".to_string()]);
        assert_eq!(b.params["claim"], serde_json::json!("c"));
        assert_eq!(b.params["n"], serde_json::json!(3));
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let raw = parse(
            r#"
[scheduler]
max_concurrency = 0

[[node]]
id = "a"
agent = "x"
"#,
        );
        assert!(matches!(
            ConfigFile::try_from(raw),
            Err(OrchestratorError::ConfigError(_))
        ));
    }

    #[test]
    fn empty_config_is_rejected() {
        assert!(ConfigFile::try_from(parse("")).is_err());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let raw = parse(
            r#"
[[node]]
id = "a"
agent = "x"

[[node]]
id = "a"
agent = "y"
"#,
        );
        assert!(matches!(
            ConfigFile::try_from(raw),
            Err(OrchestratorError::DuplicateNodeId(_))
        ));
    }
}
