// src/lib.rs

pub mod agents;
pub mod cli;
pub mod config;
pub mod dag;
pub mod demo;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod guard;
pub mod logging;
pub mod registry;
pub mod types;

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::dag::DagGraph;
use crate::engine::{RunReport, Scheduler};
use crate::guard::{PiiGuard, PiiPolicy};
use crate::registry::Registry;
use crate::types::{Payload, TEXT_KEY};

pub use crate::dag::Node;
pub use crate::engine::{ExecutionResult, NodeOutcome};
pub use crate::errors::{ErrorKind, NodeError, OrchestratorError};
pub use crate::guard::{Guard, Verdict};
pub use crate::registry::Agent;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (or the built-in demo DAG)
/// - the demo agent registry and the PII guard
/// - one scheduler run over the input text
///
/// Returns `Ok(false)` when the run aborted on a node failure.
pub async fn run(args: CliArgs) -> Result<bool> {
    let (nodes, mut max_concurrency, policy) = match args.config.as_deref() {
        Some(path) => {
            let cfg = load_and_validate(path)
                .with_context(|| format!("loading DAG config from '{path}'"))?;
            (cfg.nodes(), cfg.scheduler.max_concurrency, cfg.guard.policy)
        }
        None => (
            demo::default_demo_nodes(),
            demo::DEFAULT_MAX_CONCURRENCY,
            PiiPolicy::default(),
        ),
    };
    if let Some(n) = args.max_concurrency {
        max_concurrency = n;
    }

    let mut registry = Registry::new();
    agents::register_demo_agents(&mut registry);
    let guard = PiiGuard::new(policy);

    if args.dry_run {
        print!(
            "{}",
            render_dry_run(&nodes, max_concurrency, &registry, &guard)?
        );
        return Ok(true);
    }

    let text = resolve_input(args.input.as_deref())?;

    let scheduler = Scheduler::new(registry, Arc::new(guard), max_concurrency);
    let order: Vec<String> = nodes.iter().map(|n| n.id.clone()).collect();

    let mut initial = Payload::new();
    initial.insert(TEXT_KEY.to_string(), Value::String(text));

    info!(nodes = order.len(), max_concurrency, "running DAG");
    let report = scheduler.run_dag(nodes, initial).await?;

    print!("{}", render_report(&report, &order));
    if args.show_moderation {
        println!("{}", render_moderation(&report)?);
    }

    Ok(report.is_success())
}

/// Inline text, `@path` file contents, or the demo sentence.
pub fn resolve_input(input: Option<&str>) -> Result<String> {
    match input {
        Some(arg) => match arg.strip_prefix('@') {
            Some(path) => {
                fs::read_to_string(path).with_context(|| format!("reading input file '{path}'"))
            }
            None => Ok(arg.to_string()),
        },
        None => Ok(demo::DEFAULT_INPUT.to_string()),
    }
}

/// Print nodes, their dependencies and settings without running anything.
///
/// Agents missing from `registry` are flagged; at run time such nodes fail
/// with `UnknownAgent`.
pub fn render_dry_run(
    nodes: &[Node],
    max_concurrency: usize,
    registry: &Registry,
    guard: &PiiGuard,
) -> Result<String> {
    let graph = DagGraph::build(nodes)?;
    let mut out = String::new();

    writeln!(out, "hybrid-dag dry-run")?;
    writeln!(out, "  scheduler.max_concurrency = {max_concurrency}")?;
    writeln!(out, "  guard.policy = {}", guard.policy().as_str())?;
    writeln!(out, "  roots = {:?}", graph.roots())?;
    writeln!(out)?;
    writeln!(out, "nodes ({}):", nodes.len())?;

    for node in nodes {
        writeln!(out, "  - {}", node.id)?;
        if registry.contains(&node.agent) {
            writeln!(out, "      agent: {}", node.agent)?;
        } else {
            writeln!(out, "      agent: {} (not registered)", node.agent)?;
        }
        if !node.deps.is_empty() {
            writeln!(out, "      after: {:?}", node.deps)?;
        }
        writeln!(
            out,
            "      guard: pre={} post={}",
            node.guard_pre, node.guard_post
        )?;
        writeln!(
            out,
            "      timeout_ms: {}  max_retries: {}",
            node.timeout_ms, node.max_retries
        )?;
        if !node.params.is_empty() {
            writeln!(out, "      params: {}", Value::Object(node.params.clone()))?;
        }
    }

    debug!("dry-run complete (no execution)");
    Ok(out)
}

/// One block per node, in declaration order.
pub fn render_report(report: &RunReport, order: &[String]) -> String {
    let mut out = String::new();

    for id in order {
        let body = match report.get(id) {
            Some(result) => match &result.outcome {
                NodeOutcome::Succeeded(_) => result.text().unwrap_or_default().to_string(),
                NodeOutcome::Failed(err) => format!("FAILED ({}): {err}", err.kind()),
            },
            None if report.cancelled.contains(id) => "CANCELLED".to_string(),
            None => "NOT RUN".to_string(),
        };
        out.push_str(&format!("\n=== {id} ===\n{body}\n"));
    }

    out
}

/// Per-node guard verdicts as pretty JSON.
pub fn render_moderation(report: &RunReport) -> Result<String> {
    let cards: BTreeMap<&str, _> = report
        .results
        .iter()
        .filter(|(_, r)| !r.moderation.is_empty())
        .map(|(id, r)| (id.as_str(), &r.moderation))
        .collect();
    Ok(serde_json::to_string_pretty(&cards)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_input_is_used_verbatim() {
        assert_eq!(resolve_input(Some("hello")).unwrap(), "hello");
        assert_eq!(resolve_input(None).unwrap(), demo::DEFAULT_INPUT);
    }

    #[test]
    fn at_prefixed_input_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.txt");
        fs::write(&path, "from file").unwrap();

        let arg = format!("@{}", path.display());
        assert_eq!(resolve_input(Some(&arg)).unwrap(), "from file");
        assert!(resolve_input(Some("@/definitely/not/here.txt")).is_err());
    }

    fn demo_registry() -> Registry {
        let mut registry = Registry::new();
        agents::register_demo_agents(&mut registry);
        registry
    }

    #[test]
    fn dry_run_lists_every_node() {
        let out = render_dry_run(
            &demo::default_demo_nodes(),
            2,
            &demo_registry(),
            &PiiGuard::default(),
        )
        .unwrap();
        assert!(out.contains("roots = [\"parse\"]"));
        assert!(out.contains("guard.policy = redact"));
        assert!(!out.contains("not registered"));
        for id in ["parse", "claim1", "claim2", "reduce"] {
            assert!(out.contains(&format!("  - {id}")));
        }
    }

    #[test]
    fn dry_run_flags_unregistered_agents() {
        let nodes = vec![Node::new("a", agents::SUMMARIZER), Node::new("b", "ghost").after("a")];
        let out = render_dry_run(&nodes, 1, &demo_registry(), &PiiGuard::blocking()).unwrap();
        assert!(out.contains("guard.policy = block"));
        assert!(out.contains("agent: ghost (not registered)"));
        assert!(out.contains(&format!("agent: {}\n", agents::SUMMARIZER)));
    }

    #[test]
    fn dry_run_rejects_invalid_dag() {
        let nodes = vec![Node::new("a", "x").after("missing")];
        assert!(render_dry_run(&nodes, 1, &Registry::new(), &PiiGuard::default()).is_err());
    }
}
