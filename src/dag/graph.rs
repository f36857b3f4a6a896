// src/dag/graph.rs

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::dag::node::Node;
use crate::errors::{OrchestratorError, Result};
use crate::types::NodeId;

/// Internal adjacency entry: immediate deps and dependents.
#[derive(Debug, Clone)]
struct DagEntry {
    /// Direct dependencies, deduplicated, in declaration order.
    deps: Vec<NodeId>,
    /// Direct dependents, in node declaration order.
    dependents: Vec<NodeId>,
}

/// Validated in-memory DAG keyed by node id.
///
/// Building one is the only validation a node set goes through: once a
/// `DagGraph` exists the ids are unique, every dependency resolves and the
/// relation is acyclic.
#[derive(Debug, Clone)]
pub struct DagGraph {
    entries: HashMap<NodeId, DagEntry>,
    /// Node ids in the order they were supplied.
    order: Vec<NodeId>,
}

impl DagGraph {
    /// Validate `nodes` and build the adjacency maps.
    ///
    /// Rejects, in this order:
    /// - duplicate ids,
    /// - dependencies on ids not present in `nodes`,
    /// - cycles (a node depending on itself included).
    pub fn build(nodes: &[Node]) -> Result<Self> {
        let mut entries: HashMap<NodeId, DagEntry> = HashMap::with_capacity(nodes.len());
        let mut order = Vec::with_capacity(nodes.len());

        for node in nodes {
            if entries.contains_key(&node.id) {
                return Err(OrchestratorError::DuplicateNodeId(node.id.clone()));
            }

            let mut deps: Vec<NodeId> = Vec::with_capacity(node.deps.len());
            for dep in &node.deps {
                if !deps.contains(dep) {
                    deps.push(dep.clone());
                }
            }

            entries.insert(
                node.id.clone(),
                DagEntry {
                    deps,
                    dependents: Vec::new(),
                },
            );
            order.push(node.id.clone());
        }

        for id in &order {
            let deps = entries.get(id).map(|e| e.deps.clone()).unwrap_or_default();
            for dep in deps {
                match entries.get_mut(&dep) {
                    Some(dep_entry) => dep_entry.dependents.push(id.clone()),
                    None => {
                        return Err(OrchestratorError::UnknownDependency {
                            node: id.clone(),
                            dep,
                        });
                    }
                }
            }
        }

        let graph = Self { entries, order };
        graph.ensure_acyclic()?;
        Ok(graph)
    }

    fn ensure_acyclic(&self) -> Result<()> {
        // Edge direction: dep -> node.
        let mut g: DiGraphMap<&str, ()> = DiGraphMap::new();

        for id in &self.order {
            g.add_node(id.as_str());
        }
        for id in &self.order {
            for dep in self.dependencies_of(id) {
                if dep == id {
                    return Err(OrchestratorError::DependencyCycle(format!(
                        "node '{id}' depends on itself"
                    )));
                }
                g.add_edge(dep.as_str(), id.as_str(), ());
            }
        }

        match toposort(&g, None) {
            Ok(_) => Ok(()),
            Err(cycle) => Err(OrchestratorError::DependencyCycle(format!(
                "cycle detected in node DAG involving node '{}'",
                cycle.node_id()
            ))),
        }
    }

    /// Node ids in declaration order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Immediate dependencies of a node.
    pub fn dependencies_of(&self, id: &str) -> &[NodeId] {
        self.entries
            .get(id)
            .map(|e| e.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a node.
    pub fn dependents_of(&self, id: &str) -> &[NodeId] {
        self.entries
            .get(id)
            .map(|e| e.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// Nodes without dependencies, in declaration order.
    pub fn roots(&self) -> Vec<NodeId> {
        self.order
            .iter()
            .filter(|id| self.dependencies_of(id).is_empty())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diamond() -> Vec<Node> {
        vec![
            Node::new("parse", "a"),
            Node::new("claim1", "a").after("parse"),
            Node::new("claim2", "a").after("parse"),
            Node::new("reduce", "a").after("claim1").after("claim2"),
        ]
    }

    #[test]
    fn builds_adjacency_for_diamond() {
        let g = DagGraph::build(&diamond()).unwrap();

        assert_eq!(g.len(), 4);
        assert_eq!(g.roots(), vec!["parse".to_string()]);
        assert_eq!(
            g.dependents_of("parse"),
            &["claim1".to_string(), "claim2".to_string()]
        );
        assert_eq!(
            g.dependencies_of("reduce"),
            &["claim1".to_string(), "claim2".to_string()]
        );
        assert_eq!(
            g.nodes().collect::<Vec<_>>(),
            vec!["parse", "claim1", "claim2", "reduce"]
        );
    }

    #[test]
    fn repeated_dependency_is_collapsed() {
        let nodes = vec![Node::new("a", "x"), Node::new("b", "x").after("a").after("a")];
        let g = DagGraph::build(&nodes).unwrap();
        assert_eq!(g.dependencies_of("b"), &["a".to_string()]);
        assert_eq!(g.dependents_of("a"), &["b".to_string()]);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let nodes = vec![Node::new("a", "x"), Node::new("a", "y")];
        match DagGraph::build(&nodes) {
            Err(OrchestratorError::DuplicateNodeId(id)) => assert_eq!(id, "a"),
            other => panic!("expected DuplicateNodeId, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_dependency() {
        let nodes = vec![Node::new("a", "x").after("ghost")];
        match DagGraph::build(&nodes) {
            Err(OrchestratorError::UnknownDependency { node, dep }) => {
                assert_eq!(node, "a");
                assert_eq!(dep, "ghost");
            }
            other => panic!("expected UnknownDependency, got {other:?}"),
        }
    }

    #[test]
    fn rejects_two_node_cycle() {
        let nodes = vec![Node::new("A", "x").after("B"), Node::new("B", "x").after("A")];
        match DagGraph::build(&nodes) {
            Err(OrchestratorError::DependencyCycle(msg)) => {
                assert!(msg.contains("cycle detected"));
            }
            other => panic!("expected DependencyCycle, got {other:?}"),
        }
    }

    #[test]
    fn rejects_self_dependency_as_cycle() {
        let nodes = vec![Node::new("A", "x").after("A")];
        assert!(matches!(
            DagGraph::build(&nodes),
            Err(OrchestratorError::DependencyCycle(_))
        ));
    }

    #[test]
    fn empty_node_set_is_valid() {
        let g = DagGraph::build(&[]).unwrap();
        assert!(g.is_empty());
        assert!(g.roots().is_empty());
    }
}
