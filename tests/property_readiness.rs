use std::collections::HashSet;

use proptest::prelude::*;
use serde_json::{Value, json};

use hybrid_dag::dag::{Node, NodeRunState, ReadinessTracker};
use hybrid_dag::types::{PIECES_KEY, Payload};

// Acyclic by construction: node N may only depend on nodes 0..N-1.
fn dag_strategy(max_nodes: usize) -> impl Strategy<Value = Vec<Node>> {
    (1..=max_nodes).prop_flat_map(|num_nodes| {
        proptest::collection::vec(proptest::collection::vec(any::<usize>(), 0..4), num_nodes)
            .prop_map(|raw_deps| {
                raw_deps
                    .into_iter()
                    .enumerate()
                    .map(|(i, potential)| {
                        let mut node = Node::new(format!("node_{i}"), "agent");
                        let deps: HashSet<usize> =
                            potential.into_iter().filter(|_| i > 0).map(|d| d % i).collect();
                        let mut deps: Vec<_> = deps.into_iter().collect();
                        deps.sort();
                        for d in deps {
                            node = node.after(format!("node_{d}"));
                        }
                        node
                    })
                    .collect()
            })
    })
}

fn output_of(id: &str) -> Payload {
    json!({ "text": format!("out:{id}") })
        .as_object()
        .cloned()
        .unwrap_or_default()
}

proptest! {
    #[test]
    fn tracker_releases_each_node_once_after_its_dependencies(
        nodes in dag_strategy(12),
        failing in proptest::collection::hash_set(0..12usize, 0..3),
        pick in proptest::collection::vec(any::<usize>(), 64),
    ) {
        let deps_of: Vec<(String, Vec<String>)> =
            nodes.iter().map(|n| (n.id.clone(), n.deps.clone())).collect();
        let failing: HashSet<String> = failing.iter().map(|i| format!("node_{i}")).collect();

        let mut tracker = ReadinessTracker::new(nodes, &Payload::new()).unwrap();
        let mut launched = HashSet::new();
        let mut running: Vec<String> = Vec::new();
        let mut any_failed = false;

        let step = tracker.start();
        let mut released = step.newly_ready;
        let mut finished = step.run_finished;
        let mut round = 0;

        loop {
            // Launch everything released, the way the coordinator does.
            for ready in released.drain(..) {
                let id = ready.id().to_string();
                prop_assert!(!any_failed, "{} released after the run aborted", id);
                prop_assert!(launched.insert(id.clone()), "{} released twice", id);

                let (_, deps) = deps_of.iter().find(|(n, _)| *n == id).unwrap();
                for dep in deps {
                    prop_assert_eq!(tracker.run_state_of(dep), Some(NodeRunState::Succeeded));
                }
                if deps.is_empty() {
                    prop_assert!(ready.input.get(PIECES_KEY).is_none());
                } else {
                    let expected: Vec<Value> =
                        deps.iter().map(|d| Value::String(format!("out:{d}"))).collect();
                    prop_assert_eq!(ready.input.get(PIECES_KEY), Some(&Value::Array(expected)));
                }

                tracker.mark_running(&id);
                running.push(id);
            }

            if running.is_empty() {
                break;
            }

            // Complete in-flight nodes in an arbitrary order.
            let id = running.remove(pick[round % pick.len()] % running.len());
            round += 1;

            let step = if failing.contains(&id) {
                any_failed = true;
                tracker.complete_failure(&id)
            } else {
                tracker.complete_success(&id, &output_of(&id))
            };
            released = step.newly_ready;
            finished = step.run_finished;
        }

        prop_assert!(finished);
        prop_assert!(tracker.is_finished());
        prop_assert_eq!(tracker.in_flight(), 0);
        prop_assert_eq!(tracker.is_aborted(), any_failed);

        if !any_failed {
            prop_assert_eq!(launched.len(), deps_of.len());
            prop_assert!(tracker.never_started().is_empty());
        } else {
            for id in tracker.never_started() {
                prop_assert!(!launched.contains(&id));
            }
        }
    }
}
