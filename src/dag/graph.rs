// src/dag/graph.rs

use std::collections::{BTreeMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::errors::{DevtasksError, Result};

/// Internal node structure: stores immediate deps and dependents.
#[derive(Debug, Clone, Default)]
struct DagNode {
    /// Direct prerequisites, in declaration order.
    deps: Vec<String>,
    /// Tasks that list this one as a prerequisite.
    dependents: Vec<String>,
}

/// Prerequisite graph of named tasks.
///
/// Edges point from a prerequisite to the task that needs it. The graph is
/// built from plain `(name, after)` pairs so it does not depend on where the
/// tasks come from.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    nodes: BTreeMap<String, DagNode>,
}

impl TaskGraph {
    /// Build a graph from task names and their prerequisite lists.
    ///
    /// Unknown prerequisite names are kept as edges to missing nodes and
    /// reported by [`TaskGraph::validate`].
    pub fn new<'a, I>(tasks: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a [String])>,
    {
        let mut nodes: BTreeMap<String, DagNode> = BTreeMap::new();

        for (name, after) in tasks {
            nodes.entry(name.to_string()).or_default().deps = after.to_vec();
        }

        let edges: Vec<(String, String)> = nodes
            .iter()
            .flat_map(|(name, node)| node.deps.iter().map(move |d| (d.clone(), name.clone())))
            .collect();

        for (dep, task) in edges {
            if let Some(dep_node) = nodes.get_mut(&dep) {
                dep_node.dependents.push(task);
            }
        }

        Self { nodes }
    }

    /// All task names, sorted.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Immediate prerequisites of a task.
    pub fn dependencies_of(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(|n| n.deps.as_slice())
            .unwrap_or(&[])
    }

    /// Immediate dependents of a task.
    pub fn dependents_of(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or(&[])
    }

    /// Check references and acyclicity.
    pub fn validate(&self) -> Result<()> {
        for (name, node) in self.nodes.iter() {
            for dep in node.deps.iter() {
                if dep == name {
                    return Err(DevtasksError::ConfigError(format!(
                        "task '{}' cannot depend on itself in `after`",
                        name
                    )));
                }
                if !self.nodes.contains_key(dep) {
                    return Err(DevtasksError::ConfigError(format!(
                        "task '{}' has unknown dependency '{}' in `after`",
                        name, dep
                    )));
                }
            }
        }

        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for name in self.nodes.keys() {
            graph.add_node(name.as_str());
        }
        for (name, node) in self.nodes.iter() {
            for dep in node.deps.iter() {
                graph.add_edge(dep.as_str(), name.as_str(), ());
            }
        }

        // A topological sort fails if there is a cycle.
        match toposort(&graph, None) {
            Ok(_order) => Ok(()),
            Err(cycle) => Err(DevtasksError::DagCycle(format!(
                "cycle detected in task graph involving task '{}'",
                cycle.node_id()
            ))),
        }
    }

    /// Resolve the tasks to run for `targets`, prerequisites first.
    ///
    /// Targets are visited in the order given and prerequisites in `after`
    /// order, so the result is deterministic. Each task appears once. A cycle
    /// is reported instead of looping.
    pub fn execution_order<S: AsRef<str>>(&self, targets: &[S]) -> Result<Vec<String>> {
        let mut order = Vec::new();
        let mut done: HashSet<&str> = HashSet::new();
        let mut visiting: Vec<&str> = Vec::new();

        for target in targets {
            let target = target.as_ref();
            let name = self
                .nodes
                .get_key_value(target)
                .map(|(k, _)| k.as_str())
                .ok_or_else(|| DevtasksError::TaskNotFound(target.to_string()))?;
            self.visit(name, &mut done, &mut visiting, &mut order)?;
        }

        Ok(order)
    }

    fn visit<'a>(
        &'a self,
        name: &'a str,
        done: &mut HashSet<&'a str>,
        visiting: &mut Vec<&'a str>,
        order: &mut Vec<String>,
    ) -> Result<()> {
        if done.contains(name) {
            return Ok(());
        }
        if visiting.contains(&name) {
            let mut path: Vec<&str> = visiting.clone();
            path.push(name);
            return Err(DevtasksError::DagCycle(format!(
                "cycle detected in task graph: {}",
                path.join(" -> ")
            )));
        }

        visiting.push(name);
        for dep in self.dependencies_of(name) {
            let dep = self
                .nodes
                .get_key_value(dep.as_str())
                .map(|(k, _)| k.as_str())
                .ok_or_else(|| DevtasksError::TaskNotFound(dep.clone()))?;
            self.visit(dep, done, visiting, order)?;
        }
        visiting.pop();

        done.insert(name);
        order.push(name.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(&str, &[&str])]) -> TaskGraph {
        let owned: Vec<(String, Vec<String>)> = edges
            .iter()
            .map(|(n, deps)| (n.to_string(), deps.iter().map(|d| d.to_string()).collect()))
            .collect();
        TaskGraph::new(owned.iter().map(|(n, d)| (n.as_str(), d.as_slice())))
    }

    #[test]
    fn prerequisites_come_first() {
        let g = graph(&[("default", &["watch"]), ("watch", &["build"]), ("build", &[])]);
        assert_eq!(
            g.execution_order(&["default"]).unwrap(),
            vec!["build", "watch", "default"]
        );
    }

    #[test]
    fn shared_prerequisite_runs_once() {
        let g = graph(&[("a", &[]), ("b", &["a"]), ("c", &["a", "b"])]);
        assert_eq!(g.execution_order(&["c", "b"]).unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn cycle_fails_fast() {
        let g = graph(&[("a", &["b"]), ("b", &["a"])]);
        assert!(matches!(g.validate(), Err(DevtasksError::DagCycle(_))));
        assert!(matches!(
            g.execution_order(&["a"]),
            Err(DevtasksError::DagCycle(msg)) if msg.contains("a -> b -> a")
        ));
    }

    #[test]
    fn unknown_target_is_reported() {
        let g = graph(&[("a", &[])]);
        assert!(matches!(
            g.execution_order(&["nope"]),
            Err(DevtasksError::TaskNotFound(name)) if name == "nope"
        ));
    }

    #[test]
    fn dependents_are_tracked() {
        let g = graph(&[("a", &[]), ("b", &["a"]), ("c", &["a"])]);
        assert_eq!(g.dependents_of("a"), &["b".to_string(), "c".to_string()]);
        assert!(g.dependents_of("c").is_empty());
    }
}
