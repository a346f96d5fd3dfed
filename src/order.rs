// src/order.rs

//! Package assembly order
//!
//! Packages that provide shared libraries through `uses` are assembled
//! before the packages using them. Ties keep declaration order, so the
//! result is stable across runs.

use crate::error::{Error, Result};
use crate::graph::ModuleGraph;
use crate::package::PackageId;
use std::collections::{BTreeSet, HashMap};

/// Dependency graph between packages
#[derive(Debug, Clone, Default)]
pub struct PackageOrder {
    /// package -> packages it uses
    edges: HashMap<PackageId, Vec<PackageId>>,
    /// package -> packages using it
    reverse_edges: HashMap<PackageId, Vec<PackageId>>,
    nodes: Vec<PackageId>,
}

impl PackageOrder {
    /// Build from the packages' `uses` lists; unknown names are skipped and
    /// reported by validation instead
    pub fn from_graph(graph: &ModuleGraph) -> Self {
        let mut order = Self::default();
        for (id, _) in graph.packages() {
            order.add_package(id);
        }
        for (id, package) in graph.packages() {
            for used in package.uses.iter().filter_map(|n| graph.lookup_package(n)) {
                order.add_edge(id, used);
            }
        }
        order
    }

    pub fn add_package(&mut self, id: PackageId) {
        if !self.edges.contains_key(&id) {
            self.edges.insert(id, Vec::new());
            self.nodes.push(id);
        }
    }

    /// Record that `user` uses `provider`
    pub fn add_edge(&mut self, user: PackageId, provider: PackageId) {
        self.add_package(user);
        self.add_package(provider);
        let deps = self.edges.entry(user).or_default();
        if !deps.contains(&provider) {
            deps.push(provider);
            self.reverse_edges.entry(provider).or_default().push(user);
        }
    }

    /// Providers first; ties broken by declaration order
    pub fn sorted(&self, graph: &ModuleGraph) -> Result<Vec<PackageId>> {
        let mut in_degrees: HashMap<PackageId, usize> = self
            .edges
            .iter()
            .map(|(id, deps)| (*id, deps.len()))
            .collect();

        let mut ready: BTreeSet<PackageId> = in_degrees
            .iter()
            .filter(|&(_, deg)| *deg == 0)
            .map(|(id, _)| *id)
            .collect();
        let mut result = Vec::with_capacity(self.nodes.len());

        while let Some(node) = ready.pop_first() {
            result.push(node);
            if let Some(users) = self.reverse_edges.get(&node) {
                for user in users {
                    if let Some(deg) = in_degrees.get_mut(user) {
                        *deg = deg.saturating_sub(1);
                        if *deg == 0 {
                            ready.insert(*user);
                        }
                    }
                }
            }
        }

        if result.len() != self.nodes.len() {
            let remaining: Vec<&str> = self
                .nodes
                .iter()
                .filter(|id| !result.contains(id))
                .map(|id| graph.package(*id).name.as_str())
                .collect();
            return Err(Error::DependencyCycle(format!(
                "packages use each other: {}",
                remaining.join(", ")
            )));
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::Declarations;

    fn graph(toml: &str) -> ModuleGraph {
        ModuleGraph::from_declarations(&Declarations::parse(toml).unwrap()).unwrap()
    }

    fn names(graph: &ModuleGraph, ids: &[PackageId]) -> Vec<String> {
        ids.iter().map(|id| graph.package(*id).name.clone()).collect()
    }

    #[test]
    fn test_providers_first() {
        let g = graph(
            r#"
            [[package]]
            name = "myapex"
            key = "k"
            uses = ["commonapex"]

            [[package]]
            name = "otherapex"
            key = "k"

            [[package]]
            name = "commonapex"
            key = "k"
            provide_cpp_shared_libs = true
            "#,
        );
        let order = PackageOrder::from_graph(&g).sorted(&g).unwrap();
        assert_eq!(names(&g, &order), vec!["otherapex", "commonapex", "myapex"]);
    }

    #[test]
    fn test_declaration_order_without_uses() {
        let g = graph(
            r#"
            [[package]]
            name = "b"
            key = "k"

            [[package]]
            name = "a"
            key = "k"
            "#,
        );
        let order = PackageOrder::from_graph(&g).sorted(&g).unwrap();
        assert_eq!(names(&g, &order), vec!["b", "a"]);
    }

    #[test]
    fn test_uses_cycle() {
        let g = graph(
            r#"
            [[package]]
            name = "a"
            key = "k"
            uses = ["b"]

            [[package]]
            name = "b"
            key = "k"
            uses = ["a"]
            "#,
        );
        let err = PackageOrder::from_graph(&g).sorted(&g).unwrap_err();
        assert!(matches!(err, Error::DependencyCycle(ref msg) if msg.contains("a, b")));
    }
}
