//! The project dependency graph.
//!
//! Every manifest reachable from a root project is loaded exactly once and
//! stored as a node keyed by its canonical root directory. Edges carry the
//! [`DependencyEdge`] that declared them and keep declaration order.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::core::manifest::{DependencyEdge, ProjectManifest};
use crate::resolver::errors::ResolveError;
use crate::util::fs::normalize_path;

/// Directed graph of projects; an edge `a -> b` means "`a` depends on `b`".
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    graph: DiGraph<ProjectManifest, DependencyEdge>,
    by_root: HashMap<PathBuf, NodeIndex>,
    root: NodeIndex,
}

impl DependencyGraph {
    /// Load the graph reachable from `root`.
    ///
    /// Fails with [`ResolveError::Cycle`] if any project transitively depends
    /// on itself. Dependencies of utility projects are not followed since
    /// utility projects are never built.
    pub fn load(root: ProjectManifest) -> Result<Self, ResolveError> {
        let key = normalize_path(&root.root_path);
        let mut graph = DiGraph::new();
        let root_idx = graph.add_node(root);

        let mut this = DependencyGraph {
            graph,
            by_root: HashMap::from([(key, root_idx)]),
            root: root_idx,
        };

        let mut in_progress = Vec::new();
        this.visit(root_idx, &mut in_progress)?;
        Ok(this)
    }

    fn visit(
        &mut self,
        node: NodeIndex,
        in_progress: &mut Vec<NodeIndex>,
    ) -> Result<(), ResolveError> {
        if self.graph[node].kind.is_utility() {
            return Ok(());
        }

        in_progress.push(node);
        let consumer = self.graph[node].clone();

        for edge in &consumer.dependencies {
            let dep_root = normalize_path(&consumer.dependency_root(edge));

            if let Some(&existing) = self.by_root.get(&dep_root) {
                if let Some(pos) = in_progress.iter().position(|&n| n == existing) {
                    let mut chain: Vec<String> = in_progress[pos..]
                        .iter()
                        .map(|&n| self.graph[n].name.clone())
                        .collect();
                    chain.push(self.graph[existing].name.clone());
                    return Err(ResolveError::Cycle { chain });
                }
                self.graph.add_edge(node, existing, edge.clone());
                continue;
            }

            let manifest =
                ProjectManifest::load(&dep_root).map_err(|source| ResolveError::LoadFailed {
                    consumer: consumer.name.clone(),
                    dependency: edge.name.clone(),
                    path: dep_root.clone(),
                    source,
                })?;

            tracing::debug!(
                "loaded dependency `{}` of `{}` from {}",
                manifest.name,
                consumer.name,
                dep_root.display()
            );

            let dep = self.graph.add_node(manifest);
            self.by_root.insert(dep_root, dep);
            self.graph.add_edge(node, dep, edge.clone());
            self.visit(dep, in_progress)?;
        }

        in_progress.pop();
        Ok(())
    }

    pub fn root(&self) -> NodeIndex {
        self.root
    }

    pub fn manifest(&self, node: NodeIndex) -> &ProjectManifest {
        &self.graph[node]
    }

    /// Node of the project rooted at `dir`, if it is part of the graph.
    pub fn find(&self, dir: &Path) -> Option<NodeIndex> {
        self.by_root.get(&normalize_path(dir)).copied()
    }

    /// Direct dependencies of `node`, in declaration order.
    pub fn dependencies(&self, node: NodeIndex) -> Vec<(NodeIndex, &DependencyEdge)> {
        let mut edges: Vec<_> = self.graph.edges(node).collect();
        edges.sort_by_key(|e| e.id().index());
        edges
            .into_iter()
            .map(|e| (e.target(), e.weight()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Render the graph as an indented tree rooted at the root project.
    ///
    /// Projects already printed once are marked `(*)` and not expanded again.
    pub fn render_tree(&self, max_depth: usize) -> String {
        let mut out = String::new();
        let mut seen = HashSet::new();
        self.render_node(self.root, 0, max_depth, &mut seen, &mut out);
        out
    }

    fn render_node(
        &self,
        node: NodeIndex,
        depth: usize,
        max_depth: usize,
        seen: &mut HashSet<NodeIndex>,
        out: &mut String,
    ) {
        if depth > max_depth {
            return;
        }

        let manifest = &self.graph[node];
        let prefix = if depth == 0 {
            String::new()
        } else {
            format!("{}├── ", "│   ".repeat(depth - 1))
        };
        let duplicate = !seen.insert(node);

        out.push_str(&format!(
            "{}{} ({}){}\n",
            prefix,
            manifest.name,
            manifest.kind.as_str(),
            if duplicate { " (*)" } else { "" }
        ));

        if duplicate {
            return;
        }

        for (dep, _) in self.dependencies(node) {
            self.render_node(dep, depth + 1, max_depth, seen, out);
        }
    }
}
