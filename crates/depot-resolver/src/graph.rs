//! Dependency graph construction and traversal.

use std::collections::{BTreeSet, HashMap, HashSet};

use depot_core::coordinate::ProjectVersion;
use depot_core::metadata::StoreProjectVersionData;
use depot_core::store::CoordinateStore;
use depot_util::errors::DepotError;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::cache::check_usable;
use crate::overrides::DependencyOverride;

/// Directed graph of coordinates reachable from a requested set, backed by
/// petgraph. Edges point from dependent to dependency.
pub struct DependencyGraph {
    graph: DiGraph<ProjectVersion, ()>,
    index: HashMap<ProjectVersion, NodeIndex>,
    roots: BTreeSet<ProjectVersion>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
            roots: BTreeSet::new(),
        }
    }

    /// Add or retrieve a node. If the coordinate already exists, returns the existing index.
    pub fn add_node(&mut self, node: ProjectVersion) -> NodeIndex {
        if let Some(&idx) = self.index.get(&node) {
            return idx;
        }
        let idx = self.graph.add_node(node.clone());
        self.index.insert(node, idx);
        idx
    }

    pub fn contains(&self, node: &ProjectVersion) -> bool {
        self.index.contains_key(node)
    }

    /// Add a depends-on edge. Self-loops and duplicate edges are ignored.
    pub fn add_edge(&mut self, from: &ProjectVersion, to: &ProjectVersion) {
        if from == to {
            return;
        }
        let from = self.add_node(from.clone());
        let to = self.add_node(to.clone());
        if !self.graph.edges(from).any(|e| e.target() == to) {
            self.graph.add_edge(from, to, ());
        }
    }

    /// Mark a coordinate as one of the originally requested roots.
    pub fn add_root(&mut self, node: ProjectVersion) {
        self.add_node(node.clone());
        self.roots.insert(node);
    }

    pub fn roots(&self) -> &BTreeSet<ProjectVersion> {
        &self.roots
    }

    /// All coordinates in the graph, sorted.
    pub fn nodes(&self) -> Vec<&ProjectVersion> {
        let mut nodes: Vec<&ProjectVersion> = self.graph.node_weights().collect();
        nodes.sort();
        nodes
    }

    /// Direct dependencies of `node` (forward edges), sorted.
    pub fn dependencies_of(&self, node: &ProjectVersion) -> Vec<&ProjectVersion> {
        self.neighbors(node, Direction::Outgoing)
    }

    /// Coordinates depending on `node` (back edges), sorted.
    pub fn dependents_of(&self, node: &ProjectVersion) -> Vec<&ProjectVersion> {
        self.neighbors(node, Direction::Incoming)
    }

    fn neighbors(&self, node: &ProjectVersion, direction: Direction) -> Vec<&ProjectVersion> {
        let Some(&idx) = self.index.get(node) else {
            return Vec::new();
        };
        let mut out: Vec<&ProjectVersion> = self
            .graph
            .edges_directed(idx, direction)
            .map(|e| match direction {
                Direction::Outgoing => &self.graph[e.target()],
                Direction::Incoming => &self.graph[e.source()],
            })
            .collect();
        out.sort();
        out
    }

    /// Render the graph as a tree below each root. Coordinates already
    /// printed on the current branch are not expanded again.
    pub fn print_tree(&self, max_depth: Option<usize>) -> String {
        let mut output = String::new();
        for root in &self.roots {
            output.push_str(&format!("{root}\n"));
            let mut on_branch: HashSet<&ProjectVersion> = HashSet::new();
            on_branch.insert(root);
            let mut stack = vec![TreeFrame {
                node: root,
                prefix: String::new(),
                children: self.dependencies_of(root),
                next: 0,
                depth: 0,
            }];

            while let Some(frame) = stack.last_mut() {
                let Some(&child) = frame.children.get(frame.next) else {
                    on_branch.remove(frame.node);
                    stack.pop();
                    continue;
                };
                let is_last = frame.next + 1 == frame.children.len();
                frame.next += 1;

                let connector = if is_last { "└── " } else { "├── " };
                output.push_str(&format!("{}{connector}{child}\n", frame.prefix));

                let depth = frame.depth + 1;
                if max_depth.is_some_and(|max| depth >= max) {
                    continue;
                }
                if !on_branch.insert(child) {
                    continue;
                }
                let prefix = format!("{}{}", frame.prefix, if is_last { "    " } else { "│   " });
                stack.push(TreeFrame {
                    node: child,
                    prefix,
                    children: self.dependencies_of(child),
                    next: 0,
                    depth,
                });
            }
        }
        output
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Store reads and dependency lists memoized for the duration of one walk.
pub struct WalkContext<'a> {
    store: &'a dyn CoordinateStore,
    overrides: &'a dyn DependencyOverride,
    requested: Vec<ProjectVersion>,
    records: HashMap<ProjectVersion, StoreProjectVersionData>,
    dependencies: HashMap<ProjectVersion, Vec<ProjectVersion>>,
    visited: HashSet<ProjectVersion>,
}

impl<'a> WalkContext<'a> {
    pub fn new(
        store: &'a dyn CoordinateStore,
        overrides: &'a dyn DependencyOverride,
        requested: &[ProjectVersion],
    ) -> Self {
        Self {
            store,
            overrides,
            requested: requested.to_vec(),
            records: HashMap::new(),
            dependencies: HashMap::new(),
            visited: HashSet::new(),
        }
    }

    /// The usable store record for `coordinate`, read at most once per walk.
    pub fn record(
        &mut self,
        coordinate: &ProjectVersion,
    ) -> Result<&StoreProjectVersionData, DepotError> {
        if !self.records.contains_key(coordinate) {
            let record = self
                .store
                .find(coordinate)
                .ok_or_else(|| DepotError::not_found(coordinate))?;
            let record = check_usable(self.store, record)?;
            self.records.insert(coordinate.clone(), record);
        }
        self.records
            .get(coordinate)
            .ok_or_else(|| DepotError::not_found(coordinate))
    }

    /// Direct dependencies of `coordinate` after the override policy.
    pub fn dependencies_of(
        &mut self,
        coordinate: &ProjectVersion,
    ) -> Result<Vec<ProjectVersion>, DepotError> {
        if let Some(deps) = self.dependencies.get(coordinate) {
            return Ok(deps.clone());
        }
        let declared = self.record(coordinate)?.dependencies.clone();
        let deps = self
            .overrides
            .override_with(&declared, &self.requested, self.store);
        self.dependencies.insert(coordinate.clone(), deps.clone());
        Ok(deps)
    }

    /// Mark `coordinate` as expanded. Returns `false` if it already was.
    pub fn visit(&mut self, coordinate: &ProjectVersion) -> bool {
        self.visited.insert(coordinate.clone())
    }

    pub fn store(&self) -> &'a dyn CoordinateStore {
        self.store
    }
}

/// Register `children` under `parent` (or as top-level nodes when `parent`
/// is `None`) and expand each child not yet visited in this walk.
///
/// A child already in the graph only gains the new edge, so every
/// coordinate is expanded once per walk. Fails fast on the first missing,
/// excluded or evicted coordinate. The walk keeps its own frame stack, so
/// chain length is bounded by memory rather than thread stack.
pub fn build_dependency_graph(
    graph: &mut DependencyGraph,
    parent: Option<&ProjectVersion>,
    children: &[ProjectVersion],
    ctx: &mut WalkContext<'_>,
) -> Result<(), DepotError> {
    let mut stack = vec![ExpandFrame {
        parent: parent.cloned(),
        children: children.to_vec(),
        next: 0,
    }];

    while let Some(frame) = stack.last_mut() {
        let Some(child) = frame.children.get(frame.next).cloned() else {
            stack.pop();
            continue;
        };
        frame.next += 1;
        let parent = frame.parent.clone();

        if parent.as_ref() == Some(&child) {
            continue;
        }
        if graph.contains(&child) {
            if let Some(parent) = &parent {
                graph.add_edge(parent, &child);
            }
            continue;
        }

        ctx.record(&child)?;
        graph.add_node(child.clone());
        if let Some(parent) = &parent {
            graph.add_edge(parent, &child);
        }

        if ctx.visit(&child) {
            tracing::debug!("Expanding {child}");
            let deps = ctx.dependencies_of(&child)?;
            stack.push(ExpandFrame {
                parent: Some(child),
                children: deps,
                next: 0,
            });
        }
    }
    Ok(())
}

/// One coordinate being printed by [`DependencyGraph::print_tree`].
struct TreeFrame<'g> {
    node: &'g ProjectVersion,
    prefix: String,
    children: Vec<&'g ProjectVersion>,
    next: usize,
    depth: usize,
}

/// Children of one coordinate still to be registered.
struct ExpandFrame {
    parent: Option<ProjectVersion>,
    children: Vec<ProjectVersion>,
    next: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overrides::IdentityOverride;
    use depot_core::store::InMemoryStore;

    fn pv(s: &str) -> ProjectVersion {
        ProjectVersion::parse(s).unwrap()
    }

    fn record(coord: &str, deps: &[&str]) -> StoreProjectVersionData {
        StoreProjectVersionData::new(pv(coord)).with_dependencies(deps.iter().map(|d| pv(d)))
    }

    #[test]
    fn add_node_is_idempotent() {
        let mut g = DependencyGraph::new();
        let a = g.add_node(pv("org.example:lib:1.0"));
        let b = g.add_node(pv("org.example:lib:1.0"));
        assert_eq!(a, b);
        // Different versions of the same artifact are distinct nodes.
        g.add_node(pv("org.example:lib:2.0"));
        assert_eq!(g.len(), 2);
    }

    #[test]
    fn edges_are_deduplicated_and_never_self_loops() {
        let mut g = DependencyGraph::new();
        g.add_edge(&pv("g:a:1"), &pv("g:b:1"));
        g.add_edge(&pv("g:a:1"), &pv("g:b:1"));
        g.add_edge(&pv("g:a:1"), &pv("g:a:1"));
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.dependencies_of(&pv("g:a:1")), vec![&pv("g:b:1")]);
        assert_eq!(g.dependents_of(&pv("g:b:1")), vec![&pv("g:a:1")]);
        assert!(g.dependencies_of(&pv("g:zzz:1")).is_empty());
    }

    #[test]
    fn build_expands_diamond_once() {
        let store = InMemoryStore::from_records([
            record("g:a:1", &["g:b:1", "g:c:1"]),
            record("g:b:1", &["g:d:1"]),
            record("g:c:1", &["g:d:1"]),
            record("g:d:1", &[]),
        ]);
        let roots = vec![pv("g:a:1")];
        let mut ctx = WalkContext::new(&store, &IdentityOverride, &roots);
        let mut g = DependencyGraph::new();
        build_dependency_graph(&mut g, None, &roots, &mut ctx).unwrap();

        assert_eq!(g.len(), 4);
        assert_eq!(g.edge_count(), 4);
        assert_eq!(
            g.dependents_of(&pv("g:d:1")),
            vec![&pv("g:b:1"), &pv("g:c:1")]
        );
    }

    #[test]
    fn build_walks_long_chain() {
        let records: Vec<StoreProjectVersionData> = (0..5000)
            .map(|i| {
                let next = format!("g:a{}:1", i + 1);
                let deps: Vec<&str> = if i + 1 < 5000 { vec![next.as_str()] } else { vec![] };
                record(&format!("g:a{i}:1"), &deps)
            })
            .collect();
        let store = InMemoryStore::from_records(records);
        let roots = vec![pv("g:a0:1")];
        let mut ctx = WalkContext::new(&store, &IdentityOverride, &roots);
        let mut g = DependencyGraph::new();
        build_dependency_graph(&mut g, None, &roots, &mut ctx).unwrap();
        assert_eq!(g.len(), 5000);
        assert_eq!(g.edge_count(), 4999);
        assert_eq!(g.dependents_of(&pv("g:a4999:1")), vec![&pv("g:a4998:1")]);
    }

    #[test]
    fn tree_printing_of_deep_chain() {
        let mut g = DependencyGraph::new();
        g.add_root(pv("g:a0:1"));
        for i in 0..2000 {
            g.add_edge(&pv(&format!("g:a{i}:1")), &pv(&format!("g:a{}:1", i + 1)));
        }
        let tree = g.print_tree(None);
        assert_eq!(tree.lines().count(), 2001);
        assert!(tree.lines().last().unwrap().ends_with("└── g:a2000:1"));
        assert_eq!(g.print_tree(Some(3)).lines().count(), 4);
    }

    #[test]
    fn build_terminates_on_cycles() {
        let store = InMemoryStore::from_records([
            record("g:a:1", &["g:b:1"]),
            record("g:b:1", &["g:a:1"]),
        ]);
        let roots = vec![pv("g:a:1")];
        let mut ctx = WalkContext::new(&store, &IdentityOverride, &roots);
        let mut g = DependencyGraph::new();
        build_dependency_graph(&mut g, None, &roots, &mut ctx).unwrap();
        assert_eq!(g.len(), 2);
        assert_eq!(g.dependencies_of(&pv("g:b:1")), vec![&pv("g:a:1")]);
    }

    #[test]
    fn build_fails_fast_on_missing_child() {
        let store = InMemoryStore::from_records([record("g:a:1", &["g:missing:1"])]);
        let roots = vec![pv("g:a:1")];
        let mut ctx = WalkContext::new(&store, &IdentityOverride, &roots);
        let mut g = DependencyGraph::new();
        let err = build_dependency_graph(&mut g, None, &roots, &mut ctx).unwrap_err();
        assert!(matches!(err, DepotError::NotFound { .. }));
    }

    #[test]
    fn build_rejects_excluded_child() {
        let store = InMemoryStore::from_records([
            record("g:a:1", &["g:b:1"]),
            record("g:b:1", &[]).excluded("license"),
        ]);
        let roots = vec![pv("g:a:1")];
        let mut ctx = WalkContext::new(&store, &IdentityOverride, &roots);
        let mut g = DependencyGraph::new();
        let err = build_dependency_graph(&mut g, None, &roots, &mut ctx).unwrap_err();
        match err {
            DepotError::Excluded { reason, .. } => assert_eq!(reason, "license"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn tree_printing() {
        let mut g = DependencyGraph::new();
        g.add_root(pv("com.example:app:1.0"));
        g.add_edge(&pv("com.example:app:1.0"), &pv("org.a:a:1.0"));
        g.add_edge(&pv("com.example:app:1.0"), &pv("org.b:b:2.0"));
        g.add_edge(&pv("org.a:a:1.0"), &pv("org.c:c:3.0"));

        let tree = g.print_tree(None);
        assert!(tree.starts_with("com.example:app:1.0\n"));
        assert!(tree.contains("├── org.a:a:1.0"));
        assert!(tree.contains("│   └── org.c:c:3.0"));
        assert!(tree.contains("└── org.b:b:2.0"));

        let shallow = g.print_tree(Some(1));
        assert!(!shallow.contains("org.c:c:3.0"));
    }
}
