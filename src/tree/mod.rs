//! The logical dependency tree.
//!
//! A [`PackageTree`] is an arena of [`PackageNode`]s addressed by [`NodeId`].
//! The id is a node's identity: two handles to the same install location are
//! the same `NodeId`, while the same package version installed at two
//! locations is two nodes.
//!
//! Every node carries a precomputed `has_cycle` flag, true when the node can
//! reach itself through its dependencies. [`TreeBuilder::build`] computes the
//! flags with Tarjan's strongly connected components algorithm, so consumers
//! never need to re-verify them.
//!
//! [`provider::load_tree`] builds the tree for a real project from its lock
//! file and installed `package.json` files.

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

use crate::manifest::Scripts;

pub mod provider;

pub use provider::{build_logical_tree, load_tree};

/// Handle of a node inside a [`PackageTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the arena.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// One installed package location.
#[derive(Debug, Clone)]
pub struct PackageNode {
    /// Package name
    pub name: String,
    /// Installed version
    pub version: String,
    /// Install path relative to the project root; `""` for the root package
    pub path: String,
    /// Lifecycle scripts from the installed `package.json`
    pub scripts: Scripts,
    /// Direct dependencies in declaration order
    pub dependencies: Vec<NodeId>,
    /// Whether the node can reach itself through its dependencies
    pub has_cycle: bool,
}

/// Read-only logical dependency tree.
#[derive(Debug, Clone)]
pub struct PackageTree {
    nodes: Vec<PackageNode>,
    by_path: HashMap<String, NodeId>,
    root: NodeId,
}

impl PackageTree {
    /// The root package.
    #[must_use]
    pub fn root(&self) -> &PackageNode {
        &self.nodes[self.root.0]
    }

    /// Handle of the root package.
    #[must_use]
    pub const fn root_id(&self) -> NodeId {
        self.root
    }

    /// Node behind a handle.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &PackageNode {
        &self.nodes[id.0]
    }

    /// Find a node by install path.
    #[must_use]
    pub fn find_by_path(&self, path: &str) -> Option<&PackageNode> {
        self.by_path.get(path).map(|&id| &self.nodes[id.0])
    }

    /// Number of nodes including the root.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes. A built tree always has its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &PackageNode> {
        self.nodes.iter()
    }
}

/// Incrementally assembles a [`PackageTree`].
///
/// ```rust,no_run
/// use allow_scripts::tree::TreeBuilder;
///
/// let mut builder = TreeBuilder::new("app", "1.0.0");
/// let root = builder.root();
/// let a = builder.add_package("a", "1.0.0", "node_modules/a", Default::default());
/// builder.add_dependency(root, a);
/// let tree = builder.build();
/// assert!(!tree.node(a).has_cycle);
/// ```
#[derive(Debug)]
pub struct TreeBuilder {
    nodes: Vec<PackageNode>,
    by_path: HashMap<String, NodeId>,
}

impl TreeBuilder {
    /// Start a tree whose root package has the given name and version.
    pub fn new(root_name: impl Into<String>, root_version: impl Into<String>) -> Self {
        let mut builder = Self {
            nodes: Vec::new(),
            by_path: HashMap::new(),
        };
        builder.add_package(root_name, root_version, "", Scripts::new());
        builder
    }

    /// Handle of the root package.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Set the root package's lifecycle scripts.
    pub fn set_root_scripts(&mut self, scripts: Scripts) {
        self.nodes[0].scripts = scripts;
    }

    /// Add a package at `path`, or return the existing node at that path.
    pub fn add_package(
        &mut self,
        name: impl Into<String>,
        version: impl Into<String>,
        path: impl Into<String>,
        scripts: Scripts,
    ) -> NodeId {
        let path = path.into();
        if let Some(&id) = self.by_path.get(&path) {
            return id;
        }

        let id = NodeId(self.nodes.len());
        self.nodes.push(PackageNode {
            name: name.into(),
            version: version.into(),
            path: path.clone(),
            scripts,
            dependencies: Vec::new(),
            has_cycle: false,
        });
        self.by_path.insert(path, id);
        id
    }

    /// Node already added at `path`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<NodeId> {
        self.by_path.get(path).copied()
    }

    /// Record that `parent` depends on `child`. Repeated edges are ignored.
    pub fn add_dependency(&mut self, parent: NodeId, child: NodeId) {
        let dependencies = &mut self.nodes[parent.0].dependencies;
        if !dependencies.contains(&child) {
            dependencies.push(child);
        }
    }

    /// Finish the tree, computing every node's `has_cycle` flag.
    #[must_use]
    pub fn build(mut self) -> PackageTree {
        let mut graph: DiGraph<(), ()> = DiGraph::with_capacity(self.nodes.len(), 0);
        for _ in &self.nodes {
            graph.add_node(());
        }
        for (index, node) in self.nodes.iter().enumerate() {
            for child in &node.dependencies {
                graph.add_edge(NodeIndex::new(index), NodeIndex::new(child.0), ());
            }
        }

        for component in tarjan_scc(&graph) {
            let cyclic = component.len() > 1
                || component.iter().any(|&index| graph.contains_edge(index, index));
            if cyclic {
                for index in component {
                    self.nodes[index.index()].has_cycle = true;
                }
            }
        }

        PackageTree {
            nodes: self.nodes,
            by_path: self.by_path,
            root: NodeId(0),
        }
    }
}
