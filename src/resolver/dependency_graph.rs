//! Ordering constraints derived from the logical dependency tree.
//!
//! [`scan`] walks the tree depth-first from the root's direct dependencies and
//! records, for every install path, the set of parent paths that must run
//! after it. Paths appear in the order they were first discovered; the
//! scheduler uses that order to break ties.
//!
//! # Cycles
//!
//! A node flagged `has_cycle` is pruned: it gets no entry, its dependencies are
//! not explored through it, and a single skip notice is sent to the console
//! sink no matter how many parents reference it. Script order across a cycle
//! is undefined, so those packages never run.
//!
//! # Shared Nodes
//!
//! A node reached through several parents (a diamond) is descended into only
//! once, but every parent is still recorded against it. The walk is therefore
//! linear in the number of distinct nodes.

use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

use crate::core::{SkipReason, SkippedPackage};
use crate::tree::{NodeId, PackageTree};
use crate::utils::console::ConsoleSink;

/// "This path must run before each of `required_by`".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderingConstraint {
    /// Install path of the dependency
    pub path: String,
    /// Paths of the packages depending on it; empty for the root's direct
    /// dependencies, since the root is scheduled separately
    pub required_by: Vec<String>,
}

/// All ordering constraints of one run, in first-discovery order.
#[derive(Debug, Clone, Default)]
pub struct OrderingConstraints {
    entries: Vec<OrderingConstraint>,
    index: HashMap<String, usize>,
}

impl OrderingConstraints {
    /// Create an empty constraint set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `path` must precede `parent`; `None` only registers `path`.
    pub fn record(&mut self, path: &str, parent: Option<&str>) {
        let position = match self.index.get(path) {
            Some(&position) => position,
            None => {
                self.entries.push(OrderingConstraint {
                    path: path.to_string(),
                    required_by: Vec::new(),
                });
                self.index.insert(path.to_string(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };

        if let Some(parent) = parent {
            let required_by = &mut self.entries[position].required_by;
            if !required_by.iter().any(|existing| existing == parent) {
                required_by.push(parent.to_string());
            }
        }
    }

    /// Constraint recorded for `path`.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&OrderingConstraint> {
        self.index.get(path).map(|&position| &self.entries[position])
    }

    /// Discovery position of `path`.
    #[must_use]
    pub fn position(&self, path: &str) -> Option<usize> {
        self.index.get(path).copied()
    }

    /// Whether `path` has an entry.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    /// Number of distinct paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no path was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Constraints in first-discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &OrderingConstraint> {
        self.entries.iter()
    }
}

/// Walk `tree` and collect ordering constraints, pruning cyclic nodes.
///
/// Uses an explicit stack of `(node, next child)` frames so deep trees cannot
/// overflow the call stack; the visiting order is the same as a recursive
/// pre-order walk.
pub fn scan<S: ConsoleSink + ?Sized>(tree: &PackageTree, sink: &S) -> OrderingConstraints {
    let mut constraints = OrderingConstraints::new();
    let mut scanned: HashSet<NodeId> = HashSet::new();
    let mut warned: HashSet<&str> = HashSet::new();
    let mut stack: Vec<(NodeId, usize)> = vec![(tree.root_id(), 0)];

    while let Some(frame) = stack.last_mut() {
        let (parent_id, next_child) = *frame;
        let parent = tree.node(parent_id);

        let Some(&child_id) = parent.dependencies.get(next_child) else {
            stack.pop();
            continue;
        };
        frame.1 += 1;

        let child = tree.node(child_id);
        if child.has_cycle {
            if warned.insert(child.path.as_str()) {
                debug!("Pruning {} from the schedule: dependency cycle", child.path);
                sink.skipped(&SkippedPackage::new(child.path.clone(), SkipReason::Cycle));
            }
            continue;
        }

        let parent_path = (parent_id != tree.root_id()).then_some(parent.path.as_str());
        trace!("{} precedes {}", child.path, parent_path.unwrap_or("(root)"));
        constraints.record(&child.path, parent_path);

        if scanned.insert(child_id) {
            stack.push((child_id, 0));
        }
    }

    debug!("Collected ordering constraints for {} packages", constraints.len());
    constraints
}
