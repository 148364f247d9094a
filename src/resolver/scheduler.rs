//! Stable topological ordering of install paths.
//!
//! Every recorded path becomes a graph node whose index equals its discovery
//! position, with an edge from each dependency to the packages requiring it.
//! Kahn's algorithm then emits nodes whose dependencies are all done, always
//! picking the lowest discovery index among the ready ones, so the same tree
//! produces the same order on every run.

use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use tracing::debug;

use super::dependency_graph::OrderingConstraints;
use crate::core::AllowScriptsError;

/// Order `constraints` so every path precedes all paths that require it.
///
/// Fails with [`AllowScriptsError::CircularDependency`] when the constraints
/// contain a cycle; cyclic packages are pruned before scheduling, so this
/// indicates a bug upstream rather than a property of the project.
pub fn order(constraints: &OrderingConstraints) -> Result<Vec<String>, AllowScriptsError> {
    let mut graph: DiGraph<&str, ()> = DiGraph::with_capacity(constraints.len(), 0);
    for constraint in constraints.iter() {
        graph.add_node(constraint.path.as_str());
    }

    for (position, constraint) in constraints.iter().enumerate() {
        for parent in &constraint.required_by {
            // Parents outside the constraint set impose nothing
            if let Some(parent_position) = constraints.position(parent) {
                graph.add_edge(NodeIndex::new(position), NodeIndex::new(parent_position), ());
            }
        }
    }

    let mut in_degree: Vec<usize> = graph
        .node_indices()
        .map(|node| graph.neighbors_directed(node, Direction::Incoming).count())
        .collect();

    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, degree)| **degree == 0)
        .map(|(position, _)| Reverse(position))
        .collect();

    let mut ordered = Vec::with_capacity(graph.node_count());
    while let Some(Reverse(position)) = ready.pop() {
        let node = NodeIndex::new(position);
        ordered.push(graph[node].to_string());

        for dependent in graph.neighbors_directed(node, Direction::Outgoing) {
            let degree = &mut in_degree[dependent.index()];
            *degree -= 1;
            if *degree == 0 {
                ready.push(Reverse(dependent.index()));
            }
        }
    }

    if ordered.len() != graph.node_count() {
        let chain = tarjan_scc(&graph)
            .into_iter()
            .find(|component| {
                component.len() > 1
                    || component.iter().any(|&node| graph.contains_edge(node, node))
            })
            .map(|component| {
                let mut paths: Vec<&str> = component.iter().map(|&node| graph[node]).collect();
                paths.sort_unstable();
                paths.join(" -> ")
            })
            .unwrap_or_default();
        return Err(AllowScriptsError::CircularDependency {
            chain,
        });
    }

    debug!("Scheduled {} packages", ordered.len());
    Ok(ordered)
}
