//! Trait definitions for graph abstractions.
//!
//! Algorithms in [`super::algorithms`] are written against these traits so
//! that they work on a [`DirectedGraph`](super::DirectedGraph), on a
//! [`Reversed`] view of one, or on any analysis graph that exposes its
//! adjacency.
//!
//! - [`GraphBase`] - node count and node iteration
//! - [`Successors`] - outgoing adjacency
//! - [`Predecessors`] - incoming adjacency

use crate::utils::graph::NodeId;

/// Core graph properties.
pub trait GraphBase {
    /// Number of nodes. Node identifiers are `0..node_count()`.
    fn node_count(&self) -> usize;

    /// Iterates every node identifier.
    fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.node_count()).map(NodeId::new)
    }
}

/// Forward traversal.
pub trait Successors: GraphBase {
    /// Nodes reachable from `node` over one edge.
    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId>;
}

/// Backward traversal.
pub trait Predecessors: GraphBase {
    /// Nodes with an edge into `node`.
    fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId>;
}

/// A view of a graph with every edge reversed.
///
/// Running the dominator algorithm on a reversed control-flow graph rooted
/// at its exit yields post-dominators.
#[derive(Debug, Clone, Copy)]
pub struct Reversed<'g, G>(pub &'g G);

impl<G: GraphBase> GraphBase for Reversed<'_, G> {
    fn node_count(&self) -> usize {
        self.0.node_count()
    }
}

impl<G: Predecessors> Successors for Reversed<'_, G> {
    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.0.predecessors(node)
    }
}

impl<G: Successors> Predecessors for Reversed<'_, G> {
    fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.0.successors(node)
    }
}
