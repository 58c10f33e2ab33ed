//! Generic directed graph infrastructure for program analysis.
//!
//! Every graph the analyses build (control-flow graphs, call graphs, the
//! use graphs of the escape analysis) is a [`DirectedGraph`] with its own node
//! and edge payloads. Algorithms take the adjacency traits rather than a
//! concrete graph, so the same dominator code serves both the forward and
//! the [`Reversed`] control-flow graph.
//!
//! # Key Components
//!
//! - [`NodeId`] / [`EdgeId`] - dense, strongly-typed identifiers
//! - [`DirectedGraph`] - adjacency-list graph with payloads
//! - [`GraphBase`], [`Successors`], [`Predecessors`] - adjacency traits
//! - [`Reversed`] - edge-reversed view
//! - [`algorithms`] - traversal orders, dominators, SCCs

mod directed;
mod edge;
mod node;
mod traits;

pub mod algorithms;

pub use directed::DirectedGraph;
pub use edge::EdgeId;
pub use node::NodeId;
pub use traits::{GraphBase, Predecessors, Reversed, Successors};
