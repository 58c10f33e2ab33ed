//! Graph algorithms used by the analyses.
//!
//! - [`postorder`] / [`reverse_postorder`] - depth-first orderings
//! - [`compute_dominators`] - immediate dominators of a rooted graph
//! - [`strongly_connected_components`] - Tarjan SCCs in bottom-up order

mod dominators;
mod scc;
mod traversal;

pub use dominators::{compute_dominators, DominatorTree};
pub use scc::strongly_connected_components;
pub use traversal::{postorder, reverse_postorder};
