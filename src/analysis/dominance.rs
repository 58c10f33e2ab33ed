//! Dominator and post-dominator trees over a control-flow graph.

use crate::{
    analysis::cfg::ControlFlowGraph,
    utils::graph::{algorithms::compute_dominators, algorithms::DominatorTree, NodeId, Reversed},
};

/// Which relation a [`DominanceTree`] holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DominanceKind {
    /// Rooted at the entry block.
    Dominators,
    /// Rooted at the synthetic exit, computed on the reversed graph.
    PostDominators,
}

/// A (post-)dominator tree of one function, keyed by block label.
///
/// The block labels are copied out of the control-flow graph, so the tree can
/// be rendered without keeping the graph alive.
#[derive(Debug, Clone)]
pub struct DominanceTree {
    function: String,
    kind: DominanceKind,
    labels: Vec<String>,
    tree: DominatorTree,
}

impl DominanceTree {
    /// Dominator tree rooted at the entry block.
    pub fn forward(cfg: &ControlFlowGraph) -> Self {
        DominanceTree {
            function: cfg.function().to_string(),
            kind: DominanceKind::Dominators,
            labels: cfg.labels(),
            tree: compute_dominators(cfg, cfg.entry()),
        }
    }

    /// Post-dominator tree rooted at the synthetic exit.
    ///
    /// Blocks that cannot reach the exit (infinite loops) are left out.
    pub fn post(cfg: &ControlFlowGraph) -> Self {
        DominanceTree {
            function: cfg.function().to_string(),
            kind: DominanceKind::PostDominators,
            labels: cfg.labels(),
            tree: compute_dominators(&Reversed(cfg), cfg.exit()),
        }
    }

    /// Name of the analysed function.
    pub fn function(&self) -> &str {
        &self.function
    }

    /// Which relation this tree holds.
    pub fn kind(&self) -> DominanceKind {
        self.kind
    }

    /// The raw tree over control-flow node ids.
    pub fn tree(&self) -> &DominatorTree {
        &self.tree
    }

    /// Number of control-flow nodes, including those outside the tree.
    pub fn node_count(&self) -> usize {
        self.labels.len()
    }

    /// Label of a control-flow node.
    pub fn label(&self, node: NodeId) -> &str {
        self.labels.get(node.index()).map_or("", String::as_str)
    }

    /// Label of the root block.
    pub fn root_label(&self) -> &str {
        self.label(self.tree.root())
    }

    /// Labels of the nodes that are part of the tree, in node order.
    pub fn members(&self) -> Vec<&str> {
        (0..self.labels.len())
            .map(NodeId::new)
            .filter(|&n| self.tree.contains(n))
            .map(|n| self.label(n))
            .collect()
    }

    /// Immediate (post-)dominator of the block called `label`.
    pub fn parent_of(&self, label: &str) -> Option<&str> {
        let node = self.labels.iter().position(|l| l == label)?;
        self.tree
            .immediate_dominator(NodeId::new(node))
            .map(|parent| self.label(parent))
    }

    /// Tree edges as `(parent, child)` label pairs.
    pub fn edges(&self) -> Vec<(&str, &str)> {
        self.tree
            .edges()
            .map(|(parent, child)| (self.label(parent), self.label(child)))
            .collect()
    }
}
