//! Control dependence.
//!
//! Block `b` is control dependent on block `a` when `a` has a successor from
//! which every path to the exit passes through `b`, while `a` itself does not
//! have `b` as a post-dominator. Equivalently, `a` decides whether `b` runs.
//!
//! For each CFG edge `a -> s` where `s` does not post-dominate `a`, every
//! block on the post-dominator tree path from `s` up to (excluding) the
//! immediate post-dominator of `a` depends on `a`.

use std::collections::HashSet;

use crate::{
    analysis::cfg::{CfgEdgeKind, ControlFlowGraph},
    utils::graph::{algorithms::compute_dominators, DirectedGraph, NodeId, Reversed},
    Result,
};

/// Control-dependence graph of one function.
///
/// Nodes are the real blocks of the function (the synthetic exit is left
/// out); an edge `a -> b` labelled with the branch outcome means `b` runs
/// only if `a` takes that outcome.
#[derive(Debug, Clone)]
pub struct ControlDependenceGraph {
    function: String,
    graph: DirectedGraph<String, CfgEdgeKind>,
}

impl ControlDependenceGraph {
    /// Derives control dependences from `cfg` and its post-dominator tree.
    ///
    /// # Errors
    ///
    /// Only fails if the underlying graph rejects an edge, which cannot
    /// happen for node ids taken from `cfg`.
    pub fn build(cfg: &ControlFlowGraph) -> Result<Self> {
        let exit = cfg.exit();
        let post = compute_dominators(&Reversed(cfg), exit);

        let mut graph = DirectedGraph::new();
        for label in cfg.labels().into_iter().take(cfg.block_count()) {
            graph.add_node(label);
        }

        let mut seen: HashSet<(NodeId, NodeId, CfgEdgeKind)> = HashSet::new();
        for (source, target, kind) in cfg.graph().edges() {
            if source == exit || post.dominates(target, source) {
                continue;
            }
            let stop = post.immediate_dominator(source);
            let mut runner = Some(target);
            while let Some(node) = runner {
                if Some(node) == stop || node == exit {
                    break;
                }
                if seen.insert((source, node, *kind)) {
                    graph.add_edge(source, node, *kind)?;
                }
                runner = post.immediate_dominator(node);
            }
        }

        Ok(ControlDependenceGraph {
            function: cfg.function().to_string(),
            graph,
        })
    }

    /// Name of the analysed function.
    pub fn function(&self) -> &str {
        &self.function
    }

    /// The underlying graph; node data are block labels.
    pub fn graph(&self) -> &DirectedGraph<String, CfgEdgeKind> {
        &self.graph
    }

    /// Blocks that `label` is control dependent on, with the deciding
    /// outcome.
    pub fn controllers(&self, label: &str) -> Vec<(&str, CfgEdgeKind)> {
        let Some((node, _)) = self.graph.nodes().find(|(_, l)| *l == label) else {
            return Vec::new();
        };
        self.graph
            .incoming_edges(node)
            .filter_map(|(source, kind)| self.graph.node(source).map(|l| (l.as_str(), *kind)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ir::Program, utils::graph::GraphBase};

    fn build(instrs: serde_json::Value) -> ControlDependenceGraph {
        let program: Program = serde_json::from_value(serde_json::json!({"functions": [{
            "name": "f",
            "args": [{"name": "c", "type": "bool"}],
            "instrs": instrs
        }]}))
        .unwrap();
        let cfg = ControlFlowGraph::build(&program.functions[0]).unwrap();
        ControlDependenceGraph::build(&cfg).unwrap()
    }

    #[test]
    fn test_if_then_else_dependences() {
        let cdg = build(serde_json::json!([
            {"label": "top"},
            {"op": "br", "args": ["c"], "labels": ["then", "else"]},
            {"label": "then"},
            {"op": "jmp", "labels": ["join"]},
            {"label": "else"},
            {"op": "jmp", "labels": ["join"]},
            {"label": "join"},
            {"op": "ret"}
        ]));
        assert_eq!(cdg.graph().node_count(), 4);
        assert_eq!(cdg.controllers("then"), vec![("top", CfgEdgeKind::True)]);
        assert_eq!(cdg.controllers("else"), vec![("top", CfgEdgeKind::False)]);
        assert!(cdg.controllers("join").is_empty());
        assert!(cdg.controllers("top").is_empty());
    }

    #[test]
    fn test_loop_header_depends_on_itself() {
        let cdg = build(serde_json::json!([
            {"label": "head"},
            {"op": "br", "args": ["c"], "labels": ["body", "done"]},
            {"label": "body"},
            {"op": "jmp", "labels": ["head"]},
            {"label": "done"},
            {"op": "ret"}
        ]));
        assert_eq!(cdg.controllers("body"), vec![("head", CfgEdgeKind::True)]);
        assert_eq!(cdg.controllers("head"), vec![("head", CfgEdgeKind::True)]);
        assert!(cdg.controllers("done").is_empty());
    }

    #[test]
    fn test_straight_line_has_no_dependences() {
        let cdg = build(serde_json::json!([{"op": "nop"}, {"op": "ret"}]));
        assert_eq!(cdg.graph().edge_count(), 0);
        assert!(cdg.controllers("missing").is_empty());
    }
}
