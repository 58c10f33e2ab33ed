//! Conversion of analysis results into [`Renderable`] graphs.
//!
//! Styling follows one scheme across graph kinds: entry nodes are green,
//! exit and escaping nodes red, external functions yellow, contained values
//! blue. Node ids are derived from analysis node indices, never from labels,
//! so arbitrary identifiers in the program cannot collide or break quoting.

use crate::{
    analysis::{
        CallGraph, CallKind, CfgEdgeKind, ControlDependenceGraph, ControlFlowGraph, DominanceKind,
        DominanceTree, EscapeResult, ValueOrigin,
    },
    render::Renderable,
    utils::graph::NodeId,
};

const ENTRY: &str = "lightgreen";
const EXIT: &str = "lightcoral";
const EXTERNAL: &str = "lightyellow";
const CONTAINED: &str = "lightblue";

fn block_style(graph: &mut Renderable) {
    graph.set("fontname", "Courier");
}

fn node_id(node: NodeId) -> String {
    format!("n{}", node.index())
}

/// Renders a control-flow graph with the instructions of every block.
pub fn cfg_renderable(label: &str, cfg: &ControlFlowGraph) -> Renderable {
    let mut graph = Renderable::new(format!("CFG: {label}"));
    block_style(&mut graph);

    for (id, block) in cfg.graph().nodes() {
        let mut text = block.label.clone();
        if id == cfg.entry() {
            text.push_str(" (entry)");
        }
        text.push('\n');
        for instr in &block.instructions {
            text.push_str(&format!("{instr}\n"));
        }
        let node = graph.add_node(node_id(id), text);
        node.attr("shape", "box");
        if id == cfg.entry() {
            node.fill(ENTRY);
        } else if block.is_exit {
            node.fill(EXIT);
        }
    }

    for (source, target, kind) in cfg.graph().edges() {
        let edge = graph.add_edge(node_id(source), node_id(target));
        match kind {
            CfgEdgeKind::True | CfgEdgeKind::False => {
                edge.label(kind.to_string());
            }
            CfgEdgeKind::Return => {
                edge.attr("style", "dashed");
            }
            CfgEdgeKind::Jump | CfgEdgeKind::Fallthrough => {}
        }
    }
    graph
}

/// Renders a control-dependence graph; edges carry the deciding outcome.
pub fn cdg_renderable(label: &str, cdg: &ControlDependenceGraph) -> Renderable {
    let mut graph = Renderable::new(format!("CDG: {label}"));
    for (id, block) in cdg.graph().nodes() {
        let node = graph.add_node(node_id(id), block.as_str());
        if id == NodeId::new(0) {
            node.fill(ENTRY);
        }
    }
    for (source, target, kind) in cdg.graph().edges() {
        graph
            .add_edge(node_id(source), node_id(target))
            .label(kind.to_string());
    }
    graph
}

/// Renders a dominator or post-dominator tree.
pub fn dominance_renderable(label: &str, tree: &DominanceTree) -> Renderable {
    let title = match tree.kind() {
        DominanceKind::Dominators => "Dominator tree",
        DominanceKind::PostDominators => "Post-dominator tree",
    };
    let mut graph = Renderable::new(format!("{title}: {label}"));
    let raw = tree.tree();
    for index in 0..tree.node_count() {
        let node = NodeId::new(index);
        if !raw.contains(node) {
            continue;
        }
        let added = graph.add_node(node_id(node), tree.label(node));
        if node == raw.root() {
            added.fill(ENTRY);
        }
    }
    for (parent, child) in raw.edges() {
        graph.add_edge(node_id(parent), node_id(child));
    }
    graph
}

/// Renders a call graph. Unresolved indirect calls point at a shared
/// `<unresolved>` node.
pub fn callgraph_renderable(label: &str, cg: &CallGraph) -> Renderable {
    let mut graph = Renderable::new(format!("Call graph: {label} ({} points-to)", cg.strategy()));
    for (id, function) in cg.graph().nodes() {
        let node = graph.add_node(node_id(id), function.name.as_str());
        node.attr("shape", "box");
        if !function.defined {
            node.fill(EXTERNAL);
        }
    }
    for (source, target, kind) in cg.graph().edges() {
        let edge = graph.add_edge(node_id(source), node_id(target));
        if *kind == CallKind::Indirect {
            edge.attr("style", "dashed");
        }
    }

    let unresolved = cg.unresolved_sites();
    if !unresolved.is_empty() {
        graph
            .add_node("unresolved", "<unresolved>")
            .attr("shape", "diamond")
            .fill(EXIT);
        let mut callers: Vec<&str> = unresolved.iter().map(|(caller, _)| *caller).collect();
        callers.dedup();
        for caller in callers {
            if let Some(node) = cg.node(caller) {
                graph
                    .add_edge(node_id(node), "unresolved")
                    .attr("style", "dashed")
                    .attr("color", "red");
            }
        }
    }
    graph
}

/// Renders the escape use graph: one cluster per function, a node per
/// tracked value, and an edge from each value to every instruction that uses
/// it. Escaping values and uses are red.
pub fn escape_renderable(label: &str, result: &EscapeResult) -> Renderable {
    let mut graph = Renderable::new(format!("Escape: {label}"));
    graph.set("compound", "true");

    for (fi, function) in result.functions().iter().enumerate() {
        let cluster = format!("cluster_{fi}");
        graph.add_cluster(cluster.as_str(), function.function.as_str());

        for (vi, value) in function.values.iter().enumerate() {
            let value_id = format!("f{fi}v{vi}");
            let origin = match value.origin {
                ValueOrigin::Parameter(i) => format!("param #{i}"),
                ValueOrigin::Allocation => "alloc".to_string(),
            };
            let node = graph.add_node(value_id.as_str(), format!("{}\n{origin}", value.name));
            node.in_cluster(cluster.as_str()).attr("shape", "ellipse");
            node.fill(if value.escapes() { EXIT } else { CONTAINED });

            for (ui, value_use) in value.uses.iter().enumerate() {
                let use_id = format!("{value_id}u{ui}");
                graph
                    .add_node(use_id.as_str(), value_use.instruction.as_str())
                    .in_cluster(cluster.as_str())
                    .attr("shape", "box");
                let edge = graph.add_edge(value_id.as_str(), use_id);
                let mut text = String::new();
                if value_use.via != value.name {
                    text.push_str(&value_use.via);
                }
                if let Some(reason) = &value_use.escape {
                    if !text.is_empty() {
                        text.push_str(": ");
                    }
                    text.push_str(&reason.to_string());
                    edge.attr("color", "red");
                }
                if !text.is_empty() {
                    edge.label(text);
                }
            }
        }
    }
    graph
}
