//! Translation of a [`Renderable`] into the `graphviz_rust` DOT AST.

use std::collections::BTreeMap;

use graphviz_rust::{
    dot_structures::{
        Attribute, Edge, EdgeTy, Graph, GraphAttributes, Id, Node, NodeId, Stmt, Subgraph, Vertex,
    },
    printer::PrinterContext,
};

use crate::{render::Renderable, utils::quote_dot};

fn id(text: &str) -> Id {
    Id::Escaped(quote_dot(text))
}

fn attribute(key: &str, value: &str) -> Attribute {
    Attribute(Id::Plain(key.to_string()), id(value))
}

fn attributes(map: &BTreeMap<String, String>) -> Vec<Attribute> {
    map.iter().map(|(k, v)| attribute(k, v)).collect()
}

fn vertex(node: &str) -> Vertex {
    Vertex::N(NodeId(id(node), None))
}

/// Builds the DOT graph for `graph`.
///
/// Nodes that name a cluster are emitted inside a `subgraph cluster_*`
/// block; everything else goes to the top level. Multi-line labels are
/// left-justified.
pub fn to_graph(graph: &Renderable) -> Graph {
    let mut stmts = vec![
        Stmt::GAttribute(GraphAttributes::Graph(attributes(&graph.graph_attributes))),
        Stmt::GAttribute(GraphAttributes::Node(vec![
            attribute("fontname", "Courier"),
            attribute("fontsize", "10"),
        ])),
        Stmt::GAttribute(GraphAttributes::Edge(vec![
            attribute("fontname", "Courier"),
            attribute("fontsize", "9"),
        ])),
    ];

    let node_stmt = |node: &crate::render::RenderNode| {
        let mut attrs = vec![attribute("label", &node.label)];
        attrs.extend(attributes(&node.attributes));
        Stmt::Node(Node::new(NodeId(id(&node.id), None), attrs))
    };

    for node in graph.nodes.iter().filter(|n| n.cluster.is_none()) {
        stmts.push(node_stmt(node));
    }

    for cluster in &graph.clusters {
        let mut inner = vec![Stmt::Attribute(attribute("label", &cluster.label))];
        inner.extend(
            graph
                .nodes
                .iter()
                .filter(|n| n.cluster.as_deref() == Some(cluster.id.as_str()))
                .map(node_stmt),
        );
        stmts.push(Stmt::Subgraph(Subgraph {
            id: id(&cluster.id),
            stmts: inner,
        }));
    }

    for edge in &graph.edges {
        let mut attrs = Vec::new();
        if let Some(label) = &edge.label {
            attrs.push(attribute("label", label));
        }
        attrs.extend(attributes(&edge.attributes));
        stmts.push(Stmt::Edge(Edge {
            ty: EdgeTy::Pair(vertex(&edge.source), vertex(&edge.target)),
            attributes: attrs,
        }));
    }

    Graph::DiGraph {
        id: id(&graph.name),
        strict: false,
        stmts,
    }
}

/// Prints `graph` as DOT text.
pub fn to_dot(graph: &Renderable) -> String {
    graphviz_rust::print(to_graph(graph), &mut PrinterContext::default())
}
