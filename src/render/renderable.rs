//! Backend-neutral graph description.

use std::collections::BTreeMap;

use serde::Serialize;

/// A graph ready to be emitted by a [`Backend`](super::Backend) or dumped as
/// JSON.
///
/// Element order is significant: backends emit nodes, clusters and edges in
/// the order they were added, so a renderable built from the same analysis
/// result always produces the same output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Renderable {
    /// Graph title, also used to name output files.
    pub name: String,
    /// Graph-level attributes (`label`, `rankdir`, ...).
    pub graph_attributes: BTreeMap<String, String>,
    /// Nodes in insertion order.
    pub nodes: Vec<RenderNode>,
    /// Edges in insertion order.
    pub edges: Vec<RenderEdge>,
    /// Node groups drawn as boxes.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub clusters: Vec<RenderCluster>,
}

/// A node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderNode {
    /// Identifier, unique within the graph.
    pub id: String,
    /// Display text; may span several lines.
    pub label: String,
    /// Extra attributes (`fillcolor`, `shape`, ...).
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    /// Id of the enclosing cluster.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,
}

/// A directed edge between two node ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderEdge {
    /// Source node id.
    pub source: String,
    /// Target node id.
    pub target: String,
    /// Optional edge text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Extra attributes (`style`, `color`, ...).
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

/// A named group of nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderCluster {
    /// Identifier, unique within the graph.
    pub id: String,
    /// Title drawn on the cluster box.
    pub label: String,
}

impl Renderable {
    /// Creates an empty graph titled `name`.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut graph_attributes = BTreeMap::new();
        graph_attributes.insert("label".to_string(), name.clone());
        graph_attributes.insert("labelloc".to_string(), "t".to_string());
        Renderable {
            name,
            graph_attributes,
            ..Renderable::default()
        }
    }

    /// Sets a graph attribute.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        self.graph_attributes.insert(key.to_string(), value.into());
        self
    }

    /// Appends a node and returns it for further styling.
    pub fn add_node(&mut self, id: impl Into<String>, label: impl Into<String>) -> &mut RenderNode {
        self.nodes.push(RenderNode {
            id: id.into(),
            label: label.into(),
            attributes: BTreeMap::new(),
            cluster: None,
        });
        let last = self.nodes.len() - 1;
        &mut self.nodes[last]
    }

    /// Appends an edge and returns it for further styling.
    pub fn add_edge(&mut self, source: impl Into<String>, target: impl Into<String>) -> &mut RenderEdge {
        self.edges.push(RenderEdge {
            source: source.into(),
            target: target.into(),
            label: None,
            attributes: BTreeMap::new(),
        });
        let last = self.edges.len() - 1;
        &mut self.edges[last]
    }

    /// Appends a cluster.
    pub fn add_cluster(&mut self, id: impl Into<String>, label: impl Into<String>) {
        self.clusters.push(RenderCluster {
            id: id.into(),
            label: label.into(),
        });
    }

    /// Finds a node by id.
    pub fn node(&self, id: &str) -> Option<&RenderNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

impl RenderNode {
    /// Sets an attribute.
    pub fn attr(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    /// Places the node in a cluster.
    pub fn in_cluster(&mut self, cluster: impl Into<String>) -> &mut Self {
        self.cluster = Some(cluster.into());
        self
    }

    /// Fills the node with `color`.
    pub fn fill(&mut self, color: &str) -> &mut Self {
        self.attr("style", "filled").attr("fillcolor", color)
    }
}

impl RenderEdge {
    /// Sets the edge text.
    pub fn label(&mut self, label: impl Into<String>) -> &mut Self {
        self.label = Some(label.into());
        self
    }

    /// Sets an attribute.
    pub fn attr(&mut self, key: &str, value: impl Into<String>) -> &mut Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }
}
