//! Analysis dispatch.
//!
//! [`dispatch`] maps each [`GraphType`] to the pair of functions that
//! handles it: an [`Adapter`] that builds the named graphs from a
//! [`Module`], and a [`Converter`] that turns one of those graphs into a
//! [`Renderable`]. The table is an exhaustive `match`, so adding a graph
//! type without wiring it up does not compile.
//!
//! ```rust
//! use irview::dispatch::{dispatch, AnalysisOptions, GraphType};
//! use irview::ir::Module;
//!
//! let json = br#"{"functions": [{"name": "main", "instrs": [{"op": "ret"}]}]}"#;
//! let module = Module::from_slice("demo", json, &[])?;
//!
//! let entry = dispatch(GraphType::Domtree);
//! let graphs = (entry.build)(&module, &AnalysisOptions::default())?;
//! let renderable = (entry.convert)(&graphs[0].label, &graphs[0].graph)?;
//! assert_eq!(renderable.name, "Dominator tree: main");
//! # Ok::<(), irview::Error>(())
//! ```

pub mod adapters;

use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::{
    analysis::{
        always_escape, CallGraph, ControlDependenceGraph, ControlFlowGraph, DominanceTree,
        EscapePolicy, EscapeResult, PointsToStrategy,
    },
    ir::{Module, Pass, DEFAULT_PASSES},
    render::{convert, Renderable},
    Error, Result,
};

/// The analyses the tool can draw.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr,
)]
pub enum GraphType {
    /// Control-flow graph, per function
    Cfg,
    /// Control-dependence graph, per function
    Cdg,
    /// Call graph, whole program
    Cg,
    /// Dominator tree, per function
    Domtree,
    /// Post-dominator tree, per function
    Postdomtree,
    /// Escape-analysis use graph, whole program
    Escape,
}

/// Result of one analysis run.
#[derive(Debug, Clone)]
pub enum AnalysisGraph {
    /// See [`GraphType::Cfg`]
    Cfg(ControlFlowGraph),
    /// See [`GraphType::Cdg`]
    Cdg(ControlDependenceGraph),
    /// See [`GraphType::Cg`]
    Cg(CallGraph),
    /// See [`GraphType::Domtree`]
    Domtree(DominanceTree),
    /// See [`GraphType::Postdomtree`]
    Postdomtree(DominanceTree),
    /// See [`GraphType::Escape`]
    Escape(EscapeResult),
}

impl AnalysisGraph {
    /// The graph type that produces this kind of result.
    pub fn graph_type(&self) -> GraphType {
        match self {
            AnalysisGraph::Cfg(_) => GraphType::Cfg,
            AnalysisGraph::Cdg(_) => GraphType::Cdg,
            AnalysisGraph::Cg(_) => GraphType::Cg,
            AnalysisGraph::Domtree(_) => GraphType::Domtree,
            AnalysisGraph::Postdomtree(_) => GraphType::Postdomtree,
            AnalysisGraph::Escape(_) => GraphType::Escape,
        }
    }
}

/// A graph and the label it is rendered under.
#[derive(Debug, Clone)]
pub struct NamedGraph {
    /// Function name for per-function graphs, module name otherwise.
    pub label: String,
    /// The analysis result.
    pub graph: AnalysisGraph,
}

/// Graphs produced by one adapter, in program order.
pub type NamedGraphs = Vec<NamedGraph>;

/// Knobs for the analyses that are not part of the command line.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Passes the loader applies before any analysis.
    pub passes: Vec<Pass>,
    /// Resolution of indirect calls.
    pub points_to: PointsToStrategy,
    /// Escape behaviour of functions without a body.
    pub escape_policy: EscapePolicy,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        AnalysisOptions {
            passes: DEFAULT_PASSES.to_vec(),
            points_to: PointsToStrategy::default(),
            escape_policy: always_escape,
        }
    }
}

/// Builds the named graphs of a module.
pub type Adapter = fn(&Module, &AnalysisOptions) -> Result<NamedGraphs>;

/// Converts one named graph into a renderable.
pub type Converter = fn(&str, &AnalysisGraph) -> Result<Renderable>;

/// The adapter and converter for one graph type.
#[derive(Clone, Copy)]
pub struct Dispatch {
    /// The graph type this entry handles.
    pub graph_type: GraphType,
    /// Construction adapter.
    pub build: Adapter,
    /// Conversion function.
    pub convert: Converter,
}

/// Looks up the handler pair for `graph_type`.
pub fn dispatch(graph_type: GraphType) -> Dispatch {
    let entry = |build: Adapter, convert: Converter| Dispatch {
        graph_type,
        build,
        convert,
    };
    match graph_type {
        GraphType::Cfg => entry(adapters::cfg_graphs, convert_cfg),
        GraphType::Cdg => entry(adapters::cdg_graphs, convert_cdg),
        GraphType::Cg => entry(adapters::cg_graph, convert_cg),
        GraphType::Domtree => entry(adapters::domtree_graphs, convert_domtree),
        GraphType::Postdomtree => entry(adapters::postdomtree_graphs, convert_postdomtree),
        GraphType::Escape => entry(adapters::escape_graph, convert_escape),
    }
}

fn mismatch(expected: GraphType, found: &AnalysisGraph) -> Error {
    Error::GraphKindMismatch {
        expected: expected.into(),
        found: found.graph_type().into(),
    }
}

fn convert_cfg(label: &str, graph: &AnalysisGraph) -> Result<Renderable> {
    match graph {
        AnalysisGraph::Cfg(cfg) => Ok(convert::cfg_renderable(label, cfg)),
        other => Err(mismatch(GraphType::Cfg, other)),
    }
}

fn convert_cdg(label: &str, graph: &AnalysisGraph) -> Result<Renderable> {
    match graph {
        AnalysisGraph::Cdg(cdg) => Ok(convert::cdg_renderable(label, cdg)),
        other => Err(mismatch(GraphType::Cdg, other)),
    }
}

fn convert_cg(label: &str, graph: &AnalysisGraph) -> Result<Renderable> {
    match graph {
        AnalysisGraph::Cg(cg) => Ok(convert::callgraph_renderable(label, cg)),
        other => Err(mismatch(GraphType::Cg, other)),
    }
}

fn convert_domtree(label: &str, graph: &AnalysisGraph) -> Result<Renderable> {
    match graph {
        AnalysisGraph::Domtree(tree) => Ok(convert::dominance_renderable(label, tree)),
        other => Err(mismatch(GraphType::Domtree, other)),
    }
}

fn convert_postdomtree(label: &str, graph: &AnalysisGraph) -> Result<Renderable> {
    match graph {
        AnalysisGraph::Postdomtree(tree) => Ok(convert::dominance_renderable(label, tree)),
        other => Err(mismatch(GraphType::Postdomtree, other)),
    }
}

fn convert_escape(label: &str, graph: &AnalysisGraph) -> Result<Renderable> {
    match graph {
        AnalysisGraph::Escape(result) => Ok(convert::escape_renderable(label, result)),
        other => Err(mismatch(GraphType::Escape, other)),
    }
}
