//! Graph construction adapters, one per [`GraphType`](super::GraphType).
//!
//! Per-function adapters build every function's graph independently in
//! parallel over the read-only module and collect the results in program
//! order; the first error aborts the whole collection. Whole-program
//! adapters produce a single entry labelled with the module name.

use rayon::prelude::*;

use crate::{
    analysis::{
        CallGraph, ControlDependenceGraph, ControlFlowGraph, DominanceTree, EscapeAnalysis,
    },
    dispatch::{AnalysisGraph, AnalysisOptions, NamedGraph, NamedGraphs},
    ir::{Function, Module},
    Result,
};

fn per_function<F>(module: &Module, build: F) -> Result<NamedGraphs>
where
    F: Fn(&Function) -> Result<AnalysisGraph> + Sync,
{
    module
        .functions()
        .par_iter()
        .map(|function| {
            log::debug!("building graph for '{}'", function.name);
            Ok(NamedGraph {
                label: function.name.clone(),
                graph: build(function)?,
            })
        })
        .collect()
}

fn whole_program(module: &Module, graph: AnalysisGraph) -> NamedGraphs {
    vec![NamedGraph {
        label: module.name().to_string(),
        graph,
    }]
}

fn call_graph_of(module: &Module, options: &AnalysisOptions) -> Result<CallGraph> {
    let points_to = options.points_to.run(module.program());
    let call_graph = CallGraph::build(module.program(), points_to.as_ref())?;
    let unresolved = call_graph.unresolved_sites();
    if !unresolved.is_empty() {
        log::warn!(
            "{} indirect call(s) left unresolved by {} points-to",
            unresolved.len(),
            points_to.name()
        );
    }
    Ok(call_graph)
}

/// One control-flow graph per function.
pub fn cfg_graphs(module: &Module, _options: &AnalysisOptions) -> Result<NamedGraphs> {
    per_function(module, |f| ControlFlowGraph::build(f).map(AnalysisGraph::Cfg))
}

/// One control-dependence graph per function.
pub fn cdg_graphs(module: &Module, _options: &AnalysisOptions) -> Result<NamedGraphs> {
    per_function(module, |f| {
        let cfg = ControlFlowGraph::build(f)?;
        ControlDependenceGraph::build(&cfg).map(AnalysisGraph::Cdg)
    })
}

/// The call graph of the whole module.
pub fn cg_graph(module: &Module, options: &AnalysisOptions) -> Result<NamedGraphs> {
    let call_graph = call_graph_of(module, options)?;
    Ok(whole_program(module, AnalysisGraph::Cg(call_graph)))
}

/// One dominator tree per function.
pub fn domtree_graphs(module: &Module, _options: &AnalysisOptions) -> Result<NamedGraphs> {
    per_function(module, |f| {
        let cfg = ControlFlowGraph::build(f)?;
        Ok(AnalysisGraph::Domtree(DominanceTree::forward(&cfg)))
    })
}

/// One post-dominator tree per function.
pub fn postdomtree_graphs(module: &Module, _options: &AnalysisOptions) -> Result<NamedGraphs> {
    per_function(module, |f| {
        let cfg = ControlFlowGraph::build(f)?;
        Ok(AnalysisGraph::Postdomtree(DominanceTree::post(&cfg)))
    })
}

/// The escape use graph of the whole module.
pub fn escape_graph(module: &Module, options: &AnalysisOptions) -> Result<NamedGraphs> {
    let call_graph = call_graph_of(module, options)?;
    let result = EscapeAnalysis::run(module, &call_graph, options.escape_policy)?;
    Ok(whole_program(module, AnalysisGraph::Escape(result)))
}
