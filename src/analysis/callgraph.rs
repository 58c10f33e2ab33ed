//! Whole-program call graph.
//!
//! Direct calls name their callee; indirect calls (`icall`) are resolved by a
//! [`PointsTo`] strategy. Callees without a body, whether declared in
//! `externs` or not declared at all, become external nodes. Indirect call
//! sites for which the strategy finds no target are kept as unresolved sites
//! so later analyses can treat them conservatively.

use std::collections::{HashMap, HashSet};

use crate::{
    analysis::pointsto::PointsTo,
    ir::{Opcode, Program},
    utils::graph::{algorithms::strongly_connected_components, DirectedGraph, NodeId},
    Result,
};

/// How a call edge was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    /// `call @f`
    Direct,
    /// `icall` resolved by points-to
    Indirect,
}

/// A function in the call graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallNode {
    /// Function name.
    pub name: String,
    /// `false` for functions without a body in the program.
    pub defined: bool,
}

/// A call instruction and the functions it may reach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    /// Index of the instruction in the caller's body, labels excluded.
    pub index: usize,
    /// Direct or indirect.
    pub kind: CallKind,
    /// Possible callees; empty for unresolved indirect calls.
    pub targets: Vec<String>,
}

impl CallSite {
    /// Returns `true` for an indirect call with no known target.
    pub fn is_unresolved(&self) -> bool {
        self.kind == CallKind::Indirect && self.targets.is_empty()
    }
}

/// Call relation between the functions of a program.
#[derive(Debug, Clone)]
pub struct CallGraph {
    graph: DirectedGraph<CallNode, CallKind>,
    index: HashMap<String, NodeId>,
    sites: HashMap<String, Vec<CallSite>>,
    strategy: &'static str,
}

impl CallGraph {
    /// Builds the call graph of `program`, resolving indirect calls with
    /// `points_to`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] for a `call` without a callee or
    /// an `icall` without a function pointer operand.
    pub fn build(program: &Program, points_to: &dyn PointsTo) -> Result<Self> {
        let mut call_graph = CallGraph {
            graph: DirectedGraph::new(),
            index: HashMap::new(),
            sites: HashMap::new(),
            strategy: points_to.name(),
        };
        for function in &program.functions {
            call_graph.intern(&function.name, true);
        }

        let mut seen: HashSet<(NodeId, NodeId, CallKind)> = HashSet::new();
        for function in &program.functions {
            let caller = call_graph.intern(&function.name, true);
            let mut sites = Vec::new();

            for (index, instr) in function.instructions().enumerate() {
                let (kind, targets) = match instr.opcode() {
                    Opcode::Call => {
                        let callee = instr.funcs.first().ok_or_else(|| {
                            malformed_error!(
                                "call without a callee in function '{}'",
                                function.name
                            )
                        })?;
                        (CallKind::Direct, vec![callee.clone()])
                    }
                    Opcode::Icall => {
                        if instr.args.is_empty() {
                            return Err(malformed_error!(
                                "icall without a function pointer in function '{}'",
                                function.name
                            ));
                        }
                        (CallKind::Indirect, points_to.indirect_targets(&function.name, instr))
                    }
                    _ => continue,
                };

                for target in &targets {
                    let defined = program.is_defined(target);
                    if !defined
                        && program.declaration(target).is_none()
                        && !call_graph.index.contains_key(target)
                    {
                        log::warn!(
                            "{}: call to undeclared function '{target}', treating it as external",
                            function.name
                        );
                    }
                    let callee = call_graph.intern(target, defined);
                    if seen.insert((caller, callee, kind)) {
                        call_graph.graph.add_edge(caller, callee, kind)?;
                    }
                }
                if kind == CallKind::Indirect && targets.is_empty() {
                    log::debug!("{}: unresolved indirect call `{instr}`", function.name);
                }
                sites.push(CallSite {
                    index,
                    kind,
                    targets,
                });
            }
            call_graph.sites.insert(function.name.clone(), sites);
        }

        Ok(call_graph)
    }

    fn intern(&mut self, name: &str, defined: bool) -> NodeId {
        if let Some(&node) = self.index.get(name) {
            return node;
        }
        let node = self.graph.add_node(CallNode {
            name: name.to_string(),
            defined,
        });
        self.index.insert(name.to_string(), node);
        node
    }

    /// Name of the points-to strategy that resolved indirect calls.
    pub fn strategy(&self) -> &'static str {
        self.strategy
    }

    /// The underlying graph.
    pub fn graph(&self) -> &DirectedGraph<CallNode, CallKind> {
        &self.graph
    }

    /// Node of the function called `name`.
    pub fn node(&self, name: &str) -> Option<NodeId> {
        self.index.get(name).copied()
    }

    /// Returns `true` if `name` is in the graph without a body.
    pub fn is_external(&self, name: &str) -> bool {
        self.node(name)
            .and_then(|n| self.graph.node(n))
            .is_some_and(|n| !n.defined)
    }

    /// Distinct callees of `name` in edge order.
    pub fn callees(&self, name: &str) -> Vec<&str> {
        let Some(node) = self.node(name) else {
            return Vec::new();
        };
        let mut callees: Vec<&str> = Vec::new();
        for (target, _) in self.graph.outgoing_edges(node) {
            if let Some(callee) = self.graph.node(target) {
                if !callees.contains(&callee.name.as_str()) {
                    callees.push(&callee.name);
                }
            }
        }
        callees
    }

    /// Call sites of a defined function, in body order.
    pub fn call_sites(&self, caller: &str) -> &[CallSite] {
        self.sites.get(caller).map(Vec::as_slice).unwrap_or_default()
    }

    /// The call site at instruction `index` of `caller`.
    pub fn site(&self, caller: &str, index: usize) -> Option<&CallSite> {
        self.call_sites(caller).iter().find(|s| s.index == index)
    }

    /// Every unresolved indirect call as `(caller, instruction index)`.
    pub fn unresolved_sites(&self) -> Vec<(&str, usize)> {
        let mut unresolved: Vec<(&str, usize)> = self
            .sites
            .iter()
            .flat_map(|(caller, sites)| {
                sites
                    .iter()
                    .filter(|s| s.is_unresolved())
                    .map(move |s| (caller.as_str(), s.index))
            })
            .collect();
        unresolved.sort();
        unresolved
    }

    /// Strongly connected components in bottom-up order: every callee's
    /// component comes before its callers'. External functions are included
    /// as singleton components.
    pub fn bottom_up_sccs(&self) -> Vec<Vec<&str>> {
        strongly_connected_components(&self.graph)
            .into_iter()
            .map(|component| {
                component
                    .into_iter()
                    .filter_map(|n| self.graph.node(n).map(|c| c.name.as_str()))
                    .collect()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        analysis::pointsto::{AndersenPointsTo, TrivialPointsTo},
        Error,
    };

    fn program() -> Program {
        serde_json::from_value(serde_json::json!({
            "functions": [
                {"name": "main", "instrs": [
                    {"op": "call", "funcs": ["even"], "args": []},
                    {"op": "call", "funcs": ["even"], "args": []},
                    {"op": "call", "funcs": ["puts"], "args": []},
                    {"op": "fnaddr", "dest": "fp", "type": "fnptr", "funcs": ["leaf"]},
                    {"op": "icall", "args": ["fp"]},
                    {"op": "icall", "dest": "r", "type": "int", "args": ["fp"]}
                ]},
                {"name": "even", "instrs": [{"op": "call", "funcs": ["odd"]}]},
                {"name": "odd", "instrs": [{"op": "call", "funcs": ["even"]}, {"op": "call", "funcs": ["leaf"]}]},
                {"name": "leaf", "instrs": []}
            ],
            "externs": [{"name": "puts"}]
        }))
        .unwrap()
    }

    #[test]
    fn test_direct_edges_and_externals() -> Result<()> {
        let program = program();
        let cg = CallGraph::build(&program, &AndersenPointsTo::solve(&program))?;
        assert_eq!(cg.strategy(), "andersen");
        assert_eq!(cg.callees("main"), vec!["even", "puts", "leaf"]);
        assert!(cg.is_external("puts"));
        assert!(!cg.is_external("leaf"));
        assert_eq!(cg.call_sites("main").len(), 5);
        assert_eq!(cg.site("main", 4).map(|s| s.kind), Some(CallKind::Indirect));
        Ok(())
    }

    #[test]
    fn test_unresolved_indirect_call() -> Result<()> {
        let program = program();
        let cg = CallGraph::build(&program, &AndersenPointsTo::solve(&program))?;
        assert!(cg.unresolved_sites().is_empty());

        // no function returns a value, so the second icall has no match
        let cg = CallGraph::build(&program, &TrivialPointsTo::new(&program))?;
        assert_eq!(cg.unresolved_sites(), vec![("main", 5)]);
        Ok(())
    }

    #[test]
    fn test_bottom_up_order() -> Result<()> {
        let program = program();
        let cg = CallGraph::build(&program, &TrivialPointsTo::new(&program))?;
        let sccs = cg.bottom_up_sccs();
        let position = |name: &str| sccs.iter().position(|c| c.contains(&name)).unwrap();

        assert!(sccs.iter().any(|c| c.len() == 2 && c.contains(&"even") && c.contains(&"odd")));
        assert!(position("leaf") < position("even"));
        assert!(position("even") < position("main"));
        assert!(position("puts") < position("main"));
        Ok(())
    }

    #[test]
    fn test_undeclared_callee_is_external() -> Result<()> {
        let program: Program = serde_json::from_value(serde_json::json!({
            "functions": [{"name": "main", "instrs": [{"op": "call", "funcs": ["mystery"]}]}]
        }))
        .unwrap();
        let cg = CallGraph::build(&program, &TrivialPointsTo::new(&program))?;
        assert!(cg.is_external("mystery"));
        Ok(())
    }

    #[test]
    fn test_call_without_callee_is_malformed() {
        let program: Program = serde_json::from_value(serde_json::json!({
            "functions": [{"name": "main", "instrs": [{"op": "call"}]}]
        }))
        .unwrap();
        let result = CallGraph::build(&program, &TrivialPointsTo::new(&program));
        assert!(matches!(result, Err(Error::Malformed { .. })));
    }
}
