//! Inter-procedural escape analysis.
//!
//! Tracked values are pointer-typed parameters and the results of `alloc`.
//! A tracked value, or any variable in its alias class, escapes its function
//! when it is
//!
//! - returned,
//! - stored into memory as the value operand of `store`,
//! - passed to a parameter of a defined callee whose summary says that
//!   parameter escapes,
//! - passed to a function without a body at a position the
//!   [`EscapePolicy`] marks as escaping, or
//! - passed to an indirect call with no resolved target.
//!
//! Functions are analysed bottom-up over the strongly connected components of
//! the call graph. Inside a component the per-parameter summaries are
//! recomputed until they stop changing; summaries only ever grow, so this
//! terminates.

use std::{collections::HashMap, fmt};

use crate::{
    analysis::callgraph::CallGraph,
    ir::{Function, Instruction, Module, Opcode},
    Result,
};

/// Decides whether passing a pointer to position `index` of the external
/// function `name` lets it escape.
pub type EscapePolicy = fn(name: &str, index: usize) -> bool;

/// The conservative policy: every argument of an external function escapes.
pub fn always_escape(_name: &str, _index: usize) -> bool {
    true
}

/// Where a tracked value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueOrigin {
    /// The parameter at this position.
    Parameter(usize),
    /// The result of an `alloc`.
    Allocation,
}

/// Why a use lets a value escape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscapeReason {
    /// Returned to the caller.
    Returned,
    /// Written to memory.
    Stored,
    /// Passed to `callee` at argument `position`.
    PassedTo {
        /// The receiving function.
        callee: String,
        /// Zero-based argument position.
        position: usize,
    },
    /// Passed to an indirect call without known targets.
    UnresolvedCall,
}

impl fmt::Display for EscapeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EscapeReason::Returned => f.write_str("returned"),
            EscapeReason::Stored => f.write_str("stored"),
            EscapeReason::PassedTo { callee, position } => {
                write!(f, "passed to @{callee} #{position}")
            }
            EscapeReason::UnresolvedCall => f.write_str("unresolved call"),
        }
    }
}

/// One instruction that uses a tracked value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueUse {
    /// The using instruction, in text form.
    pub instruction: String,
    /// The variable through which the value is used.
    pub via: String,
    /// Set if this use lets the value escape.
    pub escape: Option<EscapeReason>,
}

/// A parameter or allocation and everything that happens to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedValue {
    /// Variable name.
    pub name: String,
    /// Parameter or allocation.
    pub origin: ValueOrigin,
    /// Uses in body order.
    pub uses: Vec<ValueUse>,
}

impl TrackedValue {
    /// The first reason the value escapes, if any.
    pub fn escape_reason(&self) -> Option<&EscapeReason> {
        self.uses.iter().find_map(|u| u.escape.as_ref())
    }

    /// Returns `true` if any use lets the value escape.
    pub fn escapes(&self) -> bool {
        self.escape_reason().is_some()
    }
}

/// Escape facts of one function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionEscape {
    /// Function name.
    pub function: String,
    /// Tracked values: pointer parameters first, then allocations.
    pub values: Vec<TrackedValue>,
    /// For each parameter, whether it escapes. Non-pointer parameters never
    /// do.
    pub escaping_params: Vec<bool>,
}

impl FunctionEscape {
    /// Looks up a tracked value by name.
    pub fn value(&self, name: &str) -> Option<&TrackedValue> {
        self.values.iter().find(|v| v.name == name)
    }
}

/// Escape facts of a whole module, in program order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscapeResult {
    module: String,
    functions: Vec<FunctionEscape>,
}

impl EscapeResult {
    /// Name of the analysed module.
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Per-function facts, in program order.
    pub fn functions(&self) -> &[FunctionEscape] {
        &self.functions
    }

    /// Facts of a single function.
    pub fn function(&self, name: &str) -> Option<&FunctionEscape> {
        self.functions.iter().find(|f| f.function == name)
    }

    /// Whether the tracked value `value` of `function` escapes; `None` if
    /// no such value is tracked.
    pub fn escapes(&self, function: &str, value: &str) -> Option<bool> {
        self.function(function)?.value(value).map(TrackedValue::escapes)
    }

    /// Whether parameter `index` of `function` escapes.
    pub fn parameter_escapes(&self, function: &str, index: usize) -> bool {
        self.function(function)
            .and_then(|f| f.escaping_params.get(index).copied())
            .unwrap_or(false)
    }
}

/// Runs the escape analysis.
pub struct EscapeAnalysis<'a> {
    module: &'a Module,
    call_graph: &'a CallGraph,
    policy: EscapePolicy,
    summaries: HashMap<String, Vec<bool>>,
}

impl<'a> EscapeAnalysis<'a> {
    /// Analyses every defined function of `module`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnknownFunction`] if the call graph names a
    /// defined function the module does not have, which means the two were
    /// built from different programs.
    pub fn run(
        module: &'a Module,
        call_graph: &'a CallGraph,
        policy: EscapePolicy,
    ) -> Result<EscapeResult> {
        let mut analysis = EscapeAnalysis {
            module,
            call_graph,
            policy,
            summaries: module
                .functions()
                .iter()
                .map(|f| (f.name.clone(), vec![false; f.args.len()]))
                .collect(),
        };

        let mut facts: HashMap<String, FunctionEscape> = HashMap::new();
        for component in call_graph.bottom_up_sccs() {
            let members: Vec<&Function> = component
                .iter()
                .filter(|name| !call_graph.is_external(name))
                .map(|name| module.function(name))
                .collect::<Result<_>>()?;
            if members.is_empty() {
                continue;
            }

            let mut rounds = 0usize;
            loop {
                rounds += 1;
                let mut changed = false;
                for function in &members {
                    let result = analysis.analyse(function);
                    if analysis.summaries.get(&function.name) != Some(&result.escaping_params) {
                        analysis
                            .summaries
                            .insert(function.name.clone(), result.escaping_params.clone());
                        changed = true;
                    }
                    facts.insert(function.name.clone(), result);
                }
                if !changed {
                    break;
                }
            }
            if members.len() > 1 {
                log::debug!(
                    "escape summaries for {} mutually recursive function(s) stable after {rounds} round(s)",
                    members.len()
                );
            }
        }

        let functions = module
            .functions()
            .iter()
            .filter_map(|f| facts.remove(&f.name))
            .collect();
        Ok(EscapeResult {
            module: module.name().to_string(),
            functions,
        })
    }

    fn analyse(&self, function: &Function) -> FunctionEscape {
        let aliases = self.module.aliases(&function.name);
        let types = function.variable_types();

        let mut values: Vec<TrackedValue> = Vec::new();
        for (i, arg) in function.args.iter().enumerate() {
            if arg.ty.is_pointer() {
                values.push(TrackedValue {
                    name: arg.name.clone(),
                    origin: ValueOrigin::Parameter(i),
                    uses: Vec::new(),
                });
            }
        }
        for instr in function.instructions() {
            if instr.opcode() != Opcode::Alloc {
                continue;
            }
            let Some(dest) = &instr.dest else { continue };
            if values.iter().all(|v| &v.name != dest) {
                values.push(TrackedValue {
                    name: dest.clone(),
                    origin: ValueOrigin::Allocation,
                    uses: Vec::new(),
                });
            }
        }

        for (site, instr) in function.instructions().enumerate() {
            for (position, arg) in instr.args.iter().enumerate() {
                // Non-pointer operands cannot carry a tracked value.
                if types.get(arg.as_str()).is_some_and(|t| !t.is_pointer()) {
                    continue;
                }
                for value in values.iter_mut() {
                    if !aliases.same_class(arg, &value.name) {
                        continue;
                    }
                    let escape = self.classify(function, site, instr, position);
                    value.uses.push(ValueUse {
                        instruction: instr.to_string(),
                        via: arg.clone(),
                        escape,
                    });
                }
            }
        }

        let escaping_params = (0..function.args.len())
            .map(|i| {
                values
                    .iter()
                    .any(|v| v.origin == ValueOrigin::Parameter(i) && v.escapes())
            })
            .collect();

        FunctionEscape {
            function: function.name.clone(),
            values,
            escaping_params,
        }
    }

    fn classify(
        &self,
        function: &Function,
        site: usize,
        instr: &Instruction,
        position: usize,
    ) -> Option<EscapeReason> {
        match instr.opcode() {
            Opcode::Ret => Some(EscapeReason::Returned),
            Opcode::Store if position == 1 => Some(EscapeReason::Stored),
            Opcode::Call => {
                let callee = instr.funcs.first()?;
                self.passed_to(callee, position)
            }
            Opcode::Icall if position > 0 => {
                let targets = self
                    .call_graph
                    .site(&function.name, site)
                    .map(|s| s.targets.as_slice())
                    .unwrap_or_default();
                if targets.is_empty() {
                    return Some(EscapeReason::UnresolvedCall);
                }
                targets
                    .iter()
                    .find_map(|callee| self.passed_to(callee, position - 1))
            }
            _ => None,
        }
    }

    fn passed_to(&self, callee: &str, position: usize) -> Option<EscapeReason> {
        let escapes = match self.summaries.get(callee) {
            Some(summary) => summary.get(position).copied().unwrap_or(false),
            None => (self.policy)(callee, position),
        };
        escapes.then(|| EscapeReason::PassedTo {
            callee: callee.to_string(),
            position,
        })
    }
}
