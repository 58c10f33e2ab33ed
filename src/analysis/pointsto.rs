//! Points-to strategies used to resolve indirect calls.
//!
//! The call graph asks a [`PointsTo`] implementation which functions an
//! `icall` may reach. Two strategies are provided:
//!
//! - [`TrivialPointsTo`]: any function (defined or declared) whose arity and
//!   return-ness match the call site.
//! - [`AndersenPointsTo`]: inclusion-based, flow- and context-insensitive
//!   analysis over variables, allocation sites and return values, solved to a
//!   fixpoint.

use std::collections::{BTreeSet, HashMap};

use strum::{Display, EnumIter, EnumString};

use crate::ir::{Function, Instruction, Opcode, Program};

/// Resolves the possible targets of indirect calls.
pub trait PointsTo: Send + Sync {
    /// Short strategy name, used in logs.
    fn name(&self) -> &'static str;

    /// Functions that the `icall` instruction `call` inside `caller` may
    /// invoke, sorted by name. An empty result means the call is unresolved.
    fn indirect_targets(&self, caller: &str, call: &Instruction) -> Vec<String>;
}

/// Selects a [`PointsTo`] implementation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum PointsToStrategy {
    /// Signature matching.
    #[default]
    Trivial,
    /// Inclusion-based analysis.
    Andersen,
}

impl PointsToStrategy {
    /// Runs the strategy over `program`.
    pub fn run(self, program: &Program) -> Box<dyn PointsTo> {
        match self {
            PointsToStrategy::Trivial => Box::new(TrivialPointsTo::new(program)),
            PointsToStrategy::Andersen => Box::new(AndersenPointsTo::solve(program)),
        }
    }
}

/// Resolves an indirect call to every function with a matching signature.
#[derive(Debug, Clone)]
pub struct TrivialPointsTo {
    signatures: Vec<(String, usize, bool)>,
}

impl TrivialPointsTo {
    /// Collects the signatures of `program`.
    pub fn new(program: &Program) -> Self {
        TrivialPointsTo {
            signatures: program
                .signatures()
                .into_iter()
                .map(|s| (s.name.to_string(), s.arity, s.returns))
                .collect(),
        }
    }
}

impl PointsTo for TrivialPointsTo {
    fn name(&self) -> &'static str {
        "trivial"
    }

    fn indirect_targets(&self, _caller: &str, call: &Instruction) -> Vec<String> {
        let arity = call.args.len().saturating_sub(1);
        let returns = call.dest.is_some();
        let mut targets: Vec<String> = self
            .signatures
            .iter()
            .filter(|(_, a, r)| *a == arity && *r == returns)
            .map(|(name, _, _)| name.clone())
            .collect();
        targets.sort();
        targets
    }
}

/// An abstract memory location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Location {
    /// The code of a function, produced by `fnaddr`.
    Function(String),
    /// Memory returned by the `site`-th instruction of `function`.
    Alloc {
        /// Allocating function.
        function: String,
        /// Instruction index within the function body, labels excluded.
        site: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Key {
    Var(String, String),
    Return(String),
    Memory(Location),
}

/// Inclusion-based points-to sets.
#[derive(Debug, Clone, Default)]
pub struct AndersenPointsTo {
    sets: HashMap<Key, BTreeSet<Location>>,
}

impl AndersenPointsTo {
    /// Solves the inclusion constraints of `program` by iterating until no
    /// set grows.
    pub fn solve(program: &Program) -> Self {
        let mut solver = AndersenPointsTo::default();
        let mut rounds = 0usize;
        loop {
            rounds += 1;
            let mut changed = false;
            for function in &program.functions {
                for (site, instr) in function.instructions().enumerate() {
                    changed |= solver.apply(program, function, site, instr);
                }
            }
            if !changed {
                break;
            }
        }
        log::debug!("andersen points-to converged after {rounds} round(s)");
        solver
    }

    /// Locations that `var` in `function` may point to.
    pub fn points_to(&self, function: &str, var: &str) -> BTreeSet<Location> {
        self.get(&Key::Var(function.to_string(), var.to_string()))
    }

    fn get(&self, key: &Key) -> BTreeSet<Location> {
        self.sets.get(key).cloned().unwrap_or_default()
    }

    fn var(&self, function: &str, var: &str) -> BTreeSet<Location> {
        self.points_to(function, var)
    }

    fn include(&mut self, key: Key, locations: BTreeSet<Location>) -> bool {
        if locations.is_empty() {
            return false;
        }
        let set = self.sets.entry(key).or_default();
        let before = set.len();
        set.extend(locations);
        set.len() != before
    }

    fn apply(
        &mut self,
        program: &Program,
        function: &Function,
        site: usize,
        instr: &Instruction,
    ) -> bool {
        let name = function.name.as_str();
        let dest = instr.dest.as_ref().map(|d| Key::Var(name.to_string(), d.clone()));
        let arg = |i: usize| instr.args.get(i).map(String::as_str);

        match instr.opcode() {
            Opcode::Fnaddr => match (dest, instr.funcs.first()) {
                (Some(dest), Some(target)) => {
                    self.include(dest, BTreeSet::from([Location::Function(target.clone())]))
                }
                _ => false,
            },
            Opcode::Alloc => match dest {
                Some(dest) => self.include(
                    dest,
                    BTreeSet::from([Location::Alloc {
                        function: name.to_string(),
                        site,
                    }]),
                ),
                None => false,
            },
            Opcode::Id | Opcode::Phi => match dest {
                Some(dest) => {
                    let sources: BTreeSet<Location> =
                        instr.args.iter().flat_map(|a| self.var(name, a)).collect();
                    self.include(dest, sources)
                }
                None => false,
            },
            Opcode::Ptradd => match (dest, arg(0)) {
                (Some(dest), Some(base)) => {
                    let sources = self.var(name, base);
                    self.include(dest, sources)
                }
                _ => false,
            },
            Opcode::Load => match (dest, arg(0)) {
                (Some(dest), Some(pointer)) => {
                    let sources: BTreeSet<Location> = self
                        .var(name, pointer)
                        .into_iter()
                        .flat_map(|l| self.get(&Key::Memory(l)))
                        .collect();
                    self.include(dest, sources)
                }
                _ => false,
            },
            Opcode::Store => match (arg(0), arg(1)) {
                (Some(pointer), Some(value)) => {
                    let values = self.var(name, value);
                    let mut changed = false;
                    for location in self.var(name, pointer) {
                        changed |= self.include(Key::Memory(location), values.clone());
                    }
                    changed
                }
                _ => false,
            },
            Opcode::Ret => match arg(0) {
                Some(value) => {
                    let values = self.var(name, value);
                    self.include(Key::Return(name.to_string()), values)
                }
                None => false,
            },
            Opcode::Call => match instr.funcs.first() {
                Some(callee) => self.bind(program, name, callee, &instr.args, dest),
                None => false,
            },
            Opcode::Icall => {
                let Some(pointer) = arg(0) else {
                    return false;
                };
                let callees: Vec<String> = self
                    .var(name, pointer)
                    .into_iter()
                    .filter_map(|l| match l {
                        Location::Function(f) => Some(f),
                        Location::Alloc { .. } => None,
                    })
                    .collect();
                let mut changed = false;
                for callee in callees {
                    changed |= self.bind(program, name, &callee, &instr.args[1..], dest.clone());
                }
                changed
            }
            _ => false,
        }
    }

    // Flows actuals into the callee's parameters and its return value into
    // `dest`. Calls to functions without a body have no effect.
    fn bind(
        &mut self,
        program: &Program,
        caller: &str,
        callee: &str,
        actuals: &[String],
        dest: Option<Key>,
    ) -> bool {
        let Some(target) = program.function(callee) else {
            return false;
        };
        let mut changed = false;
        for (param, actual) in target.args.iter().zip(actuals) {
            let values = self.var(caller, actual);
            changed |= self.include(Key::Var(callee.to_string(), param.name.clone()), values);
        }
        if let Some(dest) = dest {
            let values = self.get(&Key::Return(callee.to_string()));
            changed |= self.include(dest, values);
        }
        changed
    }
}

impl PointsTo for AndersenPointsTo {
    fn name(&self) -> &'static str {
        "andersen"
    }

    fn indirect_targets(&self, caller: &str, call: &Instruction) -> Vec<String> {
        let Some(pointer) = call.args.first() else {
            return Vec::new();
        };
        self.points_to(caller, pointer)
            .into_iter()
            .filter_map(|l| match l {
                Location::Function(f) => Some(f),
                Location::Alloc { .. } => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn program() -> Program {
        serde_json::from_value(serde_json::json!({
            "functions": [
                {"name": "main", "instrs": [
                    {"op": "fnaddr", "dest": "fp", "type": "fnptr", "funcs": ["inc"]},
                    {"op": "call", "dest": "g", "type": "fnptr", "funcs": ["pick"], "args": ["fp"]},
                    {"op": "const", "dest": "x", "type": "int", "value": 1},
                    {"op": "icall", "dest": "y", "type": "int", "args": ["g", "x"]}
                ]},
                {"name": "pick", "args": [{"name": "f", "type": "fnptr"}], "type": "fnptr", "instrs": [
                    {"op": "ret", "args": ["f"]}
                ]},
                {"name": "inc", "args": [{"name": "v", "type": "int"}], "type": "int", "instrs": [
                    {"op": "ret", "args": ["v"]}
                ]},
                {"name": "dec", "args": [{"name": "v", "type": "int"}], "type": "int", "instrs": [
                    {"op": "ret", "args": ["v"]}
                ]}
            ],
            "externs": [{"name": "abs", "args": [{"name": "v", "type": "int"}], "type": "int"}]
        }))
        .unwrap()
    }

    fn icall(program: &Program) -> Instruction {
        program.functions[0].instructions().last().unwrap().clone()
    }

    #[test]
    fn test_trivial_matches_signatures() {
        let program = program();
        let pts = TrivialPointsTo::new(&program);
        assert_eq!(pts.name(), "trivial");
        assert_eq!(
            pts.indirect_targets("main", &icall(&program)),
            vec!["abs", "dec", "inc", "pick"]
        );
    }

    #[test]
    fn test_andersen_follows_values_through_calls() {
        let program = program();
        let pts = AndersenPointsTo::solve(&program);
        assert_eq!(pts.indirect_targets("main", &icall(&program)), vec!["inc"]);
        assert_eq!(
            pts.points_to("pick", "f"),
            BTreeSet::from([Location::Function("inc".into())])
        );
    }

    #[test]
    fn test_andersen_tracks_memory() {
        let program: Program = serde_json::from_value(serde_json::json!({"functions": [{
            "name": "main",
            "instrs": [
                {"op": "const", "dest": "one", "type": "int", "value": 1},
                {"op": "alloc", "dest": "cell", "type": {"ptr": "fnptr"}, "args": ["one"]},
                {"op": "fnaddr", "dest": "fp", "type": "fnptr", "funcs": ["main"]},
                {"op": "store", "args": ["cell", "fp"]},
                {"op": "load", "dest": "back", "type": "fnptr", "args": ["cell"]}
            ]
        }]}))
        .unwrap();
        let pts = AndersenPointsTo::solve(&program);
        assert_eq!(
            pts.points_to("main", "cell"),
            BTreeSet::from([Location::Alloc {
                function: "main".into(),
                site: 1
            }])
        );
        assert_eq!(
            pts.points_to("main", "back"),
            BTreeSet::from([Location::Function("main".into())])
        );
    }

    #[test]
    fn test_unknown_pointer_is_unresolved() {
        let program = program();
        let pts = AndersenPointsTo::solve(&program);
        let call = Instruction {
            op: "icall".into(),
            args: vec!["nothing".into()],
            ..Instruction::default()
        };
        assert!(pts.indirect_targets("main", &call).is_empty());
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!(PointsToStrategy::from_str("andersen").unwrap(), PointsToStrategy::Andersen);
        assert_eq!(PointsToStrategy::default().to_string(), "trivial");
        assert!(PointsToStrategy::from_str("steensgaard").is_err());
        assert_eq!(PointsToStrategy::Andersen.run(&program()).name(), "andersen");
    }
}
