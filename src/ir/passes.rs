//! Preprocessing passes applied by the loader.
//!
//! Passes run once, while the [`Module`](super::Module) is being built, and
//! the module is read-only afterwards. The default pipeline is
//! [`DEFAULT_PASSES`]: promote single-slot memory to plain variables, then
//! compute basic alias classes for the escape analysis.

use std::collections::{HashMap, HashSet};

use strum::{Display, EnumIter, EnumString};

use crate::ir::program::{Code, Function, Instruction, Opcode, Type};

/// A preprocessing pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
pub enum Pass {
    /// Rewrites `alloc` slots that are only loaded from, stored to and freed
    /// into plain variable copies.
    PromoteMemory,
    /// Groups pointer variables connected by `id`, `ptradd` and `phi` into
    /// alias classes.
    BasicAlias,
}

/// Passes applied when nothing else is requested.
pub const DEFAULT_PASSES: [Pass; 2] = [Pass::PromoteMemory, Pass::BasicAlias];

/// Promotes eligible allocation slots of `function` to variables.
///
/// A slot is eligible when its pointer variable is assigned exactly once, by
/// an `alloc` of a known pointee type, and every other use is the address
/// operand of a `load`, `store` or `free`. Each store becomes an `id` into a
/// fresh variable, each load an `id` out of it, and the `alloc`/`free` pair
/// is dropped.
///
/// Returns the number of promoted slots.
pub fn promote_memory(function: &mut Function) -> usize {
    let slots = promotable_slots(function);
    if slots.is_empty() {
        return 0;
    }

    let mut taken: HashSet<String> = function
        .args
        .iter()
        .map(|a| a.name.clone())
        .chain(function.instructions().filter_map(|i| i.dest.clone()))
        .collect();

    let mut fresh: HashMap<String, (String, Type)> = HashMap::new();
    for (pointer, pointee) in &slots {
        let mut name = format!("{pointer}.slot");
        let mut counter = 0;
        while taken.contains(&name) {
            counter += 1;
            name = format!("{pointer}.slot{counter}");
        }
        taken.insert(name.clone());
        fresh.insert(pointer.clone(), (name, pointee.clone()));
    }

    let body = std::mem::take(&mut function.instrs);
    function.instrs = body
        .into_iter()
        .filter_map(|code| {
            let Code::Instruction(instr) = code else {
                return Some(code);
            };
            let pointer = match instr.opcode() {
                Opcode::Alloc => instr.dest.as_deref(),
                Opcode::Load | Opcode::Store | Opcode::Free => instr.args.first().map(String::as_str),
                _ => None,
            };
            let Some((slot, pointee)) = pointer.and_then(|p| fresh.get(p)) else {
                return Some(Code::Instruction(instr));
            };

            match instr.opcode() {
                Opcode::Store => Some(Code::Instruction(Instruction::value(
                    "id",
                    slot,
                    pointee.clone(),
                    &[instr.args[1].as_str()],
                ))),
                Opcode::Load => {
                    let dest = instr.dest.clone().unwrap_or_default();
                    let ty = instr.ty.clone().unwrap_or_else(|| pointee.clone());
                    Some(Code::Instruction(Instruction::value("id", &dest, ty, &[slot])))
                }
                _ => None,
            }
        })
        .collect();

    slots.len()
}

// Pointer variables (with pointee type) that can be promoted.
fn promotable_slots(function: &Function) -> Vec<(String, Type)> {
    let params: HashSet<&str> = function.args.iter().map(|a| a.name.as_str()).collect();
    let mut definitions: HashMap<&str, usize> = HashMap::new();
    let mut allocs: Vec<(&str, Option<&Type>)> = Vec::new();

    for instr in function.instructions() {
        if let Some(dest) = &instr.dest {
            *definitions.entry(dest.as_str()).or_default() += 1;
            if instr.opcode() == Opcode::Alloc {
                allocs.push((dest.as_str(), instr.ty.as_ref().and_then(Type::pointee)));
            }
        }
    }

    let mut escaping: HashSet<&str> = HashSet::new();
    for instr in function.instructions() {
        let opcode = instr.opcode();
        for (position, arg) in instr.args.iter().enumerate() {
            let address_use = match opcode {
                Opcode::Load | Opcode::Free => position == 0 && instr.args.len() == 1,
                Opcode::Store => position == 0 && instr.args.len() == 2,
                _ => false,
            };
            if !address_use {
                escaping.insert(arg.as_str());
            }
        }
        // A load must produce a value to be rewritten into a copy.
        if opcode == Opcode::Load && instr.dest.is_none() {
            if let Some(pointer) = instr.args.first() {
                escaping.insert(pointer.as_str());
            }
        }
    }

    let mut slots: Vec<(String, Type)> = allocs
        .into_iter()
        .filter_map(|(pointer, pointee)| {
            let eligible = !params.contains(pointer)
                && definitions.get(pointer) == Some(&1)
                && !escaping.contains(pointer);
            match (eligible, pointee) {
                (true, Some(ty)) => Some((pointer.to_string(), ty.clone())),
                _ => None,
            }
        })
        .collect();
    slots.dedup_by(|a, b| a.0 == b.0);
    slots
}

/// Alias classes of a single function.
///
/// Each variable maps to the representative of its class; variables that are
/// absent form a class of their own. The default value therefore means "no
/// alias information".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasSets {
    representative: HashMap<String, String>,
}

impl AliasSets {
    /// Runs the basic alias pass on `function`.
    ///
    /// The destination of every pointer-typed `id`, `ptradd` and `phi` is
    /// merged with its pointer operands. Assignments are not distinguished by
    /// program point, so a variable assigned from two different pointers
    /// joins both classes.
    pub fn compute(function: &Function) -> Self {
        let types = function.variable_types();
        let is_pointer = |var: &str| types.get(var).is_some_and(|t| t.is_pointer());

        let mut parent: HashMap<String, String> = HashMap::new();
        for instr in function.instructions() {
            if !instr.opcode().is_copy() {
                continue;
            }
            let Some(dest) = instr.dest.as_deref() else {
                continue;
            };
            if !is_pointer(dest) {
                continue;
            }
            let operands: Vec<&str> = match instr.opcode() {
                Opcode::Ptradd => instr.args.first().map(String::as_str).into_iter().collect(),
                _ => instr.args.iter().map(String::as_str).collect(),
            };
            for operand in operands {
                union(&mut parent, dest, operand);
            }
        }

        let vars: Vec<String> = parent.keys().cloned().collect();
        let representative = vars
            .into_iter()
            .map(|var| {
                let root = find(&mut parent, &var);
                (var, root)
            })
            .collect();
        AliasSets { representative }
    }

    /// Returns the representative of the class containing `var`.
    pub fn representative<'a>(&'a self, var: &'a str) -> &'a str {
        self.representative.get(var).map_or(var, String::as_str)
    }

    /// Returns `true` if `a` and `b` are in the same class.
    pub fn same_class(&self, a: &str, b: &str) -> bool {
        self.representative(a) == self.representative(b)
    }

    /// Returns `true` if no variable has been merged with another.
    pub fn is_trivial(&self) -> bool {
        self.representative.iter().all(|(var, rep)| var == rep)
    }
}

fn find(parent: &mut HashMap<String, String>, var: &str) -> String {
    let mut root = var.to_string();
    while let Some(next) = parent.get(&root) {
        if *next == root {
            break;
        }
        root = next.clone();
    }
    // Path compression
    let mut current = var.to_string();
    while current != root {
        let next = parent
            .insert(current.clone(), root.clone())
            .unwrap_or_else(|| root.clone());
        current = next;
    }
    root
}

fn union(parent: &mut HashMap<String, String>, a: &str, b: &str) {
    parent.entry(a.to_string()).or_insert_with(|| a.to_string());
    parent.entry(b.to_string()).or_insert_with(|| b.to_string());
    let root_a = find(parent, a);
    let root_b = find(parent, b);
    if root_a != root_b {
        // Deterministic choice keeps representatives stable across runs.
        let (keep, merge) = if root_a < root_b {
            (root_a, root_b)
        } else {
            (root_b, root_a)
        };
        parent.insert(merge, keep);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::program::Program;

    fn function(json: serde_json::Value) -> Function {
        let program: Program =
            serde_json::from_value(serde_json::json!({ "functions": [json] })).unwrap();
        program.functions.into_iter().next().unwrap()
    }

    #[test]
    fn test_promote_simple_slot() {
        let mut f = function(serde_json::json!({
            "name": "f",
            "type": "int",
            "instrs": [
                {"op": "const", "dest": "one", "type": "int", "value": 1},
                {"op": "alloc", "dest": "p", "type": {"ptr": "int"}, "args": ["one"]},
                {"op": "store", "args": ["p", "one"]},
                {"op": "load", "dest": "v", "type": "int", "args": ["p"]},
                {"op": "free", "args": ["p"]},
                {"op": "ret", "args": ["v"]}
            ]
        }));

        assert_eq!(promote_memory(&mut f), 1);
        let listing: Vec<String> = f.instructions().map(ToString::to_string).collect();
        assert_eq!(
            listing,
            vec![
                "one: int = const 1",
                "p.slot: int = id one",
                "v: int = id p.slot",
                "ret v",
            ]
        );
    }

    #[test]
    fn test_promote_skips_escaping_slot() {
        let mut f = function(serde_json::json!({
            "name": "f",
            "type": {"ptr": "int"},
            "instrs": [
                {"op": "const", "dest": "one", "type": "int", "value": 1},
                {"op": "alloc", "dest": "p", "type": {"ptr": "int"}, "args": ["one"]},
                {"op": "store", "args": ["p", "one"]},
                {"op": "ret", "args": ["p"]}
            ]
        }));
        let before = f.clone();
        assert_eq!(promote_memory(&mut f), 0);
        assert_eq!(f, before);
    }

    #[test]
    fn test_promote_skips_reassigned_pointer() {
        let mut f = function(serde_json::json!({
            "name": "f",
            "instrs": [
                {"op": "const", "dest": "one", "type": "int", "value": 1},
                {"op": "alloc", "dest": "p", "type": {"ptr": "int"}, "args": ["one"]},
                {"op": "alloc", "dest": "p", "type": {"ptr": "int"}, "args": ["one"]},
                {"op": "store", "args": ["p", "one"]}
            ]
        }));
        assert_eq!(promote_memory(&mut f), 0);
    }

    #[test]
    fn test_promote_avoids_name_clash() {
        let mut f = function(serde_json::json!({
            "name": "f",
            "instrs": [
                {"op": "const", "dest": "p.slot", "type": "int", "value": 0},
                {"op": "alloc", "dest": "p", "type": {"ptr": "int"}, "args": ["p.slot"]},
                {"op": "store", "args": ["p", "p.slot"]}
            ]
        }));
        assert_eq!(promote_memory(&mut f), 1);
        let last = f.instructions().last().unwrap().to_string();
        assert_eq!(last, "p.slot1: int = id p.slot");
    }

    #[test]
    fn test_alias_sets_merge_pointer_copies() {
        let f = function(serde_json::json!({
            "name": "f",
            "args": [{"name": "n", "type": "int"}],
            "instrs": [
                {"op": "alloc", "dest": "a", "type": {"ptr": "int"}, "args": ["n"]},
                {"op": "ptradd", "dest": "b", "type": {"ptr": "int"}, "args": ["a", "n"]},
                {"op": "id", "dest": "c", "type": {"ptr": "int"}, "args": ["b"]},
                {"op": "alloc", "dest": "d", "type": {"ptr": "int"}, "args": ["n"]},
                {"op": "id", "dest": "m", "type": "int", "args": ["n"]}
            ]
        }));

        let aliases = AliasSets::compute(&f);
        assert!(aliases.same_class("a", "c"));
        assert!(aliases.same_class("b", "a"));
        assert!(!aliases.same_class("a", "d"));
        // ptradd offsets and non-pointer copies are not merged
        assert!(!aliases.same_class("a", "n"));
        assert!(!aliases.same_class("m", "n"));
        assert_eq!(aliases.representative("a"), "a");
        assert!(!aliases.is_trivial());
    }

    #[test]
    fn test_default_alias_sets_are_identity() {
        let aliases = AliasSets::default();
        assert!(aliases.is_trivial());
        assert_eq!(aliases.representative("x"), "x");
        assert!(!aliases.same_class("x", "y"));
    }
}
