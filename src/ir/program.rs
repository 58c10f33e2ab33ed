//! Serde model of the program representation.
//!
//! Programs are Bril-style JSON: a list of functions, each a flat list of
//! labels and instructions, plus a list of external declarations. Unknown
//! opcodes are preserved so they can still be displayed in block listings.

use std::{collections::HashMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use strum::EnumString;

/// A whole program: defined functions plus external declarations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    /// Functions with a body, in source order.
    pub functions: Vec<Function>,
    /// Functions that are declared but not defined.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub externs: Vec<Declaration>,
}

impl Program {
    /// Looks up a defined function by name.
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Looks up an external declaration by name.
    pub fn declaration(&self, name: &str) -> Option<&Declaration> {
        self.externs.iter().find(|d| d.name == name)
    }

    /// Returns `true` if `name` has a body in this program.
    pub fn is_defined(&self, name: &str) -> bool {
        self.function(name).is_some()
    }

    /// Signatures of every defined and declared function, defined first.
    pub fn signatures(&self) -> Vec<Signature<'_>> {
        self.functions
            .iter()
            .map(|f| Signature {
                name: &f.name,
                arity: f.args.len(),
                returns: f.return_type.is_some(),
                defined: true,
            })
            .chain(self.externs.iter().map(|d| Signature {
                name: &d.name,
                arity: d.args.len(),
                returns: d.return_type.is_some(),
                defined: false,
            }))
            .collect()
    }
}

/// The shape of a function as seen from a call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature<'a> {
    /// Function name.
    pub name: &'a str,
    /// Number of parameters.
    pub arity: usize,
    /// Whether the function returns a value.
    pub returns: bool,
    /// Whether the function has a body in the program.
    pub defined: bool,
}

/// A function with a body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    /// Function identifier.
    pub name: String,
    /// Formal parameters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Argument>,
    /// Return type, absent for functions that return nothing.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<Type>,
    /// Labels and instructions in source order.
    #[serde(default)]
    pub instrs: Vec<Code>,
}

impl Function {
    /// Instructions of the body, skipping labels.
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> + '_ {
        self.instrs.iter().filter_map(|code| match code {
            Code::Instruction(instr) => Some(instr),
            Code::Label { .. } => None,
        })
    }

    /// Maps every parameter and destination variable to its declared type.
    ///
    /// If a variable is assigned more than once the last declaration wins.
    pub fn variable_types(&self) -> HashMap<&str, &Type> {
        let mut types: HashMap<&str, &Type> = self
            .args
            .iter()
            .map(|a| (a.name.as_str(), &a.ty))
            .collect();
        for instr in self.instructions() {
            if let (Some(dest), Some(ty)) = (&instr.dest, &instr.ty) {
                types.insert(dest.as_str(), ty);
            }
        }
        types
    }
}

/// A function declared without a body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    /// Function identifier.
    pub name: String,
    /// Formal parameters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<Argument>,
    /// Return type, absent for functions that return nothing.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<Type>,
}

/// A named, typed formal parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Argument {
    /// Parameter name.
    pub name: String,
    /// Parameter type.
    #[serde(rename = "type")]
    pub ty: Type,
}

/// A value type: a primitive name or a pointer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Type {
    /// `{"ptr": T}`
    Pointer {
        /// Pointee type.
        ptr: Box<Type>,
    },
    /// `int`, `bool`, `float`, `char`, `fnptr`, ...
    Named(String),
}

impl Type {
    /// Returns `true` for data pointers and function pointers.
    pub fn is_pointer(&self) -> bool {
        match self {
            Type::Pointer { .. } => true,
            Type::Named(name) => name == "fnptr",
        }
    }

    /// The pointee of a data pointer.
    pub fn pointee(&self) -> Option<&Type> {
        match self {
            Type::Pointer { ptr } => Some(ptr),
            Type::Named(_) => None,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Pointer { ptr } => write!(f, "ptr<{ptr}>"),
            Type::Named(name) => f.write_str(name),
        }
    }
}

/// One entry of a function body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Code {
    /// `{"label": "name"}` marks the start of a basic block.
    Label {
        /// Label name.
        label: String,
    },
    /// Any instruction.
    Instruction(Instruction),
}

/// A single instruction in its raw JSON shape.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Instruction {
    /// Opcode text; see [`Instruction::opcode`].
    pub op: String,
    /// Destination variable for value operations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest: Option<String>,
    /// Destination type for value operations.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<Type>,
    /// Variable operands.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    /// Function operands (`call`, `fnaddr`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub funcs: Vec<String>,
    /// Label operands (`jmp`, `br`, `phi`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    /// Literal operand of `const`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

/// Opcodes the analyses give meaning to.
#[derive(Debug, Clone, PartialEq, Eq, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Opcode {
    /// Literal load
    Const,
    /// Unconditional branch
    Jmp,
    /// Two-way conditional branch
    Br,
    /// Function return
    Ret,
    /// Direct call; the callee is `funcs[0]`
    Call,
    /// Indirect call through the function pointer `args[0]`
    Icall,
    /// Address of the function `funcs[0]`
    Fnaddr,
    /// Heap allocation
    Alloc,
    /// Heap release
    Free,
    /// Memory read through `args[0]`
    Load,
    /// Memory write of `args[1]` through `args[0]`
    Store,
    /// Pointer arithmetic on `args[0]`
    Ptradd,
    /// Copy
    Id,
    /// SSA merge
    Phi,
    /// Any other operation
    #[strum(default)]
    Other(String),
}

impl Opcode {
    /// Returns `true` for instructions that end a basic block.
    pub fn is_terminator(&self) -> bool {
        matches!(self, Opcode::Jmp | Opcode::Br | Opcode::Ret)
    }

    /// Returns `true` for operations whose result may alias an operand.
    pub fn is_copy(&self) -> bool {
        matches!(self, Opcode::Id | Opcode::Ptradd | Opcode::Phi)
    }
}

impl Instruction {
    /// Decodes the opcode text. Never fails: unknown text maps to
    /// [`Opcode::Other`].
    pub fn opcode(&self) -> Opcode {
        Opcode::from_str(&self.op).unwrap_or_else(|_| Opcode::Other(self.op.clone()))
    }

    /// Creates a value-producing instruction.
    pub fn value(op: &str, dest: &str, ty: Type, args: &[&str]) -> Self {
        Instruction {
            op: op.to_string(),
            dest: Some(dest.to_string()),
            ty: Some(ty),
            args: args.iter().map(|a| (*a).to_string()).collect(),
            ..Instruction::default()
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(dest) = &self.dest {
            write!(f, "{dest}")?;
            if let Some(ty) = &self.ty {
                write!(f, ": {ty}")?;
            }
            f.write_str(" = ")?;
        }
        f.write_str(&self.op)?;
        if let Some(value) = &self.value {
            write!(f, " {value}")?;
        }
        for func in &self.funcs {
            write!(f, " @{func}")?;
        }
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        for label in &self.labels {
            write!(f, " .{label}")?;
        }
        Ok(())
    }
}
