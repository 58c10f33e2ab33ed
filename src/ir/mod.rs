//! Program representation and loader.
//!
//! The analysed program is Bril-style JSON (see [`Program`]). [`Module`] is
//! the loaded form: validated, preprocessed by the requested [`Pass`]es, and
//! read-only from then on.
//!
//! ```rust,no_run
//! use irview::ir::{Module, DEFAULT_PASSES};
//!
//! let module = Module::load("program.json".as_ref(), &DEFAULT_PASSES)?;
//! for function in module.functions() {
//!     println!("{}: {} instructions", function.name, function.instructions().count());
//! }
//! # Ok::<(), irview::Error>(())
//! ```

mod module;
mod passes;
mod program;

pub use module::Module;
pub use passes::{promote_memory, AliasSets, Pass, DEFAULT_PASSES};
pub use program::{
    Argument, Code, Declaration, Function, Instruction, Opcode, Program, Signature, Type,
};
