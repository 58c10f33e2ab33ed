//! Program loading.

use std::{collections::HashMap, collections::HashSet, fs, path::Path};

use crate::{
    ir::{
        passes::{promote_memory, AliasSets, Pass},
        program::{Function, Program},
    },
    Error, Result,
};

/// A loaded, preprocessed program.
///
/// A `Module` is built once by [`Module::load`] (or one of the other
/// constructors), which validates the program and runs the requested
/// [`Pass`]es. It is read-only afterwards, so every analysis can share it,
/// including from several threads.
#[derive(Debug, Clone)]
pub struct Module {
    name: String,
    program: Program,
    aliases: HashMap<String, AliasSets>,
}

impl Module {
    /// Loads a JSON program from `path`.
    ///
    /// The module is named after the file stem.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileError`] if the file cannot be read, and the
    /// errors of [`Module::from_slice`] otherwise.
    pub fn load(path: &Path, passes: &[Pass]) -> Result<Self> {
        let data = fs::read(path)?;
        let name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .filter(|stem| !stem.is_empty())
            .unwrap_or_else(|| "module".to_string());
        Self::from_slice(&name, &data, passes)
    }

    /// Parses a JSON program from memory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] for invalid JSON and the errors of
    /// [`Module::from_program`] otherwise.
    pub fn from_slice(name: &str, data: &[u8], passes: &[Pass]) -> Result<Self> {
        let program: Program = serde_json::from_slice(data)?;
        Self::from_program(name, program, passes)
    }

    /// Validates `program` and applies `passes` in order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateFunction`] if two defined or declared
    /// functions share a name.
    pub fn from_program(name: &str, mut program: Program, passes: &[Pass]) -> Result<Self> {
        let mut seen = HashSet::new();
        let names = program
            .functions
            .iter()
            .map(|f| &f.name)
            .chain(program.externs.iter().map(|d| &d.name));
        for function_name in names {
            if !seen.insert(function_name.as_str()) {
                return Err(Error::DuplicateFunction(function_name.clone()));
            }
        }

        let mut aliases: HashMap<String, AliasSets> = HashMap::new();
        for pass in passes {
            match pass {
                Pass::PromoteMemory => {
                    for function in &mut program.functions {
                        let promoted = promote_memory(function);
                        if promoted > 0 {
                            log::debug!("{}: promoted {promoted} memory slot(s)", function.name);
                        }
                    }
                }
                Pass::BasicAlias => {
                    aliases = program
                        .functions
                        .iter()
                        .map(|f| (f.name.clone(), AliasSets::compute(f)))
                        .collect();
                }
            }
        }

        log::debug!(
            "loaded module '{name}': {} defined, {} declared function(s)",
            program.functions.len(),
            program.externs.len()
        );

        Ok(Module {
            name: name.to_string(),
            program,
            aliases,
        })
    }

    /// Module name, used to label whole-program graphs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The preprocessed program.
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Defined functions in program order.
    pub fn functions(&self) -> &[Function] {
        &self.program.functions
    }

    /// Looks up a defined function.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownFunction`] if no function has that name.
    pub fn function(&self, name: &str) -> Result<&Function> {
        self.program
            .function(name)
            .ok_or_else(|| Error::UnknownFunction(name.to_string()))
    }

    /// Alias classes of a function. Without the [`Pass::BasicAlias`] pass
    /// every variable is its own class.
    pub fn aliases(&self, function: &str) -> AliasSets {
        self.aliases.get(function).cloned().unwrap_or_default()
    }
}
