use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which covers every failure the library can report.
///
/// Every error is terminal for an invocation of the tool: the pipeline never
/// renders partial results once one of these has been returned.
///
/// # Error Categories
///
/// ## Load Errors
/// - [`Error::FileError`] - The input could not be read
/// - [`Error::Parse`] - The input is not a valid JSON program
/// - [`Error::DuplicateFunction`] - Two functions share a name
///
/// ## Analysis Errors
/// - [`Error::Malformed`] - A program construct the analyses cannot interpret
/// - [`Error::UnknownFunction`] - A function lookup failed
/// - [`Error::GraphError`] - Graph construction failure
/// - [`Error::GraphKindMismatch`] - A converter received the wrong graph kind
///
/// ## Render Errors
/// - [`Error::MultipleGraphsForFile`] - Several graphs for a single output file
/// - [`Error::Render`] - The rendering backend failed
///
/// Command-line errors are reported separately as
/// [`ConfigError`](crate::config::ConfigError), before anything is loaded.
///
/// # Examples
///
/// ```rust,no_run
/// use irview::{ir::Module, Error};
///
/// match Module::load("program.json".as_ref(), &[]) {
///     Ok(module) => println!("{} functions", module.program().functions.len()),
///     Err(Error::Parse(err)) => eprintln!("not a program: {err}"),
///     Err(err) => eprintln!("load failed: {err}"),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The program contains a construct that the analyses cannot interpret.
    ///
    /// Carries the source location where the problem was detected.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// File I/O error.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// The input could not be decoded as a JSON program.
    #[error("invalid program: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two functions (defined or declared) share the same name.
    #[error("function '{0}' is defined more than once")]
    DuplicateFunction(String),

    /// A function lookup by name failed.
    #[error("function '{0}' not found")]
    UnknownFunction(String),

    /// Graph construction or traversal failure.
    #[error("{0}")]
    GraphError(String),

    /// A conversion function was handed a graph of another analysis.
    #[error("expected a {expected} graph, found a {found} graph")]
    GraphKindMismatch {
        /// Kind the converter handles
        expected: &'static str,
        /// Kind that was supplied
        found: &'static str,
    },

    /// A single output file was given but the analysis produced several graphs.
    #[error("{count} graphs were produced but the output is a single file; use a directory")]
    MultipleGraphsForFile {
        /// Number of graphs that would have been written
        count: usize,
    },

    /// The rendering backend failed.
    #[error("render failed: {0}")]
    Render(String),
}
