//! Command-line configuration.
//!
//! The argument syntax is declared with `clap`, but the semantic rules
//! (single input, single output, graph type and format names) are checked by
//! [`Config::resolve`] so that each violation maps to its own
//! [`ConfigError`]. clap's built-in help flag is disabled: `-h`/`--help`
//! wins over every other argument, including malformed ones.
//!
//! ```rust
//! use irview::config::{Config, Resolution};
//! use irview::dispatch::GraphType;
//! use irview::render::OutputFormat;
//!
//! let Resolution::Run(config) = Config::resolve(["irview", "prog.json", "-t", "Cg", "-f", "Json"])?
//! else {
//!     unreachable!()
//! };
//! assert_eq!(config.graph_type, GraphType::Cg);
//! assert_eq!(config.format, OutputFormat::Json);
//! # Ok::<(), irview::config::ConfigError>(())
//! ```

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    str::FromStr,
};

use clap::{ArgAction, CommandFactory, Parser};
use strum::IntoEnumIterator;
use thiserror::Error;

use crate::{
    analysis::PointsToStrategy,
    dispatch::GraphType,
    render::{CanvasBackend, FileEncoding, OutputFormat},
};

/// Ways a command line can be rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// More than one positional argument.
    #[error("only one input file is allowed")]
    MultipleInputs,

    /// `--output` given more than once.
    #[error("only one output file is allowed")]
    MultipleOutputs,

    /// `--type` names no known graph type.
    #[error("unknown graph type '{0}'")]
    InvalidGraphType(String),

    /// `--format` names no known output format.
    #[error("unknown output format '{0}'")]
    InvalidFormat(String),

    /// `--points-to` names no known strategy.
    #[error("unknown points-to strategy '{0}'")]
    InvalidPointsTo(String),

    /// No positional argument.
    #[error("Input file not specified")]
    MissingInput,

    /// No `--type`.
    #[error("No graph type specified")]
    MissingGraphType,

    /// A file encoding was requested without `--output`.
    #[error("format {0} writes files and needs --output")]
    OutputRequired(FileEncoding),

    /// The arguments could not be parsed at all.
    #[error("{0}")]
    Syntax(String),
}

#[derive(Debug, Parser)]
#[command(
    name = "irview",
    about = "Render control-flow, dominance, call and escape graphs of a JSON IR program",
    long_about = None,
    disable_help_flag = true
)]
struct Cli {
    /// Program to analyse (JSON)
    #[arg(value_name = "FILE")]
    inputs: Vec<PathBuf>,

    /// Output file or directory
    #[arg(short, long, value_name = "PATH", action = ArgAction::Append)]
    output: Vec<PathBuf>,

    /// Cfg | Cdg | Cg | Domtree | Postdomtree | Escape
    #[arg(short = 't', long = "type", value_name = "TYPE", action = ArgAction::Append)]
    graph_type: Vec<String>,

    /// Gtk | Xlib | Canon | Dot | XDot | Eps | Fig | Gif | Jpeg | Pdf | Plain | Png | Ps | Svg
    /// | Svgz | Tiff | WebP | Json [default: from the --output extension, else Gtk]
    #[arg(short, long, value_name = "FORMAT", action = ArgAction::Append)]
    format: Vec<String>,

    /// Indirect call resolution: trivial | andersen [default: trivial]
    #[arg(long, value_name = "STRATEGY")]
    points_to: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Print usage and exit
    #[arg(short, long)]
    help: bool,
}

/// A validated command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// The program to load.
    pub input: PathBuf,
    /// File or directory for file and JSON output.
    pub output: Option<PathBuf>,
    /// The analysis to draw.
    pub graph_type: GraphType,
    /// Where the graphs go.
    pub format: OutputFormat,
    /// Indirect call resolution.
    pub points_to: PointsToStrategy,
    /// Debug logging requested.
    pub verbose: bool,
}

/// Outcome of [`Config::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Help was requested; print [`Config::usage`] and exit successfully.
    Help,
    /// Run with this configuration.
    Run(Config),
}

impl Config {
    /// Resolves a full argument vector, program name included.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found. Input-count and output-count
    /// errors come before name errors, and a missing input is reported
    /// before a missing graph type.
    pub fn resolve<I, T>(args: I) -> Result<Resolution, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
        if wants_help(&args) {
            return Ok(Resolution::Help);
        }

        let cli = Cli::try_parse_from(&args).map_err(|e| ConfigError::Syntax(e.to_string()))?;
        if cli.help {
            return Ok(Resolution::Help);
        }

        if cli.inputs.len() > 1 {
            return Err(ConfigError::MultipleInputs);
        }
        if cli.output.len() > 1 {
            return Err(ConfigError::MultipleOutputs);
        }

        let graph_type = cli
            .graph_type
            .last()
            .map(|text| {
                GraphType::from_str(text).map_err(|_| ConfigError::InvalidGraphType(text.clone()))
            })
            .transpose()?;
        let format = cli
            .format
            .last()
            .map(String::as_str)
            .map(parse_format)
            .transpose()?;
        let points_to = cli
            .points_to
            .as_deref()
            .map(|text| {
                PointsToStrategy::from_str(text)
                    .map_err(|_| ConfigError::InvalidPointsTo(text.to_string()))
            })
            .transpose()?
            .unwrap_or_default();

        let input = cli
            .inputs
            .into_iter()
            .next()
            .ok_or(ConfigError::MissingInput)?;
        let graph_type = graph_type.ok_or(ConfigError::MissingGraphType)?;
        let output = cli.output.into_iter().next();
        let format = format
            .or_else(|| output.as_deref().and_then(infer_format))
            .unwrap_or_default();

        if let (OutputFormat::File(encoding), None) = (format, &output) {
            return Err(ConfigError::OutputRequired(encoding));
        }

        Ok(Resolution::Run(Config {
            input,
            output,
            graph_type,
            format,
            points_to,
            verbose: cli.verbose,
        }))
    }

    /// The usage text printed for `--help` and after configuration errors.
    pub fn usage() -> String {
        Cli::command().render_help().to_string()
    }
}

fn wants_help(args: &[OsString]) -> bool {
    args.iter()
        .skip(1)
        .map(|arg| arg.to_str())
        .take_while(|arg| *arg != Some("--"))
        .any(|arg| matches!(arg, Some("-h" | "--help")))
}

/// Picks the format matching the extension of `output`, if any.
fn infer_format(output: &Path) -> Option<OutputFormat> {
    let extension = output.extension()?.to_str()?;
    if extension == "json" {
        return Some(OutputFormat::Json);
    }
    FileEncoding::iter()
        .find(|encoding| encoding.extension() == extension)
        .map(OutputFormat::File)
}

/// Parses a `--format` value: `Json`, then a canvas backend, then a file
/// encoding.
fn parse_format(text: &str) -> Result<OutputFormat, ConfigError> {
    if text == "Json" {
        return Ok(OutputFormat::Json);
    }
    if let Ok(canvas) = CanvasBackend::from_str(text) {
        return Ok(OutputFormat::Canvas(canvas));
    }
    FileEncoding::from_str(text)
        .map(OutputFormat::File)
        .map_err(|_| ConfigError::InvalidFormat(text.to_string()))
}
