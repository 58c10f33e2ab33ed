// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]
#![deny(unsafe_code)]

//! # irview
//!
//! Program analyses over a small JSON intermediate representation, drawn as
//! graphs.
//!
//! `irview` loads a Bril-style program, runs one of six analyses over it and
//! renders the result through Graphviz, into a viewer window, into files, or
//! as JSON.
//!
//! ## Features
//!
//! - **Control flow** - basic blocks, control-flow graphs and control dependence
//! - **Dominance** - dominator and post-dominator trees
//! - **Calls** - call graphs with pluggable indirect-call resolution
//!   (signature matching or Andersen-style points-to)
//! - **Escape** - interprocedural escape analysis of parameters and allocations
//! - **Rendering** - any Graphviz output format, interactive viewers, or JSON
//!
//! ## Quick Start
//!
//! ```rust
//! use irview::dispatch::{dispatch, AnalysisOptions, GraphType};
//! use irview::ir::Module;
//! use irview::render::dot::to_dot;
//!
//! let json = br#"{"functions": [
//!     {"name": "main", "instrs": [
//!         {"op": "br", "args": ["c"], "labels": ["a", "b"]},
//!         {"label": "a"}, {"op": "jmp", "labels": ["b"]},
//!         {"label": "b"}, {"op": "ret"}
//!     ]}
//! ]}"#;
//! let module = Module::from_slice("demo", json, &[])?;
//!
//! let entry = dispatch(GraphType::Cfg);
//! let graphs = (entry.build)(&module, &AnalysisOptions::default())?;
//! let renderable = (entry.convert)(&graphs[0].label, &graphs[0].graph)?;
//! assert!(to_dot(&renderable).contains("CFG: main"));
//! # Ok::<(), irview::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`ir`] - program model, loader and preprocessing passes
//! - [`analysis`] - the analyses themselves
//! - [`dispatch`] - graph type to adapter/converter table
//! - [`render`] - backend-neutral graphs, output planning and Graphviz
//! - [`config`] - command-line resolution
//! - [`pipeline`] - load, analyse and render in one call
//! - [`utils`] - graph primitives and DOT helpers
//!
//! ### Testing
//!
//! ```bash
//! cargo test
//! cargo bench
//! cargo +nightly fuzz run module --release
//! ```

#[macro_use]
pub(crate) mod error;

/// Program model and loader.
///
/// A [`ir::Module`] is parsed from JSON, validated, and preprocessed by the
/// configured [`ir::Pass`]es. It is immutable afterwards.
pub mod ir;

/// Control-flow, dominance, call-graph, points-to and escape analyses.
pub mod analysis;

/// Command-line configuration.
pub mod config;

/// Dispatch from graph type to construction and conversion.
pub mod dispatch;

/// End-to-end execution of a configuration.
pub mod pipeline;

/// Conversion to renderable graphs and output.
pub mod render;

/// Graph data structures, graph algorithms and DOT helpers.
pub mod utils;

/// `irview` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `irview` Error type
///
/// The main error type for loading, analysis and rendering.
///
/// # Examples
///
/// ```rust
/// use irview::{ir::Module, Error};
///
/// match Module::from_slice("bad", b"{", &[]) {
///     Err(Error::Parse(e)) => println!("not JSON: {e}"),
///     Err(e) => println!("Error: {e}"),
///     Ok(_) => unreachable!(),
/// }
/// ```
pub use error::Error;
