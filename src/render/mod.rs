//! Rendering of analysis results.
//!
//! Analysis results are first converted into a backend-neutral
//! [`Renderable`] (see [`convert`]), then handed to the [`RenderDriver`],
//! which decides where each graph goes according to the [`OutputFormat`] and
//! emits it through a [`Backend`].
//!
//! ```rust
//! use irview::render::{dot::to_dot, Renderable};
//!
//! let mut graph = Renderable::new("demo");
//! graph.add_node("a", "entry").fill("lightgreen");
//! graph.add_node("b", "exit");
//! graph.add_edge("a", "b").label("true");
//!
//! let text = to_dot(&graph);
//! assert!(text.contains("\"a\" -> \"b\""));
//! ```

mod backend;
pub mod convert;
pub mod dot;
mod driver;
mod format;
mod renderable;

pub use backend::{Backend, GraphvizBackend};
pub use driver::{file_names, is_directory_target, RenderDriver, RenderReport};
pub use format::{CanvasBackend, FileEncoding, OutputFormat};
pub use renderable::{RenderCluster, RenderEdge, RenderNode, Renderable};
