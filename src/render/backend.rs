//! Rendering backends.

use graphviz_rust::{
    cmd::{CommandArg, Format},
    exec,
    printer::PrinterContext,
};

use crate::{
    render::{dot, CanvasBackend, FileEncoding, Renderable},
    Error, Result,
};

/// Emits renderable graphs.
///
/// The render driver only talks to this trait, so tests can substitute a
/// backend that records calls instead of running Graphviz.
pub trait Backend {
    /// Opens a viewer for `graph` and blocks until it is closed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] if the viewer cannot be started.
    fn show(&self, graph: &Renderable, canvas: CanvasBackend) -> Result<()>;

    /// Encodes `graph` and returns the file contents.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] if encoding fails.
    fn encode(&self, graph: &Renderable, encoding: FileEncoding) -> Result<Vec<u8>>;
}

/// Backend that uses Graphviz: DOT text is printed in-process, every other
/// encoding and the viewers run the `dot` executable.
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphvizBackend;

impl GraphvizBackend {
    fn run(graph: &Renderable, format: Format) -> Result<Vec<u8>> {
        exec(
            dot::to_graph(graph),
            &mut PrinterContext::default(),
            vec![CommandArg::Format(format)],
        )
        .map_err(|e| Error::Render(format!("graphviz failed for '{}': {e}", graph.name)))
    }
}

impl Backend for GraphvizBackend {
    fn show(&self, graph: &Renderable, canvas: CanvasBackend) -> Result<()> {
        let format = match canvas {
            CanvasBackend::Gtk => Format::Gtk,
            CanvasBackend::Xlib => Format::Xlib,
        };
        Self::run(graph, format).map(|_| ())
    }

    fn encode(&self, graph: &Renderable, encoding: FileEncoding) -> Result<Vec<u8>> {
        let format = match encoding {
            FileEncoding::Dot => return Ok(dot::to_dot(graph).into_bytes()),
            FileEncoding::Canon => Format::Canon,
            FileEncoding::XDot => Format::Xdot,
            FileEncoding::Eps => Format::Eps,
            FileEncoding::Fig => Format::Fig,
            FileEncoding::Gif => Format::Gif,
            FileEncoding::Jpeg => Format::Jpeg,
            FileEncoding::Pdf => Format::Pdf,
            FileEncoding::Plain => Format::Plain,
            FileEncoding::Png => Format::Png,
            FileEncoding::Ps => Format::Ps,
            FileEncoding::Svg => Format::Svg,
            FileEncoding::Svgz => Format::Svgz,
            FileEncoding::Tiff => Format::Tiff,
            FileEncoding::WebP => Format::Webp,
        };
        Self::run(graph, format)
    }
}
