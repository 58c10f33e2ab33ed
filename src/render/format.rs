//! Output format selection.

use std::fmt;

use strum::{Display, EnumIter, EnumString};

/// Interactive viewer backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
pub enum CanvasBackend {
    /// GTK window.
    #[default]
    Gtk,
    /// X11 window.
    Xlib,
}

/// File encodings Graphviz can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
pub enum FileEncoding {
    /// Canonical DOT, pretty-printed by Graphviz
    Canon,
    /// DOT as printed in-process, without layout
    Dot,
    /// DOT with layout and drawing annotations
    XDot,
    /// Encapsulated PostScript
    Eps,
    /// FIG vector drawing
    Fig,
    /// GIF image
    Gif,
    /// JPEG image
    Jpeg,
    /// PDF document
    Pdf,
    /// Plain-text layout description
    Plain,
    /// PNG image
    Png,
    /// PostScript
    Ps,
    /// SVG image
    Svg,
    /// Compressed SVG image
    Svgz,
    /// TIFF image
    Tiff,
    /// WebP image
    WebP,
}

impl FileEncoding {
    /// Conventional file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            FileEncoding::Canon => "gv",
            FileEncoding::Dot => "dot",
            FileEncoding::XDot => "xdot",
            FileEncoding::Eps => "eps",
            FileEncoding::Fig => "fig",
            FileEncoding::Gif => "gif",
            FileEncoding::Jpeg => "jpg",
            FileEncoding::Pdf => "pdf",
            FileEncoding::Plain => "txt",
            FileEncoding::Png => "png",
            FileEncoding::Ps => "ps",
            FileEncoding::Svg => "svg",
            FileEncoding::Svgz => "svgz",
            FileEncoding::Tiff => "tiff",
            FileEncoding::WebP => "webp",
        }
    }
}

/// Where and how rendered graphs go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    /// Open a viewer window per graph.
    Canvas(CanvasBackend),
    /// Write an encoded file per graph.
    File(FileEncoding),
    /// Dump the renderable graphs as JSON.
    Json,
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Canvas(CanvasBackend::default())
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Canvas(backend) => write!(f, "{backend}"),
            OutputFormat::File(encoding) => write!(f, "{encoding}"),
            OutputFormat::Json => f.write_str("Json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_names_round_trip_through_display() {
        for encoding in FileEncoding::iter() {
            assert_eq!(FileEncoding::from_str(&encoding.to_string()), Ok(encoding));
        }
        assert_eq!(CanvasBackend::from_str("Xlib"), Ok(CanvasBackend::Xlib));
        assert!(FileEncoding::from_str("png").is_err());
    }

    #[test]
    fn test_extensions_are_distinct() {
        let mut seen: Vec<&str> = FileEncoding::iter().map(FileEncoding::extension).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), FileEncoding::iter().count());
    }

    #[test]
    fn test_default_is_gtk_canvas() {
        assert_eq!(OutputFormat::default(), OutputFormat::Canvas(CanvasBackend::Gtk));
        assert_eq!(OutputFormat::Json.to_string(), "Json");
    }
}
