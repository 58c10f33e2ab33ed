//! The render driver: conversion, output planning and emission.
//!
//! Rendering happens in three phases so that nothing reaches the file system
//! or the screen unless the whole batch is valid:
//!
//! 1. every named graph is converted to a [`Renderable`];
//! 2. the output plan is checked against the destination (a directory gets
//!    one file per graph, a plain file exactly one graph);
//! 3. graphs are encoded, and only then written or shown.

use std::{
    collections::HashSet,
    fs,
    io::Write,
    path::{Path, PathBuf, MAIN_SEPARATOR},
};

use serde::Serialize;

use crate::{
    dispatch::{Converter, GraphType, NamedGraph},
    render::{Backend, OutputFormat, Renderable},
    utils::sanitize_label,
    Error, Result,
};

/// What a [`RenderDriver::render`] call produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderReport {
    /// Files written, in graph order.
    pub written: Vec<PathBuf>,
    /// Number of graphs shown in a viewer.
    pub shown: usize,
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    module: &'a str,
    graph_type: String,
    graphs: &'a [Renderable],
}

/// Sends converted graphs to the configured sink.
pub struct RenderDriver<'a> {
    format: OutputFormat,
    output: Option<&'a Path>,
    backend: &'a dyn Backend,
}

impl<'a> RenderDriver<'a> {
    /// Creates a driver for `format`, writing to `output` through `backend`.
    pub fn new(format: OutputFormat, output: Option<&'a Path>, backend: &'a dyn Backend) -> Self {
        RenderDriver {
            format,
            output,
            backend,
        }
    }

    /// Converts and emits `graphs`.
    ///
    /// `module` and `graph_type` only appear in JSON output.
    ///
    /// # Errors
    ///
    /// Returns conversion errors, [`Error::MultipleGraphsForFile`] when
    /// several graphs target a single file, [`Error::Render`] when the
    /// backend fails or a target cannot be a file, and [`Error::FileError`]
    /// when writing fails. In every case no output file is left behind.
    ///
    /// JSON output to a directory goes to `<module>.json` inside it.
    pub fn render(
        &self,
        module: &str,
        graph_type: GraphType,
        graphs: &[NamedGraph],
        convert: Converter,
    ) -> Result<RenderReport> {
        let renderables = graphs
            .iter()
            .map(|named| convert(&named.label, &named.graph))
            .collect::<Result<Vec<Renderable>>>()?;
        let labels: Vec<&str> = graphs.iter().map(|g| g.label.as_str()).collect();

        match self.format {
            OutputFormat::Canvas(canvas) => {
                if let Some(path) = self.output {
                    log::warn!(
                        "output path '{}' is ignored for the {canvas} viewer",
                        path.display()
                    );
                }
                for renderable in &renderables {
                    self.backend.show(renderable, canvas)?;
                }
                Ok(RenderReport {
                    written: Vec::new(),
                    shown: renderables.len(),
                })
            }
            OutputFormat::File(encoding) => {
                let output = self.output.ok_or_else(|| {
                    Error::Render(format!("an output path is required for {encoding}"))
                })?;
                let targets = plan_files(output, &labels, encoding.extension())?;
                check_targets(output, &targets)?;

                let encoded = renderables
                    .iter()
                    .map(|r| self.backend.encode(r, encoding))
                    .collect::<Result<Vec<Vec<u8>>>>()?;

                if is_directory_target(output) {
                    fs::create_dir_all(output)?;
                }
                write_all(&targets, &encoded)?;
                Ok(RenderReport {
                    written: targets,
                    shown: 0,
                })
            }
            OutputFormat::Json => {
                let document = JsonDocument {
                    module,
                    graph_type: graph_type.to_string(),
                    graphs: &renderables,
                };
                let mut text = serde_json::to_string_pretty(&document)
                    .map_err(|e| Error::Render(format!("cannot serialise graphs: {e}")))?;
                text.push('\n');

                match self.output {
                    Some(path) => {
                        let target = if is_directory_target(path) {
                            path.join(format!("{}.json", sanitize_label(module)))
                        } else {
                            path.to_path_buf()
                        };
                        check_targets(path, std::slice::from_ref(&target))?;
                        if is_directory_target(path) {
                            fs::create_dir_all(path)?;
                        }
                        write_all(std::slice::from_ref(&target), &[text.into_bytes()])?;
                        Ok(RenderReport {
                            written: vec![target],
                            shown: 0,
                        })
                    }
                    None => {
                        std::io::stdout().lock().write_all(text.as_bytes())?;
                        Ok(RenderReport::default())
                    }
                }
            }
        }
    }
}

/// Returns `true` if `output` names a directory: either an existing one, or
/// a path that does not exist yet and ends with a separator.
pub fn is_directory_target(output: &Path) -> bool {
    if output.is_dir() {
        return true;
    }
    let text = output.as_os_str().to_string_lossy();
    !output.exists() && (text.ends_with('/') || text.ends_with(MAIN_SEPARATOR))
}

/// File names for `labels` inside a directory: the sanitised label plus
/// `extension`, with `-1`, `-2`, ... appended on collisions.
pub fn file_names(labels: &[&str], extension: &str) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    labels
        .iter()
        .map(|label| {
            let stem = sanitize_label(label);
            let mut name = format!("{stem}.{extension}");
            let mut counter = 0;
            while !used.insert(name.clone()) {
                counter += 1;
                name = format!("{stem}-{counter}.{extension}");
            }
            name
        })
        .collect()
}

/// Rejects targets that cannot be written as files: existing directories, and
/// single-file targets whose parent directory does not exist.
fn check_targets(output: &Path, targets: &[PathBuf]) -> Result<()> {
    for target in targets {
        if target.is_dir() {
            return Err(Error::Render(format!(
                "cannot write '{}': it is a directory",
                target.display()
            )));
        }
    }
    if !is_directory_target(output) {
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.is_dir() {
                return Err(Error::Render(format!(
                    "cannot write '{}': directory '{}' does not exist",
                    output.display(),
                    parent.display()
                )));
            }
        }
    }
    Ok(())
}

/// Writes every file, removing the ones already written if a later write
/// fails.
fn write_all(targets: &[PathBuf], contents: &[Vec<u8>]) -> Result<()> {
    for (i, (path, bytes)) in targets.iter().zip(contents).enumerate() {
        if let Err(e) = fs::write(path, bytes) {
            for written in &targets[..i] {
                if let Err(cleanup) = fs::remove_file(written) {
                    log::warn!("cannot remove '{}': {cleanup}", written.display());
                }
            }
            return Err(e.into());
        }
        log::debug!("wrote {}", path.display());
    }
    Ok(())
}

fn plan_files(output: &Path, labels: &[&str], extension: &str) -> Result<Vec<PathBuf>> {
    if is_directory_target(output) {
        return Ok(file_names(labels, extension)
            .into_iter()
            .map(|name| output.join(name))
            .collect());
    }
    match labels.len() {
        0 => {
            log::warn!("nothing to render");
            Ok(Vec::new())
        }
        1 => Ok(vec![output.to_path_buf()]),
        count => Err(Error::MultipleGraphsForFile { count }),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::{
        dispatch::{dispatch, AnalysisOptions},
        ir::Module,
        render::{CanvasBackend, FileEncoding},
    };

    #[derive(Default)]
    struct Recorder {
        shown: RefCell<Vec<String>>,
    }

    impl Backend for Recorder {
        fn show(&self, graph: &Renderable, _canvas: CanvasBackend) -> Result<()> {
            self.shown.borrow_mut().push(graph.name.clone());
            Ok(())
        }

        fn encode(&self, graph: &Renderable, _encoding: FileEncoding) -> Result<Vec<u8>> {
            Ok(graph.name.clone().into_bytes())
        }
    }

    fn graphs(graph_type: GraphType) -> Vec<NamedGraph> {
        let json = br#"{"functions": [
            {"name": "f", "instrs": [{"op": "ret"}]},
            {"name": "g", "instrs": [{"op": "ret"}]}
        ]}"#;
        let module = Module::from_slice("m", json, &[]).unwrap();
        (dispatch(graph_type).build)(&module, &AnalysisOptions::default()).unwrap()
    }

    fn run(driver: &RenderDriver<'_>, graph_type: GraphType) -> Result<RenderReport> {
        driver.render("m", graph_type, &graphs(graph_type), dispatch(graph_type).convert)
    }

    #[test]
    fn test_file_names_deduplicate() {
        assert_eq!(
            file_names(&["main", "a/b", "a?b", ""], "png"),
            vec!["main.png", "a_b.png", "a_b-1.png", "graph.png"]
        );
    }

    #[test]
    fn test_canvas_shows_every_graph() -> Result<()> {
        let recorder = Recorder::default();
        let driver = RenderDriver::new(OutputFormat::Canvas(CanvasBackend::Gtk), None, &recorder);
        let report = run(&driver, GraphType::Cfg)?;
        assert_eq!(report.shown, 2);
        assert_eq!(*recorder.shown.borrow(), vec!["CFG: f", "CFG: g"]);
        Ok(())
    }

    #[test]
    fn test_directory_output() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let recorder = Recorder::default();
        let driver =
            RenderDriver::new(OutputFormat::File(FileEncoding::Svg), Some(dir.path()), &recorder);
        let report = run(&driver, GraphType::Cfg)?;
        assert_eq!(report.written, vec![dir.path().join("f.svg"), dir.path().join("g.svg")]);
        assert_eq!(fs::read_to_string(dir.path().join("g.svg"))?, "CFG: g");
        Ok(())
    }

    #[test]
    fn test_new_directory_with_trailing_separator() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let target = PathBuf::from(format!("{}/out/", dir.path().display()));
        let recorder = Recorder::default();
        let driver =
            RenderDriver::new(OutputFormat::File(FileEncoding::Dot), Some(&target), &recorder);
        let report = run(&driver, GraphType::Domtree)?;
        assert_eq!(report.written.len(), 2);
        assert!(dir.path().join("out").join("f.dot").exists());
        Ok(())
    }

    #[test]
    fn test_single_file_rejects_several_graphs() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let target = dir.path().join("cfg.png");
        let recorder = Recorder::default();
        let driver =
            RenderDriver::new(OutputFormat::File(FileEncoding::Png), Some(&target), &recorder);
        let result = run(&driver, GraphType::Cfg);
        assert!(matches!(result, Err(Error::MultipleGraphsForFile { count: 2 })));
        assert!(!target.exists());
        Ok(())
    }

    #[test]
    fn test_single_file_for_whole_program_graph() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let target = dir.path().join("cg.png");
        let recorder = Recorder::default();
        let driver =
            RenderDriver::new(OutputFormat::File(FileEncoding::Png), Some(&target), &recorder);
        let report = run(&driver, GraphType::Cg)?;
        assert_eq!(report.written, vec![target.clone()]);
        assert!(fs::read_to_string(&target)?.starts_with("Call graph: m"));
        Ok(())
    }

    #[test]
    fn test_directory_in_the_way_leaves_nothing_behind() -> Result<()> {
        let dir = tempfile::tempdir()?;
        fs::create_dir(dir.path().join("g.dot"))?;
        let recorder = Recorder::default();
        let driver =
            RenderDriver::new(OutputFormat::File(FileEncoding::Dot), Some(dir.path()), &recorder);

        let result = run(&driver, GraphType::Cfg);
        assert!(matches!(result, Err(Error::Render(_))));
        assert!(!dir.path().join("f.dot").exists());
        Ok(())
    }

    #[test]
    fn test_missing_parent_directory() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let target = dir.path().join("nowhere").join("cg.dot");
        let recorder = Recorder::default();
        let driver =
            RenderDriver::new(OutputFormat::File(FileEncoding::Dot), Some(&target), &recorder);

        let result = run(&driver, GraphType::Cg);
        assert!(matches!(result, Err(Error::Render(_))));
        assert!(!dir.path().join("nowhere").exists());
        Ok(())
    }

    #[test]
    fn test_failed_write_removes_earlier_files() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let first = dir.path().join("a.dot");
        let second = dir.path().join("missing").join("b.dot");

        let result = write_all(&[first.clone(), second], &[b"a".to_vec(), b"b".to_vec()]);
        assert!(matches!(result, Err(Error::FileError(_))));
        assert!(!first.exists());
        Ok(())
    }

    #[test]
    fn test_json_into_existing_directory() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let recorder = Recorder::default();
        let driver = RenderDriver::new(OutputFormat::Json, Some(dir.path()), &recorder);

        let report = run(&driver, GraphType::Cfg)?;
        let target = dir.path().join("m.json");
        assert_eq!(report.written, vec![target.clone()]);
        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&target)?)?;
        assert_eq!(value["graphs"].as_array().map(Vec::len), Some(2));
        Ok(())
    }

    #[test]
    fn test_json_document() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let target = dir.path().join("escape.json");
        let recorder = Recorder::default();
        let driver = RenderDriver::new(OutputFormat::Json, Some(&target), &recorder);
        run(&driver, GraphType::Escape)?;

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&target)?)?;
        assert_eq!(value["module"], "m");
        assert_eq!(value["graph_type"], "Escape");
        assert_eq!(value["graphs"].as_array().map(Vec::len), Some(1));
        Ok(())
    }
}
