//! Command-line to output integration tests.
//!
//! Every test resolves a real argument vector with `Config::resolve` and runs
//! it through `pipeline::run`. Only in-process outputs (DOT text and JSON) are
//! used, so Graphviz does not need to be installed.

use std::{fs, path::PathBuf};

use irview::{
    config::{Config, ConfigError, Resolution},
    pipeline,
    render::GraphvizBackend,
    Error,
};

fn fixture(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
        .display()
        .to_string()
}

fn config(args: &[&str]) -> Config {
    let mut argv = vec!["irview"];
    argv.extend_from_slice(args);
    match Config::resolve(argv) {
        Ok(Resolution::Run(config)) => config,
        other => panic!("unexpected resolution: {other:?}"),
    }
}

#[test]
fn cfg_into_directory_writes_one_file_per_function() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    let input = fixture("three.json");
    let output = dir.path().display().to_string();
    let config = config(&[input.as_str(), "-t", "Cfg", "-f", "Dot", "-o", output.as_str()]);

    let report = pipeline::run(&config, &GraphvizBackend)?;
    let expected: Vec<PathBuf> = ["f.dot", "g.dot", "h.dot"]
        .iter()
        .map(|name| dir.path().join(name))
        .collect();
    assert_eq!(report.written, expected);

    let g = fs::read_to_string(dir.path().join("g.dot"))?;
    assert!(g.starts_with("digraph"));
    assert!(g.contains("CFG: g"));
    assert!(g.contains("head"));
    Ok(())
}

#[test]
fn call_graph_into_single_file() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    let input = fixture("three.json");
    let target = dir.path().join("calls.dot");
    let output = target.display().to_string();
    let config = config(&[input.as_str(), "-t", "Cg", "-f", "Dot", "-o", output.as_str()]);

    let report = pipeline::run(&config, &GraphvizBackend)?;
    assert_eq!(report.written, vec![target.clone()]);
    assert!(fs::read_to_string(&target)?.contains("print"));
    Ok(())
}

#[test]
fn blocked_file_in_directory_writes_nothing() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    fs::create_dir(dir.path().join("g.dot"))?;
    let input = fixture("three.json");
    let output = format!("{}/", dir.path().display());
    let config = config(&[input.as_str(), "-t", "Cfg", "-f", "Dot", "-o", output.as_str()]);

    assert!(pipeline::run(&config, &GraphvizBackend).is_err());
    assert!(!dir.path().join("f.dot").exists());
    assert!(!dir.path().join("h.dot").exists());
    Ok(())
}

#[test]
fn format_follows_output_extension() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    let input = fixture("three.json");
    let target = dir.path().join("calls.dot");
    let output = target.display().to_string();
    let config = config(&[input.as_str(), "-t", "Cg", "-o", output.as_str()]);

    let report = pipeline::run(&config, &GraphvizBackend)?;
    assert_eq!(report.written, vec![target.clone()]);
    assert!(fs::read_to_string(&target)?.starts_with("digraph"));
    Ok(())
}

#[test]
fn single_file_with_several_graphs_writes_nothing() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    let input = fixture("three.json");
    let target = dir.path().join("cfg.dot");
    let output = target.display().to_string();
    let config = config(&[input.as_str(), "-t", "Domtree", "-f", "Dot", "-o", output.as_str()]);

    let result = pipeline::run(&config, &GraphvizBackend);
    assert!(matches!(result, Err(Error::MultipleGraphsForFile { count: 3 })));
    assert_eq!(fs::read_dir(dir.path())?.count(), 0);
    Ok(())
}

#[test]
fn escape_as_json() -> Result<(), Error> {
    let dir = tempfile::tempdir()?;
    let input = fixture("pointers.json");
    let target = dir.path().join("escape.json");
    let output = target.display().to_string();
    let config = config(&[
        input.as_str(),
        "-t",
        "Escape",
        "-f",
        "Json",
        "--points-to",
        "andersen",
        "-o",
        output.as_str(),
    ]);

    pipeline::run(&config, &GraphvizBackend)?;
    let document: serde_json::Value = serde_json::from_str(&fs::read_to_string(&target)?)?;
    assert_eq!(document["module"], "pointers");
    assert_eq!(document["graph_type"], "Escape");
    assert_eq!(document["graphs"][0]["name"], "Escape: pointers");
    Ok(())
}

#[test]
fn missing_input_file() {
    let config = config(&["does/not/exist.json", "-t", "Cfg", "-f", "Json"]);
    let result = pipeline::run(&config, &GraphvizBackend);
    assert!(matches!(result, Err(Error::FileError(_))));
}

#[test]
fn configuration_errors_stop_before_loading() {
    let input = fixture("three.json");
    let cases: [(&[&str], &str); 4] = [
        (&[input.as_str(), input.as_str(), "-t", "Cfg"], "only one input file"),
        (&[input.as_str(), "-t", "Cfg", "-o", "a", "-o", "b"], "only one output file"),
        (&[input.as_str(), "-t", "Foo"], "Foo"),
        (&[input.as_str(), "-t", "Cfg", "-f", "Bitmap"], "Bitmap"),
    ];
    for (args, message) in cases {
        let mut argv = vec!["irview"];
        argv.extend_from_slice(args);
        let err = Config::resolve(argv).unwrap_err();
        assert!(err.to_string().contains(message), "{err}");
    }
    assert_eq!(
        Config::resolve(["irview", "-t", "Cfg"]),
        Err(ConfigError::MissingInput)
    );
    assert_eq!(
        Config::resolve(["irview", "x.json", "--type", "Foo", "--help"]),
        Ok(Resolution::Help)
    );
}
