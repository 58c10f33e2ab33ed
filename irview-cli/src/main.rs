use std::process::ExitCode;

use anyhow::Context;
use irview::{
    config::{Config, Resolution},
    pipeline,
    render::GraphvizBackend,
};

fn main() -> ExitCode {
    ctrlc::set_handler(|| {
        eprintln!("\nCancelled.");
        std::process::exit(130);
    })
    .expect("failed to set Ctrl+C handler");

    let config = match Config::resolve(std::env::args_os()) {
        Ok(Resolution::Help) => {
            println!("{}", Config::usage());
            return ExitCode::SUCCESS;
        }
        Ok(Resolution::Run(config)) => config,
        Err(e) => {
            eprintln!("Error: {e}\n");
            eprintln!("{}", Config::usage());
            return ExitCode::FAILURE;
        }
    };

    init_logging(config.verbose);

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// irview info+ on stderr; --verbose enables debug; RUST_LOG overrides
fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_module("irview", level)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();
}

fn run(config: &Config) -> anyhow::Result<()> {
    let report = pipeline::run(config, &GraphvizBackend).with_context(|| {
        format!(
            "cannot render {} graphs of {}",
            config.graph_type,
            config.input.display()
        )
    })?;

    for path in &report.written {
        log::info!("wrote {}", path.display());
    }
    Ok(())
}
