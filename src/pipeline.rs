//! End-to-end run of a resolved configuration.

use crate::{
    config::Config,
    dispatch::{dispatch, AnalysisOptions},
    ir::Module,
    render::{Backend, RenderDriver, RenderReport},
    Result,
};

/// Loads the input, builds every graph of the configured type and renders
/// them through `backend`.
///
/// All graphs are built before anything is rendered, so a failing function
/// leaves no partial output behind.
///
/// # Errors
///
/// Returns the first load, analysis or render error.
pub fn run(config: &Config, backend: &dyn Backend) -> Result<RenderReport> {
    let options = AnalysisOptions {
        points_to: config.points_to,
        ..AnalysisOptions::default()
    };

    let module = Module::load(&config.input, &options.passes)?;
    log::debug!(
        "loaded '{}' with {} function(s)",
        module.name(),
        module.functions().len()
    );

    let entry = dispatch(config.graph_type);
    let graphs = (entry.build)(&module, &options)?;
    log::debug!("built {} {} graph(s)", graphs.len(), entry.graph_type);

    RenderDriver::new(config.format, config.output.as_deref(), backend).render(
        module.name(),
        entry.graph_type,
        &graphs,
        entry.convert,
    )
}
