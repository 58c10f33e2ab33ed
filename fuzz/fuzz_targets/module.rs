#![no_main]

use irview::{
    dispatch::{dispatch, AnalysisOptions, GraphType},
    ir::{Module, DEFAULT_PASSES},
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(module) = Module::from_slice("fuzz", data, &DEFAULT_PASSES) else {
        return;
    };
    let options = AnalysisOptions::default();
    for graph_type in [GraphType::Cfg, GraphType::Postdomtree, GraphType::Escape] {
        let _ = (dispatch(graph_type).build)(&module, &options);
    }
});
