//! Benchmarks for graph construction.
//!
//! Builds a synthetic module of chained functions, each with a counting loop
//! and a diamond, and measures:
//! - Per-function adapters (CFG, CDG, dominator trees)
//! - Whole-program adapters (call graph, escape analysis)
//! - Andersen points-to on a module with indirect calls

extern crate irview;

use criterion::{criterion_group, criterion_main, Criterion};
use irview::{
    analysis::PointsToStrategy,
    dispatch::{dispatch, AnalysisOptions, GraphType},
    ir::{Module, DEFAULT_PASSES},
};
use std::hint::black_box;

/// `count` functions; `f{i}` calls `f{i+1}` directly and, every fourth
/// function, indirectly through a function pointer.
fn synthetic_module(count: usize) -> Module {
    let mut functions = Vec::with_capacity(count);
    for i in 0..count {
        let next = (i + 1) % count;
        let indirect = if i % 4 == 0 {
            format!(
                r#"{{"op": "fnaddr", "dest": "fp", "type": "fnptr", "funcs": ["f{next}"]}},
                   {{"op": "icall", "dest": "r", "type": {{"ptr": "int"}}, "args": ["fp", "p"]}},"#
            )
        } else {
            String::new()
        };
        functions.push(format!(
            r#"{{"name": "f{i}", "args": [{{"name": "p", "type": {{"ptr": "int"}}}}],
                "type": {{"ptr": "int"}},
                "instrs": [
                  {{"op": "const", "dest": "n", "type": "int", "value": 10}},
                  {{"label": "head"}},
                  {{"op": "lt", "dest": "c", "type": "bool", "args": ["n", "n"]}},
                  {{"op": "br", "args": ["c"], "labels": ["body", "done"]}},
                  {{"label": "body"}},
                  {{"op": "br", "args": ["c"], "labels": ["left", "right"]}},
                  {{"label": "left"}},
                  {{"op": "store", "args": ["p", "n"]}},
                  {{"op": "jmp", "labels": ["join"]}},
                  {{"label": "right"}},
                  {{"op": "alloc", "dest": "q", "type": {{"ptr": "int"}}, "args": ["n"]}},
                  {{"label": "join"}},
                  {{"op": "jmp", "labels": ["head"]}},
                  {{"label": "done"}},
                  {indirect}
                  {{"op": "call", "dest": "s", "type": {{"ptr": "int"}}, "funcs": ["f{next}"], "args": ["p"]}},
                  {{"op": "ret", "args": ["s"]}}
                ]}}"#
        ));
    }
    let json = format!(r#"{{"functions": [{}]}}"#, functions.join(","));
    Module::from_slice("bench", json.as_bytes(), &DEFAULT_PASSES).unwrap()
}

/// Benchmark every per-function adapter on 200 functions.
fn bench_per_function(c: &mut Criterion) {
    let module = synthetic_module(200);
    let options = AnalysisOptions::default();

    for graph_type in [
        GraphType::Cfg,
        GraphType::Cdg,
        GraphType::Domtree,
        GraphType::Postdomtree,
    ] {
        let build = dispatch(graph_type).build;
        c.bench_function(&format!("adapter_{graph_type}_200"), |b| {
            b.iter(|| black_box(build(black_box(&module), &options).unwrap()));
        });
    }
}

/// Benchmark the whole-program adapters with the default points-to.
fn bench_whole_program(c: &mut Criterion) {
    let module = synthetic_module(200);
    let options = AnalysisOptions::default();

    for graph_type in [GraphType::Cg, GraphType::Escape] {
        let build = dispatch(graph_type).build;
        c.bench_function(&format!("adapter_{graph_type}_200"), |b| {
            b.iter(|| black_box(build(black_box(&module), &options).unwrap()));
        });
    }
}

/// Benchmark the escape adapter with Andersen points-to.
fn bench_escape_andersen(c: &mut Criterion) {
    let module = synthetic_module(100);
    let options = AnalysisOptions {
        points_to: PointsToStrategy::Andersen,
        ..AnalysisOptions::default()
    };
    let build = dispatch(GraphType::Escape).build;

    c.bench_function("adapter_Escape_andersen_100", |b| {
        b.iter(|| black_box(build(black_box(&module), &options).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_per_function,
    bench_whole_program,
    bench_escape_andersen,
);
criterion_main!(benches);
