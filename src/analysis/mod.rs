//! Program analyses.
//!
//! Intra-procedural analyses work on one [`Function`](crate::ir::Function):
//!
//! - [`cfg`]: basic blocks and control flow, with a synthetic exit node
//! - [`dominance`]: dominator and post-dominator trees
//! - [`cdg`]: control dependence, derived from post-dominance
//!
//! Whole-program analyses work on a [`Module`](crate::ir::Module):
//!
//! - [`pointsto`]: resolution of indirect call targets
//! - [`callgraph`]: the call graph, with external nodes and unresolved sites
//! - [`escape`]: bottom-up escape summaries over the call graph
//!
//! # Usage
//!
//! ```rust
//! use irview::analysis::{ControlFlowGraph, DominanceTree};
//! use irview::ir::Module;
//!
//! let json = br#"{"functions": [{"name": "main", "instrs": [{"op": "ret"}]}]}"#;
//! let module = Module::from_slice("demo", json, &[])?;
//! let cfg = ControlFlowGraph::build(module.function("main")?)?;
//! let post = DominanceTree::post(&cfg);
//! assert_eq!(post.parent_of("b0"), Some("<exit>"));
//! # Ok::<(), irview::Error>(())
//! ```

pub mod callgraph;
pub mod cdg;
pub mod cfg;
pub mod dominance;
pub mod escape;
pub mod pointsto;

pub use callgraph::{CallGraph, CallKind, CallNode, CallSite};
pub use cdg::ControlDependenceGraph;
pub use cfg::{BasicBlock, CfgEdgeKind, ControlFlowGraph, EXIT_LABEL};
pub use dominance::{DominanceKind, DominanceTree};
pub use escape::{
    always_escape, EscapeAnalysis, EscapePolicy, EscapeReason, EscapeResult, FunctionEscape,
    TrackedValue, ValueOrigin, ValueUse,
};
pub use pointsto::{AndersenPointsTo, Location, PointsTo, PointsToStrategy, TrivialPointsTo};
