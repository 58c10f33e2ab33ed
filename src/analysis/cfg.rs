//! Control-flow graph construction.
//!
//! A function body is split into basic blocks at every label and after every
//! terminator (`jmp`, `br`, `ret`). Each block becomes a node; a synthetic
//! exit node is appended after the last block and receives an edge from
//! every `ret` and from a final fall-through, so the graph always has a
//! single sink for post-dominance.

use std::{collections::HashMap, fmt};

use crate::{
    ir::{Code, Function, Instruction, Opcode},
    utils::graph::{DirectedGraph, GraphBase, NodeId, Predecessors, Successors},
    Result,
};

/// Label given to the synthetic exit node.
pub const EXIT_LABEL: &str = "<exit>";

/// A straight-line sequence of instructions.
#[derive(Debug, Clone, PartialEq)]
pub struct BasicBlock {
    /// Source label, or a generated `bN` name for unlabelled blocks.
    pub label: String,
    /// Instructions in order; the last one may be a terminator.
    pub instructions: Vec<Instruction>,
    /// `true` only for the synthetic exit node.
    pub is_exit: bool,
}

/// Why control moves along an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CfgEdgeKind {
    /// `jmp`
    Jump,
    /// Taken branch of `br`
    True,
    /// Not-taken branch of `br`
    False,
    /// Falling off the end of a block into the next one
    Fallthrough,
    /// `ret` into the synthetic exit
    Return,
}

impl fmt::Display for CfgEdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CfgEdgeKind::Jump => "jump",
            CfgEdgeKind::True => "true",
            CfgEdgeKind::False => "false",
            CfgEdgeKind::Fallthrough => "fallthrough",
            CfgEdgeKind::Return => "return",
        })
    }
}

/// Control-flow graph of one function.
#[derive(Debug, Clone)]
pub struct ControlFlowGraph {
    function: String,
    graph: DirectedGraph<BasicBlock, CfgEdgeKind>,
    entry: NodeId,
    exit: NodeId,
}

impl ControlFlowGraph {
    /// Builds the control-flow graph of `function`.
    ///
    /// A function with an empty body gets a single empty entry block.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Malformed`] if a label is defined twice, if a
    /// branch names a label that does not exist, or if a `jmp`/`br` lacks its
    /// label operands.
    pub fn build(function: &Function) -> Result<Self> {
        let blocks = form_blocks(function);

        let mut by_label: HashMap<&str, NodeId> = HashMap::new();
        for (i, block) in blocks.iter().enumerate() {
            if by_label.insert(block.label.as_str(), NodeId::new(i)).is_some() {
                return Err(malformed_error!(
                    "label '{}' defined twice in function '{}'",
                    block.label,
                    function.name
                ));
            }
        }

        let mut edges: Vec<(NodeId, NodeId, CfgEdgeKind)> = Vec::new();
        let exit = NodeId::new(blocks.len());
        let lookup = |label: Option<&String>| -> Result<NodeId> {
            let label = label.ok_or_else(|| {
                malformed_error!("branch without a target label in function '{}'", function.name)
            })?;
            by_label.get(label.as_str()).copied().ok_or_else(|| {
                malformed_error!(
                    "branch to unknown label '{}' in function '{}'",
                    label,
                    function.name
                )
            })
        };

        for (i, block) in blocks.iter().enumerate() {
            let node = NodeId::new(i);
            let next = if i + 1 < blocks.len() {
                NodeId::new(i + 1)
            } else {
                exit
            };
            match block.instructions.last().map(Instruction::opcode) {
                Some(Opcode::Jmp) => {
                    let target = lookup(block.instructions.last().and_then(|t| t.labels.first()))?;
                    edges.push((node, target, CfgEdgeKind::Jump));
                }
                Some(Opcode::Br) => {
                    let labels = block.instructions.last().map(|t| &t.labels);
                    let taken = lookup(labels.and_then(|l| l.first()))?;
                    let not_taken = lookup(labels.and_then(|l| l.get(1)))?;
                    edges.push((node, taken, CfgEdgeKind::True));
                    edges.push((node, not_taken, CfgEdgeKind::False));
                }
                Some(Opcode::Ret) => edges.push((node, exit, CfgEdgeKind::Return)),
                _ => edges.push((node, next, CfgEdgeKind::Fallthrough)),
            }
        }

        let mut graph = DirectedGraph::new();
        for block in blocks {
            graph.add_node(block);
        }
        graph.add_node(BasicBlock {
            label: EXIT_LABEL.to_string(),
            instructions: Vec::new(),
            is_exit: true,
        });
        for (source, target, kind) in edges {
            graph.add_edge(source, target, kind)?;
        }

        Ok(ControlFlowGraph {
            function: function.name.clone(),
            graph,
            entry: NodeId::new(0),
            exit,
        })
    }

    /// Name of the function this graph belongs to.
    pub fn function(&self) -> &str {
        &self.function
    }

    /// The entry block.
    pub fn entry(&self) -> NodeId {
        self.entry
    }

    /// The synthetic exit node.
    pub fn exit(&self) -> NodeId {
        self.exit
    }

    /// Returns the block behind `node`.
    pub fn block(&self, node: NodeId) -> Option<&BasicBlock> {
        self.graph.node(node)
    }

    /// Number of real blocks, not counting the synthetic exit.
    pub fn block_count(&self) -> usize {
        self.graph.node_count() - 1
    }

    /// Finds a block by label.
    pub fn find(&self, label: &str) -> Option<NodeId> {
        self.graph
            .nodes()
            .find(|(_, block)| block.label == label)
            .map(|(id, _)| id)
    }

    /// Label of every node, indexed by node id.
    pub fn labels(&self) -> Vec<String> {
        self.graph.nodes().map(|(_, b)| b.label.clone()).collect()
    }

    /// The underlying graph.
    pub fn graph(&self) -> &DirectedGraph<BasicBlock, CfgEdgeKind> {
        &self.graph
    }
}

impl GraphBase for ControlFlowGraph {
    fn node_count(&self) -> usize {
        self.graph.node_count()
    }
}

impl Successors for ControlFlowGraph {
    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.graph.successors(node)
    }
}

impl Predecessors for ControlFlowGraph {
    fn predecessors(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.graph.predecessors(node)
    }
}

// Splits the body into blocks and names the unlabelled ones.
fn form_blocks(function: &Function) -> Vec<BasicBlock> {
    let mut raw: Vec<(Option<String>, Vec<Instruction>)> = Vec::new();
    let mut current: (Option<String>, Vec<Instruction>) = (None, Vec::new());

    for code in &function.instrs {
        match code {
            Code::Label { label } => {
                if current.0.is_some() || !current.1.is_empty() {
                    raw.push(std::mem::take(&mut current));
                }
                current.0 = Some(label.clone());
            }
            Code::Instruction(instr) => {
                current.1.push(instr.clone());
                if instr.opcode().is_terminator() {
                    raw.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if current.0.is_some() || !current.1.is_empty() || raw.is_empty() {
        raw.push(current);
    }

    let taken: Vec<String> = raw.iter().filter_map(|(l, _)| l.clone()).collect();
    raw.into_iter()
        .enumerate()
        .map(|(i, (label, instructions))| {
            let label = label.unwrap_or_else(|| {
                let mut name = format!("b{i}");
                while taken.contains(&name) {
                    name.push('_');
                }
                name
            });
            BasicBlock {
                label,
                instructions,
                is_exit: false,
            }
        })
        .collect()
}
