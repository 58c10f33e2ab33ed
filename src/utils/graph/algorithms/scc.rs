//! Strongly connected components (Tarjan).
//!
//! Tarjan's algorithm emits a component only after every component reachable
//! from it has been emitted, so the result is in reverse topological order of
//! the condensation. On a call graph that is exactly bottom-up order: callees
//! come before their callers, which is what summary-based analyses need.

use crate::utils::graph::{NodeId, Successors};

/// Computes the strongly connected components of `graph`.
///
/// Components are returned in reverse topological order; the nodes inside a
/// component are sorted by index. Every node belongs to exactly one component.
///
/// # Examples
///
/// ```rust
/// use irview::utils::graph::{algorithms::strongly_connected_components, DirectedGraph};
///
/// // main -> helper -> main, helper -> leaf
/// let mut graph: DirectedGraph<&str, ()> = DirectedGraph::new();
/// let main = graph.add_node("main");
/// let helper = graph.add_node("helper");
/// let leaf = graph.add_node("leaf");
/// graph.add_edge(main, helper, ())?;
/// graph.add_edge(helper, main, ())?;
/// graph.add_edge(helper, leaf, ())?;
///
/// let sccs = strongly_connected_components(&graph);
/// assert_eq!(sccs, vec![vec![leaf], vec![main, helper]]);
/// # Ok::<(), irview::Error>(())
/// ```
pub fn strongly_connected_components<G: Successors>(graph: &G) -> Vec<Vec<NodeId>> {
    let mut state = TarjanState::new(graph.node_count());
    for node in graph.node_ids() {
        if state.index[node.index()].is_none() {
            state.visit(graph, node);
        }
    }
    state.components
}

struct TarjanState {
    next_index: usize,
    index: Vec<Option<usize>>,
    lowlink: Vec<usize>,
    on_stack: Vec<bool>,
    stack: Vec<NodeId>,
    components: Vec<Vec<NodeId>>,
}

impl TarjanState {
    fn new(n: usize) -> Self {
        TarjanState {
            next_index: 0,
            index: vec![None; n],
            lowlink: vec![0; n],
            on_stack: vec![false; n],
            stack: Vec::new(),
            components: Vec::new(),
        }
    }

    fn discover(&mut self, node: NodeId) {
        self.index[node.index()] = Some(self.next_index);
        self.lowlink[node.index()] = self.next_index;
        self.next_index += 1;
        self.stack.push(node);
        self.on_stack[node.index()] = true;
    }

    // Iterative strongconnect; each frame holds a node and its unexplored successors.
    fn visit<G: Successors>(&mut self, graph: &G, start: NodeId) {
        let mut frames: Vec<(NodeId, Vec<NodeId>)> = Vec::new();
        self.discover(start);
        frames.push((start, successors_rev(graph, start)));

        while let Some((node, pending)) = frames.last_mut() {
            let node = *node;
            if let Some(next) = pending.pop() {
                match self.index[next.index()] {
                    None => {
                        self.discover(next);
                        frames.push((next, successors_rev(graph, next)));
                    }
                    Some(next_index) if self.on_stack[next.index()] => {
                        let low = &mut self.lowlink[node.index()];
                        *low = (*low).min(next_index);
                    }
                    Some(_) => {}
                }
                continue;
            }

            frames.pop();
            if let Some((parent, _)) = frames.last() {
                let child_low = self.lowlink[node.index()];
                let low = &mut self.lowlink[parent.index()];
                *low = (*low).min(child_low);
            }

            if Some(self.lowlink[node.index()]) == self.index[node.index()] {
                let mut component = Vec::new();
                while let Some(member) = self.stack.pop() {
                    self.on_stack[member.index()] = false;
                    component.push(member);
                    if member == node {
                        break;
                    }
                }
                component.sort();
                self.components.push(component);
            }
        }
    }
}

fn successors_rev<G: Successors>(graph: &G, node: NodeId) -> Vec<NodeId> {
    let mut succ: Vec<NodeId> = graph.successors(node).collect();
    succ.reverse();
    succ
}
