//! Depth-first orderings.

use crate::utils::graph::{NodeId, Successors};

/// Returns the nodes reachable from `start` in depth-first postorder.
///
/// Successors are explored in adjacency order. The traversal uses an explicit
/// stack, so deep graphs cannot overflow the call stack.
pub fn postorder<G: Successors>(graph: &G, start: NodeId) -> Vec<NodeId> {
    let mut order = Vec::new();
    if start.index() >= graph.node_count() {
        return order;
    }

    let mut visited = vec![false; graph.node_count()];
    // (node, successors not yet explored)
    let mut stack: Vec<(NodeId, Vec<NodeId>)> = Vec::new();

    visited[start.index()] = true;
    stack.push((start, pending_successors(graph, start)));

    while let Some((node, pending)) = stack.last_mut() {
        if let Some(next) = pending.pop() {
            if !visited[next.index()] {
                visited[next.index()] = true;
                let next_pending = pending_successors(graph, next);
                stack.push((next, next_pending));
            }
        } else {
            order.push(*node);
            stack.pop();
        }
    }

    order
}

/// Returns the nodes reachable from `start` in reverse postorder.
///
/// In reverse postorder every node appears before its successors, except
/// along back edges. This is the iteration order dominator computation
/// converges fastest in.
pub fn reverse_postorder<G: Successors>(graph: &G, start: NodeId) -> Vec<NodeId> {
    let mut order = postorder(graph, start);
    order.reverse();
    order
}

// Reversed so that `pop` yields successors in adjacency order.
fn pending_successors<G: Successors>(graph: &G, node: NodeId) -> Vec<NodeId> {
    let mut succ: Vec<NodeId> = graph.successors(node).collect();
    succ.reverse();
    succ
}
