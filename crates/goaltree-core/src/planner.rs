//! Update planning
//!
//! Picks the nodes whose derived fields can change after an edit. A change
//! to one node moves every ancestor's rollups, and re-parenting moves the
//! depth, root and chain priority of the whole subtree below it.

use crate::graph::GoalGraph;
use crate::types::NodeId;
use std::collections::HashSet;

/// Nodes to recompute for a set of changed identifiers
///
/// An empty change set means "everything". Otherwise each changed node that
/// still exists contributes itself, its ancestor chain and its descendant
/// subtree; deleted identifiers contribute nothing. The result follows graph
/// scan order.
#[must_use]
pub fn plan_updates(graph: &GoalGraph, changed: &HashSet<NodeId>) -> Vec<NodeId> {
    if changed.is_empty() {
        return graph.ids().cloned().collect();
    }

    let mut affected: HashSet<NodeId> = HashSet::new();
    for id in changed {
        if !graph.contains(id) {
            continue;
        }
        affected.insert(id.clone());
        collect_ancestors(graph, id, &mut affected);
        collect_descendants(graph, id, &mut affected);
    }

    tracing::debug!(
        "Planned {} of {} goals for {} change(s)",
        affected.len(),
        graph.len(),
        changed.len()
    );
    graph.ids().filter(|id| affected.contains(*id)).cloned().collect()
}

/// Ancestor chain of a node up to its root, cycle-guarded
#[must_use]
pub fn ancestors(graph: &GoalGraph, id: &NodeId) -> HashSet<NodeId> {
    let mut out = HashSet::new();
    collect_ancestors(graph, id, &mut out);
    out.remove(id);
    out
}

/// Full subtree below a node, cycle-guarded
#[must_use]
pub fn descendants(graph: &GoalGraph, id: &NodeId) -> HashSet<NodeId> {
    let mut out = HashSet::new();
    collect_descendants(graph, id, &mut out);
    out.remove(id);
    out
}

fn collect_ancestors(graph: &GoalGraph, id: &NodeId, out: &mut HashSet<NodeId>) {
    let mut visited: HashSet<&NodeId> = HashSet::from([id]);
    let mut current = graph.parent_of(id);
    while let Some(parent) = current {
        if !visited.insert(&parent.id) {
            break;
        }
        out.insert(parent.id.clone());
        current = graph.parent_of(&parent.id);
    }
}

fn collect_descendants(graph: &GoalGraph, id: &NodeId, out: &mut HashSet<NodeId>) {
    let mut visited: HashSet<&NodeId> = HashSet::from([id]);
    let mut stack: Vec<&NodeId> = vec![id];
    while let Some(current) = stack.pop() {
        let Some(node) = graph.get(current) else {
            continue;
        };
        for child in &node.children {
            if visited.insert(child) {
                out.insert(child.clone());
                stack.push(child);
            }
        }
    }
}
