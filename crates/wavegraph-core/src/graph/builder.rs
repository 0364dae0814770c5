//! Render-sequence builder (§4.3).
//!
//! Mirrors `Runtime::traverse`/`Runtime::buildRenderSequence` in the
//! original runtime: a DFS post-order walk from each sorted root, allocating
//! one scratch buffer per node output and wiring each node's inputs to its
//! children's already-allocated buffers. A node reachable from more than one
//! parent — or from more than one root — is visited, and has its buffers
//! allocated, exactly once; every later reference just reuses the same
//! buffer, which is how the builder implements structure sharing.

use std::collections::HashMap;
use std::sync::Arc;

use crate::id::NodeId;
use crate::node::Node;
use crate::scratch::BufferSlot;

use super::sequence::{GraphRenderSequence, RenderOp, RootRenderSequence};
use super::store::GraphStore;

#[must_use]
pub fn build_render_sequence(store: &mut GraphStore) -> GraphRenderSequence {
    let sorted = store.sorted_roots();
    store.scratch.reset();

    let mut visited: HashMap<NodeId, Vec<BufferSlot>> = HashMap::new();
    let mut roots = Vec::new();

    for root_id in sorted {
        let Some(entry) = store.nodes.get(&root_id) else {
            continue;
        };
        let root = Arc::clone(&entry.node);
        let active = root.is_active();

        let mut ops = Vec::new();
        let mut node_list = Vec::new();
        traverse(&store.nodes, &mut store.scratch, root_id, active, &mut visited, &mut ops, &mut node_list);

        let Some(root_output) = visited.get(&root_id).and_then(|slots| slots.first()).cloned() else {
            continue;
        };

        roots.push(RootRenderSequence {
            root,
            node_list,
            ops,
            root_output,
            output_channel: root_channel(&entry.node),
        });
    }

    GraphRenderSequence { roots }
}

fn root_channel(root: &Arc<dyn Node>) -> usize {
    // RootNode exposes its channel via the generic property snapshot so the
    // builder doesn't need to downcast the trait object. Absent a "channel"
    // property, the root was never routed — `UNSET_CHANNEL` always fails the
    // render sequence's range check rather than aliasing channel 0.
    root.properties()
        .get("channel")
        .and_then(crate::value::Value::as_number)
        .map(|n| n as usize)
        .unwrap_or(crate::builtins::RootNode::UNSET_CHANNEL)
}

#[allow(clippy::too_many_arguments)]
fn traverse(
    nodes: &HashMap<NodeId, super::store::NodeEntry>,
    arena: &mut crate::scratch::ScratchArena,
    id: NodeId,
    active: bool,
    visited: &mut HashMap<NodeId, Vec<BufferSlot>>,
    ops: &mut Vec<RenderOp>,
    node_list: &mut Vec<Arc<dyn Node>>,
) {
    if visited.contains_key(&id) {
        return;
    }
    let Some(entry) = nodes.get(&id) else {
        return;
    };

    for child in entry.children.clone() {
        traverse(nodes, arena, child, active, visited, ops, node_list);
    }

    let input_slots: Vec<BufferSlot> = entry
        .children
        .iter()
        .filter_map(|child| visited.get(child).and_then(|slots| slots.first().cloned()))
        .collect();

    let num_outputs = entry.node.num_output_channels().max(1);
    let output_slots: Vec<BufferSlot> = (0..num_outputs).map(|_| arena.next_slot()).collect();

    visited.insert(id, output_slots.clone());
    node_list.push(Arc::clone(&entry.node));
    ops.push(RenderOp {
        node: Arc::clone(&entry.node),
        input_slots,
        output_slots,
        active,
    });
}
