//! The mutable graph model, owned entirely by the control thread.
//!
//! Mirrors the node/edge bookkeeping inside `Runtime<FloatType>` in the
//! original runtime (it isn't split into its own class there, but the
//! responsibilities are identical): a node table keyed by [`NodeId`], each
//! entry's ordered child list (an "edge" here is simply membership in a
//! parent's child list — there's no separate edge id, unlike the teacher's
//! `ProcessingGraph`, because render order is always a DFS from declared
//! roots rather than an arbitrary topological sort), and the current/former
//! root bookkeeping §4.2's `ActivateRoots` merge semantics require.

use std::collections::HashMap;

use tracing::trace;

use crate::error::ReturnCode;
use crate::id::NodeId;
use crate::node::{Node, NodeFactory};
use crate::resources::SharedResourceMap;
use crate::scratch::ScratchArena;
use crate::value::Value;
use std::sync::Arc;

pub struct NodeEntry {
    pub node: Arc<dyn Node>,
    pub type_name: String,
    pub children: Vec<NodeId>,
}

pub struct GraphStore {
    sample_rate: f32,
    block_size: usize,
    factories: HashMap<String, NodeFactory>,
    pub(crate) nodes: HashMap<NodeId, NodeEntry>,
    /// Roots named by the most recent `ActivateRoots`, in call order.
    current_roots: Vec<NodeId>,
    /// Former current roots that are fading out (§4.6) and must keep
    /// appearing in the render sequence until their ramp settles.
    former_roots: Vec<NodeId>,
    resources: SharedResourceMap,
    /// Reused across builds; reset (not reallocated) at the start of each
    /// `build_render_sequence` call (§5).
    pub(crate) scratch: ScratchArena,
}

impl GraphStore {
    #[must_use]
    pub fn new(sample_rate: f32, block_size: usize) -> Self {
        Self {
            sample_rate,
            block_size,
            factories: HashMap::new(),
            nodes: HashMap::new(),
            current_roots: Vec::new(),
            former_roots: Vec::new(),
            resources: SharedResourceMap::new(),
            scratch: ScratchArena::new(block_size),
        }
    }

    /// Registers a node factory under `type_name`. Fails with
    /// `NodeTypeAlreadyExists` if the name is already taken, matching
    /// `Runtime::registerNodeType` in the original runtime — node-type
    /// registration is add-only, never a silent overwrite.
    pub fn register_node_type(&mut self, type_name: impl Into<String>, factory: NodeFactory) -> ReturnCode {
        let type_name = type_name.into();
        if self.factories.contains_key(&type_name) {
            return ReturnCode::NodeTypeAlreadyExists;
        }
        self.factories.insert(type_name, factory);
        ReturnCode::Ok
    }

    /// Broadcasts `reset()` to every live node (§6 Control API). Only
    /// `TapOutNode`/stateful node kinds have anything to do here; most
    /// built-ins take the trait's no-op default.
    pub fn reset(&self) {
        for entry in self.nodes.values() {
            entry.node.reset();
        }
    }

    #[must_use]
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    #[must_use]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&NodeEntry> {
        self.nodes.get(&id)
    }

    pub fn resources(&self) -> &SharedResourceMap {
        &self.resources
    }

    #[must_use]
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.keys().copied().collect()
    }

    pub fn create_node(&mut self, id: NodeId, type_name: &str) -> ReturnCode {
        if self.nodes.contains_key(&id) {
            return ReturnCode::NodeAlreadyExists;
        }
        let Some(factory) = self.factories.get(type_name) else {
            return ReturnCode::UnknownNodeType;
        };

        let node = factory(id, self.sample_rate, self.block_size);
        self.nodes.insert(
            id,
            NodeEntry {
                node,
                type_name: type_name.to_owned(),
                children: Vec::new(),
            },
        );
        ReturnCode::Ok
    }

    pub fn delete_node(&mut self, id: NodeId) -> ReturnCode {
        if self.nodes.remove(&id).is_none() {
            return ReturnCode::NodeNotFound;
        }
        for entry in self.nodes.values_mut() {
            entry.children.retain(|child| *child != id);
        }
        self.current_roots.retain(|root| *root != id);
        self.former_roots.retain(|root| *root != id);
        ReturnCode::Ok
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> ReturnCode {
        if !self.nodes.contains_key(&child) {
            return ReturnCode::NodeNotFound;
        }
        let Some(entry) = self.nodes.get_mut(&parent) else {
            return ReturnCode::NodeNotFound;
        };
        entry.children.push(child);
        ReturnCode::Ok
    }

    pub fn set_property(&mut self, id: NodeId, key: &str, value: &Value) -> ReturnCode {
        let Some(entry) = self.nodes.get(&id) else {
            return ReturnCode::NodeNotFound;
        };
        let node = Arc::clone(&entry.node);
        node.set_property(key, value, &mut self.resources)
    }

    /// §4.2 merge semantics: roots named in `ids` become current and are
    /// activated; previously current roots not named here are deactivated
    /// and, if their ramp hasn't settled yet, retained as "former" roots so
    /// the builder keeps scheduling them until the fade completes.
    pub fn activate_roots(&mut self, ids: &[NodeId]) -> ReturnCode {
        for id in ids {
            match self.nodes.get(id) {
                None => return ReturnCode::NodeNotFound,
                Some(entry) if entry.type_name != "root" => {
                    return ReturnCode::InvariantViolation;
                }
                Some(_) => {}
            }
        }

        let new_set: std::collections::HashSet<NodeId> = ids.iter().copied().collect();
        let previously_current = std::mem::take(&mut self.current_roots);
        for old in &previously_current {
            if new_set.contains(old) {
                continue;
            }
            if let Some(entry) = self.nodes.get(old) {
                let node = Arc::clone(&entry.node);
                node.set_property("active", &Value::Bool(false), &mut self.resources);
                if node.still_running() {
                    self.former_roots.push(*old);
                }
            }
        }

        for id in ids {
            if let Some(entry) = self.nodes.get(id) {
                let node = Arc::clone(&entry.node);
                node.set_property("active", &Value::Bool(true), &mut self.resources);
            }
        }

        self.current_roots = ids.to_vec();
        trace!(
            current = self.current_roots.len(),
            former = self.former_roots.len(),
            "activate_roots invariant scan"
        );
        ReturnCode::Ok
    }

    /// Active roots first (in `ActivateRoots` call order), then fading-out
    /// former roots still running, pruning any that have settled.
    pub fn sorted_roots(&mut self) -> Vec<NodeId> {
        let nodes = &self.nodes;
        let before = self.former_roots.len();
        self.former_roots
            .retain(|id| nodes.get(id).is_some_and(|e| e.node.still_running()));
        trace!(
            settled = before - self.former_roots.len(),
            still_fading = self.former_roots.len(),
            "sorted_roots invariant scan"
        );

        let mut out = self.current_roots.clone();
        out.extend(self.former_roots.iter().copied());
        out
    }

    /// Drops resource-map entries and (in a future extension) any other
    /// garbage no live node references anymore. Runs after every applied
    /// instruction batch, independent of whether the batch halted early.
    pub fn prune_garbage(&mut self) {
        self.resources.prune();
    }

    pub fn resources_mut(&mut self) -> &mut SharedResourceMap {
        &mut self.resources
    }
}
