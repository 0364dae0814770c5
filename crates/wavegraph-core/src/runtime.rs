//! The top-level engine: owns the graph store on the control thread and
//! hands compiled render sequences to the audio thread through a lock-free
//! handoff ring (§4.1, §D).
//!
//! Mirrors `Runtime<FloatType>` in the original runtime, minus everything
//! that runtime bundles in beyond this crate's scope (JS bridge, audio
//! device I/O, JSON wire decoding — see `spec.md`'s Non-goals). What's left
//! is exactly the two methods a host embeds: `apply_instructions` from the
//! control thread, `process` from the audio thread.

use crate::builtins::builtin_factories;
use crate::error::ReturnCode;
use crate::graph::{apply_instructions, GraphRenderSequence, GraphStore, Instruction};
use crate::id::NodeId;
use crate::ring::SpscQueue;
use crate::value::Value;

/// Handoff ring depth between control and audio thread. One in flight plus
/// a little slack is all a correctly-paced host ever needs; sized generously
/// since the cost of an idle slot is a few pointers.
const SEQUENCE_RING_CAPACITY: usize = 4;
const EVENT_RING_CAPACITY: usize = 256;

/// A relayed event, captured on the audio thread and drained on the control
/// thread (§4.9). `node` names the emitting node so hosts without node-local
/// event routing can still disambiguate.
#[derive(Debug, Clone)]
pub struct Event {
    pub node: NodeId,
    pub name: String,
    pub value: Value,
}

/// Owns the mutable graph (control thread) and the live render sequence
/// (audio thread), connected by SPSC rings. A single `Runtime` is meant to be
/// split across exactly two threads: one calls [`Runtime::apply_instructions`],
/// the other calls [`Runtime::process`]. Both are safe to call concurrently;
/// neither blocks or allocates once a render sequence has been handed off.
pub struct Runtime {
    store: GraphStore,
    // `GraphRenderSequence` is `Send` (every buffer handle it holds is
    // `Send`) but not `Sync` (scratch buffers are `RefCell`-backed, touched
    // by the audio thread only) — it moves across the ring by value rather
    // than through an extra `Arc`, which would require `Sync` too.
    sequence_ring: SpscQueue<GraphRenderSequence>,
    event_ring: SpscQueue<Event>,
    active_sequence: Option<GraphRenderSequence>,
}

impl Runtime {
    #[must_use]
    pub fn new(sample_rate: f32, block_size: usize) -> Self {
        let mut store = GraphStore::new(sample_rate, block_size);
        for (type_name, factory) in builtin_factories() {
            let result = store.register_node_type(type_name, factory);
            debug_assert!(result.is_ok(), "built-in node type name collided: {type_name}");
        }

        Self {
            store,
            sequence_ring: SpscQueue::new(SEQUENCE_RING_CAPACITY),
            event_ring: SpscQueue::new(EVENT_RING_CAPACITY),
            active_sequence: None,
        }
    }

    /// Registers a host-supplied node factory under `type_name`. Fails with
    /// `NodeTypeAlreadyExists` if the name is already taken by a built-in or
    /// a previous registration (§6 Control API).
    pub fn register_node_type(&mut self, type_name: impl Into<String>, factory: crate::node::NodeFactory) -> ReturnCode {
        self.store.register_node_type(type_name, factory)
    }

    /// Broadcasts `reset()` to every live node (§6 Control API) — used by a
    /// host restarting playback without tearing down the graph.
    pub fn reset(&self) {
        self.store.reset();
    }

    /// Adds an immutable named buffer for nodes to read (e.g. wavetable
    /// data). Add-only: returns `false` without effect if `name` is already
    /// bound (§6 Control API, §4.8).
    pub fn update_shared_resource_map(&mut self, name: impl Into<String>, data: Vec<f32>) -> bool {
        self.store.resources_mut().set_immutable(name, data)
    }

    /// Drops shared-resource entries no longer referenced by any live node
    /// (§6 Control API, §4.8). The interpreter also calls this after every
    /// instruction batch; exposed here for a host that wants to prune
    /// independent of a mutation batch (e.g. after a long idle period).
    pub fn prune_shared_resource_map(&mut self) {
        self.store.resources_mut().prune();
    }

    /// Every currently-bound shared-resource name, immutable or mutable (§6
    /// Control API).
    #[must_use]
    pub fn shared_resource_map_keys(&self) -> Vec<String> {
        self.store.resources().keys()
    }

    /// Control-thread entry point: applies a batch of instructions to the
    /// graph and, if it triggers a rebuild, pushes the new render sequence
    /// onto the handoff ring for the audio thread to pick up. May allocate;
    /// never call this from the audio thread.
    pub fn apply_instructions(&mut self, batch: &[Instruction]) -> ReturnCode {
        let (result, rebuilt) = apply_instructions(&mut self.store, batch);
        if let Some(sequence) = rebuilt {
            // `drain_keep_newest`-by-push: if the audio thread hasn't picked
            // up a previous swap yet, this push may transiently hold two
            // generations in the ring; the reader always takes the newest.
            let _ = self.sequence_ring.push(sequence);
        }
        result
    }

    /// Audio-thread entry point: picks up the newest compiled render
    /// sequence if one is waiting, then runs it for this block. Never
    /// allocates, locks a control-thread-only resource, or blocks.
    pub fn process(&mut self, output: &mut [&mut [f32]], num_samples: usize) {
        if let Some(sequence) = self.sequence_ring.drain_keep_newest() {
            self.active_sequence = Some(sequence);
        }

        let Some(sequence) = &self.active_sequence else {
            for channel in output.iter_mut() {
                channel[..num_samples].fill(0.0);
            }
            return;
        };

        sequence.process(output, num_samples);

        let ring = &self.event_ring;
        sequence.process_queued_events(&mut |node, name, value| {
            let _ = ring.push(Event {
                node,
                name: name.to_owned(),
                value,
            });
        });
    }

    /// Control-thread entry point: drains every event relayed from the audio
    /// thread since the last call.
    pub fn drain_events(&self) -> Vec<Event> {
        let mut out = Vec::new();
        while let Some(event) = self.event_ring.pop() {
            out.push(event);
        }
        out
    }

    /// Read-only snapshot of every live node's properties, keyed by the
    /// node's hex id (§F) — matches `Runtime::snapshot()` in the original
    /// runtime, used by hosts for debugging/inspector tooling rather than on
    /// any realtime path.
    #[must_use]
    pub fn snapshot(&self) -> std::collections::HashMap<String, std::collections::HashMap<String, Value>> {
        self.store
            .node_ids()
            .into_iter()
            .filter_map(|id| self.store.node(id).map(|entry| (id, entry)))
            .map(|(id, entry)| (id.to_hex(), entry.node.properties()))
            .collect()
    }

    #[must_use]
    pub fn sample_rate(&self) -> f32 {
        self.store.sample_rate()
    }

    #[must_use]
    pub fn block_size(&self) -> usize {
        self.store.block_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(rt: &mut Runtime, batch: Vec<Instruction>) -> ReturnCode {
        rt.apply_instructions(&batch)
    }

    #[test]
    fn silent_until_a_root_is_committed() {
        let mut rt = Runtime::new(44100.0, 4);
        let mut out = [0.0f32; 4];
        rt.process(&mut [&mut out], 4);
        assert_eq!(out, [0.0; 4]);
    }

    #[test]
    fn end_to_end_const_into_root_produces_audio() {
        let mut rt = Runtime::new(44100.0, 4);
        let result = commit(
            &mut rt,
            vec![
                Instruction::CreateNode { id: NodeId::new(1), type_name: "const".into() },
                Instruction::SetProperty {
                    id: NodeId::new(1),
                    key: "value".into(),
                    value: Value::Number(1.0),
                },
                Instruction::CreateNode { id: NodeId::new(2), type_name: "root".into() },
                Instruction::AppendChild { parent: NodeId::new(2), child: NodeId::new(1) },
                Instruction::SetProperty {
                    id: NodeId::new(2),
                    key: "channel".into(),
                    value: Value::Number(0.0),
                },
                Instruction::ActivateRoots { ids: vec![NodeId::new(2)] },
                Instruction::CommitUpdates,
            ],
        );
        assert!(result.is_ok());

        let mut out = [0.0f32; 4];
        // First block: root just activated, gain ramps up from 0.
        rt.process(&mut [&mut out], 4);
        assert!(out.iter().any(|s| *s > 0.0));
    }

    #[test]
    fn unknown_node_type_halts_batch_and_still_prunes() {
        let mut rt = Runtime::new(44100.0, 4);
        let result = commit(
            &mut rt,
            vec![Instruction::CreateNode { id: NodeId::new(1), type_name: "bogus".into() }],
        );
        assert_eq!(result, ReturnCode::UnknownNodeType);
    }

    #[test]
    fn snapshot_reflects_committed_properties() {
        let mut rt = Runtime::new(44100.0, 4);
        commit(
            &mut rt,
            vec![
                Instruction::CreateNode { id: NodeId::new(7), type_name: "const".into() },
                Instruction::SetProperty {
                    id: NodeId::new(7),
                    key: "value".into(),
                    value: Value::Number(0.5),
                },
            ],
        );
        let snap = rt.snapshot();
        let props = &snap[&NodeId::new(7).to_hex()];
        assert_eq!(props["value"].as_number(), Some(0.5));
    }

    #[test]
    fn registering_a_taken_type_name_fails() {
        let mut rt = Runtime::new(44100.0, 4);
        let result = rt.register_node_type("const", crate::builtins::ConstNode::construct);
        assert_eq!(result, ReturnCode::NodeTypeAlreadyExists);
    }

    #[test]
    fn shared_resource_map_is_add_only_and_listable() {
        let mut rt = Runtime::new(44100.0, 4);
        assert!(rt.update_shared_resource_map("table", vec![1.0, 2.0, 3.0]));
        assert!(!rt.update_shared_resource_map("table", vec![9.0]));
        assert_eq!(rt.shared_resource_map_keys(), vec!["table".to_owned()]);
    }

    #[test]
    fn relayed_events_are_attributed_to_the_emitting_node() {
        use crate::node::BlockContext;
        use crate::resources::SharedResourceMap;
        use std::collections::HashMap;
        use std::sync::Arc;

        struct PingNode {
            id: NodeId,
        }

        impl crate::node::Node for PingNode {
            fn id(&self) -> NodeId {
                self.id
            }

            fn set_property(&self, _key: &str, _value: &Value, _resources: &mut SharedResourceMap) -> ReturnCode {
                ReturnCode::Ok
            }

            fn properties(&self) -> HashMap<String, Value> {
                HashMap::new()
            }

            fn process(&self, ctx: &mut BlockContext<'_>) {
                for output in &mut *ctx.outputs {
                    output[..ctx.num_samples].fill(0.0);
                }
            }

            fn process_events(&self, emit: &mut dyn FnMut(&str, Value)) {
                emit("ping", Value::Number(1.0));
            }
        }

        fn construct_ping(id: NodeId, _sample_rate: f32, _block_size: usize) -> Arc<dyn crate::node::Node> {
            Arc::new(PingNode { id })
        }

        let mut rt = Runtime::new(44100.0, 4);
        rt.register_node_type("ping", construct_ping);
        commit(
            &mut rt,
            vec![
                Instruction::CreateNode { id: NodeId::new(1), type_name: "root".into() },
                Instruction::SetProperty {
                    id: NodeId::new(1),
                    key: "channel".into(),
                    value: Value::Number(0.0),
                },
                Instruction::CreateNode { id: NodeId::new(5), type_name: "ping".into() },
                Instruction::AppendChild { parent: NodeId::new(1), child: NodeId::new(5) },
                Instruction::ActivateRoots { ids: vec![NodeId::new(1)] },
                Instruction::CommitUpdates,
            ],
        );

        let mut out = [0.0f32; 4];
        rt.process(&mut [&mut out], 4);

        let events = rt.drain_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].node, NodeId::new(5));
        assert_eq!(events[0].name, "ping");
    }

    #[test]
    fn reset_zeroes_tap_out_delay_and_shared_buffer() {
        let mut rt = Runtime::new(44100.0, 4);
        commit(
            &mut rt,
            vec![
                Instruction::CreateNode { id: NodeId::new(1), type_name: "tap_out".into() },
                Instruction::SetProperty {
                    id: NodeId::new(1),
                    key: "name".into(),
                    value: Value::from("fb"),
                },
            ],
        );
        rt.update_shared_resource_map("unrelated", vec![1.0]);
        rt.reset();
        // No panic, and the reset broadcast reached every node without
        // needing a render sequence to be active. Both the tap's mutable
        // "fb" buffer and the unrelated immutable one are still listed.
        let mut keys = rt.shared_resource_map_keys();
        keys.sort();
        assert_eq!(keys, vec!["fb".to_owned(), "unrelated".to_owned()]);
    }
}
