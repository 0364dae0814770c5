//! The node contract.
//!
//! Mirrors `GraphNode<FloatType>` in the original runtime. Every built-in
//! node kind implements [`Node`] directly; the interpreter and render
//! sequence never know about concrete node types, only this trait. `&self`
//! (not `&mut self`) throughout: a node's `Arc` is held by both the graph
//! store (control thread, calls `set_property`/`process_events`) and a live
//! render sequence (audio thread, calls `process`) at the same time, so
//! nodes carry their own interior mutability — atomics for hot scalar state
//! (§4.6's gain ramp), `parking_lot::Mutex` for anything bigger that only
//! the audio thread actually touches in steady state (§4.5's tap delay
//! line).

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::ReturnCode;
use crate::id::NodeId;
use crate::resources::SharedResourceMap;
use crate::value::Value;

/// Everything a node needs to process one audio block.
pub struct BlockContext<'a> {
    pub inputs: &'a [&'a [f32]],
    pub outputs: &'a mut [&'a mut [f32]],
    pub num_samples: usize,
    /// Whether the owning root is active (§4.6) — roots fading out still
    /// run their subsequence so the ramp can complete, but nodes that care
    /// about "is anyone really listening" read this rather than inferring
    /// it from gain.
    pub active: bool,
}

pub trait Node: Send + Sync {
    fn id(&self) -> NodeId;

    /// Number of output channels this node declares; the render-sequence
    /// builder allocates one scratch buffer per channel. Most node kinds
    /// declare exactly one.
    fn num_output_channels(&self) -> usize {
        1
    }

    fn set_property(
        &self,
        key: &str,
        value: &Value,
        resources: &mut SharedResourceMap,
    ) -> ReturnCode;

    /// Current property values, for `Runtime::snapshot()`. Not on the
    /// audio-thread hot path.
    fn properties(&self) -> HashMap<String, Value>;

    fn process(&self, ctx: &mut BlockContext<'_>);

    /// Drains any buffered events and calls `emit` for each. Must not
    /// block or allocate when there's nothing to emit.
    fn process_events(&self, _emit: &mut dyn FnMut(&str, Value)) {}

    /// Called once per block, after every subsequence in the render
    /// sequence has run `process` (§4.5). Only `TapOut` overrides this;
    /// every other node kind is a no-op, which is why this lives on the
    /// contract rather than behind a downcast — the builder can call it on
    /// every node unconditionally.
    fn promote_tap_buffers(&self, _num_samples: usize) {}

    /// Whether the graph store should keep scheduling this node's root
    /// subsequence (§4.6). Only `RootNode` overrides this with its ramp
    /// check; every other node kind defaults to `true`, which is harmless
    /// since only root nodes are ever consulted here.
    fn still_running(&self) -> bool {
        true
    }

    /// Whether this root's target gain is "on" (§4.6) — as opposed to
    /// fading out. Tap promotion and event delivery are gated on this,
    /// only ever queried on root nodes; the default is harmless elsewhere.
    fn is_active(&self) -> bool {
        true
    }

    fn reset(&self) {}
}

/// Small helper every built-in node embeds to back `properties()` without
/// duplicating the bookkeeping in each impl.
#[derive(Default)]
pub struct PropertyStore {
    values: Mutex<HashMap<String, Value>>,
}

impl PropertyStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, key: &str, value: Value) {
        self.values.lock().insert(key.to_owned(), value);
    }

    #[must_use]
    pub fn snapshot(&self) -> HashMap<String, Value> {
        self.values.lock().clone()
    }
}

/// Constructs a boxed node instance given its id and the engine's sample
/// rate/block size. Matches the `NodeFactoryFn` signature in the original
/// runtime's `registerNodeType`.
pub type NodeFactory = fn(NodeId, f32, usize) -> Arc<dyn Node>;
