//! The compiled, immutable render sequence the audio thread actually runs.
//!
//! Mirrors `GraphRenderSequence`/`RootRenderSequence` in
//! `original_source/runtime/elem/GraphRenderSequence.h`. Built once per
//! graph mutation on the control thread (see [`super::builder`]), handed to
//! the audio thread through the handoff ring, and then run block after
//! block with zero allocation.

use std::sync::Arc;

use crate::id::NodeId;
use crate::node::{BlockContext, Node};
use crate::scratch::BufferSlot;

/// One step of a compiled subsequence: run a single node's `process` against
/// scratch buffers already wired up by the builder.
pub struct RenderOp {
    pub node: Arc<dyn Node>,
    pub input_slots: Vec<BufferSlot>,
    pub output_slots: Vec<BufferSlot>,
    /// Captured at build time, not re-read per block — a render sequence is
    /// an immutable snapshot (§4.3).
    pub active: bool,
}

impl RenderOp {
    fn run(&self, num_samples: usize) {
        let input_refs: Vec<_> = self.input_slots.iter().map(|s| s.borrow()).collect();
        let input_slices: Vec<&[f32]> = input_refs.iter().map(|r| &r[..num_samples]).collect();

        let mut output_guards: Vec<_> = self.output_slots.iter().map(|s| s.borrow_mut()).collect();
        let mut output_slices: Vec<&mut [f32]> = output_guards
            .iter_mut()
            .map(|g| &mut g[..num_samples])
            .collect();

        let mut ctx = BlockContext {
            inputs: &input_slices,
            outputs: &mut output_slices,
            num_samples,
            active: self.active,
        };
        self.node.process(&mut ctx);
    }
}

/// One root's compiled subsequence: the DFS-ordered op list feeding into
/// the root node itself, plus everything needed to mix it into the output
/// and to run its post-block tap promotion / event relay.
pub struct RootRenderSequence {
    pub root: Arc<dyn Node>,
    /// Every node visited for this root, in the same post-order the ops
    /// ran in — used for tap promotion and the event relay (§4.5/§4.9).
    pub node_list: Vec<Arc<dyn Node>>,
    pub ops: Vec<RenderOp>,
    /// The root node's own channel-0 scratch buffer, summed into the mix.
    pub root_output: BufferSlot,
    pub output_channel: usize,
}

impl RootRenderSequence {
    #[must_use]
    pub fn still_running(&self) -> bool {
        self.root.still_running()
    }

    /// Runs every op in DFS order, then sums this root's output into
    /// `output` at `output_channel`. No-op — freezing the whole subgraph,
    /// ramps and tap delay lines included — if the root has already fully
    /// faded out or its declared channel is out of range.
    pub fn process(&self, output: &mut [&mut [f32]], num_samples: usize) {
        if !self.still_running() || self.output_channel >= output.len() {
            return;
        }

        for op in &self.ops {
            op.run(num_samples);
        }

        let root_buf = self.root_output.borrow();
        let dst = &mut output[self.output_channel];
        for i in 0..num_samples {
            dst[i] += root_buf[i];
        }
    }

    /// Runs `processEvents` on every node in this subsequence, but only
    /// while the root is active (§4.9) — a fading-out root stops emitting
    /// events even though its audio ramp keeps running. Each node's own
    /// `(name, value)` callback (matching the original's `processEvents`
    /// signature) is wrapped here so `emit` sees which node actually raised
    /// the event.
    pub fn process_queued_events(&self, emit: &mut dyn FnMut(NodeId, &str, crate::value::Value)) {
        if !self.root.is_active() {
            return;
        }
        for node in &self.node_list {
            let id = node.id();
            node.process_events(&mut |name, value| emit(id, name, value));
        }
    }

    /// Promotes every `TapOut` node's delay line into its shared buffer
    /// (§4.5), but only while the root is active — an inactive root's taps
    /// hold their last value rather than keep writing.
    pub fn promote_tap_buffers(&self, num_samples: usize) {
        if !self.root.is_active() {
            return;
        }
        for node in &self.node_list {
            node.promote_tap_buffers(num_samples);
        }
    }
}

/// The full compiled sequence for one graph snapshot: every root's
/// subsequence, sorted active-first (§4.3).
pub struct GraphRenderSequence {
    pub roots: Vec<RootRenderSequence>,
}

impl GraphRenderSequence {
    /// Zeroes every output channel, runs every still-running root's
    /// subsequence (mixing into the shared output), then — only after every
    /// subsequence has had a chance to *read* this block's tap buffers —
    /// promotes this block's writes. That ordering is what keeps feedback
    /// exactly one block deep across a hot graph swap (§4.5).
    pub fn process(&self, output: &mut [&mut [f32]], num_samples: usize) {
        for channel in output.iter_mut() {
            channel[..num_samples].fill(0.0);
        }

        for root in &self.roots {
            root.process(output, num_samples);
        }

        for root in &self.roots {
            root.promote_tap_buffers(num_samples);
        }
    }

    pub fn process_queued_events(&self, emit: &mut dyn FnMut(NodeId, &str, crate::value::Value)) {
        for root in &self.roots {
            root.process_queued_events(emit);
        }
    }
}
