//! Feedback taps: `TapIn` reads a named shared buffer, `TapOut` passes its
//! input through while also copying it into a delay line that gets
//! promoted into the shared buffer once every subsequence has read this
//! block (§4.5).
//!
//! Direct port of `TapInNode`/`TapOutNode` in
//! `original_source/runtime/elem/builtins/Feedback.h`. Both nodes hand the
//! shared buffer handle from `set_property("name", ...)` to the audio
//! thread through a small SPSC queue rather than storing it directly,
//! exactly like the original's `bufferQueue`/`tapBufferQueue` — the control
//! thread may rebind `name` to a different buffer at any time, and the
//! audio thread must pick up the new one without a lock.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::ReturnCode;
use crate::id::NodeId;
use crate::node::{BlockContext, Node, PropertyStore};
use crate::resources::{MutableBuffer, SharedResourceMap};
use crate::ring::SpscQueue;
use crate::value::Value;

const NAME_QUEUE_CAPACITY: usize = 4;

pub struct TapInNode {
    id: NodeId,
    block_size: usize,
    pending: SpscQueue<MutableBuffer>,
    active: Mutex<Option<MutableBuffer>>,
    props: PropertyStore,
}

impl TapInNode {
    #[must_use]
    pub fn new(id: NodeId, _sample_rate: f32, block_size: usize) -> Self {
        Self {
            id,
            block_size,
            pending: SpscQueue::new(NAME_QUEUE_CAPACITY),
            active: Mutex::new(None),
            props: PropertyStore::new(),
        }
    }

    #[must_use]
    pub fn construct(id: NodeId, sample_rate: f32, block_size: usize) -> Arc<dyn Node> {
        Arc::new(Self::new(id, sample_rate, block_size))
    }
}

impl Node for TapInNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn num_output_channels(&self) -> usize {
        1
    }

    fn set_property(
        &self,
        key: &str,
        value: &Value,
        resources: &mut SharedResourceMap,
    ) -> ReturnCode {
        match key {
            "name" => {
                let Some(name) = value.as_str() else {
                    return ReturnCode::InvalidPropertyType;
                };
                let buf = resources.get_or_create_mutable(name, self.block_size);
                let _ = self.pending.push(buf);
                self.props.record(key, value.clone());
                ReturnCode::Ok
            }
            _ => {
                self.props.record(key, value.clone());
                ReturnCode::Ok
            }
        }
    }

    fn properties(&self) -> HashMap<String, Value> {
        self.props.snapshot()
    }

    fn process(&self, ctx: &mut BlockContext<'_>) {
        if let Some(newest) = self.pending.drain_keep_newest() {
            *self.active.lock() = Some(newest);
        }

        if ctx.outputs.is_empty() {
            return;
        }
        let output = &mut ctx.outputs[0];
        match self.active.lock().as_ref() {
            Some(buf) => {
                let src = buf.lock();
                let n = ctx.num_samples.min(src.len());
                output[..n].copy_from_slice(&src[..n]);
                output[n..ctx.num_samples].fill(0.0);
            }
            None => output[..ctx.num_samples].fill(0.0),
        }
    }
}

pub struct TapOutNode {
    id: NodeId,
    delay_buffer: Mutex<Vec<f32>>,
    pending: SpscQueue<MutableBuffer>,
    active: Mutex<Option<MutableBuffer>>,
    props: PropertyStore,
}

impl TapOutNode {
    #[must_use]
    pub fn new(id: NodeId, _sample_rate: f32, block_size: usize) -> Self {
        Self {
            id,
            delay_buffer: Mutex::new(vec![0.0; block_size]),
            pending: SpscQueue::new(NAME_QUEUE_CAPACITY),
            active: Mutex::new(None),
            props: PropertyStore::new(),
        }
    }

    #[must_use]
    pub fn construct(id: NodeId, sample_rate: f32, block_size: usize) -> Arc<dyn Node> {
        Arc::new(Self::new(id, sample_rate, block_size))
    }
}

impl Node for TapOutNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn num_output_channels(&self) -> usize {
        1
    }

    fn set_property(
        &self,
        key: &str,
        value: &Value,
        resources: &mut SharedResourceMap,
    ) -> ReturnCode {
        match key {
            "name" => {
                let Some(name) = value.as_str() else {
                    return ReturnCode::InvalidPropertyType;
                };
                let buf = resources.get_or_create_mutable(name, self.delay_buffer.lock().len());
                let _ = self.pending.push(buf);
                self.props.record(key, value.clone());
                ReturnCode::Ok
            }
            _ => {
                self.props.record(key, value.clone());
                ReturnCode::Ok
            }
        }
    }

    fn properties(&self) -> HashMap<String, Value> {
        self.props.snapshot()
    }

    fn process(&self, ctx: &mut BlockContext<'_>) {
        if ctx.outputs.is_empty() {
            return;
        }
        let output = &mut ctx.outputs[0];

        if ctx.inputs.is_empty() || ctx.num_samples > self.delay_buffer.lock().len() {
            output[..ctx.num_samples].fill(0.0);
            return;
        }

        let input = ctx.inputs[0];
        let mut delay = self.delay_buffer.lock();
        delay[..ctx.num_samples].copy_from_slice(&input[..ctx.num_samples]);
        output[..ctx.num_samples].copy_from_slice(&input[..ctx.num_samples]);
    }

    /// Drains a pending rebind first (so the writer can never get ahead of
    /// the reader across a hot graph swap), then copies this block's delay
    /// line into the shared buffer — after every subsequence has already
    /// read from it this block.
    fn promote_tap_buffers(&self, num_samples: usize) {
        if let Some(newest) = self.pending.drain_keep_newest() {
            *self.active.lock() = Some(newest);
        }

        if let Some(buf) = self.active.lock().as_ref() {
            let delay = self.delay_buffer.lock();
            let mut dst = buf.lock();
            let n = num_samples.min(delay.len()).min(dst.len());
            dst[..n].copy_from_slice(&delay[..n]);
        }
    }

    /// Zeroes the delay line and, if bound, the shared buffer itself — the
    /// one node kind `Runtime::reset()` actually needs to touch (§6).
    fn reset(&self) {
        self.delay_buffer.lock().fill(0.0);
        if let Some(buf) = self.active.lock().as_ref() {
            buf.lock().fill(0.0);
        }
    }
}
