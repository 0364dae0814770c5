//! Root node: the entry point of a render sequence and owner of the
//! activate/deactivate gain ramp (§4.6).
//!
//! Direct port of `RootNode`'s `process`/`stillRunning` in the original
//! runtime: a fixed-rate linear ramp of `20 / sampleRate` per sample toward
//! a target of 0 or 1, clamped to `[0, 1]`. A root keeps running — and so
//! keeps its subsequence alive in the builder's sorted-roots list — for as
//! long as it's active, or until the ramp has fully settled on a target of
//! zero.
//!
//! An un-configured channel defaults to `usize::MAX`, never `0` — matching
//! the original's `channelIndex = -1` default (`builtins/Core.h`), whose
//! negative-to-unsigned conversion guarantees an un-routed root stays out of
//! range until `setProperty("channel", ...)` is called.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam::atomic::AtomicCell;

use crate::error::ReturnCode;
use crate::id::NodeId;
use crate::node::{BlockContext, Node, PropertyStore};
use crate::resources::SharedResourceMap;
use crate::value::Value;

pub struct RootNode {
    id: NodeId,
    sample_rate: f32,
    current_gain: AtomicCell<f32>,
    target_gain: AtomicCell<f32>,
    channel: AtomicUsize,
    props: PropertyStore,
}

impl RootNode {
    #[must_use]
    pub fn new(id: NodeId, sample_rate: f32, _block_size: usize) -> Self {
        Self {
            id,
            sample_rate,
            current_gain: AtomicCell::new(0.0),
            target_gain: AtomicCell::new(0.0),
            channel: AtomicUsize::new(Self::UNSET_CHANNEL),
            props: PropertyStore::new(),
        }
    }

    /// Sentinel for "no channel configured yet" — always fails a
    /// `channel >= output.len()` range check, so an un-routed root stays
    /// silent rather than defaulting onto channel 0.
    pub const UNSET_CHANNEL: usize = usize::MAX;

    #[must_use]
    pub fn construct(id: NodeId, sample_rate: f32, block_size: usize) -> Arc<dyn Node> {
        Arc::new(Self::new(id, sample_rate, block_size))
    }

    /// `target >= 0.5`, matching the original's `on()`/"active" semantics.
    #[must_use]
    pub fn active(&self) -> bool {
        self.target_gain.load() >= 0.5
    }

    /// A root keeps its subsequence scheduled while active, or while its
    /// ramp hasn't settled yet (fading out).
    #[must_use]
    pub fn still_running(&self) -> bool {
        let target = self.target_gain.load();
        let current = self.current_gain.load();
        target >= 0.5 || (current - target).abs() >= f32::EPSILON
    }

    #[must_use]
    pub fn channel(&self) -> usize {
        self.channel.load(Ordering::Relaxed)
    }
}

impl Node for RootNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn set_property(
        &self,
        key: &str,
        value: &Value,
        _resources: &mut SharedResourceMap,
    ) -> ReturnCode {
        match key {
            "active" => {
                let Some(b) = value.as_bool() else {
                    return ReturnCode::InvalidPropertyType;
                };
                self.target_gain.store(if b { 1.0 } else { 0.0 });
                self.props.record(key, value.clone());
                ReturnCode::Ok
            }
            "channel" => {
                let Some(n) = value.as_number() else {
                    return ReturnCode::InvalidPropertyType;
                };
                if n < 0.0 {
                    return ReturnCode::InvalidPropertyValue;
                }
                self.channel.store(n as usize, Ordering::Relaxed);
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

    fn still_running(&self) -> bool {
        RootNode::still_running(self)
    }

    fn is_active(&self) -> bool {
        RootNode::active(self)
    }

    fn process(&self, ctx: &mut BlockContext<'_>) {
        if ctx.outputs.is_empty() {
            return;
        }
        if ctx.inputs.is_empty() {
            for output in &mut *ctx.outputs {
                output[..ctx.num_samples].fill(0.0);
            }
            return;
        }

        let target = self.target_gain.load();
        let mut current = self.current_gain.load();
        let direction: f32 = if target < current { -1.0 } else { 1.0 };
        let step = direction * 20.0 / self.sample_rate;

        let input = ctx.inputs[0];
        let output = &mut ctx.outputs[0];
        for i in 0..ctx.num_samples {
            output[i] = input[i] * current;
            current = (current + step).clamp(0.0, 1.0);
        }
        self.current_gain.store(current);
    }
}
