//! `multiply`: elementwise product of all its input channels.
//!
//! Like [`super::constant::ConstNode`], this exists so the E2E scenarios in
//! §8 have a minimal way to scale a signal (e.g. applying a feedback gain
//! before a `TapOut`) without pulling in a DSP node library, which is
//! explicitly out of scope (§1).

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ReturnCode;
use crate::id::NodeId;
use crate::node::{BlockContext, Node, PropertyStore};
use crate::resources::SharedResourceMap;
use crate::value::Value;

pub struct MultiplyNode {
    id: NodeId,
    props: PropertyStore,
}

impl MultiplyNode {
    #[must_use]
    pub fn new(id: NodeId, _sample_rate: f32, _block_size: usize) -> Self {
        Self {
            id,
            props: PropertyStore::new(),
        }
    }

    #[must_use]
    pub fn construct(id: NodeId, sample_rate: f32, block_size: usize) -> Arc<dyn Node> {
        Arc::new(Self::new(id, sample_rate, block_size))
    }
}

impl Node for MultiplyNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn set_property(
        &self,
        key: &str,
        value: &Value,
        _resources: &mut SharedResourceMap,
    ) -> ReturnCode {
        self.props.record(key, value.clone());
        ReturnCode::Ok
    }

    fn properties(&self) -> HashMap<String, Value> {
        self.props.snapshot()
    }

    fn process(&self, ctx: &mut BlockContext<'_>) {
        if ctx.outputs.is_empty() {
            return;
        }
        let output = &mut ctx.outputs[0];
        if ctx.inputs.is_empty() {
            output[..ctx.num_samples].fill(0.0);
            return;
        }

        output[..ctx.num_samples].copy_from_slice(&ctx.inputs[0][..ctx.num_samples]);
        for input in &ctx.inputs[1..] {
            for i in 0..ctx.num_samples {
                output[i] *= input[i];
            }
        }
    }
}
