//! `const`: emits a fixed scalar value every sample. No inputs.
//!
//! Not part of the original runtime's contract, but every E2E scenario in
//! §8 needs a source node to drive a root with — this is the smallest
//! possible one, analogous to the `ConstNode` exercised throughout the
//! original test suite's JavaScript front-end (out of scope here, but the
//! node kind itself is the natural minimal stand-in).

use std::collections::HashMap;
use std::sync::Arc;

use crossbeam::atomic::AtomicCell;

use crate::error::ReturnCode;
use crate::id::NodeId;
use crate::node::{BlockContext, Node, PropertyStore};
use crate::resources::SharedResourceMap;
use crate::value::Value;

pub struct ConstNode {
    id: NodeId,
    value: AtomicCell<f32>,
    props: PropertyStore,
}

impl ConstNode {
    #[must_use]
    pub fn new(id: NodeId, _sample_rate: f32, _block_size: usize) -> Self {
        Self {
            id,
            value: AtomicCell::new(0.0),
            props: PropertyStore::new(),
        }
    }

    #[must_use]
    pub fn construct(id: NodeId, sample_rate: f32, block_size: usize) -> Arc<dyn Node> {
        Arc::new(Self::new(id, sample_rate, block_size))
    }
}

impl Node for ConstNode {
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
            "value" => {
                let Some(n) = value.as_number() else {
                    return ReturnCode::InvalidPropertyType;
                };
                self.value.store(n as f32);
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
        let v = self.value.load();
        ctx.outputs[0][..ctx.num_samples].fill(v);
    }
}
