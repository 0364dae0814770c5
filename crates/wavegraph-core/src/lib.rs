//! Wavegraph Core - a functional-reactive audio graph engine
//!
//! This crate is the realtime-safe runtime behind an instruction-driven
//! audio processing graph: a control thread mutates a DAG of named typed
//! nodes through an ordered instruction batch, the batch is compiled into an
//! immutable render sequence, and an audio thread runs that sequence block
//! by block without ever allocating, locking a contended resource, or
//! blocking.
//!
//! # Core Abstractions
//!
//! ## Graph mutation
//!
//! - [`graph::Instruction`] / [`graph::apply_instructions`] - the six-opcode
//!   instruction interpreter (§4.2)
//! - [`graph::GraphStore`] - the mutable node/edge table the interpreter
//!   operates on, owned by the control thread
//!
//! ## Render sequence
//!
//! - [`graph::build_render_sequence`] - compiles a [`graph::GraphStore`]
//!   snapshot into an immutable [`graph::GraphRenderSequence`] via DFS
//!   post-order traversal with build-wide structural sharing
//! - [`graph::GraphRenderSequence`] / [`graph::RootRenderSequence`] - what
//!   the audio thread actually runs, block after block
//!
//! ## Node contract
//!
//! - [`node::Node`] - every node kind, built-in or host-registered, is an
//!   `Arc<dyn Node>` behind this trait
//! - [`builtins`] - the node kinds this crate ships: `root`, `tap_in`,
//!   `tap_out`, `const`, `multiply`
//!
//! ## Realtime primitives
//!
//! - [`ring::SpscQueue`] - lock-free control/audio handoff
//! - [`mc_ring::MultiChannelRing`] - lock-free multichannel capture ring
//!   with clobbering-writer overflow semantics
//! - [`pool::RefCountedPool`] - reference-counted object recycling
//! - [`scratch::ScratchArena`] - bump-allocated per-build scratch buffers
//! - [`resources::SharedResourceMap`] - named immutable and feedback-tap
//!   buffers shared across the graph
//!
//! ## Runtime
//!
//! - [`Runtime`] - the single type a host embeds: one method for the
//!   control thread, one for the audio thread
//!
//! # Example
//!
//! ```rust,ignore
//! use wavegraph_core::{Runtime, graph::Instruction, id::NodeId, value::Value};
//!
//! let mut rt = Runtime::new(44_100.0, 512);
//! rt.apply_instructions(&[
//!     Instruction::CreateNode { id: NodeId::new(1), type_name: "const".into() },
//!     Instruction::SetProperty { id: NodeId::new(1), key: "value".into(), value: Value::Number(1.0) },
//!     Instruction::CreateNode { id: NodeId::new(2), type_name: "root".into() },
//!     Instruction::SetProperty { id: NodeId::new(2), key: "channel".into(), value: Value::Number(0.0) },
//!     Instruction::AppendChild { parent: NodeId::new(2), child: NodeId::new(1) },
//!     Instruction::ActivateRoots { ids: vec![NodeId::new(2)] },
//!     Instruction::CommitUpdates,
//! ]);
//!
//! let mut left = vec![0.0f32; 512];
//! rt.process(&mut [&mut left], 512);
//! ```
//!
//! # Design Principles
//!
//! - **Realtime safe**: no allocation, locking, or blocking on the audio
//!   thread's hot path once a render sequence has been handed off
//! - **Lock-free handoff**: compiled sequences and relayed events cross the
//!   control/audio boundary through SPSC rings, never a mutex
//! - **Structural sharing**: a node reachable from more than one parent or
//!   root is processed exactly once per block

pub mod builtins;
pub mod error;
pub mod graph;
pub mod id;
pub mod mc_ring;
pub mod node;
pub mod pool;
pub mod resources;
pub mod ring;
pub mod runtime;
pub mod scratch;
pub mod value;

pub use error::ReturnCode;
pub use graph::{apply_instructions, build_render_sequence, GraphRenderSequence, GraphStore, Instruction, Opcode};
pub use id::NodeId;
pub use node::{BlockContext, Node};
pub use runtime::{Event, Runtime};
pub use value::Value;
