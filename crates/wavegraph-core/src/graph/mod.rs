//! The graph subsystem: mutable store, instruction interpreter, the
//! render-sequence builder, and the compiled render sequence itself.

mod builder;
mod interpreter;
mod sequence;
mod store;

pub use builder::build_render_sequence;
pub use interpreter::{apply_instructions, Instruction, Opcode};
pub use sequence::{GraphRenderSequence, RenderOp, RootRenderSequence};
pub use store::{GraphStore, NodeEntry};
