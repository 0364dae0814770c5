//! The instruction interpreter (§4.2).
//!
//! Mirrors `Runtime::applyInstructions` in the original runtime: a batch of
//! instructions is applied to the [`GraphStore`] in order; the first
//! instruction to fail halts the batch immediately (there is no rollback —
//! see DESIGN.md's Open Question decision) and its [`ReturnCode`] is
//! returned. `CommitUpdates` triggers a render-sequence rebuild only if an
//! `ActivateRoots` was seen earlier in the same batch, exactly like the
//! original's `shouldRebuild` flag.

use tracing::debug;

use crate::error::ReturnCode;
use crate::id::NodeId;
use crate::value::Value;

use super::builder::build_render_sequence;
use super::sequence::GraphRenderSequence;
use super::store::GraphStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Opcode {
    CreateNode = 0,
    DeleteNode = 1,
    AppendChild = 2,
    SetProperty = 3,
    ActivateRoots = 4,
    CommitUpdates = 5,
}

#[derive(Debug, Clone)]
pub enum Instruction {
    CreateNode { id: NodeId, type_name: String },
    DeleteNode { id: NodeId },
    AppendChild { parent: NodeId, child: NodeId },
    SetProperty { id: NodeId, key: String, value: Value },
    ActivateRoots { ids: Vec<NodeId> },
    CommitUpdates,
}

impl Instruction {
    #[must_use]
    pub fn opcode(&self) -> Opcode {
        match self {
            Instruction::CreateNode { .. } => Opcode::CreateNode,
            Instruction::DeleteNode { .. } => Opcode::DeleteNode,
            Instruction::AppendChild { .. } => Opcode::AppendChild,
            Instruction::SetProperty { .. } => Opcode::SetProperty,
            Instruction::ActivateRoots { .. } => Opcode::ActivateRoots,
            Instruction::CommitUpdates => Opcode::CommitUpdates,
        }
    }
}

/// Applies `batch` to `store` in order, halting on the first non-`Ok`
/// result. If a render sequence was rebuilt (because an `ActivateRoots` was
/// followed by a `CommitUpdates`), it is returned for the caller to hand to
/// the audio thread. Garbage is pruned from `store` unconditionally before
/// returning, regardless of whether the batch completed or halted early.
pub fn apply_instructions(
    store: &mut GraphStore,
    batch: &[Instruction],
) -> (ReturnCode, Option<GraphRenderSequence>) {
    let mut should_rebuild = false;
    let mut rebuilt = None;

    for instruction in batch {
        let result = match instruction {
            Instruction::CreateNode { id, type_name } => store.create_node(*id, type_name),
            Instruction::DeleteNode { id } => store.delete_node(*id),
            Instruction::AppendChild { parent, child } => store.append_child(*parent, *child),
            Instruction::SetProperty { id, key, value } => store.set_property(*id, key, value),
            Instruction::ActivateRoots { ids } => {
                let result = store.activate_roots(ids);
                if result.is_ok() {
                    should_rebuild = true;
                }
                result
            }
            Instruction::CommitUpdates => {
                if should_rebuild {
                    rebuilt = Some(build_render_sequence(store));
                }
                ReturnCode::Ok
            }
        };

        debug!(opcode = ?instruction.opcode(), result = ?result, "applied instruction");

        if !result.is_ok() {
            store.prune_garbage();
            return (result, rebuilt);
        }
    }

    store.prune_garbage();
    (ReturnCode::Ok, rebuilt)
}
