//! Bump-allocated scratch buffers for one render-sequence build.
//!
//! Mirrors `BufferAllocator` in the original runtime: a pool of
//! block-sized buffers handed out in order and reset wholesale at the start
//! of each build. The original grows a single contiguous chunk of `32 *
//! blockSize` floats at a time and vends raw pointers into it; here each
//! slot is its own `Arc<RefCell<Vec<f32>>>`, grown in batches of 32, and a
//! [`BufferSlot`] is simply a clone of that handle. Handing out owned
//! handles (instead of indices back into the arena) sidesteps borrowing
//! through nested `RefCell`s while keeping the same "process in traversal
//! order, never alias a slot with itself" invariant the original relies on,
//! enforced here at runtime by `RefCell` rather than trusted by convention.
//! `Arc` (rather than `Rc`) is required even though only the audio thread
//! ever touches buffer contents, because the completed render sequence
//! itself is moved across the control/audio boundary through the handoff
//! ring and so must be `Send`. See DESIGN.md for the tradeoff.

use std::cell::RefCell;
use std::sync::Arc;

const CHUNK_SLOTS: usize = 32;

pub type BufferSlot = Arc<RefCell<Vec<f32>>>;

pub struct ScratchArena {
    block_size: usize,
    slots: Vec<BufferSlot>,
    next: usize,
}

impl ScratchArena {
    #[must_use]
    pub fn new(block_size: usize) -> Self {
        Self {
            block_size,
            slots: Vec::new(),
            next: 0,
        }
    }

    /// Resets the bump pointer to the start without shrinking capacity, so
    /// repeated builds at a stable graph size allocate nothing.
    pub fn reset(&mut self) {
        self.next = 0;
    }

    /// Hands out the next free slot, growing the arena by a chunk of 32 if
    /// none remain, and zero-filling the slot before handing it back.
    pub fn next_slot(&mut self) -> BufferSlot {
        if self.next >= self.slots.len() {
            for _ in 0..CHUNK_SLOTS {
                self.slots
                    .push(Arc::new(RefCell::new(vec![0.0; self.block_size])));
            }
        }

        let slot = Arc::clone(&self.slots[self.next]);
        self.next += 1;
        slot.borrow_mut().fill(0.0);
        slot
    }

    #[must_use]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    #[must_use]
    pub fn allocated_slot_count(&self) -> usize {
        self.slots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_slot_zero_fills_and_is_independently_borrowable() {
        let mut arena = ScratchArena::new(4);
        let a = arena.next_slot();
        let b = arena.next_slot();
        assert!(!Arc::ptr_eq(&a, &b));

        a.borrow_mut().copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(a.borrow().as_slice(), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(b.borrow().as_slice(), &[0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn reset_reuses_slots_without_growing() {
        let mut arena = ScratchArena::new(4);
        for _ in 0..40 {
            arena.next_slot();
        }
        let grown_len = arena.allocated_slot_count();

        arena.reset();
        for _ in 0..40 {
            arena.next_slot();
        }
        assert_eq!(arena.allocated_slot_count(), grown_len);
    }

    #[test]
    fn reset_zero_fills_recycled_slots() {
        let mut arena = ScratchArena::new(2);
        let a = arena.next_slot();
        a.borrow_mut().copy_from_slice(&[9.0, 9.0]);
        drop(a);
        arena.reset();
        let a2 = arena.next_slot();
        assert_eq!(a2.borrow().as_slice(), &[0.0, 0.0]);
    }
}
