//! Single-producer/single-consumer handoff queue.
//!
//! Used to hand compiled render sequences, per-node property updates, and
//! relayed events across the control/audio boundary without the audio
//! thread ever locking or allocating. Built on `crossbeam_queue::ArrayQueue`,
//! which is the lock-free bounded queue the `ekg-phonon` example in this
//! pack reaches for to solve the identical problem — we keep our own
//! vocabulary (`push`/`pop`, capacity rounded to a power of two) to mirror
//! `SingleWriterSingleReaderQueue` in the original runtime, but delegate the
//! actual lock-free bookkeeping to the audited crate rather than hand-rolling
//! raw atomics ourselves.

use crossbeam_queue::ArrayQueue;

pub struct SpscQueue<T> {
    inner: ArrayQueue<T>,
}

impl<T> SpscQueue<T> {
    /// `capacity` is rounded up to the next power of two, matching the
    /// original queue's invariant.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1).next_power_of_two();
        Self {
            inner: ArrayQueue::new(capacity),
        }
    }

    /// Returns the value back if the queue is full.
    pub fn push(&self, value: T) -> Result<(), T> {
        self.inner.push(value)
    }

    pub fn pop(&self) -> Option<T> {
        self.inner.pop()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Drains the queue, keeping only the most recently pushed value. This
    /// is how the audio thread picks up a fresh render sequence or a tap
    /// buffer swap: older, superseded entries are simply dropped.
    pub fn drain_keep_newest(&self) -> Option<T> {
        let mut newest = self.pop();
        while let Some(next) = self.pop() {
            newest = Some(next);
        }
        newest
    }
}
