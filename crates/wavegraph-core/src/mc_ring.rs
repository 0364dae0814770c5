//! Lock-free multichannel ring buffer with clobbering-writer semantics.
//!
//! Direct port of `MultiChannelRingBuffer` in the original runtime: a fixed
//! number of parallel per-channel rings sharing one read/write cursor pair.
//! `write` never blocks — if the incoming block doesn't fit, the read
//! cursor is nudged forward so the writer always succeeds, trading old
//! samples for new ones. This is what feeds scope/capture taps from the
//! audio thread without ever stalling it.

use crossbeam::atomic::AtomicCell;
use std::sync::atomic::{AtomicUsize, Ordering};

pub struct MultiChannelRing {
    buffers: Vec<Vec<AtomicCell<f32>>>,
    capacity: usize,
    index_mask: usize,
    read_pos: AtomicUsize,
    write_pos: AtomicUsize,
}

impl MultiChannelRing {
    /// `capacity` must be a nonzero power of two.
    #[must_use]
    pub fn new(num_channels: usize, capacity: usize) -> Self {
        assert!(num_channels > 0, "num_channels must be nonzero");
        assert!(
            capacity > 0 && capacity.is_power_of_two(),
            "capacity must be a nonzero power of two"
        );

        let buffers = (0..num_channels)
            .map(|_| (0..capacity).map(|_| AtomicCell::new(0.0f32)).collect())
            .collect();

        Self {
            buffers,
            capacity,
            index_mask: capacity - 1,
            read_pos: AtomicUsize::new(0),
            write_pos: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn num_channels(&self) -> usize {
        self.buffers.len()
    }

    /// Writes `num_samples` samples per channel from `data`, one slice per
    /// channel. If there isn't room, the reader is nudged forward to make
    /// space — the write always succeeds.
    pub fn write(&self, data: &[&[f32]], num_samples: usize) {
        let w = self.write_pos.load(Ordering::Acquire);
        let r = self.read_pos.load(Ordering::Acquire);

        let should_move_read_pointer = num_samples >= self.num_free_slots(r, w);
        let desired_write_position = (w + num_samples) & self.index_mask;
        let desired_read_position = if should_move_read_pointer {
            (desired_write_position + 1) & self.index_mask
        } else {
            r
        };

        let n = self.buffers.len().min(data.len());
        for (i, buf) in self.buffers.iter().enumerate().take(n) {
            let src = data[i];
            if w + num_samples >= self.capacity {
                let s1 = self.capacity - w;
                for (offset, sample) in src.iter().take(s1).enumerate() {
                    buf[w + offset].store(*sample);
                }
                for (offset, sample) in src[s1..num_samples].iter().enumerate() {
                    buf[offset].store(*sample);
                }
            } else {
                for (offset, sample) in src.iter().take(num_samples).enumerate() {
                    buf[w + offset].store(*sample);
                }
            }
        }

        self.write_pos.store(desired_write_position, Ordering::Release);
        self.read_pos.store(desired_read_position, Ordering::Release);
    }

    /// Reads `num_samples` samples per channel into `destination`. Returns
    /// `false` (leaving `destination` untouched) if fewer than `num_samples`
    /// are available.
    pub fn read(&self, destination: &mut [&mut [f32]], num_samples: usize) -> bool {
        let r = self.read_pos.load(Ordering::Acquire);
        let w = self.write_pos.load(Ordering::Acquire);

        if self.num_full_slots(r, w) < num_samples {
            return false;
        }

        let n = self.buffers.len().min(destination.len());
        for (i, buf) in self.buffers.iter().enumerate().take(n) {
            let dst = &mut destination[i];
            if r + num_samples >= self.capacity {
                let s1 = self.capacity - r;
                for offset in 0..s1 {
                    dst[offset] = buf[r + offset].load();
                }
                for offset in 0..(num_samples - s1) {
                    dst[s1 + offset] = buf[offset].load();
                }
            } else {
                for offset in 0..num_samples {
                    dst[offset] = buf[r + offset].load();
                }
            }
        }

        let desired_read_position = (r + num_samples) & self.index_mask;
        self.read_pos.store(desired_read_position, Ordering::Release);
        true
    }

    #[must_use]
    pub fn size(&self) -> usize {
        let r = self.read_pos.load(Ordering::Acquire);
        let w = self.write_pos.load(Ordering::Acquire);
        self.num_full_slots(r, w)
    }

    fn num_full_slots(&self, r: usize, w: usize) -> usize {
        if w > r {
            w - r
        } else {
            (self.capacity - (r.wrapping_sub(w))) & self.index_mask
        }
    }

    fn num_free_slots(&self, r: usize, w: usize) -> usize {
        if r > w {
            r - w
        } else {
            self.capacity - (w - r)
        }
    }
}
