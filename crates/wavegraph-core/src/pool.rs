//! Reference-counted object recycling pool.
//!
//! Direct port of `RefCountedPool` from the original runtime: a fixed
//! collection of `Arc<T>` pre-populated with defaults. `allocate` hands back
//! the first entry whose only owner is the pool itself (`strong_count() ==
//! 1`), recycling it in place of a fresh heap allocation; if every entry is
//! still held elsewhere it grows the pool by one. This is how render
//! sequences and scratch buffers get reused across control-thread rebuilds
//! without the audio thread ever touching the allocator.

use std::sync::Arc;

pub struct RefCountedPool<T> {
    entries: Vec<Arc<T>>,
}

impl<T: Default> RefCountedPool<T> {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: (0..capacity).map(|_| Arc::new(T::default())).collect(),
        }
    }

    /// Returns the first entry with no other live owners, growing the pool
    /// with a fresh default value if none is free.
    pub fn allocate(&mut self) -> Arc<T> {
        for entry in &self.entries {
            if Arc::strong_count(entry) == 1 {
                return Arc::clone(entry);
            }
        }

        let fresh = Arc::new(T::default());
        self.entries.push(Arc::clone(&fresh));
        fresh
    }
}

impl<T> RefCountedPool<T> {
    /// Like [`allocate`](Self::allocate) but falls back to `default_value`
    /// (moved in, not freshly constructed) when the pool is exhausted,
    /// matching `allocateAvailableWithDefault` in the original runtime.
    pub fn allocate_available_with_default(&mut self, default_value: Arc<T>) -> Arc<T> {
        for entry in &self.entries {
            if Arc::strong_count(entry) == 1 {
                return Arc::clone(entry);
            }
        }

        self.entries.push(Arc::clone(&default_value));
        default_value
    }

    pub fn for_each(&self, mut f: impl FnMut(&Arc<T>)) {
        for entry in &self.entries {
            f(entry);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_recycles_entries_with_no_other_owners() {
        let mut pool: RefCountedPool<Vec<f32>> = RefCountedPool::new(2);
        let a = pool.allocate();
        let b = pool.allocate();
        assert_eq!(pool.len(), 2);

        drop(a);
        let c = pool.allocate();
        assert_eq!(pool.len(), 2, "recycled instead of growing");
        assert!(!Arc::ptr_eq(&b, &c));
    }

    #[test]
    fn allocate_grows_pool_when_all_entries_are_held() {
        let mut pool: RefCountedPool<Vec<f32>> = RefCountedPool::new(1);
        let _a = pool.allocate();
        let _b = pool.allocate();
        assert_eq!(pool.len(), 2);
    }
}
