//! Shared resource map.
//!
//! Mirrors `SharedResourceMap` in the original runtime: named buffers that
//! outlive any one render sequence, split into two disjoint namespaces.
//! Immutable entries are add-only — `updateSharedResourceMap` never replaces
//! an existing name, so a node already holding a reference never sees it
//! change underneath it — and are read by nodes like a sampler reading
//! wavetable data. Mutable entries back the feedback-tap subsystem (§4.5):
//! `get_or_create_mutable` is idempotent so a `TapIn` and `TapOut` pair
//! created in either order end up sharing the same buffer.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

pub type MutableBuffer = Arc<Mutex<Vec<f32>>>;

#[derive(Default)]
pub struct SharedResourceMap {
    immutable: HashMap<String, Arc<Vec<f32>>>,
    mutable: HashMap<String, MutableBuffer>,
}

impl SharedResourceMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an immutable named buffer. Add-only: returns `false` and
    /// leaves the existing entry untouched if `name` is already bound —
    /// preserves the original's immutability guarantee for any node still
    /// holding a reference to the prior entry (`SharedResourceMap::add` in
    /// `original_source/runtime/elem/SharedResource.h`).
    pub fn set_immutable(&mut self, name: impl Into<String>, data: Vec<f32>) -> bool {
        use std::collections::hash_map::Entry;
        match self.immutable.entry(name.into()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(data));
                true
            }
        }
    }

    #[must_use]
    pub fn get_immutable(&self, name: &str) -> Option<Arc<Vec<f32>>> {
        self.immutable.get(name).map(Arc::clone)
    }

    /// Returns the named mutable tap buffer, creating it (zero-filled to
    /// `size` samples) on first use. Subsequent calls with the same name
    /// return the same buffer regardless of `size`.
    pub fn get_or_create_mutable(&mut self, name: &str, size: usize) -> MutableBuffer {
        Arc::clone(
            self.mutable
                .entry(name.to_owned())
                .or_insert_with(|| Arc::new(Mutex::new(vec![0.0; size]))),
        )
    }

    #[must_use]
    pub fn get_mutable(&self, name: &str) -> Option<MutableBuffer> {
        self.mutable.get(name).map(Arc::clone)
    }

    /// Drops mutable entries no longer referenced by any node, matching
    /// `pruneSharedResourceMap`'s `use_count() == 1` check.
    pub fn prune(&mut self) {
        self.mutable.retain(|_, buf| Arc::strong_count(buf) > 1);
    }

    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.immutable
            .keys()
            .chain(self.mutable.keys())
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_or_create_mutable_is_idempotent() {
        let mut map = SharedResourceMap::new();
        let a = map.get_or_create_mutable("delay1", 64);
        let b = map.get_or_create_mutable("delay1", 128);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.lock().len(), 64);
    }

    #[test]
    fn prune_drops_unreferenced_mutable_buffers() {
        let mut map = SharedResourceMap::new();
        let held = map.get_or_create_mutable("kept", 4);
        map.get_or_create_mutable("dropped", 4);
        map.prune();
        assert!(map.get_mutable("dropped").is_none());
        assert!(map.get_mutable("kept").is_some());
        drop(held);
    }

    #[test]
    fn immutable_set_is_add_only() {
        let mut map = SharedResourceMap::new();
        assert!(map.set_immutable("table", vec![1.0, 2.0]));
        assert!(!map.set_immutable("table", vec![3.0]));
        assert_eq!(map.get_immutable("table").unwrap().as_slice(), &[1.0, 2.0]);
    }
}
