//! Bounded bookkeeping for fetched map tiles.
//!
//! Each tile goes `Loading` → `Ready` or `Failed`. Finished tiles are
//! evicted least-recently-used once the store grows past its capacity;
//! loading tiles are never evicted so their results always have a slot.

use super::basemap::Basemap;
use super::tile::TileId;
use crate::layers::OverlayId;
use std::collections::HashMap;

/// The tile layer a tile belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileSource {
    Basemap(Basemap),
    Overlay(OverlayId),
}

/// Cache key: one tile of one layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileKey {
    pub source: TileSource,
    pub tile: TileId,
}

impl TileKey {
    pub fn new(source: TileSource, tile: TileId) -> Self {
        Self { source, tile }
    }
}

/// State of one tile.
#[derive(Debug)]
pub enum TileEntry<T> {
    Loading,
    Ready(T),
    Failed,
}

struct Slot<T> {
    entry: TileEntry<T>,
    last_used: u64,
}

/// Tile cache keyed by [`TileKey`], generic over the loaded payload.
pub struct TileStore<T> {
    slots: HashMap<TileKey, Slot<T>>,
    capacity: usize,
    clock: u64,
}

impl<T> TileStore<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: HashMap::new(),
            capacity,
            clock: 0,
        }
    }

    /// Looks up a tile and marks it as recently used.
    pub fn get(&mut self, key: &TileKey) -> Option<&TileEntry<T>> {
        self.clock += 1;
        let clock = self.clock;
        self.slots.get_mut(key).map(|slot| {
            slot.last_used = clock;
            &slot.entry
        })
    }

    pub fn contains(&self, key: &TileKey) -> bool {
        self.slots.contains_key(key)
    }

    /// Marks a tile as loading. Returns false if the tile is already known.
    pub fn mark_loading(&mut self, key: TileKey) -> bool {
        if self.slots.contains_key(&key) {
            return false;
        }
        self.clock += 1;
        self.slots.insert(
            key,
            Slot {
                entry: TileEntry::Loading,
                last_used: self.clock,
            },
        );
        true
    }

    /// Stores the outcome of a load.
    ///
    /// Returns false (and drops the payload) when the tile is no longer
    /// expected, e.g. its overlay was detached in the meantime.
    pub fn complete(&mut self, key: TileKey, result: Option<T>) -> bool {
        let Some(slot) = self.slots.get_mut(&key) else {
            return false;
        };
        if !matches!(slot.entry, TileEntry::Loading) {
            return false;
        }
        slot.entry = match result {
            Some(payload) => TileEntry::Ready(payload),
            None => TileEntry::Failed,
        };
        true
    }

    /// Number of tiles currently loading.
    pub fn in_flight(&self) -> usize {
        self.slots
            .values()
            .filter(|slot| matches!(slot.entry, TileEntry::Loading))
            .count()
    }

    /// Drops every tile of a source.
    pub fn remove_source(&mut self, source: TileSource) {
        self.slots.retain(|key, _| key.source != source);
    }

    /// Evicts least-recently-used finished tiles until within capacity.
    pub fn evict(&mut self) -> usize {
        if self.slots.len() <= self.capacity {
            return 0;
        }
        let mut finished: Vec<(u64, TileKey)> = self
            .slots
            .iter()
            .filter(|(_, slot)| !matches!(slot.entry, TileEntry::Loading))
            .map(|(key, slot)| (slot.last_used, *key))
            .collect();
        finished.sort_unstable_by_key(|(last_used, _)| *last_used);

        let excess = self.slots.len() - self.capacity;
        let mut evicted = 0;
        for (_, key) in finished.into_iter().take(excess) {
            self.slots.remove(&key);
            evicted += 1;
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Grows the capacity to at least `min`. Never shrinks.
    pub fn ensure_capacity(&mut self, min: usize) {
        if min > self.capacity {
            log::debug!("Tile cache grown from {} to {} tiles", self.capacity, min);
            self.capacity = min;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(x: u32) -> TileKey {
        TileKey::new(TileSource::Basemap(Basemap::Street), TileId::new(3, x, 0))
    }

    #[test]
    fn test_load_lifecycle() {
        let mut store: TileStore<u32> = TileStore::new(10);
        assert!(store.mark_loading(key(0)));
        assert!(!store.mark_loading(key(0)));
        assert_eq!(store.in_flight(), 1);

        assert!(store.complete(key(0), Some(7)));
        assert!(matches!(store.get(&key(0)), Some(TileEntry::Ready(7))));
        assert_eq!(store.in_flight(), 0);

        // A second result for the same tile is ignored
        assert!(!store.complete(key(0), None));
        assert!(matches!(store.get(&key(0)), Some(TileEntry::Ready(7))));

        store.mark_loading(key(1));
        store.complete(key(1), None);
        assert!(matches!(store.get(&key(1)), Some(TileEntry::Failed)));
    }

    #[test]
    fn test_results_for_removed_source_are_dropped() {
        let overlay = TileSource::Overlay(OverlayId(4));
        let tile = TileKey::new(overlay, TileId::new(5, 1, 1));

        let mut store: TileStore<u32> = TileStore::new(10);
        store.mark_loading(tile);
        store.mark_loading(key(0));
        store.remove_source(overlay);

        assert!(!store.contains(&tile));
        assert!(!store.complete(tile, Some(1)));
        assert!(store.contains(&key(0)));
    }

    #[test]
    fn test_evicts_least_recently_used() {
        let mut store: TileStore<u32> = TileStore::new(2);
        for x in 0..3 {
            store.mark_loading(key(x));
            store.complete(key(x), Some(x));
        }
        // Touch tile 0 so tile 1 becomes the oldest
        store.get(&key(0));

        assert_eq!(store.evict(), 1);
        assert_eq!(store.len(), 2);
        assert!(store.contains(&key(0)));
        assert!(!store.contains(&key(1)));
        assert!(store.contains(&key(2)));
    }

    #[test]
    fn test_loading_tiles_survive_eviction() {
        let mut store: TileStore<u32> = TileStore::new(1);
        store.mark_loading(key(0));
        store.mark_loading(key(1));
        store.mark_loading(key(2));

        assert_eq!(store.evict(), 0);
        assert_eq!(store.in_flight(), 3);
    }

    #[test]
    fn test_ensure_capacity_only_grows() {
        let mut store: TileStore<u32> = TileStore::new(2);
        store.ensure_capacity(4);
        store.ensure_capacity(1);

        for x in 0..4 {
            store.mark_loading(key(x));
            store.complete(key(x), Some(x));
        }
        assert_eq!(store.evict(), 0);
        assert_eq!(store.len(), 4);
    }
}
