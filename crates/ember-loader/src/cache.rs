//! Bounded cache of previously fetched viewports.
//!
//! Entries are kept most-recently-used last and evicted from the front once
//! the configured bound is exceeded. Entries are never mutated in place; a
//! new fetch produces a new entry.
use std::collections::BTreeSet;

use ember_geo::{BoundingBox, CellKey, Feature};
use tracing::debug;

/// One previously fetched viewport: the (expanded) bounds it was fetched for,
/// the zoom level, the cells that fetch populated, and every feature known
/// for those bounds (newly fetched plus any reused from overlapping entries,
/// so a later overlap hit answers with the full set).
#[derive(Debug, Clone)]
pub(crate) struct CachedBoundsEntry {
    pub bounds: BoundingBox,
    pub zoom: u8,
    pub cells: BTreeSet<CellKey>,
    pub features: Vec<Feature>,
    /// False when any cell fetch failed while building this entry. Incomplete
    /// entries still contribute covered cells and features, but never satisfy
    /// the overlap short-circuit, so the gap is retried on the next call.
    pub complete: bool,
}

#[derive(Debug, Default)]
pub(crate) struct CacheState {
    // MRU last; index 0 is the eviction candidate.
    entries: Vec<CachedBoundsEntry>,
}

impl CacheState {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Cache-hit short circuit: the first same-zoom entry covering at least
    /// `threshold` of `fetch_viewport` satisfies the request. The hit is
    /// moved to the MRU end and its features cloned out.
    pub fn find_hit(
        &mut self,
        fetch_viewport: &BoundingBox,
        zoom: u8,
        threshold: f64,
    ) -> Option<Vec<Feature>> {
        let idx = self.entries.iter().position(|entry| {
            entry.complete
                && entry.zoom == zoom
                && fetch_viewport.overlap_ratio(&entry.bounds) > threshold
        })?;
        let entry = self.entries.remove(idx);
        let features = entry.features.clone();
        self.entries.push(entry);
        Some(features)
    }

    /// Cells already populated by any same-zoom entry.
    pub fn covered_cells(&self, zoom: u8) -> BTreeSet<CellKey> {
        self.entries
            .iter()
            .filter(|entry| entry.zoom == zoom)
            .flat_map(|entry| entry.cells.iter().copied())
            .collect()
    }

    /// Features from same-zoom entries whose bounds touch the viewport.
    pub fn features_overlapping(&self, viewport: &BoundingBox, zoom: u8) -> Vec<Feature> {
        self.entries
            .iter()
            .filter(|entry| entry.zoom == zoom && entry.bounds.intersects(viewport))
            .flat_map(|entry| entry.features.iter().cloned())
            .collect()
    }

    /// Insert at the MRU end and evict from the LRU end past `max_entries`.
    pub fn insert(&mut self, entry: CachedBoundsEntry, max_entries: usize) {
        self.entries.push(entry);
        while self.entries.len() > max_entries {
            let evicted = self.entries.remove(0);
            debug!(
                zoom = evicted.zoom,
                features = evicted.features.len(),
                "evicting least-recently-used viewport entry"
            );
        }
    }
}
