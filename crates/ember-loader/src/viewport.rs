//! Viewport load orchestration: overlap short-circuit, cell fan-out, merge,
//! and LRU bookkeeping.
use std::collections::BTreeSet;
use std::sync::Mutex;

use ember_geo::{BoundingBox, CellKey, Feature, FeatureCollection, cells_in_viewport};
use futures::future::join_all;
use tracing::{debug, warn};

use crate::cache::{CacheState, CachedBoundsEntry};
use crate::config::LoaderConfig;
use crate::source::FeatureSource;

/// Owns the bounded viewport cache and drives fetches through a
/// [`FeatureSource`].
///
/// One loader is constructed per map-view lifetime. Calls are reentrant-safe:
/// the cache lock is only ever held across synchronous mutation, never across
/// a fetch await, so concurrent calls for different viewports cannot corrupt
/// cache state (they may redundantly fetch the same cell, which is harmless).
pub struct ViewportLoader<S> {
    source: S,
    config: LoaderConfig,
    cache: Mutex<CacheState>,
}

impl<S: FeatureSource> ViewportLoader<S> {
    pub fn new(source: S, config: LoaderConfig) -> Self {
        Self {
            source,
            config,
            cache: Mutex::new(CacheState::default()),
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// The underlying feature source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Number of cached viewport entries; observable for tests and metrics.
    pub fn cached_bounds(&self) -> usize {
        self.lock_cache().len()
    }

    /// Features to render for the requested viewport at `zoom`.
    ///
    /// Fetches and caches only what is missing, tolerates per-cell fetch
    /// failures (the gap stays uncovered and is retried on the next call),
    /// and never returns more than the configured feature cap. Feature order
    /// is not guaranteed.
    pub async fn load_features(&self, requested: BoundingBox, zoom: u8) -> FeatureCollection {
        let fetch_viewport = requested.expand(self.config.buffer_ratio);

        // Overlap short-circuit: a cached viewport covering enough of the
        // fetch viewport answers without any network access.
        let (reused, missing) = {
            let mut cache = self.lock_cache();
            if let Some(features) =
                cache.find_hit(&fetch_viewport, zoom, self.config.overlap_threshold)
            {
                debug!(zoom, "viewport cache hit");
                return self.cull(features, &requested);
            }
            let covered = cache.covered_cells(zoom);
            let missing: Vec<CellKey> = cells_in_viewport(&fetch_viewport, self.config.cell_size)
                .into_iter()
                .filter(|cell| !covered.contains(cell))
                .collect();
            (cache.features_overlapping(&fetch_viewport, zoom), missing)
        };

        debug!(zoom, missing = missing.len(), "viewport cache miss");
        let (fetched, populated, complete) =
            self.fetch_missing(&missing, zoom, reused.len()).await;

        // The new entry carries everything known for its bounds, reused and
        // newly fetched alike; a later overlap hit on it must answer with the
        // same data this miss did. A fully covered miss fetched nothing and
        // is not inserted at all, since it would add no coverage and could
        // evict an entry that has some.
        let mut working = reused;
        working.extend(fetched);
        if !missing.is_empty() {
            let mut cache = self.lock_cache();
            cache.insert(
                CachedBoundsEntry {
                    bounds: fetch_viewport,
                    zoom,
                    cells: populated,
                    features: working.clone(),
                    complete,
                },
                self.config.max_cached_bounds,
            );
        }

        self.cull(working, &requested)
    }

    // Fan out fetches for missing cells in bounded batches, stopping early
    // once the feature cap is reached. Failed cells are logged and left
    // uncovered so a later call retries them.
    async fn fetch_missing(
        &self,
        missing: &[CellKey],
        zoom: u8,
        already_held: usize,
    ) -> (Vec<Feature>, BTreeSet<CellKey>, bool) {
        let mut fetched: Vec<Feature> = Vec::new();
        let mut populated = BTreeSet::new();
        let mut complete = true;
        for batch in missing.chunks(self.config.load_chunk_size.max(1)) {
            if already_held + fetched.len() >= self.config.max_features {
                debug!(zoom, "feature cap reached; skipping remaining cells");
                break;
            }
            let results = join_all(
                batch
                    .iter()
                    .map(|&cell| self.source.fetch_cell(cell, zoom)),
            )
            .await;
            for (&cell, result) in batch.iter().zip(results) {
                match result {
                    Ok(collection) => {
                        fetched.extend(collection.features);
                        populated.insert(cell);
                    }
                    Err(error) => {
                        complete = false;
                        warn!(%cell, zoom, %error, "cell fetch failed; will retry on next viewport change");
                    }
                }
            }
        }
        (fetched, populated, complete)
    }

    // Keep only features whose bbox touches the originally requested
    // viewport, bounded by the feature cap.
    fn cull(&self, features: Vec<Feature>, requested: &BoundingBox) -> FeatureCollection {
        features
            .into_iter()
            .filter(|feature| {
                feature
                    .geometry
                    .bbox()
                    .is_some_and(|bbox| bbox.intersects(requested))
            })
            .take(self.config.max_features)
            .collect()
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, CacheState> {
        // Cache mutations never panic, so poisoning cannot be observed in
        // practice; recover the guard rather than propagating a new panic.
        match self.cache.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
