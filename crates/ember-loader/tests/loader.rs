//! Loader behavior against a scripted in-memory feature source.
use std::collections::BTreeSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ember_geo::{BoundingBox, CellKey, Feature, FeatureCollection, Geometry, Properties};
use ember_loader::{
    DebouncedLoader, FeatureSource, FetchError, FetchResult, LoaderConfig, ViewportLoader,
};

const CELL: f64 = 1.0;

/// Emits `features_per_cell` point features near each cell's center and
/// counts every fetch; cells in `failing` error instead.
struct MockSource {
    fetch_count: AtomicUsize,
    features_per_cell: usize,
    failing: Mutex<BTreeSet<CellKey>>,
}

impl MockSource {
    fn new(features_per_cell: usize) -> Self {
        Self {
            fetch_count: AtomicUsize::new(0),
            features_per_cell,
            failing: Mutex::new(BTreeSet::new()),
        }
    }

    fn fetches(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    fn fail_cell(&self, cell: CellKey) {
        self.failing.lock().expect("lock").insert(cell);
    }

    fn heal(&self) {
        self.failing.lock().expect("lock").clear();
    }
}

#[async_trait]
impl FeatureSource for MockSource {
    async fn fetch_cell(&self, cell: CellKey, _zoom: u8) -> FetchResult<FeatureCollection> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().expect("lock").contains(&cell) {
            return Err(FetchError::Upstream("scripted outage".to_string()));
        }
        let bounds = cell.bounds(CELL);
        let features = (0..self.features_per_cell)
            .map(|i| {
                let jitter = i as f64 * 0.01;
                Feature::new(
                    Geometry::Point {
                        coordinates: [
                            bounds.west + CELL / 2.0 + jitter,
                            bounds.south + CELL / 2.0,
                        ],
                    },
                    Properties::new(),
                )
            })
            .collect();
        Ok(FeatureCollection::new(features))
    }
}

fn config() -> LoaderConfig {
    LoaderConfig {
        cell_size: CELL,
        ..LoaderConfig::default()
    }
}

fn viewport_at(west: f64) -> BoundingBox {
    BoundingBox::new(1.0, 0.0, west + 1.0, west)
}

#[tokio::test]
async fn second_identical_load_is_served_from_cache() {
    let loader = ViewportLoader::new(MockSource::new(1), config());
    let vp = viewport_at(0.0);

    let first = loader.load_features(vp, 12).await;
    let after_first = loader.source().fetches();
    assert!(after_first > 0);
    assert!(!first.is_empty());

    let second = loader.load_features(vp, 12).await;
    assert_eq!(loader.source().fetches(), after_first, "cache hit must not fetch");
    assert_eq!(second.len(), first.len());
}

#[tokio::test]
async fn zoom_change_bypasses_the_overlap_hit() {
    let loader = ViewportLoader::new(MockSource::new(1), config());
    let vp = viewport_at(0.0);

    loader.load_features(vp, 12).await;
    let after_first = loader.source().fetches();
    loader.load_features(vp, 13).await;
    assert!(loader.source().fetches() > after_first);
}

#[tokio::test]
async fn cache_is_bounded_and_evicts_least_recently_used() {
    let loader = ViewportLoader::new(MockSource::new(1), config());

    // Six distinct, non-overlapping viewports against a bound of five.
    for i in 0..6 {
        loader.load_features(viewport_at(i as f64 * 10.0), 12).await;
    }
    assert_eq!(loader.cached_bounds(), 5);

    // The very first viewport was evicted, so revisiting it fetches again.
    let before = loader.source().fetches();
    loader.load_features(viewport_at(0.0), 12).await;
    assert!(loader.source().fetches() > before);
    assert_eq!(loader.cached_bounds(), 5);
}

#[tokio::test]
async fn feature_cap_bounds_the_result_and_the_fetch_fan_out() {
    let source = MockSource::new(7);
    let loader = ViewportLoader::new(
        source,
        LoaderConfig {
            cell_size: CELL,
            max_features: 10,
            load_chunk_size: 2,
            ..LoaderConfig::default()
        },
    );

    // The expanded viewport covers 9 cells of 7 features each.
    let result = loader.load_features(viewport_at(0.0), 12).await;
    assert!(result.len() <= 10);

    // Batches stop once the cap is reached: 9 cells would be 9 fetches, but
    // two batches of two already exceed the cap.
    assert!(loader.source().fetches() < 9);
}

#[tokio::test]
async fn failed_cells_are_retried_on_the_next_call() {
    let source = MockSource::new(1);
    // The requested viewport's own cell is scripted to fail first.
    source.fail_cell(CellKey { x: 0, y: 0 });
    let loader = ViewportLoader::new(source, config());
    let vp = BoundingBox::new(0.9, 0.1, 0.9, 0.1);

    let first = loader.load_features(vp, 12).await;
    // Neighboring cells succeeded but their features lie outside the
    // requested viewport; the failed cell contributes nothing yet.
    assert!(first.is_empty());

    loader.source().heal();
    let before = loader.source().fetches();
    let second = loader.load_features(vp, 12).await;
    // Only the previously failed cell is refetched.
    assert_eq!(loader.source().fetches(), before + 1);
    assert_eq!(second.len(), 1);
}

#[tokio::test]
async fn results_are_culled_to_the_requested_viewport() {
    let loader = ViewportLoader::new(MockSource::new(1), config());
    let vp = viewport_at(0.0);
    let result = loader.load_features(vp, 12).await;
    assert!(!result.is_empty());
    for feature in &result.features {
        let bbox = feature.geometry.bbox().expect("point bbox");
        assert!(bbox.intersects(&vp), "feature escaped the requested viewport");
    }
}

#[tokio::test]
async fn cache_hit_returns_the_same_data_as_the_preceding_miss() {
    let loader = ViewportLoader::new(MockSource::new(1), config());

    // Prime one viewport, then load a neighbor overlapping it below the hit
    // threshold: a miss that reuses the primed cells and fetches the rest.
    loader.load_features(viewport_at(0.0), 12).await;
    let vp = viewport_at(1.0);
    let miss = loader.load_features(vp, 12).await;
    assert!(!miss.is_empty());

    // The identical request hits the entry the miss created; it must answer
    // with the same features, not just the ones that miss fetched.
    let before = loader.source().fetches();
    let hit = loader.load_features(vp, 12).await;
    assert_eq!(loader.source().fetches(), before, "second load must hit");
    assert_eq!(hit.len(), miss.len());
}

#[tokio::test]
async fn fully_covered_miss_fetches_nothing_and_adds_no_entry() {
    let loader = ViewportLoader::new(MockSource::new(1), config());
    loader.load_features(viewport_at(0.0), 12).await;
    let baseline = loader.source().fetches();

    // Sits entirely within already fetched cells but overlaps the cached
    // bounds too little for a hit.
    let vp = BoundingBox::new(1.25, -0.25, 1.25, -0.25);
    let first = loader.load_features(vp, 12).await;
    let second = loader.load_features(vp, 12).await;

    assert_eq!(loader.source().fetches(), baseline);
    assert_eq!(loader.cached_bounds(), 1);
    assert!(!first.is_empty());
    assert_eq!(first.len(), second.len());
}

#[tokio::test(start_paused = true)]
async fn debounce_collapses_rapid_viewport_changes_into_one_load() {
    let loader = Arc::new(ViewportLoader::new(
        MockSource::new(1),
        LoaderConfig {
            cell_size: CELL,
            debounce: Duration::from_millis(250),
            ..LoaderConfig::default()
        },
    ));
    let (debounced, mut results) = DebouncedLoader::new(Arc::clone(&loader), 4);

    // Three rapid pans; only the last settles.
    debounced.notify(viewport_at(0.0), 12);
    debounced.notify(viewport_at(10.0), 12);
    debounced.notify(viewport_at(20.0), 12);

    let delivered = results.recv().await.expect("one result");
    assert!(!delivered.is_empty());

    // Earlier notifications were superseded and must not deliver.
    tokio::task::yield_now().await;
    assert!(results.try_recv().is_err());
    // Exactly one load cycle ran.
    assert_eq!(loader.cached_bounds(), 1);
}
