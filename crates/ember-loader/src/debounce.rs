//! Debounced viewport-change triggering.
//!
//! Rapid pan/zoom gestures fire many viewport-change events; only the last
//! one within the quiet period runs a load. The core loader stays synchronous
//! per call and independently testable; this wrapper owns the timer.
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use ember_geo::{BoundingBox, FeatureCollection};
use tokio::sync::mpsc;
use tokio::time::sleep;

use crate::source::FeatureSource;
use crate::viewport::ViewportLoader;

/// Wraps a [`ViewportLoader`] behind a debounce timer.
///
/// Each [`notify`](Self::notify) resets the timer; when the configured quiet
/// period elapses without a newer event, a single load runs and its result is
/// delivered on the receiver returned by [`new`](Self::new). A notification
/// superseded while its load is in flight still merges fetched data into the
/// cache (valid data for the viewport it was requested for) but its result is
/// not delivered as the newer request's answer.
pub struct DebouncedLoader<S> {
    loader: Arc<ViewportLoader<S>>,
    results: mpsc::Sender<FeatureCollection>,
    generation: Arc<AtomicU64>,
}

impl<S: FeatureSource + 'static> DebouncedLoader<S> {
    pub fn new(
        loader: Arc<ViewportLoader<S>>,
        channel_capacity: usize,
    ) -> (Self, mpsc::Receiver<FeatureCollection>) {
        let (tx, rx) = mpsc::channel(channel_capacity.max(1));
        (
            Self {
                loader,
                results: tx,
                generation: Arc::new(AtomicU64::new(0)),
            },
            rx,
        )
    }

    /// Record a viewport-change event, resetting the debounce timer.
    pub fn notify(&self, viewport: BoundingBox, zoom: u8) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let loader = Arc::clone(&self.loader);
        let current = Arc::clone(&self.generation);
        let results = self.results.clone();
        let delay = loader.config().debounce;
        tokio::spawn(async move {
            sleep(delay).await;
            if current.load(Ordering::SeqCst) != generation {
                // Superseded during the quiet period; never load.
                return;
            }
            let features = loader.load_features(viewport, zoom).await;
            // The load above already merged into the cache; only deliver the
            // result if no newer event arrived while it was in flight.
            if current.load(Ordering::SeqCst) == generation {
                let _ = results.send(features).await;
            }
        });
    }
}
