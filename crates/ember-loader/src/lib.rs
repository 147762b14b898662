//! Viewport feature cache and loader for ember map layers.
//!
//! # Purpose
//! Given a map viewport and zoom, returns the features to render while
//! fetching and caching only what is missing: expands the viewport by a
//! prefetch margin, short-circuits on sufficiently overlapping cached
//! viewports, fans out per-cell fetches for the rest, and evicts old entries
//! under an LRU bound.
//!
//! # How it fits
//! The map UI owns a [`ViewportLoader`] (or the [`DebouncedLoader`] wrapper)
//! per map view and calls it on viewport changes. Fetching goes through the
//! [`FeatureSource`] seam; [`MvtSource`] adapts a raw tile fetcher via the
//! `ember-tile` decoder.
//!
//! # Key invariants
//! - The cache lock is held only across synchronous mutation, never across a
//!   network await.
//! - A per-cell fetch failure never aborts the overall load; the cell stays
//!   uncovered and is retried on the next viewport change.
//! - No more than the configured feature cap is ever returned; feature order
//!   is not guaranteed.
//!
//! # Common pitfalls
//! - Callers must not infer cache hit/miss from the error channel; there is
//!   none. Inspect returned data volume instead.

mod cache;
mod config;
mod debounce;
mod source;
mod viewport;

pub use config::LoaderConfig;
pub use debounce::DebouncedLoader;
pub use source::{FeatureSource, FetchError, FetchResult, MvtSource, TileFetch};
pub use viewport::ViewportLoader;
