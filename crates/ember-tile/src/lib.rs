//! Binary vector-tile decoding into GeoJSON features.
//!
//! # Purpose
//! Converts protocol-buffer-encoded vector tiles from the external address/
//! road/parcel tile service into [`ember_geo::FeatureCollection`] values in
//! geographic coordinates.
//!
//! # How it fits
//! The viewport loader hands fetched payloads here; the decoder owns the
//! format quirks (the textual tile-not-found sentinel, extent-relative
//! integer coordinates, boolean property values being dropped) so the loader
//! stays format-agnostic.
//!
//! # Key invariants
//! - [`decode_tile`] never fails; malformed features are skipped and the rest
//!   of the tile is kept.
//! - Only string and number property values survive decoding. Booleans vanish
//!   silently; that matches the observed upstream behavior and is tested, not
//!   fixed.
//! - Reprojection uses the standard Web-Mercator slippy-tile inverse
//!   transform with the layer's extent (default 4096).

mod decode;
mod proto;

pub use decode::{
    DEFAULT_EXTENT, LayerGeometry, LayerMapping, TILE_NOT_FOUND_MARKER, decode_tile,
};
