//! Geometry, bounding-box, and spatial-cell math for ember map layers.
//!
//! # Purpose
//! Pure, deterministic functions over GeoJSON geometries, viewport rectangles,
//! cache cells, and slippy-tile indices. No I/O lives here.
//!
//! # How it fits
//! The tile decoder reprojects into these value types and the viewport loader
//! uses the bbox/cell math to decide what to fetch and what to cull. Feature
//! and geometry values serialize as standard GeoJSON for the renderer.
//!
//! # Key invariants
//! - `Geometry::bbox` returns `None` only for position-free geometries;
//!   otherwise min <= max on both axes.
//! - Touching rectangle edges count as intersecting.
//! - Property values are strings or numbers only; other JSON kinds are
//!   unrepresentable.
//! - The antimeridian is not special-cased (documented limitation).

mod bbox;
mod cell;
mod geometry;
mod mercator;

pub use bbox::BoundingBox;
pub use cell::{CellKey, cell_key, cells_in_viewport};
pub use geometry::{Feature, FeatureCollection, Geometry, Position, Properties, PropertyValue};
pub use mercator::{TileCoord, clamp_lat, lat_lng_to_tile_xy, normalize_lng};
