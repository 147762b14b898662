//! Fixed-size square cells used as the cache and fetch granularity for
//! community-area feature sets. A cell is not a slippy-map tile; it is a
//! floor-quantized partition of the lng/lat plane at a configurable size.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bbox::BoundingBox;

/// Identifies a cell by its floor-quantized (x, y) indices.
///
/// Two coordinates inside the same cell always produce an identical key, so
/// the key works directly as a map key or set member. `Display` renders the
/// stable `"{x},{y}"` form used in fetch URLs and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellKey {
    pub x: i64,
    pub y: i64,
}

impl CellKey {
    /// The cell containing the given coordinate at `cell_size` degrees.
    pub fn containing(lng: f64, lat: f64, cell_size: f64) -> Self {
        Self {
            x: (lng / cell_size).floor() as i64,
            y: (lat / cell_size).floor() as i64,
        }
    }

    /// The geographic bounds of this cell at `cell_size` degrees.
    pub fn bounds(&self, cell_size: f64) -> BoundingBox {
        let west = self.x as f64 * cell_size;
        let south = self.y as f64 * cell_size;
        BoundingBox {
            north: south + cell_size,
            south,
            east: west + cell_size,
            west,
        }
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// Quantize a coordinate to its containing cell's key.
pub fn cell_key(lng: f64, lat: f64, cell_size: f64) -> CellKey {
    CellKey::containing(lng, lat, cell_size)
}

/// Every cell whose square overlaps the viewport, iterating from the floor of
/// the south-west corner to the ceiling of the north-east corner.
///
/// A degenerate (point or line) viewport still yields the cells it touches.
pub fn cells_in_viewport(viewport: &BoundingBox, cell_size: f64) -> Vec<CellKey> {
    let x0 = (viewport.west / cell_size).floor() as i64;
    let y0 = (viewport.south / cell_size).floor() as i64;
    let x1 = ((viewport.east / cell_size).ceil() as i64).max(x0 + 1);
    let y1 = ((viewport.north / cell_size).ceil() as i64).max(y0 + 1);

    let mut out = Vec::with_capacity(((x1 - x0) * (y1 - y0)) as usize);
    for y in y0..y1 {
        for x in x0..x1 {
            out.push(CellKey { x, y });
        }
    }
    out
}
