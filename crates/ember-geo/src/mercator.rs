//! Web-Mercator slippy-tile math shared by the tile decoder and the loader.
use serde::{Deserialize, Serialize};

/// Identifies a slippy-map vector tile at zoom `z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub z: u8,
}

/// Wrap longitude into `[-180, 180)`.
pub fn normalize_lng(lng: f64) -> f64 {
    (lng + 180.0).rem_euclid(360.0) - 180.0
}

/// Clamp latitude into `[-90, 90]`.
pub fn clamp_lat(lat: f64) -> f64 {
    lat.clamp(-90.0, 90.0)
}

/// Standard slippy-map tile index for a coordinate at the given zoom.
///
/// Latitude is clamped and longitude wrapped first, and the resulting index
/// is clamped into the valid range, so the poles map to the edge tiles
/// instead of overflowing.
pub fn lat_lng_to_tile_xy(lat: f64, lng: f64, zoom: u8) -> TileCoord {
    let n = 2f64.powi(i32::from(zoom));
    let lng = normalize_lng(lng);
    let lat_rad = clamp_lat(lat).to_radians();

    let x = ((lng + 180.0) / 360.0 * n).floor();
    let y = ((1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / std::f64::consts::PI) / 2.0 * n)
        .floor();

    let max = n - 1.0;
    TileCoord {
        x: x.clamp(0.0, max) as u32,
        y: y.clamp(0.0, max) as u32,
        z: zoom,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_wraps_into_half_open_range() {
        assert_eq!(normalize_lng(0.0), 0.0);
        assert_eq!(normalize_lng(180.0), -180.0);
        assert_eq!(normalize_lng(-180.0), -180.0);
        assert_eq!(normalize_lng(190.0), -170.0);
        assert_eq!(normalize_lng(540.0), -180.0);
        assert!((normalize_lng(152.7) - 152.7).abs() < 1e-12);
    }

    #[test]
    fn clamp_lat_limits_poles() {
        assert_eq!(clamp_lat(95.0), 90.0);
        assert_eq!(clamp_lat(-95.0), -90.0);
        assert_eq!(clamp_lat(-31.9), -31.9);
    }

    #[test]
    fn origin_maps_to_center_tile() {
        assert_eq!(
            lat_lng_to_tile_xy(0.0, 0.0, 1),
            TileCoord { x: 1, y: 1, z: 1 }
        );
        assert_eq!(
            lat_lng_to_tile_xy(0.0, 0.0, 0),
            TileCoord { x: 0, y: 0, z: 0 }
        );
    }

    #[test]
    fn known_location_matches_reference_index() {
        // Taree, NSW at zoom 12 (reference values from the OSM tile scheme).
        let t = lat_lng_to_tile_xy(-31.91, 152.46, 12);
        assert_eq!(t, TileCoord { x: 3782, y: 2431, z: 12 });
    }

    #[test]
    fn pole_clamps_to_edge_tile() {
        let t = lat_lng_to_tile_xy(90.0, 0.0, 3);
        assert_eq!(t.y, 0);
        let t = lat_lng_to_tile_xy(-90.0, 179.999, 3);
        assert_eq!(t.y, 7);
        assert_eq!(t.x, 7);
    }
}
