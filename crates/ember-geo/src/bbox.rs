//! Viewport rectangles in geographic degrees.
use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box in WGS84 degrees.
///
/// Invariant (unchecked): `north >= south`. Longitudes are plain numbers; the
/// antimeridian is not special-cased, so viewports spanning it are a known
/// limitation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self {
            north,
            south,
            east,
            west,
        }
    }

    /// Width in degrees of longitude. Negative for inverted input.
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    /// Height in degrees of latitude. Negative for inverted input.
    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    /// Area in square degrees; zero for degenerate or inverted boxes.
    pub fn area(&self) -> f64 {
        (self.width().max(0.0)) * (self.height().max(0.0))
    }

    /// Rectangle-overlap test. Two boxes fail to intersect iff one lies
    /// entirely to one side of the other on either axis; touching edges count
    /// as intersecting.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        !(other.west > self.east
            || other.east < self.west
            || other.south > self.north
            || other.north < self.south)
    }

    /// Whether the point lies inside or on the edge of the box.
    pub fn contains(&self, lng: f64, lat: f64) -> bool {
        lng >= self.west && lng <= self.east && lat >= self.south && lat <= self.north
    }

    /// Pad the box symmetrically by `ratio` of its own size on each side.
    ///
    /// Used to pre-fetch a margin around the visible area so small pans do
    /// not immediately trigger a refetch. `expand(0.0)` is the identity.
    pub fn expand(&self, ratio: f64) -> BoundingBox {
        let pad_x = self.width() * ratio;
        let pad_y = self.height() * ratio;
        BoundingBox {
            north: self.north + pad_y,
            south: self.south - pad_y,
            east: self.east + pad_x,
            west: self.west - pad_x,
        }
    }

    /// Fraction of `self`'s area covered by `other`, in `[0, 1]`.
    ///
    /// Zero when the boxes do not overlap or `self` is degenerate.
    pub fn overlap_ratio(&self, other: &BoundingBox) -> f64 {
        let area = self.area();
        if area <= 0.0 {
            return 0.0;
        }
        let w = (self.east.min(other.east) - self.west.max(other.west)).max(0.0);
        let h = (self.north.min(other.north) - self.south.max(other.south)).max(0.0);
        (w * h) / area
    }

    /// Clamp each edge independently into the range allowed by `limits`.
    ///
    /// A degenerate input can come out inverted; that is left to the caller,
    /// matching the per-edge contract.
    pub fn clamp_to(&self, limits: &BoundingBox) -> BoundingBox {
        BoundingBox {
            north: self.north.clamp(limits.south, limits.north),
            south: self.south.clamp(limits.south, limits.north),
            east: self.east.clamp(limits.west, limits.east),
            west: self.west.clamp(limits.west, limits.east),
        }
    }

    /// Smallest box containing both `self` and `other`.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            north: self.north.max(other.north),
            south: self.south.min(other.south),
            east: self.east.max(other.east),
            west: self.west.min(other.west),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_edges_intersect() {
        let a = BoundingBox::new(1.0, 0.0, 1.0, 0.0);
        let b = BoundingBox::new(2.0, 1.0, 2.0, 1.0);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));

        let apart = BoundingBox::new(2.0, 1.1, 2.0, 1.1);
        assert!(!a.intersects(&apart));
    }

    #[test]
    fn expand_zero_is_identity() {
        let vp = BoundingBox::new(-31.0, -32.0, 152.5, 152.0);
        assert_eq!(vp.expand(0.0), vp);
    }

    #[test]
    fn expand_pads_each_side() {
        let vp = BoundingBox::new(10.0, 0.0, 20.0, 0.0);
        let padded = vp.expand(0.5);
        assert_eq!(padded, BoundingBox::new(15.0, -5.0, 30.0, -10.0));
    }

    #[test]
    fn overlap_ratio_is_fraction_of_self() {
        let vp = BoundingBox::new(10.0, 0.0, 10.0, 0.0);
        let half = BoundingBox::new(10.0, 0.0, 5.0, 0.0);
        assert!((vp.overlap_ratio(&half) - 0.5).abs() < 1e-12);
        assert!((half.overlap_ratio(&vp) - 1.0).abs() < 1e-12);

        let disjoint = BoundingBox::new(30.0, 20.0, 30.0, 20.0);
        assert_eq!(vp.overlap_ratio(&disjoint), 0.0);
    }

    #[test]
    fn clamp_to_works_per_edge() {
        let limits = BoundingBox::new(-28.0, -38.0, 154.0, 148.0);
        let wild = BoundingBox::new(10.0, -90.0, 180.0, -180.0);
        let clamped = wild.clamp_to(&limits);
        assert_eq!(clamped, limits);
    }
}
