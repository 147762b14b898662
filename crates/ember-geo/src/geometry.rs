//! GeoJSON value types with a closed geometry sum type.
//!
//! The serde representations round-trip with standard GeoJSON: geometries are
//! internally tagged on `"type"`, and feature property values are restricted
//! to strings and numbers — booleans, arrays, and objects are unrepresentable
//! by construction, matching what the tile decoder is allowed to emit.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::bbox::BoundingBox;

/// A `[longitude, latitude]` pair in degrees.
pub type Position = [f64; 2];

/// Closed set of GeoJSON geometry kinds, matched exhaustively everywhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Position },
    LineString { coordinates: Vec<Position> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPoint { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    GeometryCollection { geometries: Vec<Geometry> },
}

impl Geometry {
    /// Axis-aligned bounding box of the geometry, or `None` when it contains
    /// no positions at all.
    ///
    /// For polygons only the outer shape matters for bbox purposes, so all
    /// rings are simply folded in; collections take the recursive union of
    /// member boxes.
    pub fn bbox(&self) -> Option<BoundingBox> {
        match self {
            Geometry::Point { coordinates } => Some(point_box(*coordinates)),
            Geometry::LineString { coordinates } | Geometry::MultiPoint { coordinates } => {
                fold_positions(coordinates.iter().copied())
            }
            Geometry::Polygon { coordinates } | Geometry::MultiLineString { coordinates } => {
                fold_positions(coordinates.iter().flatten().copied())
            }
            Geometry::MultiPolygon { coordinates } => {
                fold_positions(coordinates.iter().flatten().flatten().copied())
            }
            Geometry::GeometryCollection { geometries } => geometries
                .iter()
                .filter_map(Geometry::bbox)
                .reduce(|a, b| a.union(&b)),
        }
    }
}

fn point_box([lng, lat]: Position) -> BoundingBox {
    BoundingBox::new(lat, lat, lng, lng)
}

fn fold_positions(positions: impl Iterator<Item = Position>) -> Option<BoundingBox> {
    positions
        .map(point_box)
        .reduce(|a, b| a.union(&b))
}

/// Flat property value: only strings and numbers survive decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    String(String),
    Number(f64),
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

/// Flat property bag keyed by property name.
pub type Properties = BTreeMap<String, PropertyValue>;

// Unit markers so the derived serde form carries the GeoJSON "type" field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
enum FeatureMarker {
    #[default]
    Feature,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
enum FeatureCollectionMarker {
    #[default]
    FeatureCollection,
}

/// A GeoJSON feature: one geometry plus a flat property bag.
///
/// Features are value objects; they are freely cloned and hold no reference
/// back to whatever cache entry produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type")]
    marker: FeatureMarker,
    pub geometry: Geometry,
    #[serde(default)]
    pub properties: Properties,
}

impl Feature {
    pub fn new(geometry: Geometry, properties: Properties) -> Self {
        Self {
            marker: FeatureMarker::Feature,
            geometry,
            properties,
        }
    }
}

/// A GeoJSON feature collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    marker: FeatureCollectionMarker,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            marker: FeatureCollectionMarker::FeatureCollection,
            features,
        }
    }

    /// The canonical empty collection.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl FromIterator<Feature> for FeatureCollection {
    fn from_iter<T: IntoIterator<Item = Feature>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
