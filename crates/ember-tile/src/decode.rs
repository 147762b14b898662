//! Vector-tile to GeoJSON decoding.
use std::collections::BTreeMap;

use bytes::{Buf, Bytes};
use ember_geo::{Feature, FeatureCollection, Geometry, Position, Properties, TileCoord};
use tracing::debug;

use crate::proto::{
    DecodeError, FieldHeader, Result, WIRE_FIXED32, WIRE_FIXED64, WIRE_LEN, WIRE_VARINT,
    read_field_header, read_len_delimited, read_packed_varints, read_string, read_varint,
    skip_field, zigzag,
};

/// Textual marker the upstream tile provider returns in place of a missing
/// tile. This is a quirk of the provider's payload, not an HTTP status; the
/// decoder checks for it before attempting a binary parse.
pub const TILE_NOT_FOUND_MARKER: &str = "Tile does not exist";

/// Tile-local coordinate space size when the layer does not carry an extent.
pub const DEFAULT_EXTENT: u32 = 4096;

/// Geometry kind expected for a named layer; address layers decode as points,
/// road layers as lines, parcel layers as polygons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerGeometry {
    Point,
    Line,
    Polygon,
}

/// Caller-supplied expected geometry kind per layer name. Layers absent from
/// the mapping fall back to the geometry type recorded in the tile itself.
pub type LayerMapping = BTreeMap<String, LayerGeometry>;

/// Decode a fetched tile payload into geographic features.
///
/// Never fails: the not-found sentinel and unparseable payloads yield an
/// empty collection, and individual features that fail to decode are skipped
/// while the rest of the tile is kept.
pub fn decode_tile(buf: Bytes, coord: TileCoord, mapping: &LayerMapping) -> FeatureCollection {
    // The provider signals a missing tile with a textual payload; check for
    // that before treating the bytes as protobuf.
    if let Ok(text) = std::str::from_utf8(&buf)
        && text.contains(TILE_NOT_FOUND_MARKER)
    {
        return FeatureCollection::empty();
    }

    let mut buf = buf;
    let mut features = Vec::new();
    while buf.has_remaining() {
        match next_layer(&mut buf) {
            Ok(Some(layer)) => decode_layer(layer, coord, mapping, &mut features),
            Ok(None) => {}
            Err(err) => {
                // A malformed outer message leaves nothing trustworthy after
                // it; keep whatever already decoded.
                debug!(error = %err, "abandoning tile decode");
                break;
            }
        }
    }
    FeatureCollection::new(features)
}

// Advance past one top-level field, returning layer payloads (field 3).
fn next_layer(buf: &mut Bytes) -> Result<Option<Bytes>> {
    let FieldHeader { field, wire } = read_field_header(buf)?;
    if field == 3 && wire == WIRE_LEN {
        return Ok(Some(read_len_delimited(buf)?));
    }
    skip_field(buf, wire)?;
    Ok(None)
}

// Raw per-layer state; keys/values may arrive after the features that
// reference them, so features are buffered and resolved afterwards.
struct RawLayer {
    name: String,
    extent: u32,
    keys: Vec<String>,
    values: Vec<RawValue>,
    features: Vec<Bytes>,
}

#[derive(Debug, Clone)]
enum RawValue {
    Str(String),
    Num(f64),
    Bool(bool),
}

fn decode_layer(
    buf: Bytes,
    coord: TileCoord,
    mapping: &LayerMapping,
    out: &mut Vec<Feature>,
) {
    let layer = match read_layer(buf) {
        Ok(layer) => layer,
        Err(err) => {
            debug!(error = %err, "skipping undecodable layer");
            return;
        }
    };
    let expected = mapping.get(&layer.name).copied();
    for raw in &layer.features {
        match decode_feature(raw.clone(), coord, &layer, expected) {
            Ok(Some(feature)) => out.push(feature),
            // Features without geometry are silently omitted.
            Ok(None) => {}
            Err(err) => {
                debug!(layer = %layer.name, error = %err, "skipping undecodable feature");
            }
        }
    }
}

fn read_layer(mut buf: Bytes) -> Result<RawLayer> {
    let mut layer = RawLayer {
        name: String::new(),
        extent: DEFAULT_EXTENT,
        keys: Vec::new(),
        values: Vec::new(),
        features: Vec::new(),
    };
    while buf.has_remaining() {
        let FieldHeader { field, wire } = read_field_header(&mut buf)?;
        match (field, wire) {
            (1, WIRE_LEN) => layer.name = read_string(&mut buf)?,
            (2, WIRE_LEN) => layer.features.push(read_len_delimited(&mut buf)?),
            (3, WIRE_LEN) => layer.keys.push(read_string(&mut buf)?),
            (4, WIRE_LEN) => layer.values.push(read_value(read_len_delimited(&mut buf)?)?),
            (5, WIRE_VARINT) => layer.extent = read_varint(&mut buf)? as u32,
            (_, wire) => skip_field(&mut buf, wire)?,
        }
    }
    Ok(layer)
}

// A value message holds exactly one of the oneof fields; last one wins.
fn read_value(mut buf: Bytes) -> Result<RawValue> {
    let mut value = None;
    while buf.has_remaining() {
        let FieldHeader { field, wire } = read_field_header(&mut buf)?;
        value = Some(match (field, wire) {
            (1, WIRE_LEN) => RawValue::Str(read_string(&mut buf)?),
            (2, WIRE_FIXED32) => {
                if buf.remaining() < 4 {
                    return Err(DecodeError::Truncated);
                }
                RawValue::Num(f64::from(buf.get_f32_le()))
            }
            (3, WIRE_FIXED64) => {
                if buf.remaining() < 8 {
                    return Err(DecodeError::Truncated);
                }
                RawValue::Num(buf.get_f64_le())
            }
            (4, WIRE_VARINT) => RawValue::Num(read_varint(&mut buf)? as i64 as f64),
            (5, WIRE_VARINT) => RawValue::Num(read_varint(&mut buf)? as f64),
            (6, WIRE_VARINT) => RawValue::Num(zigzag(read_varint(&mut buf)?) as f64),
            (7, WIRE_VARINT) => RawValue::Bool(read_varint(&mut buf)? != 0),
            (_, wire) => {
                skip_field(&mut buf, wire)?;
                continue;
            }
        });
    }
    value.ok_or(DecodeError::EmptyValue)
}

fn decode_feature(
    mut buf: Bytes,
    coord: TileCoord,
    layer: &RawLayer,
    expected: Option<LayerGeometry>,
) -> Result<Option<Feature>> {
    let mut geom_type = 0u64;
    let mut tags: Vec<u64> = Vec::new();
    let mut commands: Vec<u64> = Vec::new();
    while buf.has_remaining() {
        let FieldHeader { field, wire } = read_field_header(&mut buf)?;
        match (field, wire) {
            (2, WIRE_LEN) => tags = read_packed_varints(&mut buf)?,
            (3, WIRE_VARINT) => geom_type = read_varint(&mut buf)?,
            (4, WIRE_LEN) => commands = read_packed_varints(&mut buf)?,
            (_, wire) => skip_field(&mut buf, wire)?,
        }
    }

    let rings = decode_rings(&commands)?;
    if rings.iter().all(Vec::is_empty) {
        return Ok(None);
    }

    let kind = match expected {
        Some(kind) => kind,
        None => match geom_type {
            1 => LayerGeometry::Point,
            2 => LayerGeometry::Line,
            3 => LayerGeometry::Polygon,
            _ => return Err(DecodeError::BadGeometry),
        },
    };

    let to_lnglat = |&(x, y): &(i64, i64)| project(coord, layer.extent, x, y);
    let geometry = match kind {
        // A point layer keeps only the first coordinate.
        LayerGeometry::Point => Geometry::Point {
            coordinates: rings
                .iter()
                .flatten()
                .next()
                .map(to_lnglat)
                .ok_or(DecodeError::BadGeometry)?,
        },
        LayerGeometry::Line => {
            let mut lines: Vec<Vec<Position>> = rings
                .iter()
                .filter(|ring| !ring.is_empty())
                .map(|ring| ring.iter().map(to_lnglat).collect())
                .collect();
            if lines.len() == 1 {
                Geometry::LineString {
                    coordinates: lines.remove(0),
                }
            } else {
                Geometry::MultiLineString { coordinates: lines }
            }
        }
        LayerGeometry::Polygon => Geometry::Polygon {
            coordinates: rings
                .iter()
                .filter(|ring| !ring.is_empty())
                .map(|ring| ring.iter().map(to_lnglat).collect())
                .collect(),
        },
    };

    Ok(Some(Feature::new(geometry, resolve_tags(&tags, layer))))
}

// Tag pairs index into the layer's key/value tables. Boolean values are
// dropped on the floor here; only strings and numbers survive.
fn resolve_tags(tags: &[u64], layer: &RawLayer) -> Properties {
    let mut properties = Properties::new();
    for pair in tags.chunks_exact(2) {
        let (Some(key), Some(value)) = (
            layer.keys.get(pair[0] as usize),
            layer.values.get(pair[1] as usize),
        ) else {
            continue;
        };
        match value {
            RawValue::Str(s) => {
                properties.insert(key.clone(), s.as_str().into());
            }
            RawValue::Num(n) => {
                properties.insert(key.clone(), (*n).into());
            }
            RawValue::Bool(_) => {}
        }
    }
    properties
}

// Walk the MoveTo/LineTo/ClosePath command stream into rings of tile-local
// integer coordinates. The cursor persists across commands.
fn decode_rings(commands: &[u64]) -> Result<Vec<Vec<(i64, i64)>>> {
    const MOVE_TO: u64 = 1;
    const LINE_TO: u64 = 2;
    const CLOSE_PATH: u64 = 7;

    let mut rings: Vec<Vec<(i64, i64)>> = Vec::new();
    let (mut cx, mut cy) = (0i64, 0i64);
    let mut i = 0usize;

    let mut take_delta = |i: &mut usize| -> Result<(i64, i64)> {
        let dx = *commands.get(*i).ok_or(DecodeError::BadGeometry)?;
        let dy = *commands.get(*i + 1).ok_or(DecodeError::BadGeometry)?;
        *i += 2;
        Ok((zigzag(dx), zigzag(dy)))
    };

    while i < commands.len() {
        let command = commands[i];
        i += 1;
        let id = command & 0x7;
        let count = (command >> 3) as usize;
        match id {
            MOVE_TO => {
                // Each MoveTo point starts a new ring.
                for _ in 0..count {
                    let (dx, dy) = take_delta(&mut i)?;
                    cx += dx;
                    cy += dy;
                    rings.push(vec![(cx, cy)]);
                }
            }
            LINE_TO => {
                let ring = rings.last_mut().ok_or(DecodeError::BadGeometry)?;
                for _ in 0..count {
                    let (dx, dy) = take_delta(&mut i)?;
                    cx += dx;
                    cy += dy;
                    ring.push((cx, cy));
                }
            }
            CLOSE_PATH => {
                let ring = rings.last_mut().ok_or(DecodeError::BadGeometry)?;
                let first = *ring.first().ok_or(DecodeError::BadGeometry)?;
                ring.push(first);
            }
            _ => return Err(DecodeError::BadGeometry),
        }
    }
    Ok(rings)
}

// Inverse Web-Mercator transform from tile-local integers to lng/lat degrees.
fn project(tile: TileCoord, extent: u32, x: i64, y: i64) -> Position {
    let size = f64::from(extent) * 2f64.powi(i32::from(tile.z));
    let px = f64::from(tile.x) * f64::from(extent) + x as f64;
    let py = f64::from(tile.y) * f64::from(extent) + y as f64;
    let lng = px * 360.0 / size - 180.0;
    let lat = (std::f64::consts::PI * (1.0 - 2.0 * py / size))
        .sinh()
        .atan()
        .to_degrees();
    [lng, lat]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rings_follow_the_cursor() {
        // MoveTo(1): (+2,+2); LineTo(2): (+1,0), (0,+1); ClosePath.
        let commands = vec![
            (1 << 3) | 1,
            4,
            4,
            (2 << 3) | 2,
            2,
            0,
            0,
            2,
            7,
        ];
        let rings = decode_rings(&commands).expect("rings");
        assert_eq!(rings, vec![vec![(2, 2), (3, 2), (3, 3), (2, 2)]]);
    }

    #[test]
    fn line_to_without_move_to_is_rejected() {
        let commands = vec![(1 << 3) | 2, 2, 2];
        assert!(decode_rings(&commands).is_err());
    }

    #[test]
    fn projection_covers_the_world_tile() {
        // At z0 the single tile spans the full mercator world.
        let tile = TileCoord { x: 0, y: 0, z: 0 };
        let [lng, lat] = project(tile, DEFAULT_EXTENT, 0, 0);
        assert!((lng - -180.0).abs() < 1e-9);
        assert!((lat - 85.0511).abs() < 1e-3);

        let [lng, lat] = project(tile, DEFAULT_EXTENT, 2048, 2048);
        assert!(lng.abs() < 1e-9);
        assert!(lat.abs() < 1e-9);
    }
}
