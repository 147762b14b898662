//! Fetch seams for the external tile/feature services.
//!
//! The loader only ever talks to a [`FeatureSource`]; whether the bytes on
//! the wire are pre-built GeoJSON or a binary vector tile is the source's
//! concern. [`MvtSource`] adapts a raw tile byte fetcher into a
//! [`FeatureSource`] by decoding with `ember-tile`.
use async_trait::async_trait;
use bytes::Bytes;
use ember_geo::{CellKey, Feature, FeatureCollection, TileCoord, lat_lng_to_tile_xy};
use ember_tile::{LayerMapping, decode_tile};

pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Why a single cell or tile fetch failed. Fetch failures are never fatal to
/// the loader; the unit stays uncovered and is retried on a later viewport
/// change.
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("unit not found upstream")]
    NotFound,
    #[error("fetch timed out")]
    Timeout,
    #[error("upstream error: {0}")]
    Upstream(String),
}

/// Supplies decoded features for one cache cell at a zoom level.
///
/// Implementations may call a feature API returning GeoJSON directly or fetch
/// and decode binary tiles; either way the result is a plain value with no
/// retained references.
#[async_trait]
pub trait FeatureSource: Send + Sync {
    async fn fetch_cell(&self, cell: CellKey, zoom: u8) -> FetchResult<FeatureCollection>;
}

/// Fetches one raw vector-tile payload.
#[async_trait]
pub trait TileFetch: Send + Sync {
    async fn fetch_tile(&self, coord: TileCoord) -> FetchResult<Bytes>;
}

/// Adapts a [`TileFetch`] into a [`FeatureSource`]: maps the cell onto the
/// slippy tiles covering it, decodes each payload, and culls the result back
/// down to the cell so neighboring cells do not double-report shared tiles.
pub struct MvtSource<F> {
    fetch: F,
    mapping: LayerMapping,
    cell_size: f64,
}

impl<F> MvtSource<F> {
    pub fn new(fetch: F, mapping: LayerMapping, cell_size: f64) -> Self {
        Self {
            fetch,
            mapping,
            cell_size,
        }
    }

    fn tiles_covering(&self, cell: CellKey, zoom: u8) -> Vec<TileCoord> {
        let bounds = cell.bounds(self.cell_size);
        // Tile y grows northward-to-southward, so the north-west corner gives
        // the minimum index on both axes.
        let nw = lat_lng_to_tile_xy(bounds.north, bounds.west, zoom);
        let se = lat_lng_to_tile_xy(bounds.south, bounds.east, zoom);
        let mut tiles = Vec::new();
        for y in nw.y..=se.y {
            for x in nw.x..=se.x {
                tiles.push(TileCoord { x, y, z: zoom });
            }
        }
        tiles
    }
}

#[async_trait]
impl<F: TileFetch> FeatureSource for MvtSource<F> {
    async fn fetch_cell(&self, cell: CellKey, zoom: u8) -> FetchResult<FeatureCollection> {
        let bounds = cell.bounds(self.cell_size);
        let mut features: Vec<Feature> = Vec::new();
        for coord in self.tiles_covering(cell, zoom) {
            let payload = self.fetch.fetch_tile(coord).await?;
            let decoded = decode_tile(payload, coord, &self.mapping);
            features.extend(decoded.features.into_iter().filter(|feature| {
                feature
                    .geometry
                    .bbox()
                    .is_some_and(|bbox| bbox.intersects(&bounds))
            }));
        }
        Ok(FeatureCollection::new(features))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_geo::cell_key;

    struct NotFoundFetch;

    #[async_trait]
    impl TileFetch for NotFoundFetch {
        async fn fetch_tile(&self, _coord: TileCoord) -> FetchResult<Bytes> {
            // Upstream answers missing tiles with a textual sentinel payload.
            Ok(Bytes::from_static(b"Tile does not exist"))
        }
    }

    #[tokio::test]
    async fn sentinel_tiles_yield_an_empty_cell() {
        let source = MvtSource::new(NotFoundFetch, LayerMapping::new(), 0.05);
        let cell = cell_key(152.46, -31.91, 0.05);
        let fc = source.fetch_cell(cell, 12).await.expect("fetch");
        assert!(fc.is_empty());
    }

    #[test]
    fn cell_maps_onto_at_least_one_tile() {
        let source = MvtSource::new(NotFoundFetch, LayerMapping::new(), 0.05);
        let cell = cell_key(152.46, -31.91, 0.05);
        let tiles = source.tiles_covering(cell, 12);
        assert!(!tiles.is_empty());
        // A 0.05 degree cell spans at most a few tiles at z12.
        assert!(tiles.len() <= 4);
    }
}
