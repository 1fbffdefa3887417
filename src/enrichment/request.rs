use crate::geometry::LatLon;
use crate::model::{Tile, Variables};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One tile as presented to the recommendation service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileInput {
    pub tile_id: String,
    pub row: u32,
    pub col: u32,
    pub centroid: LatLon,
    pub variables: Variables,
}

/// Full request for one area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentRequest {
    pub area_id: Uuid,
    pub tiles: Vec<TileInput>,
}

impl EnrichmentRequest {
    pub fn from_tiles(area_id: Uuid, tiles: &[Tile]) -> Self {
        let tiles = tiles
            .iter()
            .map(|tile| TileInput {
                tile_id: tile.key(),
                row: tile.row,
                col: tile.col,
                centroid: tile.centroid,
                variables: tile.variables.clone(),
            })
            .collect();
        Self { area_id, tiles }
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}
