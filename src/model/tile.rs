use super::{tile_key, Recommendation, Variables};
use crate::geometry::geojson_serde;
use crate::geometry::LatLon;
use crate::tiling::TileGeometry;
use geo::Polygon;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a single tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileStatus {
    Pending,
    Collected,
    Enriched,
    Failed,
}

/// A populated grid cell with its collected variables and recommendations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub id: Uuid,
    pub area_id: Uuid,
    pub row: u32,
    pub col: u32,
    pub centroid: LatLon,
    #[serde(with = "geojson_serde")]
    pub boundary: Polygon<f64>,
    #[serde(default)]
    pub variables: Variables,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
    pub status: TileStatus,
}

impl Tile {
    /// A tile whose variables have just been collected
    pub fn collected(area_id: Uuid, geometry: &TileGeometry, variables: Variables) -> Self {
        Self {
            id: Uuid::new_v4(),
            area_id,
            row: geometry.row,
            col: geometry.col,
            centroid: geometry.centroid,
            boundary: geometry.polygon.clone(),
            variables,
            recommendations: Vec::new(),
            status: TileStatus::Collected,
        }
    }

    /// `"row-col"`, the identifier used in recommendation payloads
    pub fn key(&self) -> String {
        tile_key(self.row, self.col)
    }

    /// The recommendation ranked first, if any
    pub fn top_recommendation(&self) -> Option<&Recommendation> {
        self.recommendations.first()
    }
}
