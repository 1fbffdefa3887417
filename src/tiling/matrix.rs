use crate::geometry::geojson_serde::{self, polygon_to_geometry};
use crate::geometry::LatLon;
use crate::model::tile_key;
use geo::Polygon;
use serde::{Deserialize, Serialize};

/// Row-major grid of tile centroids, `None` where a cell missed the polygon.
///
/// Row 0 is the southernmost row of the bounding box and column 0 the
/// westernmost, so `matrix.get(row, col)` addresses the same cell as the
/// tile with that row and column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CentroidMatrix {
    cells: Vec<Vec<Option<LatLon>>>,
}

impl CentroidMatrix {
    pub fn new(cells: Vec<Vec<Option<LatLon>>>) -> Self {
        Self { cells }
    }

    pub fn rows(&self) -> usize {
        self.cells.len()
    }

    pub fn cols(&self) -> usize {
        self.cells.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<LatLon> {
        self.cells.get(row).and_then(|r| r.get(col)).copied().flatten()
    }

    pub fn row_slices(&self) -> impl Iterator<Item = &[Option<LatLon>]> {
        self.cells.iter().map(Vec::as_slice)
    }

    /// All populated centroids in raster order
    pub fn centroids(&self) -> impl Iterator<Item = LatLon> + '_ {
        self.cells
            .iter()
            .flat_map(|row| row.iter().flatten().copied())
            .filter(LatLon::is_finite)
    }
}

/// One clipped grid cell produced by the tiler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileGeometry {
    pub row: u32,
    pub col: u32,
    #[serde(with = "geojson_serde")]
    pub polygon: Polygon<f64>,
    pub centroid: LatLon,
}

impl TileGeometry {
    pub fn key(&self) -> String {
        tile_key(self.row, self.col)
    }

    pub fn to_geojson(&self) -> geojson::Geometry {
        polygon_to_geometry(&self.polygon)
    }
}
