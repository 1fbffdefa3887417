use super::matrix::{CentroidMatrix, TileGeometry};
use super::TilingError;
use crate::geometry::repair::largest_polygon;
use crate::geometry::{normalize_to_polygon, to_geographic, to_planar, validate, LatLon};
use geo::{
    Area, BooleanOps, BoundingRect, Centroid, Coord, InteriorPoint, Intersects, MultiPolygon,
    Polygon, Rect,
};
use geojson::GeoJson;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Centroid matrix plus the tile descriptors for every populated cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TilingOutput {
    pub matrix: CentroidMatrix,
    pub tiles: Vec<TileGeometry>,
}

/// Cuts a polygon into square cells of a fixed size in meters
#[derive(Debug, Clone, Copy)]
pub struct PolygonTiler {
    cell_size_m: f64,
}

impl PolygonTiler {
    pub const DEFAULT_CELL_SIZE_M: f64 = 15.0;

    pub fn new(cell_size_m: f64) -> Result<Self, TilingError> {
        if !cell_size_m.is_finite() || cell_size_m <= 0.0 {
            return Err(TilingError::InvalidCellSize(cell_size_m));
        }
        Ok(Self { cell_size_m })
    }

    pub fn cell_size_m(&self) -> f64 {
        self.cell_size_m
    }

    /// Normalize GeoJSON input to one polygon and tile it
    pub fn tile(&self, geojson: &GeoJson) -> Result<TilingOutput, TilingError> {
        let polygon = normalize_to_polygon(geojson)?;
        self.tile_polygon(&polygon)
    }

    /// Tile a polygon given in geographic coordinates
    pub fn tile_polygon(&self, polygon: &Polygon<f64>) -> Result<TilingOutput, TilingError> {
        let polygon = validate(polygon)?;
        let planar = to_planar(&polygon);

        let area = planar.unsigned_area();
        if !area.is_finite() || area <= 0.0 {
            return Err(TilingError::EmptyAfterProjection);
        }
        let bbox = planar
            .bounding_rect()
            .ok_or(TilingError::EmptyAfterProjection)?;

        let min = bbox.min();
        let max = bbox.max();
        let n_cols = grid_span(max.x - min.x, self.cell_size_m);
        let n_rows = grid_span(max.y - min.y, self.cell_size_m);
        debug!(
            "Tiling {:.1} m2 polygon into {} rows x {} cols at {} m",
            area, n_rows, n_cols, self.cell_size_m
        );

        let clip = MultiPolygon::new(vec![planar]);
        let min_piece_area = self.cell_size_m * self.cell_size_m * GRID_TOLERANCE;
        let mut cells = Vec::with_capacity(n_rows);
        let mut tiles = Vec::new();

        for row in 0..n_rows {
            let mut row_cells = Vec::with_capacity(n_cols);
            for col in 0..n_cols {
                let cell_min = Coord {
                    x: min.x + col as f64 * self.cell_size_m,
                    y: min.y + row as f64 * self.cell_size_m,
                };
                let cell_max = Coord {
                    x: (cell_min.x + self.cell_size_m).min(max.x),
                    y: (cell_min.y + self.cell_size_m).min(max.y),
                };

                match clip_cell(&clip, cell_min, cell_max, min_piece_area) {
                    Some((polygon, centroid)) => {
                        row_cells.push(Some(centroid));
                        tiles.push(TileGeometry {
                            row: row as u32,
                            col: col as u32,
                            polygon,
                            centroid,
                        });
                    }
                    None => row_cells.push(None),
                }
            }
            cells.push(row_cells);
        }

        debug!("Produced {} tiles from {} cells", tiles.len(), n_rows * n_cols);
        Ok(TilingOutput {
            matrix: CentroidMatrix::new(cells),
            tiles,
        })
    }
}

/// Fraction of a cell ignored when counting cells, absorbing reprojection
/// noise so an exact multiple of the cell size does not gain a sliver column
const GRID_TOLERANCE: f64 = 1e-6;

pub(crate) fn grid_span(extent: f64, cell_size: f64) -> usize {
    ((extent / cell_size - GRID_TOLERANCE).ceil() as usize).max(1)
}

/// Intersect one planar cell with the polygon and return the largest piece in
/// geographic coordinates together with a centroid that lies on it. Pieces
/// smaller than `min_area` count as an empty intersection.
fn clip_cell(
    clip: &MultiPolygon<f64>,
    cell_min: Coord<f64>,
    cell_max: Coord<f64>,
    min_area: f64,
) -> Option<(Polygon<f64>, LatLon)> {
    let cell = Rect::new(cell_min, cell_max).to_polygon();
    let pieces = MultiPolygon::new(vec![cell]).intersection(clip);
    let piece = largest_polygon(pieces).filter(|p| p.unsigned_area() > min_area)?;
    let geographic = to_geographic(&piece);

    // The area centroid of a concave piece can fall outside it
    let centroid = geographic
        .centroid()
        .filter(|c| geographic.intersects(c))
        .or_else(|| geographic.interior_point())?;

    Some((geographic, LatLon::from(centroid)))
}
