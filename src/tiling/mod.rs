//! Polygon tiling into a fixed-size row/column grid
//!
//! The tiler works in Web Mercator meters: the polygon's bounding box is cut
//! into square cells of the requested size, each cell is clipped against the
//! polygon, and the surviving piece is projected back to WGS84.

pub mod matrix;
pub mod tiler;

pub use matrix::{CentroidMatrix, TileGeometry};
pub use tiler::{PolygonTiler, TilingOutput};

use crate::error::ErrorCode;
use crate::geometry::GeometryError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TilingError {
    #[error("polygon is empty after reprojection")]
    EmptyAfterProjection,

    #[error("cell size must be a positive number of meters, got {0}")]
    InvalidCellSize(f64),

    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

impl TilingError {
    pub fn code(&self) -> u16 {
        match self {
            Self::EmptyAfterProjection => ErrorCode::TILING_EMPTY_PROJECTION,
            Self::InvalidCellSize(_) => ErrorCode::TILING_INVALID_CELL_SIZE,
            Self::Geometry(inner) => inner.code(),
        }
    }
}
