//! Geometry utilities shared by the tiler and the bounds calculator
//!
//! Geographic coordinates follow the GeoJSON axis order: `x` is longitude and
//! `y` is latitude, both in degrees (EPSG:4326). Planar coordinates are Web
//! Mercator meters (EPSG:3857).

pub mod geojson_serde;
pub mod normalize;
pub mod projection;
pub mod repair;

pub use normalize::{normalize_to_polygon, parse_geojson};
pub use projection::{to_geographic, to_planar};
pub use repair::validate;

use crate::error::ErrorCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while turning user input into a single polygon
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("polygon input is empty")]
    Empty,

    #[error("feature has no geometry")]
    MissingGeometry,

    #[error("unsupported geometry type: {0}")]
    Unsupported(String),

    #[error("{0} does not contain a polygon")]
    NoPolygon(String),

    #[error("invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("failed to parse GeoJSON: {0}")]
    Parse(String),
}

impl GeometryError {
    pub fn code(&self) -> u16 {
        match self {
            Self::Empty => ErrorCode::GEOMETRY_EMPTY,
            Self::MissingGeometry | Self::NoPolygon(_) => ErrorCode::GEOMETRY_NO_POLYGON,
            Self::Unsupported(_) => ErrorCode::GEOMETRY_UNSUPPORTED,
            Self::InvalidCoordinates(_) => ErrorCode::GEOMETRY_INVALID_COORDINATES,
            Self::Parse(_) => ErrorCode::GEOMETRY_PARSE,
        }
    }
}

/// A geographic point in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Both components are finite numbers
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }

    pub fn to_point(self) -> geo::Point<f64> {
        geo::Point::new(self.lon, self.lat)
    }
}

impl From<geo::Point<f64>> for LatLon {
    fn from(point: geo::Point<f64>) -> Self {
        Self {
            lat: point.y(),
            lon: point.x(),
        }
    }
}
