//! Bounding envelopes for context enrichment
//!
//! Bounds can be derived from three sources, tried in order: the submitted
//! polygon, the centroid matrix, then the tiles themselves. A source that is
//! missing, empty or of an unsupported geometry type falls through to the
//! next one.

use crate::geometry::LatLon;
use crate::model::Tile;
use crate::tiling::CentroidMatrix;
use geo::CoordsIter;
use geojson::{GeoJson, PolygonType, Value as GeometryValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
    pub center_lat: f64,
    pub center_lon: f64,
}

impl Bounds {
    /// Envelope of a set of points, `None` when there are no finite points
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = LatLon>,
    {
        let mut iter = points.into_iter().filter(LatLon::is_finite);
        let first = iter.next()?;
        let (mut north, mut south) = (first.lat, first.lat);
        let (mut east, mut west) = (first.lon, first.lon);
        for p in iter {
            north = north.max(p.lat);
            south = south.min(p.lat);
            east = east.max(p.lon);
            west = west.min(p.lon);
        }
        Some(Self {
            north,
            south,
            east,
            west,
            center_lat: (north + south) / 2.0,
            center_lon: (east + west) / 2.0,
        })
    }

    pub fn center(&self) -> LatLon {
        LatLon::new(self.center_lat, self.center_lon)
    }
}

/// Bounds of a raw GeoJSON polygon input.
///
/// Supports Polygon, MultiPolygon, Feature and FeatureCollection. Anything
/// else, including a collection with an unsupported member, yields `None`.
pub fn bounds_from_geojson(geometry: &Value) -> Option<Bounds> {
    if geometry.is_null() || geometry.as_object().is_some_and(|o| o.is_empty()) {
        return None;
    }
    let geojson = match GeoJson::from_json_value(geometry.clone()) {
        Ok(geojson) => geojson,
        Err(e) => {
            debug!("Geometry is not valid GeoJSON: {}", e);
            return None;
        }
    };

    let mut points = Vec::new();
    match collect_geojson_points(&geojson, &mut points) {
        Ok(()) => Bounds::from_points(points),
        Err(kind) => {
            debug!("Cannot derive bounds from {} geometry", kind);
            None
        }
    }
}

fn collect_geojson_points(geojson: &GeoJson, out: &mut Vec<LatLon>) -> Result<(), &'static str> {
    match geojson {
        GeoJson::Geometry(geometry) => collect_geometry_points(&geometry.value, out),
        GeoJson::Feature(feature) => match &feature.geometry {
            Some(geometry) => collect_geometry_points(&geometry.value, out),
            None => Ok(()),
        },
        GeoJson::FeatureCollection(collection) => {
            for feature in &collection.features {
                if let Some(geometry) = &feature.geometry {
                    collect_geometry_points(&geometry.value, out)?;
                }
            }
            Ok(())
        }
    }
}

fn collect_geometry_points(value: &GeometryValue, out: &mut Vec<LatLon>) -> Result<(), &'static str> {
    match value {
        GeometryValue::Polygon(rings) => {
            push_rings(rings, out);
            Ok(())
        }
        GeometryValue::MultiPolygon(polygons) => {
            for rings in polygons {
                push_rings(rings, out);
            }
            Ok(())
        }
        GeometryValue::Point(_) => Err("Point"),
        GeometryValue::MultiPoint(_) => Err("MultiPoint"),
        GeometryValue::LineString(_) => Err("LineString"),
        GeometryValue::MultiLineString(_) => Err("MultiLineString"),
        GeometryValue::GeometryCollection(_) => Err("GeometryCollection"),
    }
}

fn push_rings(rings: &PolygonType, out: &mut Vec<LatLon>) {
    out.extend(
        rings
            .iter()
            .flatten()
            .filter(|position| position.len() >= 2)
            .map(|position| LatLon::new(position[1], position[0])),
    );
}

/// Bounds of the populated cells of a centroid matrix
pub fn bounds_from_matrix(matrix: &CentroidMatrix) -> Option<Bounds> {
    Bounds::from_points(matrix.centroids())
}

/// Bounds of tile centroids together with their boundary vertices
pub fn bounds_from_tiles(tiles: &[Tile]) -> Option<Bounds> {
    let points = tiles.iter().flat_map(|tile| {
        std::iter::once(tile.centroid).chain(
            tile.boundary
                .exterior_coords_iter()
                .map(|c| LatLon::new(c.y, c.x)),
        )
    });
    Bounds::from_points(points)
}

/// Try the polygon, then the matrix, then the tiles
pub fn compute_bounds(
    geometry: Option<&Value>,
    matrix: Option<&CentroidMatrix>,
    tiles: &[Tile],
) -> Option<Bounds> {
    geometry
        .and_then(bounds_from_geojson)
        .or_else(|| matrix.and_then(bounds_from_matrix))
        .or_else(|| bounds_from_tiles(tiles))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::sample_tiles;
    use serde_json::json;

    fn square() -> Value {
        json!({
            "type": "Polygon",
            "coordinates": [[[107.0, -6.6], [107.2, -6.6], [107.2, -6.4], [107.0, -6.4], [107.0, -6.6]]]
        })
    }

    #[test]
    fn test_bounds_from_polygon() {
        let bounds = bounds_from_geojson(&square()).unwrap();
        assert_eq!(bounds.north, -6.4);
        assert_eq!(bounds.south, -6.6);
        assert_eq!(bounds.east, 107.2);
        assert_eq!(bounds.west, 107.0);
        assert!((bounds.center_lat - -6.5).abs() < 1e-12);
        assert!((bounds.center_lon - 107.1).abs() < 1e-12);
    }

    #[test]
    fn test_bounds_from_feature_collection() {
        let fc = json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {}, "geometry": square()},
                {"type": "Feature", "properties": {}, "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[108.0, -7.0], [108.1, -7.0], [108.1, -6.9], [108.0, -7.0]]]
                }}
            ]
        });
        let bounds = bounds_from_geojson(&fc).unwrap();
        assert_eq!(bounds.east, 108.1);
        assert_eq!(bounds.south, -7.0);
    }

    #[test]
    fn test_unsupported_geometry_falls_through_to_matrix() {
        let point = json!({"type": "Point", "coordinates": [107.0, -6.5]});
        assert!(bounds_from_geojson(&point).is_none());

        let matrix = CentroidMatrix::new(vec![
            vec![Some(LatLon::new(-6.5, 107.0)), None],
            vec![None, Some(LatLon::new(-6.4, 107.1))],
        ]);
        let bounds = compute_bounds(Some(&point), Some(&matrix), &[]).unwrap();
        assert_eq!(bounds.north, -6.4);
        assert_eq!(bounds.west, 107.0);
    }

    #[test]
    fn test_tiles_are_last_resort() {
        let tiles = sample_tiles();
        let empty = CentroidMatrix::default();
        let bounds = compute_bounds(Some(&json!({})), Some(&empty), &tiles).unwrap();
        assert_eq!(bounds, bounds_from_tiles(&tiles).unwrap());
        for tile in &tiles {
            assert!(tile.centroid.lat <= bounds.north && tile.centroid.lat >= bounds.south);
        }
    }

    #[test]
    fn test_no_source_gives_none() {
        assert!(compute_bounds(None, None, &[]).is_none());
    }
}
