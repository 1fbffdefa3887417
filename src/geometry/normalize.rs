//! Reduce arbitrary GeoJSON input to one outer polygon

use super::geojson_serde::polygon_from_rings;
use super::repair::largest_polygon;
use super::GeometryError;
use geo::{BooleanOps, MultiPolygon, Polygon};
use geojson::{GeoJson, Geometry, Value};

/// Parse a JSON document into GeoJSON
pub fn parse_geojson(value: &serde_json::Value) -> Result<GeoJson, GeometryError> {
    if value.is_null() || value.as_object().is_some_and(|o| o.is_empty()) {
        return Err(GeometryError::Empty);
    }
    GeoJson::from_json_value(value.clone()).map_err(|e| GeometryError::Parse(e.to_string()))
}

/// Reduce a polygon, multi-polygon, feature, feature collection or geometry
/// collection to a single polygon.
///
/// Multi-part inputs keep their largest member. Collections are unioned first
/// so touching parts merge before the largest one is chosen.
pub fn normalize_to_polygon(geojson: &GeoJson) -> Result<Polygon<f64>, GeometryError> {
    match geojson {
        GeoJson::Geometry(geometry) => from_geometry(geometry),
        GeoJson::Feature(feature) => {
            let geometry = feature
                .geometry
                .as_ref()
                .ok_or(GeometryError::MissingGeometry)?;
            from_geometry(geometry)
        }
        GeoJson::FeatureCollection(collection) => {
            let geometries: Vec<&Geometry> = collection
                .features
                .iter()
                .filter_map(|f| f.geometry.as_ref())
                .collect();
            if geometries.is_empty() {
                return Err(GeometryError::NoPolygon("FeatureCollection".to_string()));
            }
            let mut members = Vec::new();
            for geometry in geometries {
                members.extend(polygon_members(geometry)?);
            }
            if members.is_empty() {
                return Err(GeometryError::NoPolygon("FeatureCollection".to_string()));
            }
            union_largest(members)
        }
    }
}

fn from_geometry(geometry: &Geometry) -> Result<Polygon<f64>, GeometryError> {
    match &geometry.value {
        Value::Polygon(rings) => polygon_from_rings(rings),
        Value::MultiPolygon(_) => {
            let members = polygon_members(geometry)?;
            largest_polygon(MultiPolygon::new(members)).ok_or(GeometryError::Empty)
        }
        Value::GeometryCollection(_) => {
            let members = polygon_members(geometry)?;
            if members.is_empty() {
                return Err(GeometryError::NoPolygon("GeometryCollection".to_string()));
            }
            union_largest(members)
        }
        other => Err(GeometryError::Unsupported(type_name(other).to_string())),
    }
}

/// Every polygon reachable from `geometry`; non-areal members are skipped
fn polygon_members(geometry: &Geometry) -> Result<Vec<Polygon<f64>>, GeometryError> {
    match &geometry.value {
        Value::Polygon(rings) => non_empty(polygon_from_rings(rings)),
        Value::MultiPolygon(polygons) => {
            let mut members = Vec::new();
            for rings in polygons {
                members.extend(non_empty(polygon_from_rings(rings))?);
            }
            Ok(members)
        }
        Value::GeometryCollection(geometries) => {
            let mut members = Vec::new();
            for inner in geometries {
                members.extend(polygon_members(inner)?);
            }
            Ok(members)
        }
        _ => Ok(Vec::new()),
    }
}

fn non_empty(
    polygon: Result<Polygon<f64>, GeometryError>,
) -> Result<Vec<Polygon<f64>>, GeometryError> {
    match polygon {
        Ok(p) => Ok(vec![p]),
        Err(GeometryError::Empty) => Ok(Vec::new()),
        Err(e) => Err(e),
    }
}

fn union_largest(members: Vec<Polygon<f64>>) -> Result<Polygon<f64>, GeometryError> {
    let merged = members
        .into_iter()
        .fold(MultiPolygon::new(Vec::new()), |acc, p| {
            acc.union(&MultiPolygon::new(vec![p]))
        });
    largest_polygon(merged).ok_or(GeometryError::Empty)
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Area;
    use serde_json::json;

    fn square(x0: f64, y0: f64, size: f64) -> serde_json::Value {
        json!([[
            [x0, y0],
            [x0 + size, y0],
            [x0 + size, y0 + size],
            [x0, y0 + size],
            [x0, y0]
        ]])
    }

    fn normalize(value: serde_json::Value) -> Result<Polygon<f64>, GeometryError> {
        normalize_to_polygon(&parse_geojson(&value)?)
    }

    #[test]
    fn test_plain_polygon() {
        let poly = normalize(json!({"type": "Polygon", "coordinates": square(0.0, 0.0, 1.0)}))
            .unwrap();
        assert!((poly.unsigned_area() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_multipolygon_keeps_largest_member() {
        let poly = normalize(json!({
            "type": "MultiPolygon",
            "coordinates": [square(0.0, 0.0, 1.0), square(5.0, 5.0, 3.0)]
        }))
        .unwrap();
        assert!((poly.unsigned_area() - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_feature_without_geometry_fails() {
        let err = normalize(json!({"type": "Feature", "geometry": null, "properties": {}}))
            .unwrap_err();
        assert_eq!(err, GeometryError::MissingGeometry);
    }

    #[test]
    fn test_feature_collection_unions_members() {
        let poly = normalize(json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {}, "geometry": {"type": "Polygon", "coordinates": square(0.0, 0.0, 2.0)}},
                {"type": "Feature", "properties": {}, "geometry": {"type": "Polygon", "coordinates": square(2.0, 0.0, 2.0)}}
            ]
        }))
        .unwrap();
        // Touching squares merge into one 4x2 rectangle
        assert!((poly.unsigned_area() - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_geometry_collection_without_polygon_fails() {
        let err = normalize(json!({
            "type": "GeometryCollection",
            "geometries": [{"type": "Point", "coordinates": [1.0, 2.0]}]
        }))
        .unwrap_err();
        assert_eq!(err, GeometryError::NoPolygon("GeometryCollection".to_string()));
    }

    #[test]
    fn test_unsupported_type_fails() {
        let err = normalize(json!({"type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]]}))
            .unwrap_err();
        assert_eq!(err, GeometryError::Unsupported("LineString".to_string()));
    }

    #[test]
    fn test_empty_input_fails() {
        assert_eq!(parse_geojson(&json!({})).unwrap_err(), GeometryError::Empty);
        assert_eq!(
            normalize(json!({"type": "Polygon", "coordinates": []})).unwrap_err(),
            GeometryError::Empty
        );
    }
}
