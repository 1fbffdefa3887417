//! Conversions between `geo` polygons and GeoJSON geometry
//!
//! Also usable as a `#[serde(with = "...")]` module so records can keep a
//! `geo::Polygon` in memory while serializing it as a GeoJSON object.

use super::GeometryError;
use geo::{Coord, LineString, Polygon};
use geojson::{Geometry, PolygonType, Value};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Build a polygon from GeoJSON rings (first ring is the exterior)
pub fn polygon_from_rings(rings: &PolygonType) -> Result<Polygon<f64>, GeometryError> {
    let mut rings = rings.iter();
    let exterior = match rings.next() {
        Some(ring) if !ring.is_empty() => line_string(ring)?,
        _ => return Err(GeometryError::Empty),
    };
    let interiors = rings
        .filter(|ring| !ring.is_empty())
        .map(|ring| line_string(ring))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::new(exterior, interiors))
}

fn line_string(positions: &[Vec<f64>]) -> Result<LineString<f64>, GeometryError> {
    positions
        .iter()
        .map(|p| match p.as_slice() {
            [x, y, ..] => Ok(Coord { x: *x, y: *y }),
            _ => Err(GeometryError::InvalidCoordinates(format!(
                "position {:?} needs at least two values",
                p
            ))),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(LineString::new)
}

fn ring_positions(ring: &LineString<f64>) -> Vec<Vec<f64>> {
    ring.coords().map(|c| vec![c.x, c.y]).collect()
}

/// Render a polygon as a GeoJSON `Polygon` geometry
pub fn polygon_to_geometry(polygon: &Polygon<f64>) -> Geometry {
    let mut rings = vec![ring_positions(polygon.exterior())];
    rings.extend(polygon.interiors().iter().map(ring_positions));
    Geometry::new(Value::Polygon(rings))
}

/// Read a GeoJSON geometry that must be a single polygon
pub fn polygon_from_geometry(geometry: &Geometry) -> Result<Polygon<f64>, GeometryError> {
    match &geometry.value {
        Value::Polygon(rings) => polygon_from_rings(rings),
        other => Err(GeometryError::Unsupported(
            super::normalize::type_name(other).to_string(),
        )),
    }
}

pub fn serialize<S>(polygon: &Polygon<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    polygon_to_geometry(polygon).serialize(serializer)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Polygon<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let geometry = Geometry::deserialize(deserializer)?;
    polygon_from_geometry(&geometry).map_err(serde::de::Error::custom)
}
