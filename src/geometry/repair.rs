//! Polygon validation and zero-buffer style repair
//!
//! A polygon is considered valid when every coordinate is finite, it encloses
//! a non-zero area, and none of its rings cross themselves. Invalid polygons
//! are rebuilt by running them through a boolean union, which resolves
//! self-intersections into simple pieces; the largest piece is kept.

use super::GeometryError;
use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{Area, BooleanOps, Line, LineString, MultiPolygon, Polygon};
use std::cmp::Ordering;
use tracing::debug;

/// Return a valid version of `polygon`, repairing it when necessary.
pub fn validate(polygon: &Polygon<f64>) -> Result<Polygon<f64>, GeometryError> {
    if !all_coords_finite(polygon) {
        return Err(GeometryError::InvalidCoordinates(
            "polygon contains non-finite coordinates".to_string(),
        ));
    }
    if polygon.exterior().0.is_empty() {
        return Err(GeometryError::Empty);
    }
    if is_valid(polygon) {
        return Ok(polygon.clone());
    }

    debug!(
        "Repairing invalid polygon with {} exterior coordinates",
        polygon.exterior().0.len()
    );
    let repaired = MultiPolygon::new(vec![polygon.clone()]).union(&MultiPolygon::new(vec![]));
    largest_polygon(repaired).ok_or(GeometryError::Empty)
}

/// Cheap validity check used to skip repair for well-formed input
pub fn is_valid(polygon: &Polygon<f64>) -> bool {
    if polygon.exterior().0.len() < 4 || polygon.unsigned_area() <= 0.0 {
        return false;
    }
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors().iter())
        .all(|ring| !ring_self_intersects(ring))
}

/// Pick the member with the largest positive area
pub fn largest_polygon(multi: MultiPolygon<f64>) -> Option<Polygon<f64>> {
    multi
        .0
        .into_iter()
        .map(|p| (p.unsigned_area(), p))
        .filter(|(area, _)| *area > 0.0)
        .max_by(|(a, _), (b, _)| a.partial_cmp(b).unwrap_or(Ordering::Equal))
        .map(|(_, p)| p)
}

fn all_coords_finite(polygon: &Polygon<f64>) -> bool {
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors().iter())
        .flat_map(|ring| ring.coords())
        .all(|c| c.x.is_finite() && c.y.is_finite())
}

fn ring_self_intersects(ring: &LineString<f64>) -> bool {
    let segments: Vec<Line<f64>> = ring.lines().collect();
    let n = segments.len();
    for i in 0..n {
        for j in (i + 1)..n {
            let adjacent = j == i + 1 || (i == 0 && j == n - 1);
            match line_intersection(segments[i], segments[j]) {
                None => {}
                // Neighbours always share their joint vertex
                Some(LineIntersection::SinglePoint { .. }) if adjacent => {}
                Some(_) => return true,
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    #[test]
    fn test_valid_square_is_unchanged() {
        let square = polygon![
            (x: 0.0, y: 0.0),
            (x: 10.0, y: 0.0),
            (x: 10.0, y: 10.0),
            (x: 0.0, y: 10.0),
        ];
        assert!(is_valid(&square));
        let validated = validate(&square).unwrap();
        assert_eq!(validated, square);
    }

    #[test]
    fn test_bowtie_is_repaired() {
        let bowtie = polygon![
            (x: 0.0, y: 0.0),
            (x: 10.0, y: 10.0),
            (x: 10.0, y: 0.0),
            (x: 0.0, y: 10.0),
        ];
        assert!(!is_valid(&bowtie));
        let repaired = validate(&bowtie).unwrap();
        assert!(is_valid(&repaired));
        assert!(repaired.unsigned_area() > 0.0);
        assert!(repaired.unsigned_area() <= 50.0 + 1e-9);
    }

    #[test]
    fn test_non_finite_coordinates_are_rejected() {
        let broken = polygon![
            (x: 0.0, y: 0.0),
            (x: f64::NAN, y: 0.0),
            (x: 1.0, y: 1.0),
        ];
        assert!(matches!(
            validate(&broken),
            Err(GeometryError::InvalidCoordinates(_))
        ));
    }

    #[test]
    fn test_largest_polygon_picks_biggest_member() {
        let big = polygon![(x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 4.0), (x: 0.0, y: 4.0)];
        let small = polygon![(x: 5.0, y: 5.0), (x: 6.0, y: 5.0), (x: 6.0, y: 6.0), (x: 5.0, y: 6.0)];
        let picked = largest_polygon(MultiPolygon::new(vec![small, big.clone()])).unwrap();
        assert_eq!(picked, big);
        assert!(largest_polygon(MultiPolygon::new(vec![])).is_none());
    }
}
