//! Reprojection between WGS84 degrees and Web Mercator meters
//!
//! Uses the closed-form spherical Mercator equations, so the pair is exact
//! inverses up to floating point error.

use geo::{Coord, MapCoords, Polygon};
use std::f64::consts::PI;

/// Web Mercator sphere radius in meters
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Latitude where Web Mercator becomes a square world
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_779_806_59;

#[inline]
pub fn lon_to_merc_x(lon: f64) -> f64 {
    lon.to_radians() * EARTH_RADIUS_M
}

#[inline]
pub fn lat_to_merc_y(lat: f64) -> f64 {
    let lat = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
    (PI / 4.0 + lat.to_radians() / 2.0).tan().ln() * EARTH_RADIUS_M
}

#[inline]
pub fn merc_x_to_lon(x: f64) -> f64 {
    (x / EARTH_RADIUS_M).to_degrees()
}

#[inline]
pub fn merc_y_to_lat(y: f64) -> f64 {
    (2.0 * (y / EARTH_RADIUS_M).exp().atan() - PI / 2.0).to_degrees()
}

/// Project a geographic coordinate (x = lon, y = lat) to planar meters
pub fn coord_to_planar(c: Coord<f64>) -> Coord<f64> {
    Coord {
        x: lon_to_merc_x(c.x),
        y: lat_to_merc_y(c.y),
    }
}

/// Project a planar coordinate back to geographic degrees
pub fn coord_to_geographic(c: Coord<f64>) -> Coord<f64> {
    Coord {
        x: merc_x_to_lon(c.x),
        y: merc_y_to_lat(c.y),
    }
}

pub fn to_planar(polygon: &Polygon<f64>) -> Polygon<f64> {
    polygon.map_coords(coord_to_planar)
}

pub fn to_geographic(polygon: &Polygon<f64>) -> Polygon<f64> {
    polygon.map_coords(coord_to_geographic)
}
