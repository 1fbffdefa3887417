//! Polygon, tile and payload fixtures
//!
//! Polygons are built as exact squares in Web Mercator meters around a fixed
//! origin and converted to WGS84, so tiling them gives predictable grids.

use crate::collector::ProviderKind;
use crate::geometry::geojson_serde::polygon_to_geometry;
use crate::geometry::projection::{lat_to_merc_y, lon_to_merc_x};
use crate::geometry::to_geographic;
use crate::model::{Area, Tile, Variables};
use crate::tiling::{PolygonTiler, TileGeometry, TilingOutput};
use geo::{coord, Coord, LineString, Polygon};
use serde_json::{json, Value};
use uuid::Uuid;

/// Fixture origin (south-west corner), in degrees
pub const ORIGIN_LAT: f64 = -6.53;
pub const ORIGIN_LON: f64 = 107.0;

/// Cell size used for the sample tiles
pub const SAMPLE_CELL_SIZE_M: u32 = 30;

fn origin() -> Coord<f64> {
    coord! { x: lon_to_merc_x(ORIGIN_LON), y: lat_to_merc_y(ORIGIN_LAT) }
}

fn planar_polygon(offsets: &[(f64, f64)]) -> Polygon<f64> {
    let o = origin();
    let ring: Vec<Coord<f64>> = offsets
        .iter()
        .map(|(dx, dy)| coord! { x: o.x + dx, y: o.y + dy })
        .collect();
    to_geographic(&Polygon::new(LineString::from(ring), vec![]))
}

/// Geographic polygon that projects to a `size_m` x `size_m` square
pub fn square_polygon(size_m: f64) -> Polygon<f64> {
    planar_polygon(&[
        (0.0, 0.0),
        (size_m, 0.0),
        (size_m, size_m),
        (0.0, size_m),
        (0.0, 0.0),
    ])
}

/// A `size_m` square with its north-east quadrant cut away
pub fn l_shaped_polygon(size_m: f64) -> Polygon<f64> {
    let half = size_m / 2.0;
    planar_polygon(&[
        (0.0, 0.0),
        (size_m, 0.0),
        (size_m, half),
        (half, half),
        (half, size_m),
        (0.0, size_m),
        (0.0, 0.0),
    ])
}

/// Polygon as a GeoJSON value
pub fn polygon_geojson(polygon: &Polygon<f64>) -> Value {
    serde_json::to_value(polygon_to_geometry(polygon)).unwrap_or(Value::Null)
}

pub fn square_geojson(size_m: f64) -> Value {
    polygon_geojson(&square_polygon(size_m))
}

fn sample_tiling() -> TilingOutput {
    PolygonTiler::new(f64::from(SAMPLE_CELL_SIZE_M))
        .and_then(|tiler| tiler.tile_polygon(&square_polygon(60.0)))
        .expect("sample square tiles cleanly")
}

/// The four tiles of a 60 m square cut at 30 m
pub fn sample_tile_geometries() -> Vec<TileGeometry> {
    sample_tiling().tiles
}

pub fn sample_area() -> Area {
    let mut area = Area::new(
        Some("Sample field".to_string()),
        square_geojson(60.0),
        sample_tiling().matrix,
        SAMPLE_CELL_SIZE_M,
    );
    area.processing_seconds = Some(1.5);
    area
}

/// Provider payload as a healthy provider would return it
pub fn provider_payload(kind: ProviderKind, seed: f64) -> Value {
    match kind {
        ProviderKind::Climate => json!({
            "status": "success",
            "data": [{"date": "2024-06-30", "temp_mean_c": 26.0 + seed, "precip_mm": 4.2}]
        }),
        ProviderKind::Soil => json!({
            "status": "success",
            "properties_at_0_5cm": {"ph": 5.8 + seed / 10.0, "sand_g_kg": 380, "clay_g_kg": 240}
        }),
        ProviderKind::Topography => json!({
            "status": "success",
            "data": {"elevation_meters": 410.0 + seed, "slope_degrees": 3.5}
        }),
        ProviderKind::Landcover => json!({
            "status": "success",
            "land_cover_class": "cropland",
            "vegetation_indices": {"ndvi": 0.5 + seed / 100.0, "ndwi": 0.1}
        }),
        ProviderKind::Seasonal => json!({
            "status": "success",
            "data": {"long_term_avg_precip_mm": 180.0 + seed}
        }),
        ProviderKind::Nighttime => json!({
            "status": "success",
            "radiance": 0.3
        }),
    }
}

/// Variables with every provider present
pub fn sample_variables(seed: f64) -> Variables {
    let mut vars = Variables::new();
    for kind in ProviderKind::ALL {
        vars.insert(kind.as_str(), provider_payload(kind, seed));
    }
    vars
}

/// Collected sample tiles owned by `area_id`
pub fn sample_tiles_for(area_id: Uuid) -> Vec<Tile> {
    sample_tile_geometries()
        .iter()
        .enumerate()
        .map(|(i, geometry)| Tile::collected(area_id, geometry, sample_variables(i as f64)))
        .collect()
}

pub fn sample_tiles() -> Vec<Tile> {
    sample_tiles_for(Uuid::new_v4())
}

/// Service reply recommending Rice on even tiles and Corn on odd ones
pub fn recommendation_payload(tiles: &[Tile]) -> Value {
    let entries: Vec<Value> = tiles
        .iter()
        .enumerate()
        .map(|(i, tile)| {
            let (first, second) = if i % 2 == 0 { ("Rice", "Corn") } else { ("Corn", "Rice") };
            json!({
                "tile_id": tile.key(),
                "recommendations": [
                    {"plant": first, "confidence": 0.8, "rationale": "Suited to local rainfall"},
                    {"plant": second, "confidence": 0.4, "rationale": "Secondary option"}
                ]
            })
        })
        .collect();
    json!({ "tiles": entries })
}
