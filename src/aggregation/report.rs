use crate::model::Tile;
use serde::{Deserialize, Serialize};

/// Placeholder for a missing or non-finite value
pub const MISSING: &str = "—";

/// At most this many recommendations are listed per tile
pub const MAX_REPORTED_RECOMMENDATIONS: usize = 5;

/// Format a number with fixed precision and a unit suffix
pub fn format_metric(value: Option<f64>, digits: usize, suffix: &str) -> String {
    match value.filter(|v| v.is_finite()) {
        Some(v) => format!("{v:.digits$}{suffix}"),
        None => MISSING.to_string(),
    }
}

/// `"Sand N g/kg · Clay N g/kg"`, omitting whichever part is missing
pub fn format_texture(sand: Option<f64>, clay: Option<f64>) -> String {
    let parts: Vec<String> = [("Sand", sand), ("Clay", clay)]
        .into_iter()
        .filter_map(|(label, value)| {
            value
                .filter(|v| v.is_finite())
                .map(|v| format!("{label} {v:.0} g/kg"))
        })
        .collect();
    if parts.is_empty() {
        MISSING.to_string()
    } else {
        parts.join(" · ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRow {
    /// 1-based rank
    pub rank: usize,
    pub category: String,
    /// Confidence as a percentage
    pub confidence_pct: Option<f64>,
    pub rationale: Option<String>,
}

/// Display row for one tile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileReport {
    /// `"row,col"`
    pub index: String,
    pub lat: String,
    pub lon: String,
    pub precip: String,
    pub temperature: String,
    pub ph: String,
    pub texture: String,
    pub elevation: String,
    pub ndvi: String,
    pub ndwi: String,
    pub recommendations: Vec<RecommendationRow>,
}

impl TileReport {
    pub fn from_tile(tile: &Tile) -> Self {
        let vars = &tile.variables;
        let recommendations = tile
            .recommendations
            .iter()
            .take(MAX_REPORTED_RECOMMENDATIONS)
            .enumerate()
            .map(|(idx, rec)| RecommendationRow {
                rank: idx + 1,
                category: rec.category.clone(),
                confidence_pct: rec.confidence.map(|c| c * 100.0),
                rationale: rec.rationale.clone(),
            })
            .collect();

        Self {
            index: format!("{},{}", tile.row, tile.col),
            lat: format_metric(Some(tile.centroid.lat), 5, ""),
            lon: format_metric(Some(tile.centroid.lon), 5, ""),
            precip: format_metric(vars.long_term_precip_mm(), 1, " mm"),
            temperature: format_metric(vars.temperature_c(), 1, " °C"),
            ph: format_metric(vars.soil_ph(), 2, ""),
            texture: format_texture(vars.sand_g_kg(), vars.clay_g_kg()),
            elevation: format_metric(vars.elevation_m(), 0, " m"),
            ndvi: format_metric(vars.ndvi(), 3, ""),
            ndwi: format_metric(vars.ndwi(), 3, ""),
            recommendations,
        }
    }
}
