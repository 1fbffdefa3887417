use crate::model::{Area, Tile};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Environmental signals averaged across an area
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvSignal {
    Ndvi,
    Ndwi,
    MonthlyPrecipitation,
}

impl EnvSignal {
    pub const ALL: [EnvSignal; 3] = [
        EnvSignal::Ndvi,
        EnvSignal::Ndwi,
        EnvSignal::MonthlyPrecipitation,
    ];

    pub fn label(self) -> &'static str {
        match self {
            EnvSignal::Ndvi => "Average NDVI",
            EnvSignal::Ndwi => "Average NDWI",
            EnvSignal::MonthlyPrecipitation => "Monthly precipitation",
        }
    }

    fn read(self, tile: &Tile) -> Option<f64> {
        match self {
            EnvSignal::Ndvi => tile.variables.ndvi(),
            EnvSignal::Ndwi => tile.variables.ndwi(),
            EnvSignal::MonthlyPrecipitation => tile.variables.long_term_precip_mm(),
        }
    }

    fn format(self, mean: f64) -> String {
        match self {
            EnvSignal::Ndvi | EnvSignal::Ndwi => format!("{mean:.3}"),
            EnvSignal::MonthlyPrecipitation => format!("{mean:.1} mm"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DominantCategory {
    pub category: String,
    /// Tiles where this category is ranked first
    pub tiles: usize,
    /// Mean confidence over every recommendation of this category at any rank
    pub avg_confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaSummary {
    pub tile_count: usize,
    pub dominant_categories: Vec<DominantCategory>,
    pub env_summary: BTreeMap<EnvSignal, String>,
    pub processing_seconds: f64,
}

impl AreaSummary {
    /// The `n` most common top-ranked categories
    pub fn top_categories(&self, n: usize) -> Vec<String> {
        self.dominant_categories
            .iter()
            .take(n)
            .map(|d| d.category.clone())
            .collect()
    }
}

/// Reduce an area's tiles to summary statistics.
///
/// Categories are ordered by how many tiles rank them first; ties keep the
/// order in which the categories were first seen while scanning `tiles`.
/// A signal with no numeric value on any tile is left out of `env_summary`.
pub fn summarize(area: &Area, tiles: &[Tile]) -> AreaSummary {
    summarize_tiles(tiles, area.processing_seconds)
}

/// Same as [`summarize`] for tiles detached from their area record
pub fn summarize_tiles(tiles: &[Tile], processing_seconds: Option<f64>) -> AreaSummary {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for tile in tiles {
        if let Some(top) = tile.top_recommendation() {
            match counts.iter_mut().find(|(category, _)| *category == top.category) {
                Some((_, count)) => *count += 1,
                None => counts.push((top.category.as_str(), 1)),
            }
        }
    }
    // Stable sort keeps first-seen order among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let dominant_categories = counts
        .into_iter()
        .map(|(category, count)| DominantCategory {
            category: category.to_string(),
            tiles: count,
            avg_confidence: average_confidence(tiles, category),
        })
        .collect();

    let env_summary = EnvSignal::ALL
        .iter()
        .filter_map(|signal| {
            let values: Vec<f64> = tiles.iter().filter_map(|t| signal.read(t)).collect();
            mean(&values).map(|m| (*signal, signal.format(m)))
        })
        .collect();

    AreaSummary {
        tile_count: tiles.len(),
        dominant_categories,
        env_summary,
        processing_seconds: processing_seconds.unwrap_or(0.0),
    }
}

fn average_confidence(tiles: &[Tile], category: &str) -> f64 {
    let values: Vec<f64> = tiles
        .iter()
        .flat_map(|t| &t.recommendations)
        .filter(|r| r.category == category)
        .filter_map(|r| r.confidence)
        .collect();
    mean(&values).unwrap_or(0.0)
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}
