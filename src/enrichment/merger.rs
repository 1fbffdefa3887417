use crate::model::{tile_key, Recommendation, Tile, TileStatus};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Outcome of merging one payload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Tiles that received at least one recommendation
    pub enriched: usize,
    /// Tiles the payload had nothing for
    pub unmatched: usize,
    /// Payload entries that named no known tile
    pub orphaned: usize,
}

/// Group a service reply by tile key.
///
/// Expects `{"tiles": [{"tile_id": "row-col", "recommendations": [...]}]}`.
/// A reply without a `tiles` array yields an empty map. Entries without a
/// key and recommendations without a category are dropped. When a key
/// repeats, the last entry wins.
pub fn parse_recommendations(payload: &Value) -> HashMap<String, Vec<Recommendation>> {
    let Some(entries) = payload.get("tiles").and_then(Value::as_array) else {
        warn!("Recommendation payload has no 'tiles' list; treating as empty");
        return HashMap::new();
    };

    let mut grouped = HashMap::with_capacity(entries.len());
    for entry in entries {
        let Some(key) = entry_key(entry) else {
            debug!("Skipping recommendation entry without a tile id");
            continue;
        };
        let recommendations = entry
            .get("recommendations")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| match Recommendation::deserialize_lenient(item) {
                        Some(rec) => Some(rec),
                        None => {
                            debug!("Dropping malformed recommendation for tile {}", key);
                            None
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();
        grouped.insert(key, recommendations);
    }
    grouped
}

fn entry_key(entry: &Value) -> Option<String> {
    if let Some(id) = entry.get("tile_id").and_then(Value::as_str) {
        return Some(id.trim().to_string());
    }
    let row = entry.get("row").and_then(Value::as_u64)?;
    let col = entry.get("col").and_then(Value::as_u64)?;
    Some(tile_key(u32::try_from(row).ok()?, u32::try_from(col).ok()?))
}

/// Attach a service reply to tiles.
///
/// A tile found in the reply with a non-empty list gets that list and
/// becomes `Enriched`. Any other tile gets an empty list; an `Enriched` tile
/// falls back to `Collected` and other statuses are left alone. Applying the
/// same payload twice leaves the tiles as they were after the first call.
pub fn apply(tiles: &mut [Tile], payload: &Value) -> MergeReport {
    let mut grouped = parse_recommendations(payload);
    let mut report = MergeReport::default();

    for tile in tiles.iter_mut() {
        match grouped.remove(&tile.key()) {
            Some(recommendations) if !recommendations.is_empty() => {
                tile.recommendations = recommendations;
                tile.status = TileStatus::Enriched;
                report.enriched += 1;
            }
            _ => {
                reset_recommendations(tile);
                report.unmatched += 1;
            }
        }
    }
    report.orphaned = grouped.len();

    info!(
        "Merged recommendations: {} enriched, {} without recommendations, {} orphaned entries",
        report.enriched, report.unmatched, report.orphaned
    );
    report
}

/// Drop every tile's recommendations, keeping collected variables.
/// `Enriched` tiles fall back to `Collected`.
pub fn clear_recommendations(tiles: &mut [Tile]) {
    tiles.iter_mut().for_each(reset_recommendations);
}

fn reset_recommendations(tile: &mut Tile) {
    tile.recommendations.clear();
    if tile.status == TileStatus::Enriched {
        tile.status = TileStatus::Collected;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::{recommendation_payload, sample_tiles};
    use serde_json::json;

    #[test]
    fn test_apply_attaches_by_key() {
        let mut tiles = sample_tiles();
        let first_key = tiles[0].key();
        let payload = json!({
            "tiles": [{
                "tile_id": first_key,
                "recommendations": [
                    {"plant": "Rice", "confidence": 0.9, "rationale": "Wet soils"},
                    {"category": "Corn", "confidence": 0.4}
                ]
            }]
        });

        let report = apply(&mut tiles, &payload);
        assert_eq!(report.enriched, 1);
        assert_eq!(report.unmatched, tiles.len() - 1);
        assert_eq!(tiles[0].status, TileStatus::Enriched);
        assert_eq!(tiles[0].recommendations.len(), 2);
        assert_eq!(tiles[0].recommendations[0].category, "Rice");
        assert!(tiles[1..].iter().all(|t| t.recommendations.is_empty()));
        assert!(tiles[1..].iter().all(|t| t.status == TileStatus::Collected));
    }

    #[test]
    fn test_clear_recommendations_keeps_variables() {
        let mut tiles = sample_tiles();
        let payload = recommendation_payload(&tiles);
        apply(&mut tiles, &payload);
        let variables: Vec<_> = tiles.iter().map(|t| t.variables.clone()).collect();

        clear_recommendations(&mut tiles);
        assert!(tiles.iter().all(|t| t.recommendations.is_empty()));
        assert!(tiles.iter().all(|t| t.status == TileStatus::Collected));
        let after: Vec<_> = tiles.iter().map(|t| t.variables.clone()).collect();
        assert_eq!(after, variables);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let mut tiles = sample_tiles();
        let payload = recommendation_payload(&tiles);
        apply(&mut tiles, &payload);
        let after_first = tiles.clone();
        apply(&mut tiles, &payload);
        assert_eq!(tiles, after_first);
    }

    #[test]
    fn test_malformed_payload_means_no_recommendations() {
        let mut tiles = sample_tiles();
        let payload = recommendation_payload(&tiles);
        apply(&mut tiles, &payload);

        for bad in [json!({"items": []}), json!("oops"), json!({"tiles": {"0-0": []}})] {
            let report = apply(&mut tiles, &bad);
            assert_eq!(report.enriched, 0);
            assert!(tiles.iter().all(|t| t.recommendations.is_empty()));
            assert!(tiles.iter().all(|t| t.status == TileStatus::Collected));
        }
    }

    #[test]
    fn test_entries_fall_back_to_row_col() {
        let payload = json!({
            "tiles": [
                {"row": 2, "col": 1, "recommendations": [{"category": "Cassava"}]},
                {"recommendations": [{"category": "Lost"}]},
                {"tile_id": "0-0", "recommendations": [{"confidence": 0.3}, {"plant": "Taro"}]}
            ]
        });
        let grouped = parse_recommendations(&payload);
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped["2-1"][0].category, "Cassava");
        assert_eq!(grouped["0-0"].len(), 1);
        assert_eq!(grouped["0-0"][0].category, "Taro");
    }

    #[test]
    fn test_orphaned_entries_are_counted() {
        let mut tiles = sample_tiles();
        let payload = json!({
            "tiles": [{"tile_id": "99-99", "recommendations": [{"category": "Rice"}]}]
        });
        let report = apply(&mut tiles, &payload);
        assert_eq!(report.orphaned, 1);
        assert_eq!(report.enriched, 0);
    }
}
