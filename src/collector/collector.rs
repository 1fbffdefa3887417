use super::provider::{ProviderError, ProviderSet};
use super::window::TimeWindow;
use crate::geometry::LatLon;
use crate::model::{error_record, Tile, Variables};
use crate::tiling::TileGeometry;
use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Concurrency and timeout settings for provider calls
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollectorOptions {
    /// Provider calls in flight per tile
    pub concurrency: usize,
    /// Upper bound on a single provider call
    pub timeout: Duration,
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Queries every provider for a location and isolates their failures
#[derive(Debug, Clone)]
pub struct VariableCollector {
    providers: ProviderSet,
    options: CollectorOptions,
}

impl VariableCollector {
    pub fn new(providers: ProviderSet, options: CollectorOptions) -> Self {
        Self { providers, options }
    }

    pub fn providers(&self) -> &ProviderSet {
        &self.providers
    }

    pub fn options(&self) -> CollectorOptions {
        self.options
    }

    /// Call every provider for one location.
    ///
    /// The result holds exactly one entry per provider: its payload, or an
    /// error record when the call failed, timed out, panicked or returned
    /// something other than a JSON object.
    pub async fn collect(&self, location: LatLon, window: &TimeWindow) -> Variables {
        let limit = self.options.concurrency.clamp(1, self.providers.len().max(1));
        let semaphore = Arc::new(Semaphore::new(limit));
        let timeout = self.options.timeout;

        let calls = self.providers.iter().map(|provider| {
            let provider = Arc::clone(provider);
            let semaphore = Arc::clone(&semaphore);
            let window = *window;
            let kind = provider.kind();

            // Spawned so a panicking provider surfaces as a JoinError
            let handle = tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| ProviderError::Aborted(e.to_string()))?;
                match tokio::time::timeout(timeout, provider.fetch(location, &window)).await {
                    Ok(result) => result,
                    Err(_) => Err(ProviderError::Timeout(timeout)),
                }
            });

            async move {
                let outcome = match handle.await {
                    Ok(result) => result.and_then(require_object),
                    Err(join_err) => Err(ProviderError::Aborted(join_err.to_string())),
                };
                (kind, outcome)
            }
        });

        let mut variables = Variables::new();
        for (kind, outcome) in join_all(calls).await {
            let payload = match outcome {
                Ok(payload) => payload,
                Err(err) => {
                    warn!(
                        "Provider {} failed at ({:.5}, {:.5}): {}",
                        kind, location.lat, location.lon, err
                    );
                    error_record(err.to_string())
                }
            };
            variables.insert(kind.as_str(), payload);
        }
        variables
    }

    /// Collect variables for every tile with a usable centroid.
    ///
    /// Runs at most `max_workers` tiles at a time. Tiles with a non-finite
    /// centroid are skipped. The returned tiles are ordered by (row, col)
    /// whatever order the workers finish in.
    pub async fn collect_for_tiles(
        &self,
        area_id: Uuid,
        tiles: &[TileGeometry],
        window: &TimeWindow,
        max_workers: usize,
    ) -> Vec<Tile> {
        let eligible: Vec<&TileGeometry> =
            tiles.iter().filter(|t| t.centroid.is_finite()).collect();
        let skipped = tiles.len() - eligible.len();
        if skipped > 0 {
            debug!("Skipping {} tiles without a usable centroid", skipped);
        }
        if eligible.is_empty() {
            info!("No tiles to collect for area {}", area_id);
            return Vec::new();
        }

        let workers = max_workers.clamp(1, eligible.len());
        info!(
            "Collecting variables for {} tiles of area {} with {} workers ({})",
            eligible.len(),
            area_id,
            workers,
            window
        );

        let semaphore = Arc::new(Semaphore::new(workers));
        let handles: Vec<_> = eligible
            .iter()
            .map(|geometry| {
                let collector = self.clone();
                let semaphore = Arc::clone(&semaphore);
                let window = *window;
                let location = geometry.centroid;
                let key = geometry.key();

                tokio::spawn(async move {
                    let _permit = match semaphore.acquire_owned().await {
                        Ok(permit) => permit,
                        Err(e) => return Variables::failed(e.to_string()),
                    };
                    let started = Instant::now();
                    let variables = collector.collect(location, &window).await;
                    debug!("Tile {} collected in {:?}", key, started.elapsed());
                    variables
                })
            })
            .collect();

        let results = join_all(handles).await;

        let mut collected: Vec<Tile> = eligible
            .into_iter()
            .zip(results)
            .map(|(geometry, result)| {
                let variables = result.unwrap_or_else(|join_err| {
                    error!("Collection task for tile {} failed: {}", geometry.key(), join_err);
                    Variables::failed(join_err.to_string())
                });
                Tile::collected(area_id, geometry, variables)
            })
            .collect();
        collected.sort_by_key(|tile| (tile.row, tile.col));

        info!("Collected variables for {} tiles", collected.len());
        collected
    }
}

fn require_object(payload: Value) -> Result<Value, ProviderError> {
    match payload {
        Value::Object(_) => Ok(payload),
        other => Err(ProviderError::Malformed(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{Provider, ProviderKind};
    use crate::model::{is_error_record, TileStatus};
    use crate::testing::fixtures::sample_tile_geometries;
    use crate::testing::mocks::{
        standard_providers, ConcurrencyTracker, FailingProvider, PanickingProvider, SlowProvider,
        StaticProvider,
    };
    use chrono::NaiveDate;
    use serde_json::json;

    fn window() -> TimeWindow {
        TimeWindow::trailing(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(), 7)
    }

    fn collector_with(providers: Vec<Arc<dyn Provider>>) -> VariableCollector {
        VariableCollector::new(
            ProviderSet::new(providers).unwrap(),
            CollectorOptions {
                concurrency: 4,
                timeout: Duration::from_millis(200),
            },
        )
    }

    #[tokio::test]
    async fn test_collect_returns_one_entry_per_provider() {
        let collector = VariableCollector::new(standard_providers(), CollectorOptions::default());
        let vars = collector.collect(LatLon::new(-6.5, 107.0), &window()).await;

        assert_eq!(vars.len(), ProviderKind::ALL.len());
        for kind in ProviderKind::ALL {
            assert!(vars.get(kind.as_str()).is_some(), "missing {kind}");
            assert!(!vars.provider_failed(kind.as_str()));
        }
    }

    #[tokio::test]
    async fn test_failures_become_error_records() {
        let collector = collector_with(vec![
            Arc::new(StaticProvider::new(ProviderKind::Soil, json!({"status": "success", "ph": 6.1}))),
            Arc::new(FailingProvider::new(ProviderKind::Climate, "upstream returned 503")),
            Arc::new(SlowProvider::new(ProviderKind::Seasonal, Duration::from_secs(5))),
            Arc::new(PanickingProvider::new(ProviderKind::Topography)),
            Arc::new(StaticProvider::new(ProviderKind::Nighttime, json!([1, 2, 3]))),
        ]);

        let vars = collector.collect(LatLon::new(0.0, 0.0), &window()).await;

        assert_eq!(vars.len(), 5);
        assert_eq!(vars.soil_ph(), Some(6.1));
        for failed in ["climate", "seasonal", "topography", "nighttime"] {
            assert!(vars.provider_failed(failed), "{failed} should be an error record");
        }
        assert_eq!(
            vars.get("climate").unwrap()["message"],
            json!("upstream returned 503")
        );
        assert!(vars.get("seasonal").unwrap()["message"]
            .as_str()
            .unwrap()
            .starts_with("timed out"));
    }

    #[tokio::test]
    async fn test_non_finite_numbers_serialize_as_null() {
        let collector = collector_with(vec![Arc::new(StaticProvider::new(
            ProviderKind::Landcover,
            json!({"vegetation_indices": {"ndvi": f64::NAN}}),
        ))]);
        let vars = collector.collect(LatLon::new(0.0, 0.0), &window()).await;
        assert_eq!(vars.get("landcover").unwrap()["vegetation_indices"]["ndvi"], Value::Null);
        assert_eq!(vars.ndvi(), None);
    }

    #[tokio::test]
    async fn test_provider_concurrency_is_bounded() {
        let tracker = Arc::new(ConcurrencyTracker::default());
        let providers: Vec<Arc<dyn Provider>> = ProviderKind::ALL
            .iter()
            .map(|kind| Arc::new(tracker.provider(*kind)) as Arc<dyn Provider>)
            .collect();
        let collector = VariableCollector::new(
            ProviderSet::new(providers).unwrap(),
            CollectorOptions {
                concurrency: 2,
                timeout: Duration::from_secs(5),
            },
        );

        collector.collect(LatLon::new(0.0, 0.0), &window()).await;
        assert!(tracker.max_in_flight() <= 2);
        assert!(tracker.max_in_flight() >= 1);
    }

    #[tokio::test]
    async fn test_collect_for_tiles_keeps_every_tile_and_orders_them() {
        let collector = collector_with(vec![
            Arc::new(SlowProvider::new(ProviderKind::Climate, Duration::from_millis(5))),
            Arc::new(FailingProvider::new(ProviderKind::Soil, "boom")),
        ]);
        let mut geometries = sample_tile_geometries();
        geometries.reverse();
        let area_id = Uuid::new_v4();

        let tiles = collector
            .collect_for_tiles(area_id, &geometries, &window(), 8)
            .await;

        assert_eq!(tiles.len(), geometries.len());
        let keys: Vec<(u32, u32)> = tiles.iter().map(|t| (t.row, t.col)).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        for tile in &tiles {
            assert_eq!(tile.area_id, area_id);
            assert_eq!(tile.status, TileStatus::Collected);
            assert_eq!(tile.variables.len(), 2);
            assert!(is_error_record(tile.variables.get("soil").unwrap()));
        }
    }

    #[tokio::test]
    async fn test_tiles_without_centroid_are_skipped() {
        let collector = collector_with(vec![Arc::new(StaticProvider::new(
            ProviderKind::Soil,
            json!({"status": "success"}),
        ))]);
        let mut geometries = sample_tile_geometries();
        geometries[0].centroid = LatLon::new(f64::NAN, 107.0);

        let tiles = collector
            .collect_for_tiles(Uuid::new_v4(), &geometries, &window(), 2)
            .await;
        assert_eq!(tiles.len(), geometries.len() - 1);
        assert!(tiles
            .iter()
            .all(|t| (t.row, t.col) != (geometries[0].row, geometries[0].col)));
    }

    #[tokio::test]
    async fn test_empty_tile_list() {
        let collector = VariableCollector::new(standard_providers(), CollectorOptions::default());
        let tiles = collector
            .collect_for_tiles(Uuid::new_v4(), &[], &window(), 4)
            .await;
        assert!(tiles.is_empty());
    }
}
