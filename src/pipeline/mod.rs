//! End-to-end area processing
//!
//! `process` runs tiling, collection and enrichment for one submitted
//! polygon. Geometry and cell-size problems reject the request before any
//! state is stored. An enrichment failure does not: the area is stored as
//! failed with its collected tiles intact.

use crate::aggregation::{summarize, AreaSummary};
use crate::collector::{ProviderSet, VariableCollector};
use crate::config::PipelineConfig;
use crate::enrichment::{
    apply, build_hyperlocal_payload, clear_recommendations, EnrichmentRequest, HyperlocalInsights, InsightContext,
    InsightService, RecommendationService,
};
use crate::error::{AgroError, ErrorCode, Result};
use crate::geometry::parse_geojson;
use crate::model::{Area, AreaStatus, Tile};
use crate::storage::AreaStore;
use crate::tiling::PolygonTiler;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Number of top categories passed to the insight service as focus
const INSIGHT_FOCUS_CATEGORIES: usize = 3;

/// A polygon submitted for processing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaRequest {
    #[serde(default)]
    pub name: Option<String>,
    /// GeoJSON Polygon, MultiPolygon, Feature, FeatureCollection or
    /// GeometryCollection
    pub geometry: Value,
    #[serde(default)]
    pub cell_size_m: Option<u32>,
}

impl AreaRequest {
    pub fn new(geometry: Value) -> Self {
        Self {
            name: None,
            geometry,
            cell_size_m: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_cell_size(mut self, cell_size_m: u32) -> Self {
        self.cell_size_m = Some(cell_size_m);
        self
    }
}

/// An area with its tiles and freshly computed summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedArea {
    pub area: Area,
    pub tiles: Vec<Tile>,
    pub summary: AreaSummary,
}

pub struct AreaPipeline {
    config: PipelineConfig,
    store: Arc<dyn AreaStore>,
    collector: VariableCollector,
    recommender: Arc<dyn RecommendationService>,
    insights: Option<Arc<dyn InsightService>>,
}

impl AreaPipeline {
    pub fn new(
        config: PipelineConfig,
        store: Arc<dyn AreaStore>,
        collector: VariableCollector,
        recommender: Arc<dyn RecommendationService>,
    ) -> Self {
        Self {
            config,
            store,
            collector,
            recommender,
            insights: None,
        }
    }

    /// Pipeline whose collector takes its concurrency and timeout from
    /// `config`
    pub fn from_config(
        config: PipelineConfig,
        store: Arc<dyn AreaStore>,
        providers: ProviderSet,
        recommender: Arc<dyn RecommendationService>,
    ) -> Self {
        let collector = VariableCollector::new(providers, config.collector_options());
        Self::new(config, store, collector, recommender)
    }

    pub fn with_insight_service(mut self, service: Arc<dyn InsightService>) -> Self {
        self.insights = Some(service);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Requested cell size, or the configured default, checked against the
    /// configured range
    pub fn resolve_cell_size(&self, requested: Option<u32>) -> Result<u32> {
        let size = requested.unwrap_or(self.config.default_cell_size_m);
        let (min, max) = (self.config.min_cell_size_m, self.config.max_cell_size_m);
        if !(min..=max).contains(&size) {
            return Err(AgroError::validation_with_code(
                ErrorCode::VALIDATION_OUT_OF_RANGE,
                format!("cell size must be between {min} and {max} m, got {size}"),
                Some("cell_size_m".to_string()),
            ));
        }
        Ok(size)
    }

    /// Tile, collect and enrich one polygon
    pub async fn process(&self, request: AreaRequest) -> Result<ProcessedArea> {
        let cell_size = self.resolve_cell_size(request.cell_size_m)?;
        let geojson = parse_geojson(&request.geometry)?;
        let output = PolygonTiler::new(f64::from(cell_size))?.tile(&geojson)?;

        let started = Instant::now();
        let mut area = Area::new(request.name, request.geometry, output.matrix, cell_size);
        info!(
            "Area {} tiled into {} tiles ({} x {} at {} m)",
            area.id,
            output.tiles.len(),
            area.matrix.rows(),
            area.matrix.cols(),
            cell_size
        );
        self.store.save_area(&area).await?;

        let window = self.config.time_window();
        let mut tiles = self
            .collector
            .collect_for_tiles(area.id, &output.tiles, &window, self.config.max_workers)
            .await;
        area.transition(AreaStatus::Collected)?;
        self.store.replace_tiles(area.id, tiles.clone()).await?;
        self.store.save_area(&area).await?;

        self.run_enrichment(&mut area, &mut tiles).await?;

        area.processing_seconds = Some(started.elapsed().as_secs_f64());
        self.store.replace_tiles(area.id, tiles.clone()).await?;
        self.store.save_area(&area).await?;
        info!(
            "Area {} finished as {} in {:.2}s",
            area.id,
            area.status,
            area.processing_seconds.unwrap_or_default()
        );

        let summary = summarize(&area, &tiles);
        Ok(ProcessedArea {
            area,
            tiles,
            summary,
        })
    }

    /// Run enrichment again for a stored area
    pub async fn enrich(&self, area_id: Uuid) -> Result<ProcessedArea> {
        let mut area = self.load_area(area_id).await?;
        let mut tiles = self.store.load_tiles(area_id).await?;

        self.run_enrichment(&mut area, &mut tiles).await?;
        self.store.replace_tiles(area.id, tiles.clone()).await?;
        self.store.save_area(&area).await?;

        let summary = summarize(&area, &tiles);
        Ok(ProcessedArea {
            area,
            tiles,
            summary,
        })
    }

    /// Reload an area with its tiles and recompute the summary
    pub async fn detail(&self, area_id: Uuid) -> Result<ProcessedArea> {
        let area = self.load_area(area_id).await?;
        let tiles = self.store.load_tiles(area_id).await?;
        let summary = summarize(&area, &tiles);
        Ok(ProcessedArea {
            area,
            tiles,
            summary,
        })
    }

    /// Hyperlocal insights for a stored area. `None` when no insight service
    /// is configured or no bounds can be derived.
    pub async fn insights(&self, area_id: Uuid) -> Result<Option<HyperlocalInsights>> {
        let Some(service) = &self.insights else {
            return Ok(None);
        };
        let detail = self.detail(area_id).await?;
        let context = InsightContext {
            area_name: detail.area.name.clone(),
            focus_categories: detail.summary.top_categories(INSIGHT_FOCUS_CATEGORIES),
        };
        Ok(build_hyperlocal_payload(
            service.as_ref(),
            Some(&detail.area.geometry),
            Some(&detail.area.matrix),
            &detail.tiles,
            Some(context),
        )
        .await)
    }

    pub async fn delete(&self, area_id: Uuid) -> Result<bool> {
        Ok(self.store.delete_area(area_id).await?)
    }

    async fn load_area(&self, area_id: Uuid) -> Result<Area> {
        self.store.load_area(area_id).await?.ok_or_else(|| {
            AgroError::storage_with_code(
                ErrorCode::STORAGE_NOT_FOUND,
                format!("area {area_id} not found"),
            )
        })
    }

    async fn run_enrichment(&self, area: &mut Area, tiles: &mut [Tile]) -> Result<()> {
        area.transition(AreaStatus::Enriching)?;
        self.store.save_area(area).await?;

        let request = EnrichmentRequest::from_tiles(area.id, tiles);
        match self.recommender.recommend(&request).await {
            Ok(payload) => {
                let report = apply(tiles, &payload);
                if report.enriched == 0 && !tiles.is_empty() {
                    warn!("Area {} received no usable recommendations", area.id);
                }
                area.transition(AreaStatus::Enriched)?;
            }
            Err(e) => {
                error!("Enrichment of area {} failed: {}", area.id, e);
                clear_recommendations(tiles);
                area.mark_failed(e.to_string());
            }
        }
        Ok(())
    }
}
