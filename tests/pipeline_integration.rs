//! End-to-end pipeline behavior against mock providers and services

mod common;

use agrotile::aggregation::EnvSignal;
use agrotile::collector::{Provider, ProviderKind, TimeWindow};
use agrotile::enrichment::apply;
use agrotile::model::{AreaStatus, Recommendation, TileStatus};
use agrotile::pipeline::AreaRequest;
use agrotile::storage::AreaStore;
use agrotile::testing::{
    recommendation_payload, sample_area, sample_tile_geometries, sample_tiles, square_geojson,
    standard_providers, FailAtProvider, FailingProvider, MockRecommendationService,
    StaticProvider,
};
use agrotile::aggregation::summarize;
use common::{collector, fast_options, pipeline_with};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

fn all_healthy_except(kind: ProviderKind, replacement: Arc<dyn Provider>) -> Vec<Arc<dyn Provider>> {
    ProviderKind::ALL
        .iter()
        .map(|k| {
            if *k == kind {
                Arc::clone(&replacement)
            } else {
                Arc::new(StaticProvider::healthy(*k)) as Arc<dyn Provider>
            }
        })
        .collect()
}

#[tokio::test]
async fn one_provider_failing_on_one_tile_degrades_only_that_entry() {
    let geometries: Vec<_> = sample_tile_geometries().into_iter().take(3).collect();
    let target = geometries[1].centroid;
    let collector = collector(all_healthy_except(
        ProviderKind::Soil,
        Arc::new(FailAtProvider::new(ProviderKind::Soil, target, "soil grid unavailable")),
    ));

    let window = TimeWindow::ending_today(7);
    let tiles = collector
        .collect_for_tiles(Uuid::new_v4(), &geometries, &window, 4)
        .await;

    assert_eq!(tiles.len(), 3);
    for tile in &tiles {
        assert_eq!(tile.variables.len(), ProviderKind::ALL.len());
        let failed: Vec<&str> = ProviderKind::ALL
            .iter()
            .map(|k| k.as_str())
            .filter(|k| tile.variables.provider_failed(k))
            .collect();
        if tile.centroid == target {
            assert_eq!(failed, vec!["soil"]);
            assert_eq!(
                tile.variables.get("soil").unwrap(),
                &json!({"status": "error", "message": "soil grid unavailable"})
            );
        } else {
            assert!(failed.is_empty());
        }
    }
}

#[tokio::test]
async fn every_provider_failing_still_yields_one_record_per_tile() {
    let providers: Vec<Arc<dyn Provider>> = ProviderKind::ALL
        .iter()
        .map(|k| Arc::new(FailingProvider::new(*k, "offline")) as Arc<dyn Provider>)
        .collect();
    let geometries = sample_tile_geometries();

    let tiles = collector(providers)
        .collect_for_tiles(Uuid::new_v4(), &geometries, &TimeWindow::ending_today(7), 2)
        .await;

    assert_eq!(tiles.len(), geometries.len());
    for tile in &tiles {
        assert_eq!(tile.status, TileStatus::Collected);
        assert!(ProviderKind::ALL
            .iter()
            .all(|k| tile.variables.provider_failed(k.as_str())));
    }
}

#[test]
fn three_tile_scenario_aggregates_rice_before_corn() {
    let mut tiles: Vec<_> = sample_tiles().into_iter().take(3).collect();
    let recs = [("Rice", 0.9), ("Rice", 0.7), ("Corn", 0.5)];
    for (tile, (category, confidence)) in tiles.iter_mut().zip(recs) {
        tile.recommendations = vec![Recommendation::new(category, Some(confidence))];
    }

    let summary = summarize(&sample_area(), &tiles);
    let dominant: Vec<(String, usize)> = summary
        .dominant_categories
        .iter()
        .map(|d| (d.category.clone(), d.tiles))
        .collect();
    assert_eq!(
        dominant,
        vec![("Rice".to_string(), 2), ("Corn".to_string(), 1)]
    );
    assert!((summary.dominant_categories[0].avg_confidence - 0.8).abs() < 1e-9);
    assert!((summary.dominant_categories[1].avg_confidence - 0.5).abs() < 1e-9);
}

#[test]
fn applying_the_same_payload_twice_is_a_no_op() {
    let mut tiles = sample_tiles();
    let payload = recommendation_payload(&tiles);

    let first = apply(&mut tiles, &payload);
    let snapshot = tiles.clone();
    let second = apply(&mut tiles, &payload);

    assert_eq!(first, second);
    assert_eq!(tiles, snapshot);
    assert!(tiles.iter().all(|t| t.status == TileStatus::Enriched));
}

#[tokio::test]
async fn full_run_produces_enriched_area_and_summary() {
    let recommender = Arc::new(MockRecommendationService::first_category("Rice"));
    let (pipeline, store) = pipeline_with(
        agrotile::collector::VariableCollector::new(standard_providers(), fast_options()),
        recommender.clone(),
    );

    let processed = pipeline
        .process(AreaRequest::new(square_geojson(90.0)).with_cell_size(30))
        .await
        .unwrap();

    assert_eq!(processed.area.status, AreaStatus::Enriched);
    assert_eq!(processed.area.matrix.rows(), 3);
    assert_eq!(processed.area.matrix.cols(), 3);
    assert_eq!(processed.tiles.len(), 9);
    assert!(processed
        .tiles
        .iter()
        .all(|t| t.status == TileStatus::Enriched));

    assert_eq!(recommender.calls(), 1);
    let request = recommender.last_request().unwrap();
    assert_eq!(request.area_id, processed.area.id);
    assert_eq!(request.tiles.len(), 9);

    assert_eq!(processed.summary.tile_count, 9);
    assert_eq!(processed.summary.dominant_categories[0].tiles, 9);
    assert!(processed.summary.env_summary.contains_key(&EnvSignal::Ndvi));
    assert!(processed
        .summary
        .env_summary
        .contains_key(&EnvSignal::MonthlyPrecipitation));

    let stored = store.load_tiles(processed.area.id).await.unwrap();
    assert_eq!(stored, processed.tiles);
}

#[tokio::test]
async fn enrichment_failure_marks_area_failed_and_keeps_variables() {
    let (pipeline, store) = pipeline_with(
        agrotile::collector::VariableCollector::new(standard_providers(), fast_options()),
        Arc::new(MockRecommendationService::failing("model quota exceeded")),
    );

    let processed = pipeline
        .process(AreaRequest::new(square_geojson(60.0)).with_cell_size(30))
        .await
        .unwrap();

    assert_eq!(processed.area.status, AreaStatus::Failed);
    assert!(processed
        .area
        .failure_reason()
        .unwrap()
        .contains("model quota exceeded"));
    assert!(processed.tiles.iter().all(|t| t.recommendations.is_empty()));
    assert!(processed
        .tiles
        .iter()
        .all(|t| t.status == TileStatus::Collected && !t.variables.is_empty()));

    let stored = store.load_area(processed.area.id).await.unwrap().unwrap();
    assert_eq!(stored.status, AreaStatus::Failed);
    assert_eq!(store.load_tiles(stored.id).await.unwrap().len(), 4);
}

#[tokio::test]
async fn malformed_recommendations_leave_tiles_collected() {
    let (pipeline, _store) = pipeline_with(
        agrotile::collector::VariableCollector::new(standard_providers(), fast_options()),
        Arc::new(MockRecommendationService::replying(json!({"result": "ok"}))),
    );

    let processed = pipeline
        .process(AreaRequest::new(square_geojson(60.0)).with_cell_size(30))
        .await
        .unwrap();

    assert_eq!(processed.area.status, AreaStatus::Enriched);
    assert!(processed
        .tiles
        .iter()
        .all(|t| t.status == TileStatus::Collected && t.recommendations.is_empty()));
    assert!(processed.summary.dominant_categories.is_empty());
}

#[tokio::test]
async fn retrying_enrichment_recovers_a_failed_area() {
    let store = Arc::new(agrotile::storage::MemoryStore::new());
    let failing = agrotile::pipeline::AreaPipeline::new(
        agrotile::config::PipelineConfig::default(),
        store.clone(),
        agrotile::collector::VariableCollector::new(standard_providers(), fast_options()),
        Arc::new(MockRecommendationService::failing("timeout")),
    );
    let processed = failing
        .process(AreaRequest::new(square_geojson(60.0)).with_cell_size(30))
        .await
        .unwrap();
    assert_eq!(processed.area.status, AreaStatus::Failed);

    let healthy = agrotile::pipeline::AreaPipeline::new(
        agrotile::config::PipelineConfig::default(),
        store.clone(),
        agrotile::collector::VariableCollector::new(standard_providers(), fast_options()),
        Arc::new(MockRecommendationService::first_category("Corn")),
    );
    let retried = healthy.enrich(processed.area.id).await.unwrap();
    assert_eq!(retried.area.status, AreaStatus::Enriched);
    assert_eq!(retried.summary.top_categories(1), vec!["Corn"]);
    assert_eq!(retried.area.failure_reason(), None);
    let stored = store.load_area(processed.area.id).await.unwrap().unwrap();
    assert_eq!(stored.failure_reason(), None);

    assert!(healthy.delete(processed.area.id).await.unwrap());
    assert!(store.load_tiles(processed.area.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn out_of_range_cell_size_is_rejected_before_any_state() {
    let (pipeline, store) = pipeline_with(
        agrotile::collector::VariableCollector::new(standard_providers(), fast_options()),
        Arc::new(MockRecommendationService::first_category("Rice")),
    );

    let err = pipeline
        .process(AreaRequest::new(square_geojson(60.0)).with_cell_size(150))
        .await
        .unwrap_err();
    assert!(err.is_input_rejection());

    let err = pipeline
        .process(AreaRequest::new(json!({})))
        .await
        .unwrap_err();
    assert!(err.is_input_rejection());
    assert!(store.list_areas().await.unwrap().is_empty());
}

#[tokio::test]
async fn insights_use_area_bounds_and_top_categories() {
    use agrotile::testing::MockInsightService;

    let service = Arc::new(MockInsightService::replying(json!({
        "items": [
            {"title": "Rain expected", "summary": "Heavy rain this week", "source_url": "https://example.org/rain"},
            {"title": "No source", "summary": "Dropped"}
        ]
    })));
    let (pipeline, _store) = pipeline_with(
        agrotile::collector::VariableCollector::new(standard_providers(), fast_options()),
        Arc::new(MockRecommendationService::first_category("Rice")),
    );
    let pipeline = pipeline.with_insight_service(service.clone());

    let processed = pipeline
        .process(
            AreaRequest::new(square_geojson(60.0))
                .with_name("River plot")
                .with_cell_size(30),
        )
        .await
        .unwrap();
    let insights = pipeline.insights(processed.area.id).await.unwrap().unwrap();

    assert_eq!(service.calls(), 1);
    assert_eq!(insights.items.len(), 1);
    assert_eq!(insights.items[0].source_name, "Credible source");
    let context = insights.context.unwrap();
    assert_eq!(context.area_name.as_deref(), Some("River plot"));
    assert_eq!(context.focus_categories, vec!["Rice"]);

    let bounds = service.last_bounds().unwrap();
    assert!(bounds.south < bounds.north);
    assert!(bounds.west < bounds.east);
    assert!((bounds.south - agrotile::testing::ORIGIN_LAT).abs() < 1e-9);
    assert!((bounds.west - agrotile::testing::ORIGIN_LON).abs() < 1e-9);
}
