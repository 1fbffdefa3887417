//! Mock providers and services

use super::fixtures::provider_payload;
use crate::bounds::Bounds;
use crate::collector::{Provider, ProviderError, ProviderKind, ProviderSet, TimeWindow};
use crate::enrichment::{
    EnrichmentError, EnrichmentRequest, InsightContext, InsightService, RecommendationService,
};
use crate::geometry::LatLon;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Every provider kind answering with a healthy fixture payload
pub fn standard_providers() -> ProviderSet {
    let providers: Vec<Arc<dyn Provider>> = ProviderKind::ALL
        .iter()
        .map(|kind| Arc::new(StaticProvider::healthy(*kind)) as Arc<dyn Provider>)
        .collect();
    ProviderSet::new(providers).expect("provider kinds are distinct")
}

/// Always returns the same payload
pub struct StaticProvider {
    kind: ProviderKind,
    payload: Value,
}

impl StaticProvider {
    pub fn new(kind: ProviderKind, payload: Value) -> Self {
        Self { kind, payload }
    }

    pub fn healthy(kind: ProviderKind) -> Self {
        Self::new(kind, provider_payload(kind, 0.0))
    }
}

#[async_trait]
impl Provider for StaticProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn fetch(&self, _location: LatLon, _window: &TimeWindow) -> Result<Value, ProviderError> {
        Ok(self.payload.clone())
    }
}

/// Always fails with the given message
pub struct FailingProvider {
    kind: ProviderKind,
    message: String,
}

impl FailingProvider {
    pub fn new(kind: ProviderKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[async_trait]
impl Provider for FailingProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn fetch(&self, _location: LatLon, _window: &TimeWindow) -> Result<Value, ProviderError> {
        Err(ProviderError::Failed(self.message.clone()))
    }
}

/// Answers after a delay
pub struct SlowProvider {
    kind: ProviderKind,
    delay: Duration,
}

impl SlowProvider {
    pub fn new(kind: ProviderKind, delay: Duration) -> Self {
        Self { kind, delay }
    }
}

#[async_trait]
impl Provider for SlowProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn fetch(&self, _location: LatLon, _window: &TimeWindow) -> Result<Value, ProviderError> {
        tokio::time::sleep(self.delay).await;
        Ok(provider_payload(self.kind, 0.0))
    }
}

/// Panics on every call
pub struct PanickingProvider {
    kind: ProviderKind,
}

impl PanickingProvider {
    pub fn new(kind: ProviderKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl Provider for PanickingProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn fetch(&self, _location: LatLon, _window: &TimeWindow) -> Result<Value, ProviderError> {
        panic!("{} provider crashed", self.kind)
    }
}

/// Healthy everywhere except at one location
pub struct FailAtProvider {
    kind: ProviderKind,
    location: LatLon,
    message: String,
}

impl FailAtProvider {
    pub fn new(kind: ProviderKind, location: LatLon, message: impl Into<String>) -> Self {
        Self {
            kind,
            location,
            message: message.into(),
        }
    }
}

#[async_trait]
impl Provider for FailAtProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn fetch(&self, location: LatLon, _window: &TimeWindow) -> Result<Value, ProviderError> {
        if location == self.location {
            return Err(ProviderError::Failed(self.message.clone()));
        }
        Ok(provider_payload(self.kind, 0.0))
    }
}

/// Records how many provider calls run at the same time
#[derive(Debug, Default)]
pub struct ConcurrencyTracker {
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl ConcurrencyTracker {
    pub fn provider(&self, kind: ProviderKind) -> TrackedProvider {
        TrackedProvider {
            kind,
            in_flight: Arc::clone(&self.in_flight),
            max_in_flight: Arc::clone(&self.max_in_flight),
        }
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

pub struct TrackedProvider {
    kind: ProviderKind,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

#[async_trait]
impl Provider for TrackedProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn fetch(&self, _location: LatLon, _window: &TimeWindow) -> Result<Value, ProviderError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(json!({"status": "success"}))
    }
}

enum RecommendationBehavior {
    FirstCategory(String),
    Reply(Value),
    Fail(String),
}

/// Recommendation service double that records its requests
pub struct MockRecommendationService {
    behavior: RecommendationBehavior,
    calls: AtomicUsize,
    last_request: Mutex<Option<EnrichmentRequest>>,
}

impl MockRecommendationService {
    fn with_behavior(behavior: RecommendationBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Recommend `category` with confidence 0.8 for every tile
    pub fn first_category(category: impl Into<String>) -> Self {
        Self::with_behavior(RecommendationBehavior::FirstCategory(category.into()))
    }

    /// Always return `payload`
    pub fn replying(payload: Value) -> Self {
        Self::with_behavior(RecommendationBehavior::Reply(payload))
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_behavior(RecommendationBehavior::Fail(message.into()))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<EnrichmentRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecommendationService for MockRecommendationService {
    async fn recommend(&self, request: &EnrichmentRequest) -> Result<Value, EnrichmentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());

        match &self.behavior {
            RecommendationBehavior::FirstCategory(category) => {
                let tiles: Vec<Value> = request
                    .tiles
                    .iter()
                    .map(|tile| {
                        json!({
                            "tile_id": tile.tile_id,
                            "recommendations": [{"category": category, "confidence": 0.8}]
                        })
                    })
                    .collect();
                Ok(json!({ "tiles": tiles }))
            }
            RecommendationBehavior::Reply(payload) => Ok(payload.clone()),
            RecommendationBehavior::Fail(message) => Err(EnrichmentError::Service(message.clone())),
        }
    }
}

/// Insight service double
pub struct MockInsightService {
    reply: Result<Value, EnrichmentError>,
    calls: AtomicUsize,
    last_bounds: Mutex<Option<Bounds>>,
}

impl MockInsightService {
    pub fn replying(reply: Value) -> Self {
        Self {
            reply: Ok(reply),
            calls: AtomicUsize::new(0),
            last_bounds: Mutex::new(None),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            reply: Err(EnrichmentError::Service(message.into())),
            calls: AtomicUsize::new(0),
            last_bounds: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_bounds(&self) -> Option<Bounds> {
        *self.last_bounds.lock().unwrap()
    }
}

#[async_trait]
impl InsightService for MockInsightService {
    async fn fetch_insights(
        &self,
        bounds: &Bounds,
        _context: Option<&InsightContext>,
    ) -> Result<Value, EnrichmentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_bounds.lock().unwrap() = Some(*bounds);
        self.reply.clone()
    }
}
