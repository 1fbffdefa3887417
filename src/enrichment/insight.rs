use super::EnrichmentError;
use crate::bounds::{compute_bounds, Bounds};
use crate::model::Tile;
use crate::tiling::CentroidMatrix;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, warn};

pub const DEFAULT_INSIGHT_TITLE: &str = "Insight";
pub const DEFAULT_SOURCE_NAME: &str = "Credible source";

/// Optional framing for an insight request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_name: Option<String>,
    /// Categories the insights should focus on, e.g. the area's main crops
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub focus_categories: Vec<String>,
}

/// A sourced, location-specific news or weather item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub title: String,
    pub summary: String,
    pub source_name: String,
    pub source_url: String,
}

/// Result of an insight fetch; `items` is empty when the service failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HyperlocalInsights {
    pub generated_at: DateTime<Utc>,
    pub items: Vec<Insight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<InsightContext>,
}

/// External service producing hyperlocal insights for a bounding box.
///
/// Returns the raw reply, expected to carry an `items` array.
#[async_trait]
pub trait InsightService: Send + Sync {
    async fn fetch_insights(
        &self,
        bounds: &Bounds,
        context: Option<&InsightContext>,
    ) -> Result<Value, EnrichmentError>;
}

fn text_field(entry: &Value, key: &str) -> Option<String> {
    let text = match entry.get(key)? {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}

/// Keep only insight items that cite a source URL
pub fn sanitize_insights(reply: &Value) -> Result<Vec<Insight>, EnrichmentError> {
    let items = reply
        .get("items")
        .and_then(Value::as_array)
        .ok_or_else(|| EnrichmentError::InvalidResponse("reply has no 'items' list".to_string()))?;

    let sanitized: Vec<Insight> = items
        .iter()
        .filter(|entry| entry.is_object())
        .filter_map(|entry| {
            let source_url = text_field(entry, "source_url")?;
            Some(Insight {
                title: text_field(entry, "title")
                    .unwrap_or_else(|| DEFAULT_INSIGHT_TITLE.to_string()),
                summary: text_field(entry, "summary").unwrap_or_default(),
                source_name: text_field(entry, "source_name")
                    .unwrap_or_else(|| DEFAULT_SOURCE_NAME.to_string()),
                source_url,
            })
        })
        .collect();

    if sanitized.is_empty() {
        return Err(EnrichmentError::NoInsights);
    }
    Ok(sanitized)
}

/// Fetch insights for `bounds`. Never fails: a service or parse error is
/// logged and yields an empty item list.
pub async fn fetch_hyperlocal_insights(
    service: &dyn InsightService,
    bounds: &Bounds,
    context: Option<&InsightContext>,
) -> HyperlocalInsights {
    let generated_at = Utc::now();
    let items = match service.fetch_insights(bounds, context).await {
        Ok(reply) => sanitize_insights(&reply).unwrap_or_else(|e| {
            error!("Hyperlocal insight reply rejected: {}", e);
            Vec::new()
        }),
        Err(e) => {
            error!("Hyperlocal insight request failed: {}", e);
            Vec::new()
        }
    };

    HyperlocalInsights {
        generated_at,
        items,
        context: None,
    }
}

/// Derive bounds for an area and fetch its insights.
///
/// Returns `None` when no bounds can be derived from any source. The
/// context, when given, is echoed back in the payload.
pub async fn build_hyperlocal_payload(
    service: &dyn InsightService,
    geometry: Option<&Value>,
    matrix: Option<&CentroidMatrix>,
    tiles: &[Tile],
    context: Option<InsightContext>,
) -> Option<HyperlocalInsights> {
    let Some(bounds) = compute_bounds(geometry, matrix, tiles) else {
        warn!("Cannot derive area bounds for hyperlocal insights");
        return None;
    };
    let mut payload = fetch_hyperlocal_insights(service, &bounds, context.as_ref()).await;
    payload.context = context;
    Some(payload)
}
