//! Recommendation enrichment
//!
//! The recommendation service is an external collaborator: it receives the
//! collected tiles and answers with per-tile recommendations grouped by
//! `"row-col"` keys. This module owns the request shape, reply parsing and
//! the merge of a reply back onto tiles, plus the hyperlocal insight call.

pub mod insight;
pub mod merger;
pub mod request;
pub mod service;

pub use insight::{
    build_hyperlocal_payload, fetch_hyperlocal_insights, sanitize_insights, HyperlocalInsights,
    Insight, InsightContext, InsightService,
};
pub use merger::{apply, clear_recommendations, parse_recommendations, MergeReport};
pub use request::{EnrichmentRequest, TileInput};
pub use service::{parse_model_reply, strip_markdown_fence, RecommendationService};

use crate::error::ErrorCode;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum EnrichmentError {
    #[error("enrichment service failed: {0}")]
    Service(String),

    #[error("invalid service response: {0}")]
    InvalidResponse(String),

    #[error("no insight with a valid source was returned")]
    NoInsights,
}

impl EnrichmentError {
    pub fn code(&self) -> u16 {
        match self {
            Self::Service(_) => ErrorCode::ENRICHMENT_SERVICE_FAILED,
            Self::InvalidResponse(_) => ErrorCode::ENRICHMENT_INVALID_RESPONSE,
            Self::NoInsights => ErrorCode::ENRICHMENT_NO_INSIGHTS,
        }
    }
}
