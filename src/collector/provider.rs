use super::window::TimeWindow;
use super::CollectorError;
use crate::geometry::LatLon;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// The closed set of environmental data sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Climate,
    Soil,
    Topography,
    Landcover,
    Seasonal,
    Nighttime,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 6] = [
        ProviderKind::Climate,
        ProviderKind::Soil,
        ProviderKind::Topography,
        ProviderKind::Landcover,
        ProviderKind::Seasonal,
        ProviderKind::Nighttime,
    ];

    /// Key used in a tile's variables map
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Climate => "climate",
            ProviderKind::Soil => "soil",
            ProviderKind::Topography => "topography",
            ProviderKind::Landcover => "landcover",
            ProviderKind::Seasonal => "seasonal",
            ProviderKind::Nighttime => "nighttime",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single provider call. Never escapes the collector; it is
/// rendered into the provider's error record instead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProviderError {
    #[error("{0}")]
    Failed(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("provider task aborted: {0}")]
    Aborted(String),
}

/// One environmental data source queried at a point location
#[async_trait]
pub trait Provider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Fetch this provider's payload for `location` over `window`.
    ///
    /// Implementations must be safe to call concurrently.
    async fn fetch(&self, location: LatLon, window: &TimeWindow) -> Result<Value, ProviderError>;
}

/// An ordered set of providers with distinct kinds
#[derive(Clone)]
pub struct ProviderSet {
    providers: Vec<Arc<dyn Provider>>,
}

impl ProviderSet {
    pub fn new(providers: Vec<Arc<dyn Provider>>) -> Result<Self, CollectorError> {
        if providers.is_empty() {
            return Err(CollectorError::NoProviders);
        }
        let mut seen = HashSet::new();
        for provider in &providers {
            if !seen.insert(provider.kind()) {
                return Err(CollectorError::DuplicateProvider(provider.kind()));
            }
        }
        Ok(Self { providers })
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn kinds(&self) -> Vec<ProviderKind> {
        self.providers.iter().map(|p| p.kind()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Provider>> {
        self.providers.iter()
    }
}

impl fmt::Debug for ProviderSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSet")
            .field("kinds", &self.kinds())
            .finish()
    }
}
