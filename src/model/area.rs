use crate::error::{AgroError, ErrorCode};
use crate::tiling::CentroidMatrix;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// Metadata key holding the enrichment failure reason
pub const ENRICHMENT_ERROR_KEY: &str = "enrichment_error";

/// Lifecycle of an area through the pipeline phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AreaStatus {
    Collecting,
    Collected,
    Enriching,
    Enriched,
    Failed,
}

impl AreaStatus {
    /// Phases only move forward. Enrichment may be retried from a terminal
    /// state and a failed area may be collected again.
    pub fn can_transition_to(self, next: AreaStatus) -> bool {
        use AreaStatus::*;
        matches!(
            (self, next),
            (Collecting, Collected)
                | (Collecting, Failed)
                | (Collected, Enriching)
                | (Collected, Failed)
                | (Enriching, Enriched)
                | (Enriching, Failed)
                | (Enriched, Enriching)
                | (Failed, Enriching)
                | (Failed, Collecting)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, AreaStatus::Enriched | AreaStatus::Failed)
    }

    /// Human-readable label for reports
    pub fn label(self) -> &'static str {
        match self {
            AreaStatus::Collecting => "Collecting variables",
            AreaStatus::Collected => "Collected",
            AreaStatus::Enriching => "Enriching",
            AreaStatus::Enriched => "Completed",
            AreaStatus::Failed => "Failed",
        }
    }
}

impl fmt::Display for AreaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AreaStatus::Collecting => "collecting",
            AreaStatus::Collected => "collected",
            AreaStatus::Enriching => "enriching",
            AreaStatus::Enriched => "enriched",
            AreaStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A user-submitted polygon and its tiling result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub id: Uuid,
    #[serde(default)]
    pub name: Option<String>,
    /// GeoJSON exactly as submitted
    pub geometry: Value,
    pub matrix: CentroidMatrix,
    pub cell_size_m: u32,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    pub status: AreaStatus,
    #[serde(default)]
    pub processing_seconds: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Area {
    pub fn new(
        name: Option<String>,
        geometry: Value,
        matrix: CentroidMatrix,
        cell_size_m: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            geometry,
            matrix,
            cell_size_m,
            metadata: Map::new(),
            status: AreaStatus::Collecting,
            processing_seconds: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => format!("Area {}", self.id),
        }
    }

    /// Move to the next lifecycle phase. Reaching `Enriched` clears any
    /// earlier enrichment failure.
    pub fn transition(&mut self, next: AreaStatus) -> Result<(), AgroError> {
        if !self.status.can_transition_to(next) {
            return Err(AgroError::validation_with_code(
                ErrorCode::VALIDATION_GENERIC,
                format!("area cannot move from {} to {}", self.status, next),
                Some("status".to_string()),
            ));
        }
        if next == AreaStatus::Enriched {
            self.metadata.remove(ENRICHMENT_ERROR_KEY);
        }
        self.status = next;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Record an enrichment failure; collected data is left untouched
    pub fn mark_failed(&mut self, reason: impl Into<String>) {
        self.metadata
            .insert(ENRICHMENT_ERROR_KEY.to_string(), Value::String(reason.into()));
        self.status = AreaStatus::Failed;
        self.updated_at = Utc::now();
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.metadata.get(ENRICHMENT_ERROR_KEY).and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn area() -> Area {
        Area::new(None, json!({}), CentroidMatrix::default(), 15)
    }

    #[test]
    fn test_forward_transitions() {
        let mut area = area();
        area.transition(AreaStatus::Collected).unwrap();
        area.transition(AreaStatus::Enriching).unwrap();
        area.transition(AreaStatus::Enriched).unwrap();
        assert!(area.status.is_terminal());
        assert_eq!(area.status.label(), "Completed");
    }

    #[test]
    fn test_skipping_a_phase_is_rejected() {
        let mut area = area();
        let err = area.transition(AreaStatus::Enriched).unwrap_err();
        assert_eq!(err.code(), ErrorCode::VALIDATION_GENERIC);
        assert_eq!(area.status, AreaStatus::Collecting);
    }

    #[test]
    fn test_successful_retry_clears_failure_reason() {
        let mut area = area();
        area.transition(AreaStatus::Collected).unwrap();
        area.transition(AreaStatus::Enriching).unwrap();
        area.mark_failed("service unavailable");
        assert_eq!(area.failure_reason(), Some("service unavailable"));

        area.transition(AreaStatus::Enriching).unwrap();
        assert_eq!(area.failure_reason(), Some("service unavailable"));
        area.transition(AreaStatus::Enriched).unwrap();
        assert_eq!(area.failure_reason(), None);
        assert!(!area.metadata.contains_key(ENRICHMENT_ERROR_KEY));
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        let mut area = area();
        assert!(area.display_name().starts_with("Area "));
        area.name = Some("North field".to_string());
        assert_eq!(area.display_name(), "North field");
    }
}
