//! Concurrent variable collection
//!
//! Two nested fan-outs: tiles are processed by a bounded worker pool, and
//! each tile queries its providers through a second, per-tile bound. A
//! provider failure never fails the tile; it is stored in-band as
//! `{"status": "error", "message": ...}` under the provider's name.

pub mod collector;
pub mod provider;
pub mod window;

pub use collector::{CollectorOptions, VariableCollector};
pub use provider::{Provider, ProviderError, ProviderKind, ProviderSet};
pub use window::TimeWindow;

use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised while assembling a collector
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CollectorError {
    #[error("at least one provider is required")]
    NoProviders,

    #[error("provider {0} registered more than once")]
    DuplicateProvider(ProviderKind),

    #[error("time window starts after it ends ({start} > {end})")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },
}
