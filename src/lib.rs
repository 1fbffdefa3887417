//! # agrotile
//!
//! Area processing pipeline: cut a polygon into a fixed-size grid, collect
//! environmental variables for every cell from several providers at once,
//! merge externally produced recommendations and reduce the result into
//! area-level statistics.
//!
//! ## Usage
//!
//! ```bash
//! agrotile tile field.geojson --cell-size 30
//! agrotile summarize tiles.json
//! ```
//!
//! ## Modules
//!
//! - `geometry` - Projection, polygon repair and GeoJSON normalization
//! - `tiling` - Polygon to row/column grid tiling
//! - `bounds` - Bounding envelopes for context enrichment
//! - `collector` - Concurrent multi-provider variable collection
//! - `enrichment` - Recommendation merge and hyperlocal insights
//! - `aggregation` - Area summaries and per-tile reports
//! - `model` - Area and tile records
//! - `storage` - Area persistence behind an async trait
//! - `pipeline` - End-to-end orchestration
//! - `config` - Pipeline configuration
//! - `error` - Unified error type with stable error codes
//! - `testing` - Mocks and fixtures for tests
pub mod aggregation;
pub mod bounds;
pub mod collector;
pub mod config;
pub mod enrichment;
pub mod error;
pub mod geometry;
pub mod model;
pub mod pipeline;
pub mod storage;
pub mod tiling;

pub mod testing;

pub use error::{AgroError, Result};
