//! Area-level reduction of tiles
//!
//! Everything here is derived from tiles on demand and never stored.

pub mod report;
pub mod summary;

pub use report::{format_metric, format_texture, RecommendationRow, TileReport};
pub use summary::{summarize, summarize_tiles, AreaSummary, DominantCategory, EnvSignal};
