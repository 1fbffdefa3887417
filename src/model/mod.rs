//! Persisted entities: areas, tiles and their payloads

pub mod area;
pub mod recommendation;
pub mod tile;
pub mod variables;

pub use area::{Area, AreaStatus, ENRICHMENT_ERROR_KEY};
pub use recommendation::Recommendation;
pub use tile::{Tile, TileStatus};
pub use variables::{error_record, is_error_record, Variables};

/// Identifier shared by tiles and recommendation payloads
pub fn tile_key(row: u32, col: u32) -> String {
    format!("{row}-{col}")
}
