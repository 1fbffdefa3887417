//! Persistence contract for areas and their tiles

use async_trait::async_trait;
use uuid::Uuid;

use super::error::StorageResult;
use crate::model::{Area, Tile};

/// Storage for areas and the tiles they own.
///
/// Tiles belong to exactly one area; deleting the area deletes them.
#[async_trait]
pub trait AreaStore: Send + Sync {
    /// Insert or update an area
    async fn save_area(&self, area: &Area) -> StorageResult<()>;

    /// Load an area by ID
    async fn load_area(&self, id: Uuid) -> StorageResult<Option<Area>>;

    /// All areas, most recently created first
    async fn list_areas(&self) -> StorageResult<Vec<Area>>;

    /// Replace the full tile set of an existing area.
    ///
    /// Fails with `NotFound` when the area is unknown and with `Conflict`
    /// when a tile belongs to another area or a (row, col) pair repeats.
    async fn replace_tiles(&self, area_id: Uuid, tiles: Vec<Tile>) -> StorageResult<()>;

    /// Tiles of an area ordered by (row, col)
    async fn load_tiles(&self, area_id: Uuid) -> StorageResult<Vec<Tile>>;

    /// Delete an area and its tiles, returning whether it existed
    async fn delete_area(&self, id: Uuid) -> StorageResult<bool>;
}
