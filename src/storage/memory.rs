//! In-memory storage backend

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::error::{StorageError, StorageResult};
use super::traits::AreaStore;
use crate::model::{Area, Tile};

/// Area store kept entirely in memory, cheap to clone and share
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    areas: Arc<RwLock<HashMap<Uuid, Area>>>,
    tiles: Arc<RwLock<HashMap<Uuid, Vec<Tile>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_tiles(area_id: Uuid, tiles: &[Tile]) -> StorageResult<()> {
    let mut seen = HashSet::with_capacity(tiles.len());
    for tile in tiles {
        if tile.area_id != area_id {
            return Err(StorageError::conflict(format!(
                "tile {} belongs to area {}, not {}",
                tile.key(),
                tile.area_id,
                area_id
            )));
        }
        if !seen.insert((tile.row, tile.col)) {
            return Err(StorageError::conflict(format!(
                "duplicate tile {} in area {}",
                tile.key(),
                area_id
            )));
        }
    }
    Ok(())
}

#[async_trait]
impl AreaStore for MemoryStore {
    async fn save_area(&self, area: &Area) -> StorageResult<()> {
        self.areas.write().await.insert(area.id, area.clone());
        Ok(())
    }

    async fn load_area(&self, id: Uuid) -> StorageResult<Option<Area>> {
        Ok(self.areas.read().await.get(&id).cloned())
    }

    async fn list_areas(&self) -> StorageResult<Vec<Area>> {
        let mut areas: Vec<Area> = self.areas.read().await.values().cloned().collect();
        areas.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(areas)
    }

    async fn replace_tiles(&self, area_id: Uuid, mut tiles: Vec<Tile>) -> StorageResult<()> {
        if !self.areas.read().await.contains_key(&area_id) {
            return Err(StorageError::not_found(format!("area {area_id}")));
        }
        check_tiles(area_id, &tiles)?;
        tiles.sort_by_key(|t| (t.row, t.col));
        debug!("Storing {} tiles for area {}", tiles.len(), area_id);
        self.tiles.write().await.insert(area_id, tiles);
        Ok(())
    }

    async fn load_tiles(&self, area_id: Uuid) -> StorageResult<Vec<Tile>> {
        Ok(self
            .tiles
            .read()
            .await
            .get(&area_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn delete_area(&self, id: Uuid) -> StorageResult<bool> {
        let existed = self.areas.write().await.remove(&id).is_some();
        self.tiles.write().await.remove(&id);
        Ok(existed)
    }
}
