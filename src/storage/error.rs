//! Errors raised by area stores

use std::fmt;
use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StorageError {
    /// The area a write refers to does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Tiles that belong to another area or repeat a (row, col) cell
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl StorageError {
    pub fn not_found(item: impl fmt::Display) -> Self {
        Self::NotFound(item.to_string())
    }

    pub fn conflict(msg: impl fmt::Display) -> Self {
        Self::Conflict(msg.to_string())
    }
}
