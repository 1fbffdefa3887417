//! Area and tile persistence
//!
//! The pipeline only talks to [`AreaStore`]; [`MemoryStore`] is the in-process
//! implementation.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{StorageError, StorageResult};
pub use memory::MemoryStore;
pub use traits::AreaStore;
