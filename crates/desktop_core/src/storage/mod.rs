//! Storage port and backend adapters.
//!
//! # Responsibility
//! - Define the persistence capability the write pipeline depends on.
//! - Provide in-memory and single-file SQLite implementations.
//!
//! # Invariants
//! - `save` is an upsert: re-saving an id overwrites, never duplicates.
//! - `load_all` returns one owner's items, newest `created_at` first.
//! - `delete` only removes a row when both id and owner match; a miss is
//!   `Ok(false)`, not an error.
//! - All operations are safe to call concurrently with each other.

use crate::config::StorageBackend;
use crate::db::DbError;
use crate::model::item::{DesktopItem, ItemValidationError};
use async_trait::async_trait;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryItemStore;
pub use sqlite::SqliteItemStore;

pub type StorageResult<T> = Result<T, StorageError>;

/// Failure of a single storage operation.
#[derive(Debug)]
pub enum StorageError {
    Validation(ItemValidationError),
    Db(DbError),
    Serialization(serde_json::Error),
    InvalidData(String),
    /// The adapter's internal lock was poisoned by a panicking writer.
    LockPoisoned,
    /// The backend refused or could not run the operation.
    Unavailable(String),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Serialization(err) => write!(f, "item payload serialization failed: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted item data: {message}"),
            Self::LockPoisoned => write!(f, "storage lock poisoned"),
            Self::Unavailable(message) => write!(f, "storage unavailable: {message}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::InvalidData(_) | Self::LockPoisoned | Self::Unavailable(_) => None,
        }
    }
}

impl From<ItemValidationError> for StorageError {
    fn from(value: ItemValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}

/// Persistence destination for desktop items.
#[async_trait]
pub trait StoragePort: Send + Sync {
    /// Short backend label used in logs.
    fn backend_name(&self) -> &'static str;

    /// Inserts or overwrites the item keyed by `item.id`.
    async fn save(&self, item: &DesktopItem) -> StorageResult<()>;

    /// Lists all items of `owner_id`, sorted by `created_at` descending.
    async fn load_all(&self, owner_id: &str) -> StorageResult<Vec<DesktopItem>>;

    /// Deletes `item_id` if it belongs to `owner_id`.
    ///
    /// Returns whether a record was actually removed.
    async fn delete(&self, item_id: &str, owner_id: &str) -> StorageResult<bool>;
}

/// Builds the storage adapter selected by configuration.
pub fn open_storage(backend: &StorageBackend) -> StorageResult<Arc<dyn StoragePort>> {
    match backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryItemStore::new())),
        StorageBackend::Sqlite { path } => Ok(Arc::new(SqliteItemStore::open(path)?)),
    }
}

/// Shared ordering used by every adapter's `load_all`.
pub(crate) fn sort_newest_first(items: &mut [DesktopItem]) {
    items.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}
