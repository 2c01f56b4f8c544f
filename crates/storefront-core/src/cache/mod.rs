//! Local persistence for offline data access.
//!
//! Every store keeps one snapshot per entity type: the last reconciled copy of
//! that collection, keyed by id. Three backends implement `LocalStore`:
//!
//! - `MemoryStore`: process-local, nothing survives a restart
//! - `JsonFileStore`: one JSON document per entity type in a cache directory
//! - `SqliteStore`: a single SQLite database, one row per entity
//!
//! `LocalBackend` selects one of them at runtime from configuration.

pub mod backend;
pub mod json;
pub mod memory;
pub mod snapshot;
pub mod sqlite;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::Entity;

pub use backend::LocalBackend;
pub use json::JsonFileStore;
pub use memory::MemoryStore;
pub use snapshot::Snapshot;
pub use sqlite::SqliteStore;

/// A stored collection plus the time it was last written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }
}

/// Storage backend for entity snapshots.
///
/// Each method is atomic with respect to other calls on the same store.
/// Writes normalize the entity before storing it, so stored sales always carry
/// consistent totals and `updated_at >= created_at` holds for every record.
pub trait LocalStore: Send + Sync {
    /// Every stored entity of type `E`, in insertion order.
    fn load_all<E: Entity>(&self) -> Result<Vec<E>>;

    fn get<E: Entity>(&self, id: &str) -> Result<Option<E>>;

    /// Insert, or replace the entity with the same id.
    fn upsert<E: Entity>(&self, entity: &E) -> Result<()>;

    /// Merge a batch into the snapshot, replacing by id.
    fn upsert_many<E: Entity>(&self, entities: &[E]) -> Result<()>;

    /// Full replace of an existing entity. Returns false when the id is unknown.
    fn update<E: Entity>(&self, entity: &E) -> Result<bool>;

    /// Hard removal. Returns false when the id is unknown.
    fn delete<E: Entity>(&self, id: &str) -> Result<bool>;

    /// Apply `patch` to the stored entity and bump its `updated_at`.
    /// Returns the patched entity, or `None` when the id is unknown.
    fn patch<E, F>(&self, id: &str, patch: F) -> Result<Option<E>>
    where
        E: Entity,
        F: FnOnce(&mut E);

    /// When the snapshot for `E` was last written, if ever.
    fn cached_at<E: Entity>(&self) -> Result<Option<DateTime<Utc>>>;

    /// Soft delete: clear the active flag and keep the record.
    fn deactivate<E: Entity>(&self, id: &str) -> Result<bool> {
        Ok(self.patch::<E, _>(id, |entity| entity.deactivate())?.is_some())
    }
}
