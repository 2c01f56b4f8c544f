use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};

use super::{JsonFileStore, LocalStore, MemoryStore, SqliteStore};
use crate::config::StorageKind;
use crate::entity::Entity;

/// Runtime-selected local store.
pub enum LocalBackend {
    Memory(MemoryStore),
    Json(JsonFileStore),
    Sqlite(SqliteStore),
}

impl LocalBackend {
    /// Open the configured store under `data_dir`.
    pub fn open(kind: StorageKind, data_dir: &Path) -> Result<Self> {
        Ok(match kind {
            StorageKind::Memory => Self::Memory(MemoryStore::new()),
            StorageKind::Json => Self::Json(JsonFileStore::new(data_dir.join("cache"))?),
            StorageKind::Sqlite => Self::Sqlite(SqliteStore::open(&data_dir.join("storefront.db"))?),
        })
    }

    pub fn kind(&self) -> StorageKind {
        match self {
            Self::Memory(_) => StorageKind::Memory,
            Self::Json(_) => StorageKind::Json,
            Self::Sqlite(_) => StorageKind::Sqlite,
        }
    }
}

macro_rules! delegate {
    ($self:ident, $store:ident => $call:expr) => {
        match $self {
            LocalBackend::Memory($store) => $call,
            LocalBackend::Json($store) => $call,
            LocalBackend::Sqlite($store) => $call,
        }
    };
}

impl LocalStore for LocalBackend {
    fn load_all<E: Entity>(&self) -> Result<Vec<E>> {
        delegate!(self, store => store.load_all())
    }

    fn get<E: Entity>(&self, id: &str) -> Result<Option<E>> {
        delegate!(self, store => store.get(id))
    }

    fn upsert<E: Entity>(&self, entity: &E) -> Result<()> {
        delegate!(self, store => store.upsert(entity))
    }

    fn upsert_many<E: Entity>(&self, entities: &[E]) -> Result<()> {
        delegate!(self, store => store.upsert_many(entities))
    }

    fn update<E: Entity>(&self, entity: &E) -> Result<bool> {
        delegate!(self, store => store.update(entity))
    }

    fn delete<E: Entity>(&self, id: &str) -> Result<bool> {
        delegate!(self, store => store.delete::<E>(id))
    }

    fn patch<E, F>(&self, id: &str, patch: F) -> Result<Option<E>>
    where
        E: Entity,
        F: FnOnce(&mut E),
    {
        delegate!(self, store => store.patch(id, patch))
    }

    fn cached_at<E: Entity>(&self) -> Result<Option<DateTime<Utc>>> {
        delegate!(self, store => store.cached_at::<E>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Customer;

    #[test]
    fn test_open_each_kind() {
        let dir = tempfile::tempdir().unwrap();
        for kind in [StorageKind::Memory, StorageKind::Json, StorageKind::Sqlite] {
            let store = LocalBackend::open(kind, dir.path()).unwrap();
            assert_eq!(store.kind(), kind);
            store.upsert(&Customer::new("1", "Ana", "ana@example.com")).unwrap();
            assert_eq!(store.load_all::<Customer>().unwrap().len(), 1);
        }
        assert!(dir.path().join("cache").join("customers.json").exists());
        assert!(dir.path().join("storefront.db").exists());
    }
}
