use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{CachedData, LocalStore, Snapshot};
use crate::entity::Entity;

/// Process-local store. Collections are kept as JSON values keyed by
/// collection name, the same shape the file store writes to disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<&'static str, CachedData<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` against the snapshot for `E`, storing it back if it changed.
    fn with_snapshot<E, T>(&self, f: impl FnOnce(&mut Snapshot<E>) -> T) -> Result<T>
    where
        E: Entity,
    {
        let mut collections = self
            .collections
            .lock()
            .map_err(|e| anyhow!("Lock poisoned: {}", e))?;

        let entities: Vec<E> = match collections.get(E::COLLECTION) {
            Some(cached) => serde_json::from_value(cached.data.clone())
                .with_context(|| format!("Failed to decode {} snapshot", E::COLLECTION))?,
            None => Vec::new(),
        };

        let mut snapshot = Snapshot::new(entities);
        let result = f(&mut snapshot);

        if snapshot.is_dirty() {
            let value = serde_json::to_value(snapshot.entities())
                .with_context(|| format!("Failed to encode {} snapshot", E::COLLECTION))?;
            collections.insert(E::COLLECTION, CachedData::new(value));
        }

        Ok(result)
    }
}

impl LocalStore for MemoryStore {
    fn load_all<E: Entity>(&self) -> Result<Vec<E>> {
        self.with_snapshot(|snapshot: &mut Snapshot<E>| snapshot.entities().to_vec())
    }

    fn get<E: Entity>(&self, id: &str) -> Result<Option<E>> {
        self.with_snapshot(|snapshot: &mut Snapshot<E>| snapshot.get(id).cloned())
    }

    fn upsert<E: Entity>(&self, entity: &E) -> Result<()> {
        self.with_snapshot(|snapshot: &mut Snapshot<E>| snapshot.upsert(entity.clone()))
    }

    fn upsert_many<E: Entity>(&self, entities: &[E]) -> Result<()> {
        self.with_snapshot(|snapshot: &mut Snapshot<E>| {
            for entity in entities {
                snapshot.upsert(entity.clone());
            }
        })
    }

    fn update<E: Entity>(&self, entity: &E) -> Result<bool> {
        self.with_snapshot(|snapshot: &mut Snapshot<E>| snapshot.update(entity.clone()))
    }

    fn delete<E: Entity>(&self, id: &str) -> Result<bool> {
        self.with_snapshot(|snapshot: &mut Snapshot<E>| snapshot.remove(id))
    }

    fn patch<E, F>(&self, id: &str, patch: F) -> Result<Option<E>>
    where
        E: Entity,
        F: FnOnce(&mut E),
    {
        self.with_snapshot(|snapshot: &mut Snapshot<E>| snapshot.patch(id, patch))
    }

    fn cached_at<E: Entity>(&self) -> Result<Option<DateTime<Utc>>> {
        let collections = self
            .collections
            .lock()
            .map_err(|e| anyhow!("Lock poisoned: {}", e))?;
        Ok(collections.get(E::COLLECTION).map(|cached| cached.cached_at))
    }
}
