use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{ApiError, RemoteSource};
use crate::cache::Snapshot;
use crate::entity::Entity;

/// In-process stand-in for the storefront backend.
///
/// Holds one collection per entity type and answers the same five calls as
/// the HTTP API. Taking it offline with `set_available(false)` makes every
/// call fail with `ApiError::Offline`, which is how demos and tests exercise
/// the local and seed fallbacks.
#[derive(Debug)]
pub struct MemoryApi {
    collections: Mutex<HashMap<&'static str, Vec<Value>>>,
    available: AtomicBool,
    requests: AtomicUsize,
}

impl Default for MemoryApi {
    fn default() -> Self {
        Self {
            collections: Mutex::new(HashMap::new()),
            available: AtomicBool::new(true),
            requests: AtomicUsize::new(0),
        }
    }
}

impl MemoryApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the backend collection for `E`, replacing anything already there.
    pub fn with_collection<E: Entity>(self, entities: Vec<E>) -> Self {
        let values = entities
            .iter()
            .filter_map(|entity| serde_json::to_value(entity).ok())
            .collect();
        if let Ok(mut collections) = self.collections.lock() {
            collections.insert(E::COLLECTION, values);
        }
        self
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    /// Number of calls received, including those refused while offline.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Current backend contents for `E`, bypassing availability.
    pub fn contents<E: Entity>(&self) -> Vec<E> {
        self.with_snapshot(|snapshot: &mut Snapshot<E>| snapshot.entities().to_vec())
            .unwrap_or_default()
    }

    fn with_snapshot<E, T>(&self, f: impl FnOnce(&mut Snapshot<E>) -> T) -> Result<T, ApiError>
    where
        E: Entity,
    {
        let mut collections = self
            .collections
            .lock()
            .map_err(|e| ApiError::ServerError(format!("Lock poisoned: {}", e)))?;

        let entities: Vec<E> = match collections.get(E::COLLECTION) {
            Some(values) => serde_json::from_value(Value::Array(values.clone()))
                .map_err(|e| ApiError::InvalidResponse(e.to_string()))?,
            None => Vec::new(),
        };

        let mut snapshot = Snapshot::new(entities);
        let result = f(&mut snapshot);

        if snapshot.is_dirty() {
            let values = snapshot
                .entities()
                .iter()
                .map(serde_json::to_value)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
            collections.insert(E::COLLECTION, values);
        }
        Ok(result)
    }

    fn begin(&self, call: &'static str, collection: &'static str) -> Result<(), ApiError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if !self.is_available() {
            debug!(call, collection, "Refusing call while offline");
            return Err(ApiError::Offline);
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteSource for MemoryApi {
    async fn list<E: Entity>(&self) -> Result<Vec<E>, ApiError> {
        self.begin("list", E::COLLECTION)?;
        self.with_snapshot(|snapshot: &mut Snapshot<E>| snapshot.entities().to_vec())
    }

    async fn get<E: Entity>(&self, id: &str) -> Result<Option<E>, ApiError> {
        self.begin("get", E::COLLECTION)?;
        self.with_snapshot(|snapshot: &mut Snapshot<E>| snapshot.get(id).cloned())
    }

    async fn create<E: Entity>(&self, entity: &E) -> Result<(), ApiError> {
        self.begin("create", E::COLLECTION)?;
        self.with_snapshot(|snapshot: &mut Snapshot<E>| snapshot.upsert(entity.clone()))
    }

    async fn replace<E: Entity>(&self, entity: &E) -> Result<(), ApiError> {
        self.begin("replace", E::COLLECTION)?;
        let replaced = self.with_snapshot(|snapshot: &mut Snapshot<E>| snapshot.update(entity.clone()))?;
        if replaced {
            Ok(())
        } else {
            Err(ApiError::NotFound(format!("{}/{}", E::COLLECTION, entity.id())))
        }
    }

    async fn delete<E: Entity>(&self, id: &str) -> Result<(), ApiError> {
        self.begin("delete", E::COLLECTION)?;
        let removed = self.with_snapshot(|snapshot: &mut Snapshot<E>| snapshot.remove(id))?;
        if removed {
            Ok(())
        } else {
            Err(ApiError::NotFound(format!("{}/{}", E::COLLECTION, id)))
        }
    }
}
