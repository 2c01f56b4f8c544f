//! Synchronized repositories over a remote source and a local store.
//!
//! Every read tries the remote first. A successful answer is merged into the
//! local snapshot and returned as is, even when empty. A failed one falls back
//! to the local snapshot, or to the seed set when the snapshot is empty, with
//! the same predicate applied. Writes are best-effort against the remote and
//! always applied locally.

pub mod customers;
pub mod outcome;
pub mod products;
pub mod sales;

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::api::RemoteSource;
use crate::cache::LocalStore;
use crate::entity::{DeleteMode, Entity};
use crate::models::{Customer, Product, Sale};

pub use outcome::{Fetched, LocalWrite, Patched, RemoteWrite, Source, WriteOutcome};

pub type ProductRepository<R, S> = Repository<Product, R, S>;
pub type CustomerRepository<R, S> = Repository<Customer, R, S>;
pub type SaleRepository<R, S> = Repository<Sale, R, S>;

/// Repository for one entity type.
///
/// # Type Parameters
///
/// * `E` - The entity type
/// * `R` - The remote source
/// * `S` - The local store
pub struct Repository<E, R, S> {
    remote: Arc<R>,
    local: Arc<S>,
    seed: Arc<Vec<E>>,
    // Held across the remote attempt and the local mutation of each write.
    write_lock: Arc<Mutex<()>>,
}

impl<E, R, S> Clone for Repository<E, R, S> {
    fn clone(&self) -> Self {
        Self {
            remote: Arc::clone(&self.remote),
            local: Arc::clone(&self.local),
            seed: Arc::clone(&self.seed),
            write_lock: Arc::clone(&self.write_lock),
        }
    }
}

impl<E, R, S> Repository<E, R, S>
where
    E: Entity,
    R: RemoteSource,
    S: LocalStore,
{
    pub fn new(remote: Arc<R>, local: Arc<S>, seed: Vec<E>) -> Self {
        Self {
            remote,
            local,
            seed: Arc::new(seed),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn local(&self) -> &S {
        &self.local
    }

    pub fn seed(&self) -> &[E] {
        &self.seed
    }

    /// Every visible entity.
    pub async fn all(&self) -> Fetched<Vec<E>> {
        self.query(|_| true).await
    }

    /// Visible entities matching `predicate`.
    ///
    /// The remote has no query surface, so this lists the whole collection,
    /// reconciles it, and filters client-side. The local and seed fallbacks
    /// use the same predicate.
    pub async fn query<P>(&self, predicate: P) -> Fetched<Vec<E>>
    where
        P: Fn(&E) -> bool + Send + Sync,
    {
        match self.remote.list::<E>().await {
            Ok(entities) => {
                let entities: Vec<E> = entities.into_iter().map(E::normalized).collect();
                self.reconcile(&entities);
                debug!(collection = E::COLLECTION, count = entities.len(), "Fetched from remote");
                Fetched::from_remote(
                    entities
                        .into_iter()
                        .filter(|entity| entity.is_visible() && predicate(entity))
                        .collect(),
                )
            }
            Err(e) => {
                warn!(collection = E::COLLECTION, error = %e, "Remote list failed, serving local data");
                self.fallback_query(|entity| entity.is_visible() && predicate(entity))
            }
        }
    }

    /// Entity by id. Soft-deleted entities are still returned.
    ///
    /// A remote "not found" is authoritative; only a failed call falls back.
    pub async fn get(&self, id: &str) -> Fetched<Option<E>> {
        match self.remote.get::<E>(id).await {
            Ok(Some(entity)) => {
                let entity = entity.normalized();
                if let Err(e) = self.local.upsert(&entity) {
                    warn!(collection = E::COLLECTION, id, error = %e, "Failed to cache fetched entity");
                }
                Fetched::from_remote(Some(entity))
            }
            Ok(None) => Fetched::from_remote(None),
            Err(e) => {
                warn!(collection = E::COLLECTION, id, error = %e, "Remote get failed, serving local data");
                match self.local_or_seed(id) {
                    Some((entity, Source::Seed)) => Fetched::from_seed(Some(entity)),
                    Some((entity, _)) => Fetched::from_local(Some(entity), self.cached_at()),
                    None => Fetched::from_local(None, self.cached_at()),
                }
            }
        }
    }

    /// Create an entity: `POST` best-effort, then upsert locally.
    pub async fn insert(&self, entity: E) -> WriteOutcome {
        let entity = entity.normalized();
        let _guard = self.write_lock.lock().await;
        let remote = self.remote_write(entity.id(), "create", self.remote.create(&entity).await);
        let local = match self.local.upsert(&entity) {
            Ok(()) => LocalWrite::Applied,
            Err(e) => self.local_failed(entity.id(), "insert", e),
        };
        WriteOutcome { remote, local }
    }

    /// Full replace: `PUT` best-effort, then replace locally when the id is known.
    pub async fn update(&self, entity: E) -> WriteOutcome {
        let entity = entity.normalized();
        let _guard = self.write_lock.lock().await;
        let remote = self.remote_write(entity.id(), "replace", self.remote.replace(&entity).await);
        let local = match self.local.update(&entity) {
            Ok(true) => LocalWrite::Applied,
            Ok(false) => {
                debug!(collection = E::COLLECTION, id = entity.id(), "Update of unknown id skipped locally");
                LocalWrite::Skipped
            }
            Err(e) => self.local_failed(entity.id(), "update", e),
        };
        WriteOutcome { remote, local }
    }

    /// `DELETE` best-effort, then remove locally, or deactivate for
    /// soft-deleted entity types.
    pub async fn delete(&self, id: &str) -> WriteOutcome {
        let _guard = self.write_lock.lock().await;
        let remote = self.remote_write(id, "delete", self.remote.delete::<E>(id).await);
        let result = match E::DELETE_MODE {
            DeleteMode::Hard => self.local.delete::<E>(id),
            DeleteMode::Soft => self.local.deactivate::<E>(id),
        };
        let local = match result {
            Ok(true) => LocalWrite::Applied,
            Ok(false) => LocalWrite::Skipped,
            Err(e) => self.local_failed(id, "delete", e),
        };
        WriteOutcome { remote, local }
    }

    /// Targeted field update.
    ///
    /// The patch is applied to the local copy (or to the seed entry when the
    /// snapshot is still empty), `updated_at` is bumped, the result is `PUT`
    /// best-effort and then stored locally. Patching a seed entry stores the
    /// whole seed set alongside it. An unknown id changes nothing.
    pub async fn patch<F>(&self, id: &str, patch: F) -> Patched<E>
    where
        F: FnOnce(&mut E) + Send,
    {
        let _guard = self.write_lock.lock().await;
        let Some((mut entity, base)) = self.local_or_seed(id) else {
            debug!(collection = E::COLLECTION, id, "Patch of unknown id skipped");
            return Patched {
                entity: None,
                outcome: WriteOutcome::skipped(),
            };
        };

        patch(&mut entity);
        entity.touch();
        let entity = entity.normalized();

        let remote = self.remote_write(id, "replace", self.remote.replace(&entity).await);
        let stored = match base {
            Source::Seed => self.local.upsert_many(&self.seeded_with(&entity)),
            _ => self.local.upsert(&entity),
        };
        let local = match stored {
            Ok(()) => LocalWrite::Applied,
            Err(e) => self.local_failed(id, "patch", e),
        };
        Patched {
            entity: Some(entity),
            outcome: WriteOutcome { remote, local },
        }
    }

    /// Merge a successful remote listing into the snapshot. Entities only
    /// present locally are kept.
    fn reconcile(&self, entities: &[E]) {
        if let Err(e) = self.local.upsert_many(entities) {
            warn!(collection = E::COLLECTION, error = %e, "Failed to reconcile local snapshot");
        }
    }

    fn load_local(&self) -> Vec<E> {
        self.local.load_all::<E>().unwrap_or_else(|e| {
            warn!(collection = E::COLLECTION, error = %e, "Local snapshot unreadable, treating as empty");
            Vec::new()
        })
    }

    fn cached_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.local.cached_at::<E>().unwrap_or_else(|e| {
            debug!(collection = E::COLLECTION, error = %e, "Failed to read snapshot time");
            None
        })
    }

    fn fallback_query(&self, keep: impl Fn(&E) -> bool) -> Fetched<Vec<E>> {
        let local = self.load_local();
        if local.is_empty() {
            debug!(collection = E::COLLECTION, "Local snapshot empty, serving seed set");
            return Fetched::from_seed(self.seed.iter().filter(|entity| keep(entity)).cloned().collect());
        }
        Fetched::from_local(local.into_iter().filter(|entity| keep(entity)).collect(), self.cached_at())
    }

    /// Local entity by id; the seed entry only while the snapshot is empty.
    fn local_or_seed(&self, id: &str) -> Option<(E, Source)> {
        match self.local.get::<E>(id) {
            Ok(Some(entity)) => return Some((entity, Source::Local)),
            Ok(None) => {}
            Err(e) => {
                warn!(collection = E::COLLECTION, id, error = %e, "Local lookup failed");
            }
        }
        if !self.load_local().is_empty() {
            return None;
        }
        self.seed
            .iter()
            .find(|entity| entity.id() == id)
            .cloned()
            .map(|entity| (entity, Source::Seed))
    }

    /// The seed set with `entity` in place of its seed entry.
    fn seeded_with(&self, entity: &E) -> Vec<E> {
        self.seed
            .iter()
            .map(|seeded| if seeded.id() == entity.id() { entity.clone() } else { seeded.clone() })
            .collect()
    }

    fn remote_write(&self, id: &str, call: &str, result: Result<(), crate::api::ApiError>) -> RemoteWrite {
        match result {
            Ok(()) => RemoteWrite::Accepted,
            Err(e) => {
                warn!(collection = E::COLLECTION, id, call, error = %e, "Remote write failed, applying locally only");
                RemoteWrite::Failed
            }
        }
    }

    fn local_failed(&self, id: &str, op: &str, error: anyhow::Error) -> LocalWrite {
        warn!(collection = E::COLLECTION, id, op, error = %error, "Failed to persist local change");
        LocalWrite::Failed
    }
}
