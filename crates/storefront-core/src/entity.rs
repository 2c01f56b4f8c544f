//! The contract every synchronized record type implements.

use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Serialize};

/// How a delete operation is applied to the local snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteMode {
    /// The record is removed from the snapshot.
    Hard,
    /// The record stays in the snapshot with its active flag cleared.
    Soft,
}

/// A domain record with a stable string id and audit timestamps.
///
/// The collection name doubles as the API path segment (`GET /products`) and
/// the local storage key (`products.json`, or the `entity_type` column).
pub trait Entity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    const COLLECTION: &'static str;

    const DELETE_MODE: DeleteMode = DeleteMode::Hard;

    fn id(&self) -> &str;

    fn created_at(&self) -> DateTime<Utc>;

    fn updated_at(&self) -> DateTime<Utc>;

    fn set_updated_at(&mut self, at: DateTime<Utc>);

    /// Whether the record shows up in list, search and filter results.
    /// Soft-deleted records are hidden but stay reachable by id.
    fn is_visible(&self) -> bool {
        true
    }

    /// Soft-delete hook, only meaningful for `DeleteMode::Soft` entities.
    fn deactivate(&mut self) {}

    /// Re-establish derived fields (totals and the like) before a write.
    fn normalize(&mut self) {}

    /// Normalized copy with `updated_at` raised to at least `created_at`.
    fn normalized(mut self) -> Self {
        self.normalize();
        if self.updated_at() < self.created_at() {
            let created = self.created_at();
            self.set_updated_at(created);
        }
        self
    }

    /// Bump `updated_at`, strictly past its previous value.
    fn touch(&mut self) {
        let now = Utc::now();
        let previous = self.updated_at();
        let next = if now > previous {
            now
        } else {
            previous + Duration::milliseconds(1)
        };
        self.set_updated_at(next);
    }
}
