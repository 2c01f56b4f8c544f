use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::{CachedData, LocalStore, Snapshot};
use crate::entity::Entity;

/// File-backed store: one `<collection>.json` document per entity type.
///
/// Each document is a plain JSON array of records, and the snapshot time is
/// the file's modification time. Documents written as a `CachedData` envelope
/// are still accepted and become plain arrays on the next write. A missing
/// file is an empty snapshot; so is a file that cannot be read or parsed,
/// which is logged and then overwritten by the next write.
pub struct JsonFileStore {
    cache_dir: PathBuf,
    // Serializes read-modify-write cycles across collections.
    lock: Mutex<()>,
}

/// A parsed collection document.
enum Document<T> {
    Records(Vec<T>),
    Envelope(CachedData<Vec<T>>),
}

impl<T> Document<T> {
    fn into_records(self) -> Vec<T> {
        match self {
            Document::Records(records) => records,
            Document::Envelope(cached) => cached.data,
        }
    }
}

impl JsonFileStore {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache directory: {}", cache_dir.display()))?;
        Ok(Self {
            cache_dir,
            lock: Mutex::new(()),
        })
    }

    fn cache_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", name))
    }

    fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<Document<T>>> {
        let path = self.cache_path(name);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file: {}", name))?;
        let value: Value = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file: {}", name))?;

        let document = if value.is_array() {
            Document::Records(
                serde_json::from_value(value)
                    .with_context(|| format!("Failed to parse records in cache file: {}", name))?,
            )
        } else if value.get("data").is_some() {
            Document::Envelope(
                serde_json::from_value(value)
                    .with_context(|| format!("Failed to parse cache envelope: {}", name))?,
            )
        } else {
            bail!("Cache file is not a JSON array: {}", name);
        };
        Ok(Some(document))
    }

    fn save<T: Serialize>(&self, name: &str, records: &[T]) -> Result<()> {
        let path = self.cache_path(name);
        let contents = serde_json::to_string_pretty(records)?;

        // Write to a sibling temp file and rename so readers never see a
        // half-written document.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, contents)
            .with_context(|| format!("Failed to write cache file: {}", name))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to replace cache file: {}", name))?;
        Ok(())
    }

    fn modified_at(&self, name: &str) -> Result<DateTime<Utc>> {
        let modified = std::fs::metadata(self.cache_path(name))
            .and_then(|metadata| metadata.modified())
            .with_context(|| format!("Failed to read modification time: {}", name))?;
        Ok(DateTime::<Utc>::from(modified))
    }

    /// Current snapshot for `E`; unreadable documents count as empty.
    fn read_snapshot<E: Entity>(&self) -> Snapshot<E> {
        match self.load::<E>(E::COLLECTION) {
            Ok(Some(document)) => Snapshot::new(document.into_records()),
            Ok(None) => Snapshot::default(),
            Err(e) => {
                warn!(cache = E::COLLECTION, error = %e, "Discarding unreadable cache file");
                Snapshot::default()
            }
        }
    }

    fn with_snapshot<E, T>(&self, f: impl FnOnce(&mut Snapshot<E>) -> T) -> Result<T>
    where
        E: Entity,
    {
        let _guard = self.lock.lock().map_err(|e| anyhow!("Lock poisoned: {}", e))?;
        let mut snapshot = self.read_snapshot::<E>();
        let result = f(&mut snapshot);
        if snapshot.is_dirty() {
            self.save(E::COLLECTION, snapshot.entities())?;
            debug!(cache = E::COLLECTION, count = snapshot.len(), "Saved snapshot");
        }
        Ok(result)
    }
}

impl LocalStore for JsonFileStore {
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
        let _guard = self.lock.lock().map_err(|e| anyhow!("Lock poisoned: {}", e))?;
        match self.load::<Value>(E::COLLECTION) {
            Ok(Some(Document::Envelope(cached))) => Ok(Some(cached.cached_at)),
            Ok(Some(Document::Records(_))) => self.modified_at(E::COLLECTION).map(Some),
            Ok(None) => Ok(None),
            Err(e) => {
                debug!(cache = E::COLLECTION, error = %e, "Failed to load cache for age display");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Customer, Money, Product};

    #[test]
    fn test_snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let customer = Customer::new("1", "Juan Perez", "juan.perez@email.com").with_phone("123456789");

        {
            let store = JsonFileStore::new(dir.path().to_path_buf()).unwrap();
            store.upsert(&customer).unwrap();
        }

        let store = JsonFileStore::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(store.get::<Customer>("1").unwrap(), Some(customer));
        assert!(store.cached_at::<Customer>().unwrap().is_some());
        assert!(dir.path().join("customers.json").exists());
    }

    #[test]
    fn test_corrupt_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("products.json"), "{ not json").unwrap();

        let store = JsonFileStore::new(dir.path().to_path_buf()).unwrap();
        assert!(store.load_all::<Product>().unwrap().is_empty());
        assert!(store.cached_at::<Product>().unwrap().is_none());

        // The next write replaces the corrupt document.
        store
            .upsert(&Product::new("1", "Laptop", "Gaming", Money::from_units(1500), "Tech", 5))
            .unwrap();
        assert_eq!(store.load_all::<Product>().unwrap().len(), 1);
    }

    #[test]
    fn test_document_layout() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().to_path_buf()).unwrap();
        store.upsert(&Customer::new("9", "Ana", "ana@example.com")).unwrap();

        let raw = std::fs::read_to_string(dir.path().join("customers.json")).unwrap();
        let doc: Value = serde_json::from_str(&raw).unwrap();
        let records = doc.as_array().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["id"], "9");
        assert_eq!(records[0]["email"], "ana@example.com");
        assert!(records[0]["phone"].is_null());
    }

    #[test]
    fn test_delete_and_update() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().to_path_buf()).unwrap();
        let mut customer = Customer::new("1", "Ana", "ana@example.com");
        store.upsert(&customer).unwrap();

        customer.name = "Ana Maria".to_string();
        assert!(store.update(&customer).unwrap());
        assert!(!store.update(&Customer::new("2", "Ghost", "ghost@example.com")).unwrap());
        assert_eq!(store.get::<Customer>("1").unwrap().unwrap().name, "Ana Maria");

        assert!(store.delete::<Customer>("1").unwrap());
        assert!(store.get::<Customer>("1").unwrap().is_none());
    }

    #[test]
    fn test_reads_plain_record_array() {
        let dir = tempfile::tempdir().unwrap();
        let records = serde_json::json!([
            { "id": "1", "name": "Laptop", "price": 150000, "stock": 5 }
        ]);
        std::fs::write(dir.path().join("products.json"), records.to_string()).unwrap();

        let store = JsonFileStore::new(dir.path().to_path_buf()).unwrap();
        let loaded = store.load_all::<Product>().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "Laptop");
        assert!(store.cached_at::<Product>().unwrap().is_some());

        store
            .upsert(&Product::new("2", "Mouse", "Wireless", Money::from_units(25), "Tech", 10))
            .unwrap();
        let ids: Vec<String> = store.load_all::<Product>().unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_reads_envelope_document() {
        let dir = tempfile::tempdir().unwrap();
        let customer = Customer::new("1", "Ana", "ana@example.com");
        let envelope = CachedData::new(vec![customer.clone()]);
        std::fs::write(
            dir.path().join("customers.json"),
            serde_json::to_string(&envelope).unwrap(),
        )
        .unwrap();

        let store = JsonFileStore::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(store.load_all::<Customer>().unwrap(), vec![customer.clone()]);
        assert_eq!(store.cached_at::<Customer>().unwrap(), Some(envelope.cached_at));

        // The next write rewrites the document as a plain array.
        store.upsert(&Customer::new("2", "Luis", "luis@example.com")).unwrap();
        let raw = std::fs::read_to_string(dir.path().join("customers.json")).unwrap();
        let doc: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(doc.as_array().unwrap().len(), 2);
    }
}
