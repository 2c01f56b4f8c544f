use std::collections::HashMap;

use crate::entity::Entity;

/// An ordered, id-unique collection of entities.
///
/// Shared by the file and memory stores (and the in-memory API) so that
/// upsert, replace and removal behave identically everywhere. Tracks whether
/// any mutation happened so callers only persist real changes.
#[derive(Debug, Clone)]
pub struct Snapshot<E> {
    entities: Vec<E>,
    index: HashMap<String, usize>,
    dirty: bool,
}

impl<E: Entity> Default for Snapshot<E> {
    fn default() -> Self {
        Self {
            entities: Vec::new(),
            index: HashMap::new(),
            dirty: false,
        }
    }
}

impl<E: Entity> Snapshot<E> {
    /// Build from stored records. Duplicate ids collapse onto the first
    /// position, keeping the last record seen.
    pub fn new(entities: Vec<E>) -> Self {
        let mut snapshot = Self::default();
        for entity in entities {
            snapshot.upsert(entity);
        }
        snapshot.dirty = false;
        snapshot
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn get(&self, id: &str) -> Option<&E> {
        self.index.get(id).map(|&pos| &self.entities[pos])
    }

    pub fn entities(&self) -> &[E] {
        &self.entities
    }

    pub fn upsert(&mut self, entity: E) {
        let entity = entity.normalized();
        match self.index.get(entity.id()) {
            Some(&pos) => self.entities[pos] = entity,
            None => {
                self.index.insert(entity.id().to_string(), self.entities.len());
                self.entities.push(entity);
            }
        }
        self.dirty = true;
    }

    pub fn update(&mut self, entity: E) -> bool {
        let Some(&pos) = self.index.get(entity.id()) else {
            return false;
        };
        self.entities[pos] = entity.normalized();
        self.dirty = true;
        true
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let Some(pos) = self.index.remove(id) else {
            return false;
        };
        self.entities.remove(pos);
        for slot in self.index.values_mut() {
            if *slot > pos {
                *slot -= 1;
            }
        }
        self.dirty = true;
        true
    }

    pub fn patch<F>(&mut self, id: &str, patch: F) -> Option<E>
    where
        F: FnOnce(&mut E),
    {
        let &pos = self.index.get(id)?;
        let mut entity = self.entities[pos].clone();
        patch(&mut entity);
        entity.touch();
        let entity = entity.normalized();
        self.entities[pos] = entity.clone();
        self.dirty = true;
        Some(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Customer, Money, Product};

    #[test]
    fn test_new_collapses_duplicate_ids() {
        let snapshot = Snapshot::new(vec![
            Customer::new("1", "First", "a@example.com"),
            Customer::new("2", "Second", "b@example.com"),
            Customer::new("1", "First again", "a2@example.com"),
        ]);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.entities()[0].name, "First again");
        assert!(!snapshot.is_dirty());
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let customer = Customer::new("1", "Ana", "ana@example.com");
        let mut once = Snapshot::default();
        once.upsert(customer.clone());
        let mut twice = Snapshot::default();
        twice.upsert(customer.clone());
        twice.upsert(customer);
        assert_eq!(once.entities(), twice.entities());
    }

    #[test]
    fn test_remove_keeps_index_consistent() {
        let mut snapshot = Snapshot::new(vec![
            Customer::new("1", "A", "a@example.com"),
            Customer::new("2", "B", "b@example.com"),
            Customer::new("3", "C", "c@example.com"),
        ]);
        assert!(snapshot.remove("1"));
        assert!(!snapshot.remove("1"));
        assert_eq!(snapshot.get("3").map(|c| c.name.as_str()), Some("C"));
        assert_eq!(snapshot.get("2").map(|c| c.name.as_str()), Some("B"));
        assert!(snapshot.is_dirty());
    }

    #[test]
    fn test_update_requires_existing_id() {
        let mut snapshot: Snapshot<Customer> = Snapshot::default();
        assert!(!snapshot.update(Customer::new("1", "A", "a@example.com")));
        assert!(snapshot.is_empty());
        assert!(!snapshot.is_dirty());
    }

    #[test]
    fn test_patch_touches_updated_at() {
        let product = Product::new("1", "Laptop", "Gaming", Money::from_units(1500), "Tech", 5);
        let created = product.created_at;
        let mut snapshot = Snapshot::new(vec![product]);

        let patched = snapshot.patch("1", |p: &mut Product| p.stock = 3).unwrap();
        assert_eq!(patched.stock, 3);
        assert!(patched.updated_at > created);
        assert_eq!(snapshot.get("1"), Some(&patched));
        assert!(snapshot.patch("missing", |p: &mut Product| p.stock = 1).is_none());
    }
}
