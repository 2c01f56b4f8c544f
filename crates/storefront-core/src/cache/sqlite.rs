use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::warn;

use super::LocalStore;
use crate::entity::Entity;

/// SQLite-backed store. Entities are kept as serialized JSON, one row each.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS entities (
    entity_type TEXT NOT NULL,
    id TEXT NOT NULL,
    data TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (entity_type, id)
);

-- Last write time per entity type
CREATE TABLE IF NOT EXISTS snapshots (
    entity_type TEXT PRIMARY KEY,
    cached_at TEXT NOT NULL
);
"#;

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        self.conn()?
            .execute_batch(SCHEMA)
            .context("Failed to run migrations")?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| anyhow!("Lock poisoned: {}", e))
    }
}

fn decode<E: Entity>(data: &str) -> Option<E> {
    match serde_json::from_str(data) {
        Ok(entity) => Some(entity),
        Err(e) => {
            warn!(entity_type = E::COLLECTION, error = %e, "Skipping unreadable row");
            None
        }
    }
}

fn write_row<E: Entity>(conn: &Connection, entity: &E) -> Result<()> {
    let data = serde_json::to_string(entity)?;
    conn.execute(
        "INSERT INTO entities (entity_type, id, data, updated_at) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (entity_type, id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
        params![E::COLLECTION, entity.id(), data, entity.updated_at().to_rfc3339()],
    )
    .with_context(|| format!("Failed to write {} row {}", E::COLLECTION, entity.id()))?;
    Ok(())
}

fn mark_written<E: Entity>(conn: &Connection) -> Result<()> {
    conn.execute(
        "INSERT INTO snapshots (entity_type, cached_at) VALUES (?1, ?2)
         ON CONFLICT (entity_type) DO UPDATE SET cached_at = excluded.cached_at",
        params![E::COLLECTION, Utc::now().to_rfc3339()],
    )
    .context("Failed to record snapshot time")?;
    Ok(())
}

fn read_row<E: Entity>(conn: &Connection, id: &str) -> Result<Option<E>> {
    let data: Option<String> = conn
        .query_row(
            "SELECT data FROM entities WHERE entity_type = ?1 AND id = ?2",
            params![E::COLLECTION, id],
            |row| row.get(0),
        )
        .optional()
        .with_context(|| format!("Failed to read {} row {}", E::COLLECTION, id))?;
    Ok(data.and_then(|data| decode(&data)))
}

impl LocalStore for SqliteStore {
    fn load_all<E: Entity>(&self) -> Result<Vec<E>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT data FROM entities WHERE entity_type = ?1 ORDER BY rowid")?;
        let rows = stmt.query_map(params![E::COLLECTION], |row| row.get::<_, String>(0))?;

        let mut entities = Vec::new();
        for row in rows {
            if let Some(entity) = decode(&row?) {
                entities.push(entity);
            }
        }
        Ok(entities)
    }

    fn get<E: Entity>(&self, id: &str) -> Result<Option<E>> {
        let conn = self.conn()?;
        read_row(&conn, id)
    }

    fn upsert<E: Entity>(&self, entity: &E) -> Result<()> {
        let conn = self.conn()?;
        write_row(&conn, &entity.clone().normalized())?;
        mark_written::<E>(&conn)
    }

    fn upsert_many<E: Entity>(&self, entities: &[E]) -> Result<()> {
        if entities.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn()?;
        let tx = conn.transaction().context("Failed to begin transaction")?;
        for entity in entities {
            write_row(&tx, &entity.clone().normalized())?;
        }
        mark_written::<E>(&tx)?;
        tx.commit().context("Failed to commit transaction")?;
        Ok(())
    }

    fn update<E: Entity>(&self, entity: &E) -> Result<bool> {
        let conn = self.conn()?;
        let entity = entity.clone().normalized();
        let data = serde_json::to_string(&entity)?;
        let changed = conn
            .execute(
                "UPDATE entities SET data = ?3, updated_at = ?4 WHERE entity_type = ?1 AND id = ?2",
                params![E::COLLECTION, entity.id(), data, entity.updated_at().to_rfc3339()],
            )
            .with_context(|| format!("Failed to update {} row {}", E::COLLECTION, entity.id()))?;
        if changed > 0 {
            mark_written::<E>(&conn)?;
        }
        Ok(changed > 0)
    }

    fn delete<E: Entity>(&self, id: &str) -> Result<bool> {
        let conn = self.conn()?;
        let changed = conn
            .execute(
                "DELETE FROM entities WHERE entity_type = ?1 AND id = ?2",
                params![E::COLLECTION, id],
            )
            .with_context(|| format!("Failed to delete {} row {}", E::COLLECTION, id))?;
        if changed > 0 {
            mark_written::<E>(&conn)?;
        }
        Ok(changed > 0)
    }

    fn patch<E, F>(&self, id: &str, patch: F) -> Result<Option<E>>
    where
        E: Entity,
        F: FnOnce(&mut E),
    {
        let mut conn = self.conn()?;
        let tx = conn.transaction().context("Failed to begin transaction")?;
        let Some(mut entity) = read_row::<E>(&tx, id)? else {
            return Ok(None);
        };
        patch(&mut entity);
        entity.touch();
        let entity = entity.normalized();
        write_row(&tx, &entity)?;
        mark_written::<E>(&tx)?;
        tx.commit().context("Failed to commit transaction")?;
        Ok(Some(entity))
    }

    fn cached_at<E: Entity>(&self) -> Result<Option<DateTime<Utc>>> {
        let conn = self.conn()?;
        let raw: Option<String> = conn
            .query_row(
                "SELECT cached_at FROM snapshots WHERE entity_type = ?1",
                params![E::COLLECTION],
                |row| row.get(0),
            )
            .optional()?;

        Ok(raw.and_then(|raw| match DateTime::parse_from_rfc3339(&raw) {
            Ok(at) => Some(at.with_timezone(&Utc)),
            Err(e) => {
                warn!(entity_type = E::COLLECTION, error = %e, "Invalid snapshot timestamp");
                None
            }
        }))
    }
}
