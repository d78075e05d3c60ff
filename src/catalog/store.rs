//! Persistent catalog store backed by SQLite.
//!
//! One table keyed by restaurant id, holding each record as serialized
//! JSON. The schema carries a version marker: bumping `SCHEMA_VERSION`
//! drops and recreates the table on the next open. There is no data
//! migration in this design — the store is a cache and the next
//! refresh repopulates it.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::info;

use super::error::CatalogError;
use super::types::Restaurant;

/// Bump to force the object store to be recreated on open.
pub const SCHEMA_VERSION: i64 = 1;

const CATALOG_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS schema_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS restaurants (
    id INTEGER PRIMARY KEY,
    data BLOB NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

/// Owned handle to the catalog object store.
///
/// Created once by an `open*` constructor and injected into whatever
/// needs it; all operations go through the internal connection lock.
pub struct CatalogStore {
  conn: Mutex<Connection>,
}

impl CatalogStore {
  /// Open or create the store at the default location.
  pub fn open_default() -> Result<Self, CatalogError> {
    Self::open(&Self::default_path()?)
  }

  /// Open or create the store at the given path.
  pub fn open(path: &Path) -> Result<Self, CatalogError> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).map_err(|e| {
        CatalogError::StorageUnavailable(format!("failed to create store directory: {}", e))
      })?;
    }

    let conn = Connection::open(path).map_err(|e| {
      CatalogError::StorageUnavailable(format!(
        "failed to open catalog store at {}: {}",
        path.display(),
        e
      ))
    })?;

    Self::from_connection(conn)
  }

  /// Open an in-memory store with the same schema. Nothing persists
  /// beyond the handle's lifetime.
  pub fn open_in_memory() -> Result<Self, CatalogError> {
    let conn = Connection::open_in_memory()?;
    Self::from_connection(conn)
  }

  fn from_connection(conn: Connection) -> Result<Self, CatalogError> {
    conn.execute_batch(CATALOG_SCHEMA)?;
    apply_schema_version(&conn, SCHEMA_VERSION)?;
    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  fn default_path() -> Result<PathBuf, CatalogError> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| {
        CatalogError::StorageUnavailable("could not determine data directory".to_string())
      })?;

    Ok(data_dir.join("restorevs").join("catalog.db"))
  }

  fn lock(&self) -> Result<MutexGuard<'_, Connection>, CatalogError> {
    self
      .conn
      .lock()
      .map_err(|e| CatalogError::StorageUnavailable(format!("lock poisoned: {}", e)))
  }

  /// All records in the store, ordered by id.
  pub fn get_all(&self) -> Result<Vec<Restaurant>, CatalogError> {
    let conn = self.lock()?;

    let mut stmt = conn.prepare("SELECT data FROM restaurants ORDER BY id")?;
    let rows = stmt.query_map([], |row| row.get::<_, Vec<u8>>(0))?;

    let mut records = Vec::new();
    for row in rows {
      let data = row?;
      let record: Restaurant = serde_json::from_slice(&data).map_err(|e| {
        CatalogError::StorageUnavailable(format!("failed to deserialize record: {}", e))
      })?;
      records.push(record);
    }

    Ok(records)
  }

  /// Look up a single record by id.
  pub fn get(&self, id: i64) -> Result<Option<Restaurant>, CatalogError> {
    let conn = self.lock()?;

    let data: Option<Vec<u8>> = conn
      .query_row(
        "SELECT data FROM restaurants WHERE id = ?",
        params![id],
        |row| row.get(0),
      )
      .optional()?;

    match data {
      Some(data) => {
        let record = serde_json::from_slice(&data).map_err(|e| {
          CatalogError::StorageUnavailable(format!("failed to deserialize record: {}", e))
        })?;
        Ok(Some(record))
      }
      None => Ok(None),
    }
  }

  /// Replace the entire contents of the store with the given records.
  ///
  /// Clear and bulk insert run in one transaction, so readers observe
  /// either the previous snapshot or the new one, never a mix.
  pub fn replace_all(&self, records: &[Restaurant]) -> Result<(), CatalogError> {
    let mut conn = self.lock()?;
    let tx = conn.transaction()?;

    tx.execute("DELETE FROM restaurants", [])?;
    for record in records {
      let data = serde_json::to_vec(record).map_err(|e| {
        CatalogError::StorageUnavailable(format!("failed to serialize record: {}", e))
      })?;
      tx.execute(
        "INSERT INTO restaurants (id, data, cached_at) VALUES (?, ?, datetime('now'))",
        params![record.id, data],
      )?;
    }

    tx.commit()?;
    Ok(())
  }
}

/// Recreate the object store when the stored schema version differs
/// from `version`, then record `version` as current.
fn apply_schema_version(conn: &Connection, version: i64) -> Result<(), CatalogError> {
  let stored: Option<i64> = conn
    .query_row("SELECT version FROM schema_meta WHERE id = 1", [], |row| {
      row.get(0)
    })
    .optional()?;

  match stored {
    None => {
      conn.execute(
        "INSERT INTO schema_meta (id, version) VALUES (1, ?)",
        params![version],
      )?;
    }
    Some(v) if v != version => {
      info!(from = v, to = version, "schema version changed, recreating object store");
      conn.execute("DROP TABLE restaurants", [])?;
      conn.execute_batch(CATALOG_SCHEMA)?;
      conn.execute(
        "UPDATE schema_meta SET version = ? WHERE id = 1",
        params![version],
      )?;
    }
    Some(_) => {}
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn record(id: i64, name: &str) -> Restaurant {
    Restaurant {
      id,
      name: name.to_string(),
      cuisine_type: "Asian".to_string(),
      neighborhood: "Manhattan".to_string(),
      photograph: None,
      latlng: None,
      extra: serde_json::Map::new(),
    }
  }

  #[test]
  fn test_get_on_empty_store() {
    let store = CatalogStore::open_in_memory().unwrap();
    assert!(store.get(1).unwrap().is_none());
    assert!(store.get_all().unwrap().is_empty());
  }

  #[test]
  fn test_replace_all_and_get() {
    let store = CatalogStore::open_in_memory().unwrap();
    store
      .replace_all(&[record(1, "one"), record(2, "two")])
      .unwrap();

    let found = store.get(2).unwrap().unwrap();
    assert_eq!(found.name, "two");
    assert_eq!(store.get_all().unwrap().len(), 2);
  }

  #[test]
  fn test_replace_all_supersedes_previous_snapshot() {
    let store = CatalogStore::open_in_memory().unwrap();
    store
      .replace_all(&[record(1, "one"), record(2, "two")])
      .unwrap();
    store.replace_all(&[record(3, "three")]).unwrap();

    // No record with a now-removed id remains
    assert!(store.get(1).unwrap().is_none());
    assert!(store.get(2).unwrap().is_none());

    let all = store.get_all().unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, 3);
  }

  #[test]
  fn test_version_bump_recreates_store() {
    let store = CatalogStore::open_in_memory().unwrap();
    store.replace_all(&[record(1, "one")]).unwrap();

    {
      let conn = store.lock().unwrap();
      apply_schema_version(&conn, SCHEMA_VERSION + 1).unwrap();
    }

    // The bump cleared the data, not migrated it
    assert!(store.get_all().unwrap().is_empty());

    // Reapplying the same version is a no-op
    {
      let conn = store.lock().unwrap();
      apply_schema_version(&conn, SCHEMA_VERSION + 1).unwrap();
    }
    assert!(store.get_all().unwrap().is_empty());
  }
}
