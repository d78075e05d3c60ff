//! Named response caches backed by SQLite.
//!
//! Each cache is a namespace of request-URL to response-snapshot
//! entries, keyed by `(cache_name, url)`. Writes overwrite, so a URL
//! has exactly one entry per namespace. Namespaces are disjoint: a new
//! cache version writes under a new name and never touches entries of
//! a superseded one.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use super::error::WorkerError;
use super::fetch::ResponseSnapshot;

const RESPONSE_CACHE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS response_cache (
    cache_name TEXT NOT NULL,
    url TEXT NOT NULL,
    status INTEGER NOT NULL,
    content_type TEXT,
    body BLOB NOT NULL,
    cached_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (cache_name, url)
);
"#;

/// Storage for named request/response caches.
pub struct ResponseCache {
  conn: Mutex<Connection>,
}

impl ResponseCache {
  /// Open or create the cache database at the default location.
  pub fn open_default() -> Result<Self, WorkerError> {
    Self::open(&Self::default_path()?)
  }

  /// Open or create the cache database at the given path.
  pub fn open(path: &Path) -> Result<Self, WorkerError> {
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).map_err(|e| {
        WorkerError::StorageUnavailable(format!("failed to create cache directory: {}", e))
      })?;
    }

    let conn = Connection::open(path).map_err(|e| {
      WorkerError::StorageUnavailable(format!(
        "failed to open response cache at {}: {}",
        path.display(),
        e
      ))
    })?;

    Self::from_connection(conn)
  }

  /// Open an in-memory cache database with the same schema.
  pub fn open_in_memory() -> Result<Self, WorkerError> {
    let conn = Connection::open_in_memory()?;
    Self::from_connection(conn)
  }

  fn from_connection(conn: Connection) -> Result<Self, WorkerError> {
    conn.execute_batch(RESPONSE_CACHE_SCHEMA)?;
    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  fn default_path() -> Result<PathBuf, WorkerError> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| {
        WorkerError::StorageUnavailable("could not determine data directory".to_string())
      })?;

    Ok(data_dir.join("restorevs").join("cache.db"))
  }

  fn lock(&self) -> Result<MutexGuard<'_, Connection>, WorkerError> {
    self
      .conn
      .lock()
      .map_err(|e| WorkerError::StorageUnavailable(format!("lock poisoned: {}", e)))
  }

  /// Look up the entry for a request URL in the named cache.
  pub fn get(&self, cache_name: &str, url: &str) -> Result<Option<ResponseSnapshot>, WorkerError> {
    let conn = self.lock()?;

    let row: Option<(u16, Option<String>, Vec<u8>)> = conn
      .query_row(
        "SELECT status, content_type, body FROM response_cache
         WHERE cache_name = ? AND url = ?",
        params![cache_name, url],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
      )
      .optional()?;

    Ok(row.map(|(status, content_type, body)| ResponseSnapshot {
      status,
      content_type,
      body,
    }))
  }

  /// Store an entry, overwriting any previous entry for the URL.
  pub fn put(
    &self,
    cache_name: &str,
    url: &str,
    response: &ResponseSnapshot,
  ) -> Result<(), WorkerError> {
    let conn = self.lock()?;

    conn.execute(
      "INSERT OR REPLACE INTO response_cache (cache_name, url, status, content_type, body, cached_at)
       VALUES (?, ?, ?, ?, ?, datetime('now'))",
      params![
        cache_name,
        url,
        response.status,
        response.content_type,
        response.body
      ],
    )?;

    Ok(())
  }

  /// Store a batch of entries in one transaction. Either every entry
  /// lands or none do.
  pub fn put_many(
    &self,
    cache_name: &str,
    entries: &[(String, ResponseSnapshot)],
  ) -> Result<(), WorkerError> {
    let mut conn = self.lock()?;
    let tx = conn.transaction()?;

    for (url, response) in entries {
      tx.execute(
        "INSERT OR REPLACE INTO response_cache (cache_name, url, status, content_type, body, cached_at)
         VALUES (?, ?, ?, ?, ?, datetime('now'))",
        params![
          cache_name,
          url,
          response.status,
          response.content_type,
          response.body
        ],
      )?;
    }

    tx.commit()?;
    Ok(())
  }

  /// Names of every cache namespace present in storage.
  pub fn cache_names(&self) -> Result<Vec<String>, WorkerError> {
    let conn = self.lock()?;

    let mut stmt =
      conn.prepare("SELECT DISTINCT cache_name FROM response_cache ORDER BY cache_name")?;
    let names = stmt
      .query_map([], |row| row.get(0))?
      .collect::<Result<Vec<String>, _>>()?;

    Ok(names)
  }

  /// Delete a cache namespace and every entry in it.
  pub fn delete_cache(&self, cache_name: &str) -> Result<(), WorkerError> {
    let conn = self.lock()?;
    conn.execute(
      "DELETE FROM response_cache WHERE cache_name = ?",
      params![cache_name],
    )?;
    Ok(())
  }

  /// Number of entries in the named cache.
  pub fn entry_count(&self, cache_name: &str) -> Result<usize, WorkerError> {
    let conn = self.lock()?;
    let count: i64 = conn.query_row(
      "SELECT COUNT(*) FROM response_cache WHERE cache_name = ?",
      params![cache_name],
      |row| row.get(0),
    )?;
    Ok(count as usize)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_get_miss() {
    let cache = ResponseCache::open_in_memory().unwrap();
    assert!(cache.get("a-v1", "http://x/index.html").unwrap().is_none());
  }

  #[test]
  fn test_put_overwrites_entry_for_same_url() {
    let cache = ResponseCache::open_in_memory().unwrap();
    let url = "http://x/index.html";

    cache
      .put("a-v1", url, &ResponseSnapshot::html("first"))
      .unwrap();
    cache
      .put("a-v1", url, &ResponseSnapshot::html("second"))
      .unwrap();

    let entry = cache.get("a-v1", url).unwrap().unwrap();
    assert_eq!(entry.body, b"second");
    assert_eq!(cache.entry_count("a-v1").unwrap(), 1);
  }

  #[test]
  fn test_namespaces_are_disjoint() {
    let cache = ResponseCache::open_in_memory().unwrap();
    let url = "http://x/index.html";

    cache
      .put("a-v1", url, &ResponseSnapshot::html("old"))
      .unwrap();
    cache
      .put("a-v2", url, &ResponseSnapshot::html("new"))
      .unwrap();

    assert_eq!(cache.get("a-v1", url).unwrap().unwrap().body, b"old");
    assert_eq!(cache.get("a-v2", url).unwrap().unwrap().body, b"new");
    assert_eq!(cache.cache_names().unwrap(), vec!["a-v1", "a-v2"]);
  }

  #[test]
  fn test_delete_cache_removes_only_that_namespace() {
    let cache = ResponseCache::open_in_memory().unwrap();
    let url = "http://x/index.html";

    cache
      .put("a-v1", url, &ResponseSnapshot::html("old"))
      .unwrap();
    cache
      .put("a-v2", url, &ResponseSnapshot::html("new"))
      .unwrap();
    cache.delete_cache("a-v1").unwrap();

    assert!(cache.get("a-v1", url).unwrap().is_none());
    assert!(cache.get("a-v2", url).unwrap().is_some());
  }

  #[test]
  fn test_put_many_is_atomic_batch() {
    let cache = ResponseCache::open_in_memory().unwrap();
    let entries = vec![
      ("http://x/a".to_string(), ResponseSnapshot::html("a")),
      ("http://x/b".to_string(), ResponseSnapshot::html("b")),
    ];

    cache.put_many("a-v1", &entries).unwrap();
    assert_eq!(cache.entry_count("a-v1").unwrap(), 2);
  }
}
