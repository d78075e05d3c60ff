//! Catalog service: local-first reads with background remote refresh.
//!
//! Reads always answer from the local store first. A forced refresh
//! fetches the remote record set in the background, replaces the local
//! snapshot wholesale (remote wins, no merging) and reports the fresh
//! set as a second, `Source::Remote`-tagged snapshot. A failed refresh
//! downgrades to the stale local snapshot with the error attached, so
//! callers holding local data never see a refresh error as fatal.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

use super::error::CatalogError;
use super::store::CatalogStore;
use super::types::{Restaurant, Snapshot};

/// A boxed future producing the remote record set.
pub type FetchFuture = Pin<Box<dyn Future<Output = Result<Vec<Restaurant>, String>> + Send>>;

/// Factory for remote fetch futures, invoked once per forced refresh.
pub type CatalogFetcher = Arc<dyn Fn() -> FetchFuture + Send + Sync>;

/// Two-phase snapshot channel returned by [`Catalog::get_all`].
pub type SnapshotStream = mpsc::UnboundedReceiver<Result<Snapshot, CatalogError>>;

/// Local-first view of the restaurant catalog.
pub struct Catalog {
  store: Arc<CatalogStore>,
  fetcher: CatalogFetcher,
}

impl Catalog {
  pub fn new(store: CatalogStore, fetcher: CatalogFetcher) -> Self {
    Self {
      store: Arc::new(store),
      fetcher,
    }
  }

  /// Read the catalog, optionally refreshing from the remote service.
  ///
  /// The returned channel yields the local snapshot first. When
  /// `refresh` is set it yields a second snapshot once the remote
  /// round trip settles: the fresh record set on success, or the stale
  /// local one carrying `refresh_error` on failure. The store is fully
  /// replaced before the fresh snapshot is sent.
  ///
  /// Store failures are terminal and arrive as `Err`.
  pub fn get_all(&self, refresh: bool) -> SnapshotStream {
    let (tx, rx) = mpsc::unbounded_channel();
    let store = Arc::clone(&self.store);
    let fetcher = Arc::clone(&self.fetcher);

    tokio::spawn(async move {
      let local = match store.get_all() {
        Ok(records) => records,
        Err(e) => {
          let _ = tx.send(Err(e));
          return;
        }
      };

      if !refresh {
        let _ = tx.send(Ok(Snapshot::local(local)));
        return;
      }

      let _ = tx.send(Ok(Snapshot::local(local.clone())));

      match (fetcher)().await {
        Ok(records) => {
          if let Err(e) = store.replace_all(&records) {
            let _ = tx.send(Err(e));
            return;
          }
          let _ = tx.send(Ok(Snapshot::remote(records)));
        }
        Err(e) => {
          warn!(error = %e, "remote refresh failed, serving local snapshot");
          let _ = tx.send(Ok(Snapshot::stale(local, e)));
        }
      }
    });

    rx
  }

  /// Like [`Catalog::get_all`], but waits for the definitive snapshot:
  /// the refreshed set when refreshing, the local one otherwise.
  pub async fn get_all_now(&self, refresh: bool) -> Result<Snapshot, CatalogError> {
    let mut rx = self.get_all(refresh);

    let mut last = None;
    while let Some(result) = rx.recv().await {
      last = Some(result?);
    }

    last.ok_or_else(|| CatalogError::StorageUnavailable("snapshot channel closed".to_string()))
  }

  /// Look up a record by id in the local store.
  pub fn get_by_id(&self, id: i64) -> Result<Restaurant, CatalogError> {
    self
      .store
      .get(id)?
      .ok_or_else(|| CatalogError::NotFound(id.to_string()))
  }

  /// Look up a record by a raw, unvalidated id such as a query-string
  /// parameter. A malformed id is treated as no match, not an error.
  pub fn get_by_raw_id(&self, raw: &str) -> Result<Restaurant, CatalogError> {
    match raw.trim().parse::<i64>() {
      Ok(id) => self.get_by_id(id),
      Err(_) => Err(CatalogError::NotFound(raw.to_string())),
    }
  }

  /// Records matching the given cuisine and/or neighborhood. `None`
  /// leaves that attribute unconstrained. Filtering is a client-side
  /// scan over the full local set; the catalog is small enough that an
  /// indexed path isn't warranted.
  pub async fn get_by_filter(
    &self,
    cuisine: Option<&str>,
    neighborhood: Option<&str>,
  ) -> Result<Vec<Restaurant>, CatalogError> {
    let snapshot = self.get_all_now(false).await?;

    Ok(
      snapshot
        .records
        .into_iter()
        .filter(|r| cuisine.map_or(true, |c| r.cuisine_type == c))
        .filter(|r| neighborhood.map_or(true, |n| r.neighborhood == n))
        .collect(),
    )
  }

  /// Unique neighborhoods across all records, first occurrence first.
  pub async fn distinct_neighborhoods(&self) -> Result<Vec<String>, CatalogError> {
    let snapshot = self.get_all_now(false).await?;
    Ok(distinct_preserving_order(
      snapshot.records.into_iter().map(|r| r.neighborhood),
    ))
  }

  /// Unique cuisines across all records, first occurrence first.
  pub async fn distinct_cuisines(&self) -> Result<Vec<String>, CatalogError> {
    let snapshot = self.get_all_now(false).await?;
    Ok(distinct_preserving_order(
      snapshot.records.into_iter().map(|r| r.cuisine_type),
    ))
  }
}

impl Clone for Catalog {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      fetcher: Arc::clone(&self.fetcher),
    }
  }
}

/// Deduplicate, keeping the first occurrence of each value in order.
fn distinct_preserving_order<I: IntoIterator<Item = String>>(values: I) -> Vec<String> {
  let mut seen = HashSet::new();
  let mut out = Vec::new();
  for value in values {
    if seen.insert(value.clone()) {
      out.push(value);
    }
  }
  out
}
