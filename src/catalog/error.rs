use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
  /// The persistent store could not be opened or a storage operation
  /// failed. Fatal: every catalog operation depends on the store.
  #[error("local store unavailable: {0}")]
  StorageUnavailable(String),

  /// The remote catalog could not be fetched. Recoverable: callers
  /// holding local data keep serving it.
  #[error("remote catalog fetch failed: {0}")]
  RemoteFetchFailed(String),

  /// No record with the given id exists in the local store.
  #[error("restaurant with id '{0}' could not be found")]
  NotFound(String),
}

impl From<rusqlite::Error> for CatalogError {
  fn from(err: rusqlite::Error) -> Self {
    CatalogError::StorageUnavailable(err.to_string())
  }
}
