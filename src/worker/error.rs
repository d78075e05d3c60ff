use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkerError {
  /// The response cache could not be opened or a storage operation
  /// failed. Fatal to the interception layer.
  #[error("response cache unavailable: {0}")]
  StorageUnavailable(String),

  /// Pre-population of the manifest failed. Install is all-or-nothing:
  /// a single failed entry leaves the cache namespace untouched.
  #[error("manifest install failed for '{url}': {reason}")]
  ManifestInstallFailed { url: String, reason: String },

  /// A network request failed with no cached entry and no fallback
  /// eligibility. Surfaced verbatim to the requester.
  #[error("request for '{url}' failed: {reason}")]
  NetworkRequestFailed { url: String, reason: String },
}

impl From<rusqlite::Error> for WorkerError {
  fn from(err: rusqlite::Error) -> Self {
    WorkerError::StorageUnavailable(err.to_string())
  }
}
