//! HTTP client for the remote catalog endpoint.

use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use super::error::CatalogError;
use super::service::CatalogFetcher;

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Client for the remote catalog service.
///
/// The catalog exposes a single read endpoint: `GET {base}/restaurants`
/// returning a JSON array of records.
#[derive(Clone)]
pub struct RemoteCatalog {
  client: Client,
  endpoint: Url,
}

impl RemoteCatalog {
  pub fn new(base_url: &str) -> Result<Self, CatalogError> {
    let base = Url::parse(base_url)
      .map_err(|e| CatalogError::RemoteFetchFailed(format!("invalid catalog url: {}", e)))?;
    let endpoint = base
      .join("restaurants")
      .map_err(|e| CatalogError::RemoteFetchFailed(format!("invalid catalog url: {}", e)))?;

    let client = Client::builder()
      .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
      .build()
      .map_err(|e| CatalogError::RemoteFetchFailed(format!("failed to build client: {}", e)))?;

    Ok(Self { client, endpoint })
  }

  /// Fetch the full record set from the remote catalog.
  pub async fn fetch_restaurants(&self) -> Result<Vec<super::types::Restaurant>, CatalogError> {
    let response = self
      .client
      .get(self.endpoint.clone())
      .send()
      .await
      .map_err(|e| CatalogError::RemoteFetchFailed(e.to_string()))?
      .error_for_status()
      .map_err(|e| CatalogError::RemoteFetchFailed(e.to_string()))?;

    response
      .json()
      .await
      .map_err(|e| CatalogError::RemoteFetchFailed(format!("invalid catalog response: {}", e)))
  }

  /// Package this client as a fetcher closure for `Catalog`.
  pub fn into_fetcher(self) -> CatalogFetcher {
    Arc::new(move || {
      let remote = self.clone();
      Box::pin(async move {
        remote
          .fetch_restaurants()
          .await
          .map_err(|e| e.to_string())
      })
    })
  }
}
