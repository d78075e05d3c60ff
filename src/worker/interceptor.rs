//! Request interception over a versioned response cache.
//!
//! The interceptor owns one cache namespace, named from the prefix and
//! version constants. Install pre-populates it with the manifest,
//! activation purges superseded namespaces, and every intercepted
//! request is answered cache-first: a hit short-circuits the network,
//! a miss is fetched and snapshotted for next time, and a failed
//! detail-page request degrades to the pre-cached fallback document.

use futures::future;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

use super::error::WorkerError;
use super::fetch::{Fetcher, ResponseSnapshot};
use super::manifest::{
  build_manifest, cache_name, detail_page_url, is_detail_page, CACHE_PREFIX, FALLBACK_PAGE,
};
use super::store::ResponseCache;

/// How an intercepted request was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServedSource {
  /// An existing cache entry, no network involved
  Cache,
  /// A live network response, now also cached
  Network,
  /// The fallback document substituted for a failed detail-page request
  Fallback,
}

/// An intercepted request's result.
#[derive(Debug, Clone)]
pub struct Served {
  pub response: ResponseSnapshot,
  pub source: ServedSource,
}

/// Control message from the application page.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action")]
pub enum WorkerMessage {
  /// Pre-warm detail pages for the given restaurants.
  #[serde(rename = "cacheRestaurantSites")]
  CacheRestaurantSites { restaurants: Vec<RestaurantRef> },
}

/// A record reference inside a control message. Only the id matters;
/// other attributes the page sends along are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct RestaurantRef {
  pub id: i64,
}

/// Cache-first request interceptor for one cache version.
pub struct Interceptor {
  cache: Arc<ResponseCache>,
  base: Url,
  fetcher: Fetcher,
  cache_name: String,
}

impl Interceptor {
  pub fn new(cache: Arc<ResponseCache>, base: Url, fetcher: Fetcher) -> Self {
    Self {
      cache,
      base,
      fetcher,
      cache_name: cache_name(),
    }
  }

  /// Use a different cache version than the compiled-in constant.
  pub fn with_cache_version(mut self, version: &str) -> Self {
    self.cache_name = format!("{}-{}", CACHE_PREFIX, version);
    self
  }

  /// Pre-populate this version's namespace with the install manifest.
  ///
  /// All-or-nothing: every entry must fetch with a success status
  /// before anything is committed. On success the new version is ready
  /// to take over immediately — callers proceed straight to
  /// [`Interceptor::activate`] instead of waiting out the old one.
  pub async fn install(&self) -> Result<(), WorkerError> {
    let mut urls = Vec::new();
    for entry in build_manifest() {
      let url = self.base.join(&entry).map_err(|e| {
        WorkerError::ManifestInstallFailed {
          url: entry.clone(),
          reason: e.to_string(),
        }
      })?;
      urls.push(url.to_string());
    }

    let fetches = urls.into_iter().map(|url| {
      let fetch = (self.fetcher)(url.clone());
      async move {
        let response = fetch
          .await
          .map_err(|reason| WorkerError::ManifestInstallFailed {
            url: url.clone(),
            reason,
          })?;
        if !response.is_success() {
          return Err(WorkerError::ManifestInstallFailed {
            url,
            reason: format!("unexpected status {}", response.status),
          });
        }
        Ok((url, response))
      }
    });

    let entries = future::try_join_all(fetches).await?;
    self.cache.put_many(&self.cache_name, &entries)?;

    info!(
      cache = %self.cache_name,
      entries = entries.len(),
      "install complete, superseding previous versions"
    );
    Ok(())
  }

  /// Purge every cache namespace of this worker's prefix that does not
  /// match the current version, then take over request handling.
  pub fn activate(&self) -> Result<(), WorkerError> {
    let prefix = format!("{}-", CACHE_PREFIX);

    for name in self.cache.cache_names()? {
      if name.starts_with(&prefix) && name != self.cache_name {
        info!(cache = %name, "purging superseded cache");
        self.cache.delete_cache(&name)?;
      }
    }

    info!(cache = %self.cache_name, "activated");
    Ok(())
  }

  /// Answer an intercepted request.
  ///
  /// Cache-first by exact URL; a miss goes to the network and the
  /// response — whatever its status — is snapshotted under the request
  /// URL so the next identical request hits the cache. A transport
  /// failure substitutes the fallback document for detail-page
  /// requests and propagates for everything else.
  pub async fn handle(&self, url: &str) -> Result<Served, WorkerError> {
    if let Some(cached) = self.cache.get(&self.cache_name, url)? {
      return Ok(Served {
        response: cached,
        source: ServedSource::Cache,
      });
    }

    match (self.fetcher)(url.to_string()).await {
      Ok(response) => {
        self.cache.put(&self.cache_name, url, &response)?;
        debug!(url, "added new cache entry");
        Ok(Served {
          response,
          source: ServedSource::Network,
        })
      }
      Err(reason) => {
        if Url::parse(url).map(|u| is_detail_page(&u)).unwrap_or(false) {
          if let Some(fallback) = self.fallback_response()? {
            debug!(url, "serving fallback for unreachable detail page");
            return Ok(Served {
              response: fallback,
              source: ServedSource::Fallback,
            });
          }
        }
        Err(WorkerError::NetworkRequestFailed {
          url: url.to_string(),
          reason,
        })
      }
    }
  }

  /// Dispatch an inbound control message.
  pub async fn on_message(&self, message: WorkerMessage) -> Result<(), WorkerError> {
    match message {
      WorkerMessage::CacheRestaurantSites { restaurants } => {
        let ids: Vec<i64> = restaurants.iter().map(|r| r.id).collect();
        self.warm(&ids).await
      }
    }
  }

  /// Pre-populate detail-page entries for the given restaurant ids.
  ///
  /// Already-cached pages are skipped. A page that fails to fetch is
  /// skipped too — warming is best-effort per entry and sends no
  /// acknowledgement. Storage failures still propagate.
  pub async fn warm(&self, ids: &[i64]) -> Result<(), WorkerError> {
    for &id in ids {
      let url = match detail_page_url(&self.base, id) {
        Ok(url) => url.to_string(),
        Err(e) => {
          debug!(id, error = %e, "skipping unwarmable id");
          continue;
        }
      };

      if self.cache.get(&self.cache_name, &url)?.is_some() {
        continue;
      }

      match (self.fetcher)(url.clone()).await {
        Ok(response) if response.is_success() => {
          self.cache.put(&self.cache_name, &url, &response)?;
          debug!(url = %url, "warmed detail page");
        }
        Ok(response) => {
          debug!(url = %url, status = response.status as u64, "skipping warm entry");
        }
        Err(reason) => {
          debug!(url = %url, reason = %reason, "skipping warm entry");
        }
      }
    }

    Ok(())
  }

  fn fallback_response(&self) -> Result<Option<ResponseSnapshot>, WorkerError> {
    let url = match self.base.join(FALLBACK_PAGE) {
      Ok(url) => url.to_string(),
      Err(_) => return Ok(None),
    };
    self.cache.get(&self.cache_name, &url)
  }
}
