//! Cache-first request interception.
//!
//! The network-layer counterpart of the catalog: a versioned cache of
//! response snapshots, pre-populated from a static manifest at install
//! time, answering intercepted requests without freshness checks and
//! degrading failed detail-page requests to a fallback document.

mod error;
mod fetch;
mod interceptor;
mod manifest;
mod store;

pub use error::WorkerError;
pub use fetch::{network_fetcher, FetchFuture, Fetcher, ResponseSnapshot};
pub use interceptor::{Interceptor, RestaurantRef, Served, ServedSource, WorkerMessage};
pub use manifest::{
  build_manifest, cache_name, detail_page_url, is_detail_page, CACHE_PREFIX, CACHE_VERSION,
  DETAIL_PAGE, FALLBACK_PAGE, PHOTO_SUFFIXES,
};
pub use store::ResponseCache;
