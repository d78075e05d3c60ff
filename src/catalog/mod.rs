//! Local-first restaurant catalog.
//!
//! A persistent object store mirrors the remote catalog; reads are
//! served from the local snapshot and a forced refresh replaces it
//! wholesale from the network (stale-while-revalidate, remote wins).

mod error;
mod remote;
mod service;
mod store;
mod types;

pub use error::CatalogError;
pub use remote::RemoteCatalog;
pub use service::{Catalog, CatalogFetcher, FetchFuture, SnapshotStream};
pub use store::CatalogStore;
pub use types::{LatLng, Restaurant, Snapshot, Source, PLACEHOLDER_PHOTO};
