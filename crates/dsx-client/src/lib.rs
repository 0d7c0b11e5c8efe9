//! Catalog client for the entity-store emulator.
//!
//! The emulator only exposes lookup, run-query and commit. This crate
//! rebuilds a browsable catalog on top of them: namespace, kind and database
//! discovery, paged entity listings, single-entity writes, bulk delete by
//! kind and a whole-project export. Discovery results are cached per project
//! and invalidated by every write.

pub mod cache;
pub mod client;
pub mod config;
pub mod discovery;
pub mod entities;
pub mod errors;
pub mod export;
pub mod metadata;
pub mod mutations;
pub mod query;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use cache::{CacheEntry, CatalogCache, Clock, ManualClock, SystemClock, TtlCache};
pub use client::DatastoreClient;
pub use config::{ClientConfig, TransportTimeout};
pub use discovery::DATABASE_SAMPLE_KINDS;
pub use entities::{EntityPage, EntityQuery};
pub use errors::{DatastoreError, Result, ServerError};
pub use export::{CatalogExport, KindExport, NamespaceExport};
pub use metadata::{EntityCount, KindMetadata, KindMetadataTable};
pub use mutations::MUTATION_BATCH_LIMIT;
pub use transport::{DatastoreTransport, HttpTransport};

pub use dsx_protocol;
