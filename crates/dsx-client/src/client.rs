//! The catalog client: one transport, one discovery cache, shared metadata.
//!
//! Discovery, pagination, mutations and export are implemented as further
//! `impl DatastoreClient` blocks in their own modules.

use std::future::Future;
use std::sync::Arc;

use dsx_protocol::{
    AllocateIdsRequest, BeginTransactionRequest, Entity, Key, LookupRequest, RollbackRequest,
};
use futures::StreamExt;
use futures::stream;

use crate::cache::{CatalogCache, TtlCache, project_prefixes};
use crate::config::{ClientConfig, DEFAULT_FAN_OUT_CONCURRENCY};
use crate::errors::Result;
use crate::metadata::KindMetadataTable;
use crate::query::{QueryPage, QueryWindow, run_kind_query};
use crate::transport::{DatastoreTransport, HttpTransport};

/// Cheap to clone; clones share the transport, cache and metadata table.
#[derive(Clone)]
pub struct DatastoreClient {
    pub(crate) transport: Arc<dyn DatastoreTransport>,
    pub(crate) cache: Arc<dyn CatalogCache>,
    pub(crate) kind_metadata: KindMetadataTable,
    pub(crate) fan_out_concurrency: usize,
}

impl std::fmt::Debug for DatastoreClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatastoreClient")
            .field("fan_out_concurrency", &self.fan_out_concurrency)
            .finish_non_exhaustive()
    }
}

impl DatastoreClient {
    /// Client over `transport` with a default 30 s discovery cache.
    pub fn new(transport: Arc<dyn DatastoreTransport>) -> Self {
        Self {
            transport,
            cache: Arc::new(TtlCache::<Vec<String>>::default()),
            kind_metadata: KindMetadataTable::default(),
            fan_out_concurrency: DEFAULT_FAN_OUT_CONCURRENCY,
        }
    }

    /// HTTP client against `config.base_url`.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(config)?;
        Ok(Self::new(Arc::new(transport))
            .with_cache(Arc::new(TtlCache::<Vec<String>>::new(config.cache_ttl)))
            .with_fan_out_concurrency(config.fan_out_concurrency))
    }

    pub fn with_cache(mut self, cache: Arc<dyn CatalogCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_fan_out_concurrency(mut self, concurrency: usize) -> Self {
        self.fan_out_concurrency = concurrency.max(1);
        self
    }

    pub fn cache(&self) -> &Arc<dyn CatalogCache> {
        &self.cache
    }

    pub fn kind_metadata(&self) -> &KindMetadataTable {
        &self.kind_metadata
    }

    pub(crate) async fn run_query(
        &self,
        project_id: &str,
        namespace_id: Option<&str>,
        kind: &str,
        window: QueryWindow,
    ) -> Result<QueryPage> {
        run_kind_query(
            self.transport.as_ref(),
            project_id,
            namespace_id,
            kind,
            window,
        )
        .await
    }

    /// Runs `sample` once per name with at most `fan_out_concurrency` in
    /// flight and waits for all of them. A failing sample is logged and
    /// contributes nothing; it never fails the batch.
    pub(crate) async fn sample_each<T, F, Fut>(&self, names: &[String], sample: F) -> Vec<(String, T)>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        stream::iter(names.iter().cloned().map(|name| {
            let pending = sample(name.clone());
            async move { (name, pending.await) }
        }))
        .buffer_unordered(self.fan_out_concurrency)
        .filter_map(|(name, outcome)| async move {
            match outcome {
                Ok(value) => Some((name, value)),
                Err(error) => {
                    tracing::warn!(kind = %name, %error, "sampling query failed; skipping kind");
                    None
                }
            }
        })
        .collect()
        .await
    }

    /// Drops every cached listing for `project_id`.
    pub(crate) fn invalidate_project(&self, project_id: &str) {
        tracing::debug!(project_id, "clearing discovery cache");
        for prefix in project_prefixes(project_id) {
            self.cache.clear_prefix(&prefix);
        }
    }

    /// Looks up one entity by key. Errors are logged and read as `None`.
    pub async fn get_entity(&self, project_id: &str, key: &Key) -> Option<Entity> {
        match self.fetch_entity(project_id, key).await {
            Ok(found) => found,
            Err(error) => {
                tracing::warn!(project_id, %error, "lookup failed");
                None
            }
        }
    }

    pub async fn fetch_entity(&self, project_id: &str, key: &Key) -> Result<Option<Entity>> {
        let response = self
            .transport
            .lookup(
                project_id,
                LookupRequest {
                    keys: vec![key.clone()],
                },
            )
            .await?;
        Ok(response.found.into_iter().next().map(|result| result.entity))
    }

    /// True when the emulator answers its root endpoint.
    pub async fn health_check(&self) -> bool {
        match self.transport.ping().await {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!(%error, "health check failed");
                false
            }
        }
    }

    pub async fn begin_transaction(&self, project_id: &str) -> Result<String> {
        let response = self
            .transport
            .begin_transaction(project_id, BeginTransactionRequest::default())
            .await?;
        Ok(response.transaction)
    }

    pub async fn rollback(&self, project_id: &str, transaction: impl Into<String>) -> Result<()> {
        self.transport
            .rollback(
                project_id,
                RollbackRequest {
                    transaction: transaction.into(),
                },
            )
            .await?;
        Ok(())
    }

    /// Completes the final path element of each incomplete key.
    pub async fn allocate_ids(&self, project_id: &str, keys: Vec<Key>) -> Result<Vec<Key>> {
        let response = self
            .transport
            .allocate_ids(project_id, AllocateIdsRequest { keys })
            .await?;
        Ok(response.keys)
    }
}
