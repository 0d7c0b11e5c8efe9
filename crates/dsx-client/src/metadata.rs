//! Per-kind metadata for list views, with background count refinement.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Serialize, Serializer};
use tokio::task::JoinHandle;

use crate::client::DatastoreClient;
use crate::entities::EntityQuery;
use crate::errors::Result;
use crate::query::QueryWindow;

/// Counts stop here; anything above reads as `100+`.
pub const ENTITY_COUNT_CAP: u32 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityCount {
    Exact(u32),
    AtLeast(u32),
}

impl Default for EntityCount {
    fn default() -> Self {
        Self::Exact(0)
    }
}

impl EntityCount {
    fn from_sample(rows: usize) -> Self {
        match u32::try_from(rows) {
            Ok(rows) if rows <= ENTITY_COUNT_CAP => Self::Exact(rows),
            _ => Self::AtLeast(ENTITY_COUNT_CAP),
        }
    }
}

impl fmt::Display for EntityCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(count) => write!(f, "{count}"),
            Self::AtLeast(count) => write!(f, "{count}+"),
        }
    }
}

impl Serialize for EntityCount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Exact(count) => serializer.serialize_u32(*count),
            Self::AtLeast(_) => serializer.collect_str(self),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KindMetadata {
    pub name: String,
    pub entity_count: EntityCount,
    pub namespace: String,
}

type MetadataKey = (String, String, String);

/// Shared `(project, namespace, kind) -> metadata` table. Writers race with
/// last-write-wins; counts are estimates anyway.
#[derive(Clone, Debug, Default)]
pub struct KindMetadataTable {
    entries: Arc<RwLock<HashMap<MetadataKey, KindMetadata>>>,
}

impl KindMetadataTable {
    pub fn get(&self, project_id: &str, namespace: &str, kind: &str) -> Option<KindMetadata> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(&(project_id.to_string(), namespace.to_string(), kind.to_string()))
            .cloned()
    }

    /// Everything recorded for one namespace, sorted by kind name.
    pub fn list(&self, project_id: &str, namespace: &str) -> Vec<KindMetadata> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut kinds: Vec<KindMetadata> = entries
            .iter()
            .filter(|((project, ns, _), _)| project == project_id && ns == namespace)
            .map(|(_, metadata)| metadata.clone())
            .collect();
        kinds.sort_by(|a, b| a.name.cmp(&b.name));
        kinds
    }

    pub fn record(&self, project_id: &str, metadata: KindMetadata) {
        let key = (
            project_id.to_string(),
            metadata.namespace.clone(),
            metadata.name.clone(),
        );
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, metadata);
    }

    fn set_count(&self, project_id: &str, namespace: &str, kind: &str, count: EntityCount) {
        let key = (project_id.to_string(), namespace.to_string(), kind.to_string());
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries
            .entry(key)
            .and_modify(|metadata| metadata.entity_count = count)
            .or_insert_with(|| KindMetadata {
                name: kind.to_string(),
                entity_count: count,
                namespace: namespace.to_string(),
            });
    }
}

impl DatastoreClient {
    /// Kind listing with zero counts, recorded in [`Self::kind_metadata`].
    pub async fn list_kind_metadata(
        &self,
        project_id: &str,
        namespace_id: Option<&str>,
        database_id: Option<&str>,
    ) -> Vec<KindMetadata> {
        let namespace = namespace_id.unwrap_or_default().to_string();
        let kinds = self.list_kinds(project_id, namespace_id, database_id).await;
        kinds
            .into_iter()
            .map(|name| {
                let metadata = KindMetadata {
                    name,
                    entity_count: EntityCount::default(),
                    namespace: namespace.clone(),
                };
                self.kind_metadata.record(project_id, metadata.clone());
                metadata
            })
            .collect()
    }

    /// Spawns a detached task that samples up to `ENTITY_COUNT_CAP + 1` rows
    /// per kind and writes the resulting counts into the metadata table.
    ///
    /// With `database_id`, only rows in that database are counted, using the
    /// same over-fetch window as filtered entity pages.
    ///
    /// The task swallows its own failures. Dropping the handle is fine.
    pub fn refine_kind_counts(
        &self,
        project_id: &str,
        namespace_id: Option<&str>,
        database_id: Option<&str>,
        kinds: Vec<String>,
    ) -> JoinHandle<()> {
        let client = self.clone();
        let project_id = project_id.to_string();
        let namespace = namespace_id.unwrap_or_default().to_string();
        let database = database_id.map(ToString::to_string);
        tokio::spawn(async move {
            let namespace_filter = Some(namespace.as_str());
            let database_filter = database.as_deref();
            let counts = client
                .sample_each(&kinds, |kind| {
                    let client = &client;
                    let project_id = project_id.as_str();
                    async move {
                        client
                            .sample_count(project_id, namespace_filter, database_filter, &kind)
                            .await
                    }
                })
                .await;
            for (kind, count) in counts {
                client
                    .kind_metadata
                    .set_count(&project_id, &namespace, &kind, count);
            }
            tracing::debug!(
                project_id,
                namespace,
                database = database_filter,
                "kind counts refined"
            );
        })
    }

    async fn sample_count(
        &self,
        project_id: &str,
        namespace_id: Option<&str>,
        database_id: Option<&str>,
        kind: &str,
    ) -> Result<EntityCount> {
        let Some(database_id) = database_id else {
            let page = self
                .run_query(
                    project_id,
                    namespace_id,
                    kind,
                    QueryWindow::limit(ENTITY_COUNT_CAP + 1),
                )
                .await?;
            return Ok(EntityCount::from_sample(page.entities.len()));
        };

        let mut query = EntityQuery::new(kind)
            .database(database_id)
            .limit(ENTITY_COUNT_CAP + 1);
        query.namespace_id = namespace_id.map(ToString::to_string);
        let page = self.fetch_entities_by_kind(project_id, &query).await?;
        match EntityCount::from_sample(page.entities.len()) {
            // Rows past the over-fetched window were never inspected.
            EntityCount::Exact(seen) if page.next_offset.is_some() => {
                Ok(EntityCount::AtLeast(seen))
            }
            count => Ok(count),
        }
    }
}
