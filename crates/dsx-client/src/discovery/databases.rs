use std::collections::BTreeSet;

use crate::cache::databases_key;
use crate::client::DatastoreClient;
use crate::errors::Result;
use crate::query::QueryWindow;

/// How many kinds are sampled when looking for database ids.
pub const DATABASE_SAMPLE_KINDS: usize = 3;
const DATABASE_SAMPLE_ROWS: u32 = 10;

impl DatastoreClient {
    /// Database ids observed in a sample of real entities. Always non-empty:
    /// `[""]` (the default database) when nothing else is seen or on failure.
    pub async fn list_databases(&self, project_id: &str, namespace_id: Option<&str>) -> Vec<String> {
        match self.fetch_databases(project_id, namespace_id).await {
            Ok(databases) => databases,
            Err(error) => {
                tracing::warn!(project_id, namespace_id, %error, "database discovery failed");
                vec![String::new()]
            }
        }
    }

    pub async fn fetch_databases(
        &self,
        project_id: &str,
        namespace_id: Option<&str>,
    ) -> Result<Vec<String>> {
        let cache_key = databases_key(project_id, namespace_id);
        if let Some(databases) = self.cache.get(&cache_key) {
            tracing::debug!(%cache_key, "cache hit");
            return Ok(databases);
        }

        let kinds = self.fetch_kinds(project_id, namespace_id, None).await?;
        if kinds.is_empty() {
            return Ok(vec![String::new()]);
        }

        let sample: Vec<String> = kinds.into_iter().take(DATABASE_SAMPLE_KINDS).collect();
        let observed = self
            .sample_each(&sample, |kind| async move {
                let page = self
                    .run_query(
                        project_id,
                        namespace_id,
                        &kind,
                        QueryWindow::limit(DATABASE_SAMPLE_ROWS),
                    )
                    .await?;
                Ok(page
                    .entities
                    .iter()
                    .filter(|entity| namespace_id.is_none_or(|ns| entity.namespace_id() == ns))
                    .map(|entity| entity.database_id().to_string())
                    .collect::<Vec<_>>())
            })
            .await;

        let mut databases: BTreeSet<String> = observed
            .into_iter()
            .flat_map(|(_, databases)| databases)
            .collect();
        if databases.is_empty() {
            databases.insert(String::new());
        }
        let databases: Vec<String> = databases.into_iter().collect();
        self.cache.set(cache_key, databases.clone());
        Ok(databases)
    }
}
