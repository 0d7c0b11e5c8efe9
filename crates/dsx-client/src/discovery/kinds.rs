use std::collections::BTreeSet;

use dsx_protocol::{KIND_META_KIND, is_reserved_kind};

use super::meta_entity_name;
use crate::cache::kinds_key;
use crate::client::DatastoreClient;
use crate::errors::Result;
use crate::query::QueryWindow;

impl DatastoreClient {
    /// Sorted, de-duplicated kind names in a namespace.
    ///
    /// With `database_id`, only kinds whose sampled entity lives in that
    /// database are kept. Any failure yields an empty listing.
    pub async fn list_kinds(
        &self,
        project_id: &str,
        namespace_id: Option<&str>,
        database_id: Option<&str>,
    ) -> Vec<String> {
        match self.fetch_kinds(project_id, namespace_id, database_id).await {
            Ok(kinds) => kinds,
            Err(error) => {
                tracing::warn!(project_id, namespace_id, database_id, %error, "kind discovery failed");
                Vec::new()
            }
        }
    }

    pub async fn fetch_kinds(
        &self,
        project_id: &str,
        namespace_id: Option<&str>,
        database_id: Option<&str>,
    ) -> Result<Vec<String>> {
        let cache_key = kinds_key(project_id, namespace_id, database_id);
        if let Some(kinds) = self.cache.get(&cache_key) {
            tracing::debug!(%cache_key, "cache hit");
            return Ok(kinds);
        }

        // `__kind__` rows carry no database, so this is always unfiltered.
        let page = self
            .run_query(project_id, namespace_id, KIND_META_KIND, QueryWindow::default())
            .await?;
        let discovered: BTreeSet<String> = page
            .entities
            .iter()
            .filter_map(meta_entity_name)
            .filter(|name| !name.is_empty() && !is_reserved_kind(name))
            .collect();

        let kinds: Vec<String> = match database_id {
            None => discovered.into_iter().collect(),
            Some(database_id) => {
                let candidates: Vec<String> = discovered.into_iter().collect();
                let sampled = self
                    .sample_each(&candidates, |kind| async move {
                        let page = self
                            .run_query(project_id, namespace_id, &kind, QueryWindow::limit(1))
                            .await?;
                        Ok(page
                            .entities
                            .first()
                            .is_some_and(|entity| entity.database_id() == database_id))
                    })
                    .await;
                let kept: BTreeSet<String> = sampled
                    .into_iter()
                    .filter_map(|(kind, matches)| matches.then_some(kind))
                    .collect();
                kept.into_iter().collect()
            }
        };

        self.cache.set(cache_key, kinds.clone());
        Ok(kinds)
    }
}
