use std::collections::BTreeSet;

use dsx_protocol::NAMESPACE_META_KIND;

use super::meta_entity_name;
use crate::cache::namespaces_key;
use crate::client::DatastoreClient;
use crate::errors::Result;
use crate::query::QueryWindow;

impl DatastoreClient {
    /// Namespace ids in the project, always including the default `""`.
    pub async fn list_namespaces(&self, project_id: &str, database_id: Option<&str>) -> Vec<String> {
        match self.fetch_namespaces(project_id, database_id).await {
            Ok(namespaces) => namespaces,
            Err(error) => {
                tracing::warn!(project_id, database_id, %error, "namespace discovery failed");
                vec![String::new()]
            }
        }
    }

    pub async fn fetch_namespaces(
        &self,
        project_id: &str,
        database_id: Option<&str>,
    ) -> Result<Vec<String>> {
        let cache_key = namespaces_key(project_id, database_id);
        if let Some(namespaces) = self.cache.get(&cache_key) {
            tracing::debug!(%cache_key, "cache hit");
            return Ok(namespaces);
        }

        // Namespaces are what is being enumerated, so the query is project-wide.
        let page = self
            .run_query(project_id, None, NAMESPACE_META_KIND, QueryWindow::default())
            .await?;

        let mut namespaces = BTreeSet::from([String::new()]);
        for entity in &page.entities {
            if database_id.is_some_and(|database_id| entity.database_id() != database_id) {
                continue;
            }
            if let Some(name) = meta_entity_name(entity) {
                namespaces.insert(name);
            }
        }

        let namespaces: Vec<String> = namespaces.into_iter().collect();
        self.cache.set(cache_key, namespaces.clone());
        Ok(namespaces)
    }
}
