//! Depth-first snapshot of namespaces, kinds and entities as one document.

use dsx_protocol::Entity;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::client::DatastoreClient;
use crate::entities::EntityQuery;
use crate::errors::{DatastoreError, Result};

/// Entities fetched per kind; the export does not page past this.
pub const EXPORT_ENTITY_LIMIT: u32 = 10_000;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogExport {
    pub project_id: String,
    /// RFC 3339, UTC.
    pub export_date: String,
    pub namespaces: Vec<NamespaceExport>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceExport {
    pub namespace_id: String,
    pub kinds: Vec<KindExport>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KindExport {
    pub kind: String,
    pub count: usize,
    pub entities: Vec<Entity>,
}

impl CatalogExport {
    pub fn entity_count(&self) -> usize {
        self.namespaces
            .iter()
            .flat_map(|namespace| &namespace.kinds)
            .map(|kind| kind.count)
            .sum()
    }
}

impl DatastoreClient {
    /// Walks one namespace, or all of them, into a [`CatalogExport`]. Any
    /// failure aborts the export; a partial document is never returned.
    pub async fn export_entities_as_json(
        &self,
        project_id: &str,
        namespace_id: Option<&str>,
    ) -> Result<CatalogExport> {
        let export_date = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|error| DatastoreError::Encode(error.to_string()))?;

        let namespaces = match namespace_id {
            Some(namespace_id) => vec![namespace_id.to_string()],
            None => self.fetch_namespaces(project_id, None).await?,
        };

        let mut exported = Vec::with_capacity(namespaces.len());
        for namespace_id in namespaces {
            let namespace = (!namespace_id.is_empty()).then_some(namespace_id.as_str());
            let kinds = self.fetch_kinds(project_id, namespace, None).await?;

            let mut kind_exports = Vec::with_capacity(kinds.len());
            for kind in kinds {
                let mut query = EntityQuery::new(kind.clone()).limit(EXPORT_ENTITY_LIMIT);
                query.namespace_id = namespace.map(ToString::to_string);
                let page = self.fetch_entities_by_kind(project_id, &query).await?;
                tracing::info!(
                    project_id,
                    namespace_id = %namespace_id,
                    kind = %kind,
                    entities = page.entities.len(),
                    "exported kind"
                );
                kind_exports.push(KindExport {
                    kind,
                    count: page.entities.len(),
                    entities: page.entities,
                });
            }
            exported.push(NamespaceExport {
                namespace_id,
                kinds: kind_exports,
            });
        }

        Ok(CatalogExport {
            project_id: project_id.to_string(),
            export_date,
            namespaces: exported,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeEmulator, PROJECT, RecordedCall, entity};
    use std::sync::Arc;

    fn emulator() -> Arc<FakeEmulator> {
        Arc::new(FakeEmulator::with_entities(vec![
            entity("", "", "Task", "a"),
            entity("", "", "Task", "b"),
            entity("", "", "User", "u"),
            entity("tenant", "", "Order", "o1"),
        ]))
    }

    #[tokio::test]
    async fn export_walks_every_namespace_and_kind() {
        let client = DatastoreClient::new(emulator());
        let export = client.export_entities_as_json(PROJECT, None).await.unwrap();

        assert_eq!(export.project_id, PROJECT);
        assert!(export.export_date.ends_with('Z'), "{}", export.export_date);
        let shape: Vec<(String, Vec<(String, usize)>)> = export
            .namespaces
            .iter()
            .map(|namespace| {
                (
                    namespace.namespace_id.clone(),
                    namespace
                        .kinds
                        .iter()
                        .map(|kind| (kind.kind.clone(), kind.count))
                        .collect(),
                )
            })
            .collect();
        assert_eq!(
            shape,
            vec![
                ("".to_string(), vec![("Task".to_string(), 2), ("User".to_string(), 1)]),
                ("tenant".to_string(), vec![("Order".to_string(), 1)]),
            ]
        );
        assert_eq!(export.entity_count(), 4);
    }

    #[tokio::test]
    async fn export_of_one_namespace_skips_namespace_discovery() {
        let emulator = emulator();
        let client = DatastoreClient::new(emulator.clone());
        let export = client
            .export_entities_as_json(PROJECT, Some("tenant"))
            .await
            .unwrap();

        assert_eq!(export.namespaces.len(), 1);
        assert_eq!(export.namespaces[0].kinds[0].entities.len(), 1);
        assert_eq!(
            emulator.queries(),
            vec![
                RecordedCall::query("tenant", "__kind__", None, None, None),
                RecordedCall::query("tenant", "Order", Some(EXPORT_ENTITY_LIMIT), None, None),
            ]
        );
    }

    #[tokio::test]
    async fn export_serializes_with_wire_field_names() {
        let client = DatastoreClient::new(emulator());
        let export = client
            .export_entities_as_json(PROJECT, Some("tenant"))
            .await
            .unwrap();
        let json = serde_json::to_value(&export).unwrap();
        assert_eq!(json["projectId"], "p");
        assert_eq!(json["namespaces"][0]["namespaceId"], "tenant");
        assert_eq!(json["namespaces"][0]["kinds"][0]["kind"], "Order");
        assert_eq!(json["namespaces"][0]["kinds"][0]["count"], 1);
    }

    #[tokio::test]
    async fn any_failure_aborts_the_export() {
        let emulator = emulator();
        emulator.fail_kind("User");
        let client = DatastoreClient::new(emulator);
        let error = client.export_entities_as_json(PROJECT, None).await.unwrap_err();
        assert!(error.to_string().contains("kind User is unavailable"));

        let emulator = Arc::new(FakeEmulator::default());
        emulator.fail_everything();
        let client = DatastoreClient::new(emulator);
        assert!(matches!(
            client.export_entities_as_json(PROJECT, None).await,
            Err(DatastoreError::Network(_))
        ));
    }
}
