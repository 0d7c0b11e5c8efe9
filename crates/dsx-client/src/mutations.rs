//! Single-entity writes and bulk delete-by-kind.
//!
//! Every successful write drops the project's cached catalog listings. Errors
//! are returned to the caller, never swallowed.

use dsx_protocol::{CommitRequest, CommitResponse, Entity, Key, Mutation};

use crate::client::DatastoreClient;
use crate::entities::EntityQuery;
use crate::errors::{DatastoreError, Result};

/// Most mutations the server accepts in one commit.
pub const MUTATION_BATCH_LIMIT: usize = 500;

/// The emulator only deletes keys in the default database.
fn ensure_default_database(database_id: Option<&str>) -> Result<()> {
    match database_id {
        Some(database_id) if !database_id.is_empty() => Err(DatastoreError::UnsupportedDatabase {
            database_id: database_id.to_string(),
        }),
        _ => Ok(()),
    }
}

impl DatastoreClient {
    /// Inserts `entity`; a server-allocated key replaces an incomplete one.
    pub async fn create_entity(&self, project_id: &str, entity: Entity) -> Result<Entity> {
        self.write_entity(project_id, Mutation::Insert(entity.clone()), entity)
            .await
    }

    pub async fn update_entity(&self, project_id: &str, entity: Entity) -> Result<Entity> {
        self.write_entity(project_id, Mutation::Update(entity.clone()), entity)
            .await
    }

    pub async fn upsert_entity(&self, project_id: &str, entity: Entity) -> Result<Entity> {
        self.write_entity(project_id, Mutation::Upsert(entity.clone()), entity)
            .await
    }

    async fn write_entity(
        &self,
        project_id: &str,
        mutation: Mutation,
        mut entity: Entity,
    ) -> Result<Entity> {
        let operation = mutation.operation();
        let response = self
            .commit_mutations(project_id, vec![mutation])
            .await
            .map_err(|error| DatastoreError::mutation(operation, error))?;
        self.invalidate_project(project_id);

        if let Some(key) = response
            .mutation_results
            .into_iter()
            .next()
            .and_then(|result| result.key)
        {
            entity.key = Some(key);
        }
        Ok(entity)
    }

    /// Deletes one entity. Keys in a named database are refused before any
    /// request is made; the database field is stripped from the rest.
    pub async fn delete_entity(&self, project_id: &str, key: &Key) -> Result<()> {
        ensure_default_database(Some(key.database_id()))?;
        self.commit_mutations(project_id, vec![Mutation::Delete(key.without_database())])
            .await
            .map_err(|error| DatastoreError::mutation("delete", error))?;
        self.invalidate_project(project_id);
        Ok(())
    }

    /// Deletes every entity of `kind`, committing at most
    /// [`MUTATION_BATCH_LIMIT`] deletes per request, one batch at a time.
    ///
    /// Returns how many entities were deleted. The first failing batch stops
    /// the run; earlier batches stay deleted and the error says how many.
    pub async fn delete_kind(
        &self,
        project_id: &str,
        kind: &str,
        namespace_id: Option<&str>,
        database_id: Option<&str>,
    ) -> Result<usize> {
        ensure_default_database(database_id)?;

        let keys = self
            .collect_keys(project_id, kind, namespace_id, database_id)
            .await
            .map_err(|error| DatastoreError::mutation("delete kind", error))?;
        if keys.is_empty() {
            return Ok(0);
        }

        let mut deleted = 0;
        for batch in keys.chunks(MUTATION_BATCH_LIMIT) {
            let mutations = batch.iter().cloned().map(Mutation::Delete).collect();
            if let Err(error) = self.commit_mutations(project_id, mutations).await {
                return Err(DatastoreError::PartialDelete {
                    kind: kind.to_string(),
                    deleted,
                    source: Box::new(error),
                });
            }
            deleted += batch.len();
            tracing::info!(project_id, kind, deleted, total = keys.len(), "deleted batch");
        }

        self.invalidate_project(project_id);
        Ok(deleted)
    }

    /// Walks every page of `kind` and returns delete-ready keys. Rows in a
    /// named database cannot be deleted and are left out.
    async fn collect_keys(
        &self,
        project_id: &str,
        kind: &str,
        namespace_id: Option<&str>,
        database_id: Option<&str>,
    ) -> Result<Vec<Key>> {
        let mut keys = Vec::new();
        let mut skipped = 0;
        let mut token: Option<String> = None;
        loop {
            let query = EntityQuery {
                kind: kind.to_string(),
                namespace_id: namespace_id.map(ToString::to_string),
                limit: Some(MUTATION_BATCH_LIMIT as u32),
                page_token: token.clone(),
                database_id: database_id.map(ToString::to_string),
            };
            let page = self.fetch_entities_by_kind(project_id, &query).await?;
            for key in page.entities.iter().filter_map(|entity| entity.key.as_ref()) {
                if key.database_id().is_empty() {
                    keys.push(key.without_database());
                } else {
                    skipped += 1;
                }
            }
            match page.next_page_token() {
                Some(next) if token.as_ref() != Some(&next) => token = Some(next),
                _ => break,
            }
        }
        if skipped > 0 {
            tracing::warn!(
                project_id,
                kind,
                skipped,
                "left entities in named databases untouched"
            );
        }
        Ok(keys)
    }

    async fn commit_mutations(
        &self,
        project_id: &str,
        mutations: Vec<Mutation>,
    ) -> Result<CommitResponse> {
        tracing::debug!(project_id, mutations = mutations.len(), "commit");
        self.transport
            .commit(project_id, CommitRequest::non_transactional(mutations))
            .await
    }
}
