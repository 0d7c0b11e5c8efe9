//! Paged entity listings for one kind.
//!
//! Without a database filter, paging is cursor-based and fully server-side.
//! With one, the server cannot scope the query, so rows are over-fetched with
//! an offset and filtered here; cursors would point into the unfiltered
//! stream and are never handed out in that mode.

use dsx_protocol::Entity;
use serde::{Deserialize, Serialize};

use crate::client::DatastoreClient;
use crate::errors::Result;
use crate::query::QueryWindow;

/// Rows requested per wanted row when filtering by database client-side.
pub const OVER_FETCH_FACTOR: u32 = 3;
/// Ceiling on a single over-fetching request.
pub const MAX_FILTERED_FETCH: u32 = 5_000;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntityQuery {
    pub kind: String,
    pub namespace_id: Option<String>,
    pub limit: Option<u32>,
    /// Cursor when unfiltered, decimal offset when `database_id` is set.
    pub page_token: Option<String>,
    pub database_id: Option<String>,
}

impl EntityQuery {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    pub fn namespace(mut self, namespace_id: impl Into<String>) -> Self {
        self.namespace_id = Some(namespace_id.into());
        self
    }

    pub fn database(mut self, database_id: impl Into<String>) -> Self {
        self.database_id = Some(database_id.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn page_token(mut self, token: impl Into<String>) -> Self {
        self.page_token = Some(token.into());
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityPage {
    pub entities: Vec<Entity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_cursor: Option<String>,
    /// Under database filtering this is a heuristic: the server reported more
    /// unfiltered rows and the filtered page came back full. It can be wrong
    /// in both directions.
    pub has_more: bool,
    /// Offset just past the last raw row that fed this page, set only under
    /// database filtering while rows may remain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_offset: Option<u32>,
}

impl EntityPage {
    /// Token that continues after this page, if there is one to follow.
    pub fn next_page_token(&self) -> Option<String> {
        match (&self.end_cursor, self.next_offset) {
            (Some(cursor), _) if self.has_more => Some(cursor.clone()),
            (_, Some(offset)) => Some(offset.to_string()),
            _ => None,
        }
    }
}

impl DatastoreClient {
    /// One page of `query.kind`. Failures read as an empty, final page, the
    /// same as a kind that does not exist.
    pub async fn get_entities_by_kind(&self, project_id: &str, query: &EntityQuery) -> EntityPage {
        match self.fetch_entities_by_kind(project_id, query).await {
            Ok(page) => page,
            Err(error) => {
                tracing::warn!(project_id, kind = %query.kind, %error, "entity listing failed");
                EntityPage::default()
            }
        }
    }

    pub async fn fetch_entities_by_kind(
        &self,
        project_id: &str,
        query: &EntityQuery,
    ) -> Result<EntityPage> {
        let namespace_id = query.namespace_id.as_deref();
        let Some(database_id) = query.database_id.as_deref() else {
            let window = QueryWindow {
                limit: query.limit,
                offset: None,
                start_cursor: query.page_token.clone(),
            };
            let page = self
                .run_query(project_id, namespace_id, &query.kind, window)
                .await?;
            return Ok(EntityPage {
                entities: page.entities,
                end_cursor: page.end_cursor,
                has_more: page.more_results.has_more(),
                next_offset: None,
            });
        };

        let offset = query
            .page_token
            .as_deref()
            .and_then(|token| token.trim().parse::<u32>().ok())
            .unwrap_or(0);
        let window = QueryWindow {
            limit: query
                .limit
                .map(|limit| limit.saturating_mul(OVER_FETCH_FACTOR).min(MAX_FILTERED_FETCH)),
            offset: (offset > 0).then_some(offset),
            start_cursor: None,
        };
        let page = self
            .run_query(project_id, namespace_id, &query.kind, window)
            .await?;
        let server_has_more = page.more_results.has_more();
        let raw_rows = page.entities.len();

        let wanted = query.limit.map(|limit| limit as usize);
        let mut entities = Vec::new();
        let mut consumed = 0;
        for (index, entity) in page.entities.into_iter().enumerate() {
            if wanted.is_some_and(|wanted| entities.len() >= wanted) {
                break;
            }
            consumed = index + 1;
            if entity.database_id() == database_id {
                entities.push(entity);
            }
        }

        let page_full = wanted.is_some_and(|wanted| entities.len() >= wanted);
        let rows_remain = server_has_more || consumed < raw_rows;
        let consumed = u32::try_from(consumed).unwrap_or(u32::MAX);
        Ok(EntityPage {
            entities,
            end_cursor: None,
            has_more: server_has_more && page_full,
            next_offset: rows_remain.then(|| offset.saturating_add(consumed)),
        })
    }
}
