//! Single run-query calls against one kind, meta-kinds included.

use dsx_protocol::{Entity, MoreResultsType, Query, QueryPartition, RunQueryRequest};

use crate::errors::Result;
use crate::transport::DatastoreTransport;

/// Paging knobs forwarded verbatim to the server.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryWindow {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub start_cursor: Option<String>,
}

impl QueryWindow {
    pub fn limit(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryPage {
    pub entities: Vec<Entity>,
    pub end_cursor: Option<String>,
    pub more_results: MoreResultsType,
}

/// Runs `kind` in `{project, namespace}`.
///
/// The partition never names a database; see [`QueryPartition`]. Transport
/// errors are returned as-is and nothing is retried.
pub async fn run_kind_query(
    transport: &dyn DatastoreTransport,
    project_id: &str,
    namespace_id: Option<&str>,
    kind: &str,
    window: QueryWindow,
) -> Result<QueryPage> {
    let mut query = Query::kind(kind);
    query.limit = window.limit;
    query.offset = window.offset;
    query.start_cursor = window.start_cursor;

    let request = RunQueryRequest {
        partition_id: QueryPartition::new(
            project_id,
            namespace_id.filter(|namespace| !namespace.is_empty()),
        ),
        query,
    };
    tracing::debug!(project_id, namespace_id, kind, "run query");
    let batch = transport.run_query(project_id, request).await?.batch;

    Ok(QueryPage {
        entities: batch
            .entity_results
            .into_iter()
            .map(|result| result.entity)
            .collect(),
        end_cursor: batch.end_cursor,
        more_results: batch.more_results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeEmulator, RecordedCall, entity};

    #[tokio::test]
    async fn query_carries_namespace_but_never_database() {
        let emulator = FakeEmulator::with_entities(vec![
            entity("ns", "d1", "Task", "a"),
            entity("ns", "", "Task", "b"),
            entity("", "", "Task", "c"),
        ]);
        let page = run_kind_query(
            &emulator,
            "p",
            Some("ns"),
            "Task",
            QueryWindow {
                limit: Some(1),
                offset: Some(1),
                start_cursor: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(page.entities.len(), 1);
        assert_eq!(page.entities[0].database_id(), "");
        assert_eq!(page.more_results, MoreResultsType::NoMoreResults);
        let calls = emulator.queries();
        assert_eq!(
            calls,
            vec![RecordedCall::query("ns", "Task", Some(1), Some(1), None)]
        );
    }

    #[tokio::test]
    async fn empty_namespace_is_sent_as_default_partition() {
        let emulator = FakeEmulator::default();
        run_kind_query(&emulator, "p", Some(""), "Task", QueryWindow::default())
            .await
            .unwrap();
        assert_eq!(emulator.last_partition().namespace_id, None);
    }

    #[tokio::test]
    async fn transport_failures_propagate_unchanged() {
        let emulator = FakeEmulator::default();
        emulator.fail_everything();
        let error = run_kind_query(&emulator, "p", None, "Task", QueryWindow::default())
            .await
            .unwrap_err();
        assert!(matches!(error, crate::DatastoreError::Network(_)));
        assert_eq!(emulator.call_count(), 1, "no retry");
    }
}
