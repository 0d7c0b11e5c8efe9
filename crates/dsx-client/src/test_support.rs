//! In-memory stand-in for the emulator used by unit tests.

use std::collections::{BTreeSet, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use dsx_protocol::{
    AllocateIdsRequest, AllocateIdsResponse, BeginTransactionRequest, BeginTransactionResponse,
    CommitRequest, CommitResponse, Entity, EntityResult, KIND_META_KIND, Key, LookupRequest,
    LookupResponse, MoreResultsType, Mutation, MutationResult, NAMESPACE_META_KIND, PartitionId,
    PathElement, QueryPartition, QueryResultBatch, RollbackRequest, RollbackResponse,
    RunQueryRequest, RunQueryResponse,
};

use crate::errors::{DatastoreError, Result, ServerError};
use crate::transport::DatastoreTransport;

pub const PROJECT: &str = "p";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RecordedCall {
    Query {
        namespace: String,
        kind: String,
        limit: Option<u32>,
        offset: Option<u32>,
        start_cursor: Option<String>,
    },
    Lookup,
    Commit {
        mutations: usize,
    },
    BeginTransaction,
    Rollback,
    AllocateIds,
    Ping,
}

impl RecordedCall {
    pub fn query(
        namespace: &str,
        kind: &str,
        limit: Option<u32>,
        offset: Option<u32>,
        start_cursor: Option<&str>,
    ) -> Self {
        Self::Query {
            namespace: namespace.to_string(),
            kind: kind.to_string(),
            limit,
            offset,
            start_cursor: start_cursor.map(ToString::to_string),
        }
    }
}

/// Builds a named entity in `{PROJECT, namespace, database}`; empty strings
/// leave the partition field unset, as the emulator does for defaults.
pub fn entity(namespace: &str, database: &str, kind: &str, name: &str) -> Entity {
    Entity::new(key(namespace, database, kind, name))
}

pub fn key(namespace: &str, database: &str, kind: &str, name: &str) -> Key {
    let mut partition = PartitionId::new(PROJECT);
    if !namespace.is_empty() {
        partition = partition.with_namespace(namespace);
    }
    if !database.is_empty() {
        partition = partition.with_database(database);
    }
    Key::new(partition, vec![PathElement::name(kind, name)])
}

#[derive(Default)]
pub struct FakeEmulator {
    entities: Mutex<Vec<Entity>>,
    calls: Mutex<Vec<RecordedCall>>,
    partitions: Mutex<Vec<QueryPartition>>,
    commits: Mutex<Vec<Vec<Mutation>>>,
    failing_kinds: Mutex<HashSet<String>>,
    fail_all: AtomicBool,
    fail_commits: AtomicBool,
    next_id: AtomicI64,
}

impl FakeEmulator {
    pub fn with_entities(entities: Vec<Entity>) -> Self {
        let emulator = Self::default();
        *emulator.entities.lock().unwrap() = entities;
        emulator
    }

    pub fn fail_everything(&self) {
        self.fail_all.store(true, Ordering::SeqCst);
    }

    pub fn fail_kind(&self, kind: &str) {
        self.failing_kinds.lock().unwrap().insert(kind.to_string());
    }

    pub fn fail_commits(&self) {
        self.fail_commits.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn queries(&self) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, RecordedCall::Query { .. }))
            .collect()
    }

    pub fn last_partition(&self) -> QueryPartition {
        self.partitions.lock().unwrap().last().cloned().unwrap()
    }

    pub fn commits(&self) -> Vec<Vec<Mutation>> {
        self.commits.lock().unwrap().clone()
    }

    pub fn stored(&self) -> Vec<Entity> {
        self.entities.lock().unwrap().clone()
    }

    fn record(&self, call: RecordedCall) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        if self.fail_all.load(Ordering::SeqCst) {
            return Err(DatastoreError::Network("connection refused".into()));
        }
        Ok(())
    }

    fn meta_kind_rows(&self, namespace: &str) -> Vec<Entity> {
        let kinds: BTreeSet<String> = self
            .entities
            .lock()
            .unwrap()
            .iter()
            .filter(|entity| entity.namespace_id() == namespace)
            .filter_map(|entity| entity.kind().map(ToString::to_string))
            .collect();
        kinds
            .into_iter()
            .map(|kind| {
                let mut partition = PartitionId::new(PROJECT);
                if !namespace.is_empty() {
                    partition = partition.with_namespace(namespace);
                }
                Entity::new(Key::new(
                    partition,
                    vec![PathElement::name(KIND_META_KIND, kind)],
                ))
            })
            .collect()
    }

    fn meta_namespace_rows(&self) -> Vec<Entity> {
        let pairs: BTreeSet<(String, String)> = self
            .entities
            .lock()
            .unwrap()
            .iter()
            .map(|entity| {
                (
                    entity.namespace_id().to_string(),
                    entity.database_id().to_string(),
                )
            })
            .collect();
        pairs
            .into_iter()
            .map(|(namespace, database)| {
                let element = if namespace.is_empty() {
                    PathElement::id(NAMESPACE_META_KIND, 1)
                } else {
                    PathElement::name(NAMESPACE_META_KIND, namespace)
                };
                let mut partition = PartitionId::new(PROJECT);
                if !database.is_empty() {
                    partition = partition.with_database(database);
                }
                Entity::new(Key::new(partition, vec![element]))
            })
            .collect()
    }

    fn position(entities: &[Entity], key: &Key) -> Option<usize> {
        entities.iter().position(|entity| {
            entity.key.as_ref().is_some_and(|stored| {
                stored.path == key.path
                    && stored.namespace_id() == key.namespace_id()
                    && stored.database_id() == key.database_id()
            })
        })
    }

    fn complete_key(&self, mut key: Key) -> Key {
        if let Some(last) = key.path.last_mut() {
            if !last.is_complete() {
                let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1000;
                last.id = Some(id.to_string());
            }
        }
        key
    }
}

fn conflict(message: &str) -> DatastoreError {
    DatastoreError::Server(ServerError {
        status_code: 400,
        status: Some("INVALID_ARGUMENT".into()),
        message: message.into(),
    })
}

#[async_trait]
impl DatastoreTransport for FakeEmulator {
    async fn lookup(&self, _project_id: &str, request: LookupRequest) -> Result<LookupResponse> {
        self.record(RecordedCall::Lookup)?;
        let entities = self.entities.lock().unwrap();
        let mut response = LookupResponse::default();
        for key in request.keys {
            match Self::position(&entities, &key) {
                Some(index) => response.found.push(entities[index].clone().into()),
                None => response.missing.push(Entity::new(key).into()),
            }
        }
        Ok(response)
    }

    async fn run_query(
        &self,
        _project_id: &str,
        request: RunQueryRequest,
    ) -> Result<RunQueryResponse> {
        let namespace = request.partition_id.namespace_id.clone().unwrap_or_default();
        let kind = request
            .query
            .kind
            .first()
            .map(|expression| expression.name.clone())
            .unwrap_or_default();
        self.partitions.lock().unwrap().push(request.partition_id.clone());
        self.record(RecordedCall::Query {
            namespace: namespace.clone(),
            kind: kind.clone(),
            limit: request.query.limit,
            offset: request.query.offset,
            start_cursor: request.query.start_cursor.clone(),
        })?;
        if self.failing_kinds.lock().unwrap().contains(&kind) {
            return Err(conflict(&format!("kind {kind} is unavailable")));
        }

        let rows: Vec<Entity> = match kind.as_str() {
            KIND_META_KIND => self.meta_kind_rows(&namespace),
            NAMESPACE_META_KIND => self.meta_namespace_rows(),
            _ => self
                .entities
                .lock()
                .unwrap()
                .iter()
                .filter(|entity| entity.namespace_id() == namespace)
                .filter(|entity| entity.kind() == Some(kind.as_str()))
                .cloned()
                .collect(),
        };

        let start = request
            .query
            .start_cursor
            .as_deref()
            .and_then(|cursor| cursor.strip_prefix("c"))
            .and_then(|position| position.parse::<usize>().ok())
            .unwrap_or(0)
            + request.query.offset.unwrap_or(0) as usize;
        let start = start.min(rows.len());
        let end = match request.query.limit {
            Some(limit) => (start + limit as usize).min(rows.len()),
            None => rows.len(),
        };
        let more_results = if end < rows.len() {
            MoreResultsType::MoreResultsAfterLimit
        } else {
            MoreResultsType::NoMoreResults
        };

        Ok(RunQueryResponse {
            batch: QueryResultBatch {
                entity_results: rows[start..end]
                    .iter()
                    .cloned()
                    .map(EntityResult::from)
                    .collect(),
                end_cursor: Some(format!("c{end}")),
                more_results,
                skipped_results: None,
            },
        })
    }

    async fn commit(&self, _project_id: &str, request: CommitRequest) -> Result<CommitResponse> {
        self.record(RecordedCall::Commit {
            mutations: request.mutations.len(),
        })?;
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(conflict("commit rejected"));
        }
        self.commits.lock().unwrap().push(request.mutations.clone());

        let mut response = CommitResponse::default();
        for mutation in request.mutations {
            let mut entities = self.entities.lock().unwrap();
            let mut result = MutationResult::default();
            match mutation {
                Mutation::Insert(mut entity) => {
                    let key = self.complete_key(entity.key.clone().unwrap_or_default());
                    if Self::position(&entities, &key).is_some() {
                        return Err(conflict("entity already exists"));
                    }
                    entity.key = Some(key.clone());
                    entities.push(entity);
                    result.key = Some(key);
                }
                Mutation::Update(entity) => {
                    let key = entity.key.clone().unwrap_or_default();
                    let Some(index) = Self::position(&entities, &key) else {
                        return Err(conflict("no entity to update"));
                    };
                    entities[index] = entity;
                }
                Mutation::Upsert(mut entity) => {
                    let key = self.complete_key(entity.key.clone().unwrap_or_default());
                    entity.key = Some(key.clone());
                    match Self::position(&entities, &key) {
                        Some(index) => entities[index] = entity,
                        None => entities.push(entity),
                    }
                    result.key = Some(key);
                }
                Mutation::Delete(key) => {
                    if key.partition_id.as_ref().is_some_and(|p| p.database_id.is_some()) {
                        return Err(conflict("database id not accepted on delete"));
                    }
                    if let Some(index) = Self::position(&entities, &key) {
                        entities.remove(index);
                    }
                }
            }
            response.mutation_results.push(result);
        }
        Ok(response)
    }

    async fn begin_transaction(
        &self,
        _project_id: &str,
        _request: BeginTransactionRequest,
    ) -> Result<BeginTransactionResponse> {
        self.record(RecordedCall::BeginTransaction)?;
        Ok(BeginTransactionResponse {
            transaction: "tx-1".into(),
        })
    }

    async fn rollback(
        &self,
        _project_id: &str,
        _request: RollbackRequest,
    ) -> Result<RollbackResponse> {
        self.record(RecordedCall::Rollback)?;
        Ok(RollbackResponse {})
    }

    async fn allocate_ids(
        &self,
        _project_id: &str,
        request: AllocateIdsRequest,
    ) -> Result<AllocateIdsResponse> {
        self.record(RecordedCall::AllocateIds)?;
        Ok(AllocateIdsResponse {
            keys: request
                .keys
                .into_iter()
                .map(|key| self.complete_key(key))
                .collect(),
        })
    }

    async fn ping(&self) -> Result<()> {
        self.record(RecordedCall::Ping)
    }
}
