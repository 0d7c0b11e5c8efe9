//! Wire transport for the emulator's JSON API.

use async_trait::async_trait;
use dsx_protocol::{
    AllocateIdsRequest, AllocateIdsResponse, BeginTransactionRequest, BeginTransactionResponse,
    CommitRequest, CommitResponse, LookupRequest, LookupResponse, RollbackRequest,
    RollbackResponse, RunQueryRequest, RunQueryResponse,
};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::errors::{DatastoreError, Result, ServerError};

/// One method per emulator RPC. Implementations never retry.
#[async_trait]
pub trait DatastoreTransport: Send + Sync {
    async fn lookup(&self, project_id: &str, request: LookupRequest) -> Result<LookupResponse>;

    async fn run_query(&self, project_id: &str, request: RunQueryRequest)
    -> Result<RunQueryResponse>;

    async fn commit(&self, project_id: &str, request: CommitRequest) -> Result<CommitResponse>;

    async fn begin_transaction(
        &self,
        project_id: &str,
        request: BeginTransactionRequest,
    ) -> Result<BeginTransactionResponse>;

    async fn rollback(&self, project_id: &str, request: RollbackRequest)
    -> Result<RollbackResponse>;

    async fn allocate_ids(
        &self,
        project_id: &str,
        request: AllocateIdsRequest,
    ) -> Result<AllocateIdsResponse>;

    /// Liveness probe against the emulator root.
    async fn ping(&self) -> Result<()>;
}

#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.timeout.connect)
            .timeout(config.timeout.request)
            .build()
            .map_err(|error| {
                DatastoreError::Configuration(format!("failed to build HTTP client: {error}"))
            })?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, project_id: &str, method: &str) -> String {
        format!("{}/v1/projects/{}:{}", self.base_url, project_id, method)
    }

    async fn call<Req, Resp>(&self, project_id: &str, method: &str, body: &Req) -> Result<Resp>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = self.endpoint(project_id, method);
        tracing::debug!(%url, "emulator request");
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|error| DatastoreError::Network(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            return Err(DatastoreError::Server(ServerError::from_body(
                status.as_u16(),
                &raw,
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|error| DatastoreError::Network(error.to_string()))?;
        serde_json::from_slice(&bytes)
            .map_err(|error| DatastoreError::Decode(format!("{method} response: {error}")))
    }
}

#[async_trait]
impl DatastoreTransport for HttpTransport {
    async fn lookup(&self, project_id: &str, request: LookupRequest) -> Result<LookupResponse> {
        self.call(project_id, "lookup", &request).await
    }

    async fn run_query(
        &self,
        project_id: &str,
        request: RunQueryRequest,
    ) -> Result<RunQueryResponse> {
        self.call(project_id, "runQuery", &request).await
    }

    async fn commit(&self, project_id: &str, request: CommitRequest) -> Result<CommitResponse> {
        self.call(project_id, "commit", &request).await
    }

    async fn begin_transaction(
        &self,
        project_id: &str,
        request: BeginTransactionRequest,
    ) -> Result<BeginTransactionResponse> {
        self.call(project_id, "beginTransaction", &request).await
    }

    async fn rollback(
        &self,
        project_id: &str,
        request: RollbackRequest,
    ) -> Result<RollbackResponse> {
        self.call(project_id, "rollback", &request).await
    }

    async fn allocate_ids(
        &self,
        project_id: &str,
        request: AllocateIdsRequest,
    ) -> Result<AllocateIdsResponse> {
        self.call(project_id, "allocateIds", &request).await
    }

    async fn ping(&self) -> Result<()> {
        let response = self
            .client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .map_err(|error| DatastoreError::Network(error.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let raw = response.text().await.unwrap_or_default();
        Err(DatastoreError::Server(ServerError::from_body(
            status.as_u16(),
            &raw,
        )))
    }
}
