//! Error taxonomy for the client.
//!
//! The read path converts these into empty results; the write path and the
//! export walker return them to the caller.

use serde_json::Value;
use thiserror::Error;

pub type Result<T, E = DatastoreError> = std::result::Result<T, E>;

/// Non-2xx reply from the emulator, decoded from `{error: {code, message, status}}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerError {
    pub status_code: u16,
    /// Canonical status name such as `INVALID_ARGUMENT`, when the body had one.
    pub status: Option<String>,
    pub message: String,
}

impl ServerError {
    pub fn from_body(status_code: u16, body_text: &str) -> Self {
        let raw_json = serde_json::from_str::<Value>(body_text).ok();
        let error = raw_json.as_ref().and_then(|json| json.get("error"));
        let message = error
            .and_then(|error| error.get("message"))
            .and_then(Value::as_str)
            .map(ToString::to_string)
            .unwrap_or_else(|| {
                let trimmed = body_text.trim();
                if trimmed.is_empty() {
                    format!("HTTP {status_code}")
                } else {
                    trimmed.to_string()
                }
            });
        let status = error
            .and_then(|error| error.get("status"))
            .and_then(Value::as_str)
            .map(ToString::to_string);
        Self {
            status_code,
            status,
            message,
        }
    }

    pub fn retryable(&self) -> bool {
        matches!(self.status_code, 408 | 429 | 500..=599)
    }
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.status {
            Some(status) => write!(f, "{} ({}): {}", self.status_code, status, self.message),
            None => write!(f, "{}: {}", self.status_code, self.message),
        }
    }
}

#[derive(Debug, Error)]
pub enum DatastoreError {
    #[error("network error: {0}")]
    Network(String),
    #[error("emulator error {0}")]
    Server(ServerError),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("encode error: {0}")]
    Encode(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Raised before any request is sent.
    #[error(
        "cannot delete entities in database '{database_id}': the emulator only accepts deletes against the default database"
    )]
    UnsupportedDatabase { database_id: String },
    #[error("{operation} failed: {source}")]
    Mutation {
        operation: &'static str,
        #[source]
        source: Box<DatastoreError>,
    },
    /// A delete-kind batch failed; earlier batches are already committed.
    #[error("delete of kind '{kind}' stopped after {deleted} entities: {source}")]
    PartialDelete {
        kind: String,
        deleted: usize,
        #[source]
        source: Box<DatastoreError>,
    },
}

impl DatastoreError {
    pub fn mutation(operation: &'static str, source: DatastoreError) -> Self {
        Self::Mutation {
            operation,
            source: Box::new(source),
        }
    }

    pub fn retryable(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Server(error) => error.retryable(),
            Self::Mutation { source, .. } | Self::PartialDelete { source, .. } => {
                source.retryable()
            }
            Self::Decode(_)
            | Self::Encode(_)
            | Self::Configuration(_)
            | Self::UnsupportedDatabase { .. } => false,
        }
    }
}
