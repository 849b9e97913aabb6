//! Error types for mes-core.

use thiserror::Error;

/// Why a single remote source contributed nothing to a search cycle.
///
/// These never escape the aggregator: they are logged and recorded in
/// [`ResultSet::failed_sources`](crate::types::ResultSet::failed_sources).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("no bearer credential in the current session")]
    MissingCredential,

    #[error("credential rejected (HTTP {0})")]
    Unauthorized(u16),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response body: {0}")]
    Malformed(String),
}

impl SourceError {
    pub fn is_credential_failure(&self) -> bool {
        matches!(self, SourceError::MissingCredential | SourceError::Unauthorized(_))
    }
}

/// Errors from decoding, loading or persisting a [`Session`](crate::session::Session).
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("malformed token: {0}")]
    MalformedToken(String),

    #[error("session file I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("session file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
