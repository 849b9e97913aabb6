use mes_core::SourceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid API URL: {0}")]
    InvalidUrl(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("credential rejected (HTTP {0})")]
    Unauthorized(u16),

    /// Login or registration refused; carries the server's message.
    #[error("{0}")]
    Rejected(String),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("could not decode response: {0}")]
    Decode(String),
}

impl From<hyper_util::client::legacy::Error> for ApiError {
    fn from(e: hyper_util::client::legacy::Error) -> Self {
        ApiError::Transport(e.to_string())
    }
}

impl From<hyper::Error> for ApiError {
    fn from(e: hyper::Error) -> Self {
        ApiError::Transport(e.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}

impl From<ApiError> for SourceError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::Unauthorized(status) => SourceError::Unauthorized(status),
            ApiError::Status { status, message } => SourceError::Status { status, message },
            ApiError::Decode(msg) => SourceError::Malformed(msg),
            ApiError::Rejected(msg) => SourceError::Status {
                status: 400,
                message: msg,
            },
            ApiError::InvalidUrl(msg) | ApiError::Transport(msg) => SourceError::Transport(msg),
        }
    }
}
