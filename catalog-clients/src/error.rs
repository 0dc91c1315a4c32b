use thiserror::Error;

/// Upstream call outcomes the stages branch on. Workers map `NotFound`,
/// `PermissionDenied` and `InvalidArgument` to terminal responses; anything
/// else is retriable through queue redelivery.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unexpected type: {0}")]
    Type(String),

    #[error("malformed resource name: {0}")]
    Format(String),

    #[error("{context}: {status} {body}")]
    Status {
        context: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("credential lookup failed: {0}")]
    Auth(#[from] transfer_gcp_auth::AuthError),

    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl From<transfer_entities::EntityError> for ApiError {
    fn from(err: transfer_entities::EntityError) -> Self {
        match err {
            transfer_entities::EntityError::Type(msg) => ApiError::Type(msg),
            transfer_entities::EntityError::Format(msg) => ApiError::Format(msg),
            transfer_entities::EntityError::Validation(msg) => ApiError::InvalidArgument(msg),
        }
    }
}
