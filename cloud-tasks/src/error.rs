use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    /// The addressed queue does not exist; callers may create it and retry.
    #[error("queue not found: {0}")]
    NotFound(String),

    #[error("queue quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

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

    /// Project-number lookup for the delivery URL failed.
    #[error("target resolution failed: {0}")]
    Target(#[from] transfer_catalog_clients::ApiError),
}
