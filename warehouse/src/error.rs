use thiserror::Error;

#[derive(Debug, Error)]
pub enum WarehouseError {
    /// Insert kept hitting "table not found" past the retry budget, or the
    /// service rejected the call outright.
    #[error("warehouse unavailable: {0}")]
    Unavailable(String),

    /// The table holds no partition with `createdAt <= today`; the upstream
    /// stage has not produced a snapshot yet.
    #[error("no data yet in table {0}")]
    NoDataYet(String),

    /// A query response that does not decode into the expected row shape.
    #[error("failed to decode query response from {table}: {message}")]
    Decode { table: String, message: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("credential lookup failed: {0}")]
    Auth(#[from] transfer_gcp_auth::AuthError),

    #[error("{context}: {status} {body}")]
    Status {
        context: String,
        status: reqwest::StatusCode,
        body: String,
    },
}
