use axum::Json;
use axum::http::StatusCode;
use serde::Deserialize;
use serde::Serialize;

/// Body of every worker response, success or failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

pub(crate) type Reply = (StatusCode, Json<MessageResponse>);

pub(crate) fn reply(status: StatusCode, message: impl Into<String>) -> Reply {
    (
        status,
        Json(MessageResponse {
            message: message.into(),
        }),
    )
}

/// Terminal success; the queue will not redeliver.
pub(crate) fn ok(message: impl Into<String>) -> Reply {
    reply(StatusCode::OK, message)
}

/// Rejected payload or unrecoverable client-side condition.
pub(crate) fn bad_request(message: impl Into<String>) -> Reply {
    reply(StatusCode::BAD_REQUEST, message)
}

/// Transient failure; the queue redelivers under its backoff policy.
pub(crate) fn retry(message: impl Into<String>) -> Reply {
    reply(StatusCode::INTERNAL_SERVER_ERROR, message)
}
