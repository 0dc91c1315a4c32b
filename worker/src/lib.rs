//! The per-task half of the pipeline. Every stage's handler is one axum
//! service with a single `POST /` route; the queue delivers JSON payloads
//! and interprets the response status: 200 ends the task (including the
//! "nothing to do" outcomes), anything else redelivers it. Handlers are
//! idempotent, so redelivery is always safe.

pub mod handlers;
mod response;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::post;
use tokio::net::TcpListener;
use tracing::info;

pub use response::MessageResponse;
pub use state::WorkerKind;
pub use state::WorkerState;

/// The single-route app for one worker kind.
pub fn router(kind: WorkerKind, state: Arc<WorkerState>) -> Router {
    let handler = match kind {
        WorkerKind::FetchProjects => post(handlers::fetch_projects::handle),
        WorkerKind::FetchResources => post(handlers::fetch_resources::handle),
        WorkerKind::FindResourceNames => post(handlers::find_resource_names::handle),
        WorkerKind::FetchPolicies => post(handlers::fetch_policies::handle),
        WorkerKind::ConvertPrivateTagTemplates => {
            post(handlers::convert_private_tag_templates::handle)
        }
        WorkerKind::TransferResources => post(handlers::transfer_resources::handle),
        WorkerKind::CleanUp => post(handlers::clean_up::handle),
    };
    Router::new().route("/", handler).with_state(state)
}

/// Binds and serves until shutdown.
pub async fn serve(kind: WorkerKind, state: Arc<WorkerState>, port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, kind = ?kind, "worker listening");

    axum::serve(listener, router(kind, state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
