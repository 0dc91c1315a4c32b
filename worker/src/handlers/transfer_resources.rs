//! Triggers the server-side transfer of one legacy resource. Every terminal
//! upstream answer becomes a 200 so the queue stops: a vanished resource and
//! an already-transferred one are both done as far as this stage cares.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use tracing::error;

use transfer_catalog_clients::ApiError;
use transfer_entities::ResourceKind;
use transfer_entities::ResourceTask;
use transfer_entities::legacy_entry_group_fqn;
use transfer_entities::legacy_tag_template_fqn;

use crate::response::Reply;
use crate::response::ok;
use crate::response::retry;
use crate::state::WorkerState;

pub async fn handle(
    State(state): State<Arc<WorkerState>>,
    Json(task): Json<ResourceTask>,
) -> Reply {
    let resource = &task.resource;
    let (fqn, result) = match task.resource_type {
        ResourceKind::EntryGroup => {
            let fqn = legacy_entry_group_fqn(
                &resource.project_id,
                &resource.location,
                &resource.resource_name,
            );
            let result = state.datacatalog.transfer_entry_group(&fqn).await;
            (fqn, result)
        }
        ResourceKind::TagTemplate => {
            let fqn = legacy_tag_template_fqn(
                &resource.project_id,
                &resource.location,
                &resource.resource_name,
            );
            let result = state.datacatalog.transfer_tag_template(&fqn).await;
            (fqn, result)
        }
    };

    match result {
        Ok(()) => ok("Task processed"),
        Err(ApiError::PermissionDenied(_) | ApiError::NotFound(_)) => {
            ok(format!("Resource {fqn} not found"))
        }
        Err(ApiError::InvalidArgument(_)) => ok(format!("Resource {fqn} already transferred")),
        Err(err) => {
            error!(resource = %fqn, "transfer failed: {err}");
            retry(format!("Error occurred {err}"))
        }
    }
}
