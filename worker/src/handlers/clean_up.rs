//! Deletes the legacy copy of one transferred resource. The handler re-reads
//! the legacy record and refuses to delete unless the transfer flag is
//! confirmed set: the snapshot that scheduled this task may be a day old.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use tracing::error;
use tracing::info;

use transfer_catalog_clients::ApiError;
use transfer_entities::ResourceKind;
use transfer_entities::ResourceTask;
use transfer_entities::legacy_entry_group_fqn;
use transfer_entities::legacy_tag_template_fqn;

use crate::response::Reply;
use crate::response::ok;
use crate::response::retry;
use crate::state::WorkerState;

async fn clean_up(state: &WorkerState, task: &ResourceTask, fqn: &str) -> Result<Reply, ApiError> {
    let resource = &task.resource;
    match task.resource_type {
        ResourceKind::EntryGroup => {
            let entry_group = state
                .datacatalog
                .get_entry_group(&resource.project_id, &resource.location, &resource.resource_name)
                .await?;
            if !entry_group.transferred_to_dataplex {
                info!(resource = %fqn, "entry group not transferred");
                return Ok(ok(format!("Entry group {fqn} not transferred")));
            }
            state
                .datacatalog
                .delete_entry_group(
                    &resource.project_id,
                    &resource.location,
                    &resource.resource_name,
                    true,
                )
                .await?;
        }
        ResourceKind::TagTemplate => {
            let template = state
                .datacatalog
                .get_tag_template(&resource.project_id, &resource.location, &resource.resource_name)
                .await?;
            if !template.is_transferred() {
                info!(resource = %fqn, "tag template not transferred");
                return Ok(ok(format!("Tag template {fqn} not transferred")));
            }
            state
                .datacatalog
                .delete_tag_template(
                    &resource.project_id,
                    &resource.location,
                    &resource.resource_name,
                    true,
                )
                .await?;
        }
    }
    Ok(ok("Task processed"))
}

pub async fn handle(
    State(state): State<Arc<WorkerState>>,
    Json(task): Json<ResourceTask>,
) -> Reply {
    let resource = &task.resource;
    let fqn = match task.resource_type {
        ResourceKind::EntryGroup => legacy_entry_group_fqn(
            &resource.project_id,
            &resource.location,
            &resource.resource_name,
        ),
        ResourceKind::TagTemplate => legacy_tag_template_fqn(
            &resource.project_id,
            &resource.location,
            &resource.resource_name,
        ),
    };

    match clean_up(&state, &task, &fqn).await {
        Ok(reply) => reply,
        Err(ApiError::PermissionDenied(_) | ApiError::NotFound(_)) => {
            ok(format!("Resource {fqn} not found"))
        }
        Err(err) => {
            error!(resource = %fqn, "cleanup failed: {err}");
            retry(err.to_string())
        }
    }
}
