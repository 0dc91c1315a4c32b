//! Flips one private tag template to publicly readable. Idempotent: a
//! template that is already public is a no-op success, so redelivery after
//! a half-completed run converges.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use tracing::error;
use tracing::info;

use transfer_catalog_clients::ApiError;
use transfer_entities::ConvertTagTemplateTask;
use transfer_entities::legacy_tag_template_fqn;

use crate::response::Reply;
use crate::response::bad_request;
use crate::response::ok;
use crate::response::retry;
use crate::state::WorkerState;

fn is_client_error(err: &ApiError) -> bool {
    matches!(
        err,
        ApiError::NotFound(_) | ApiError::PermissionDenied(_) | ApiError::InvalidArgument(_)
    )
}

pub async fn handle(
    State(state): State<Arc<WorkerState>>,
    Json(task): Json<ConvertTagTemplateTask>,
) -> Reply {
    let fqn = legacy_tag_template_fqn(&task.project_id, &task.location, &task.resource_name);

    let template = match state
        .datacatalog
        .get_tag_template(&task.project_id, &task.location, &task.resource_name)
        .await
    {
        Ok(template) => template,
        Err(err) if is_client_error(&err) => {
            error!(template = %fqn, "failed to process tag template: {err}");
            return bad_request(err.to_string());
        }
        Err(err) => {
            error!(template = %fqn, "tag template read failed: {err}");
            return retry(err.to_string());
        }
    };

    if template.is_publicly_readable {
        info!(template = %fqn, "tag template is already publicly readable");
        return ok("Tag template is already public.");
    }

    match state.datacatalog.convert_private_tag_template(&fqn).await {
        Ok(converted) => {
            info!(template = %converted.name, "converted tag template to public");
            ok("Task processed.")
        }
        Err(err) if is_client_error(&err) => {
            error!(template = %fqn, "failed to process tag template: {err}");
            bad_request(err.to_string())
        }
        Err(err) => {
            error!(template = %fqn, "tag template conversion failed: {err}");
            retry(err.to_string())
        }
    }
}
