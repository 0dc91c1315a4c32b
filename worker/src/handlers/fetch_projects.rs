//! Enriches one discovered project with its ancestry chain and writes the
//! `projects` snapshot row.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use tracing::error;

use transfer_catalog_clients::ApiError;
use transfer_entities::FetchProjectsTask;
use transfer_entities::Project;
use transfer_warehouse::ProjectRow;
use transfer_warehouse::TableName;

use crate::response::Reply;
use crate::response::bad_request;
use crate::response::ok;
use crate::response::retry;
use crate::state::WorkerState;

pub async fn handle(
    State(state): State<Arc<WorkerState>>,
    Json(task): Json<FetchProjectsTask>,
) -> Reply {
    let mut project = Project::new(&task.project_id, task.project_number);
    project.data_catalog_api_enabled = task.data_catalog_api_enabled;
    project.dataplex_api_enabled = task.dataplex_api_enabled;

    match state.resource_manager.project_ancestry(&task.project_id).await {
        Ok(ancestry) => project.ancestry = ancestry,
        // A parent kind we do not model will not fix itself on redelivery.
        Err(ApiError::Format(message)) => {
            error!(project = %task.project_id, %message, "unparseable ancestry");
            return bad_request(message);
        }
        Err(err) => {
            error!(project = %task.project_id, "ancestry lookup failed: {err}");
            return retry(err.to_string());
        }
    }

    let row = ProjectRow::from_project(&project, task.created_at);
    if let Err(err) = state.warehouse.insert_rows(TableName::Projects, &[row]).await {
        error!(project = %task.project_id, "projects write failed: {err}");
        return retry(err.to_string());
    }
    ok("Task processed")
}
