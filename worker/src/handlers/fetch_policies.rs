//! Reads the IAM policy of one resource from whichever catalog owns it and
//! records the bindings. An absent policy is written as empty bindings:
//! downstream comparison needs the row either way.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use tracing::error;

use transfer_catalog_clients::ApiError;
use transfer_catalog_clients::PolicyBinding;
use transfer_entities::FetchPoliciesTask;
use transfer_entities::ManagingSystem;
use transfer_entities::ResourceKind;
use transfer_entities::dataplex_aspect_type_fqn;
use transfer_entities::dataplex_entry_group_fqn;
use transfer_entities::legacy_entry_group_fqn;
use transfer_entities::legacy_tag_template_fqn;
use transfer_warehouse::IamBinding;
use transfer_warehouse::IamPolicyRow;
use transfer_warehouse::TableName;

use crate::response::Reply;
use crate::response::ok;
use crate::response::retry;
use crate::state::WorkerState;

async fn fetch_bindings(
    state: &WorkerState,
    task: &FetchPoliciesTask,
) -> Result<Vec<PolicyBinding>, ApiError> {
    let resource = &task.resource;
    let result = match resource.system {
        ManagingSystem::DataCatalog => {
            state
                .datacatalog
                .get_iam_policy(
                    task.resource_type,
                    &resource.project_id,
                    &resource.location,
                    &resource.resource_name,
                )
                .await
        }
        ManagingSystem::Dataplex => {
            let fqn = match task.resource_type {
                ResourceKind::EntryGroup => dataplex_entry_group_fqn(
                    &resource.project_id,
                    &resource.location,
                    &resource.resource_name,
                ),
                ResourceKind::TagTemplate => {
                    dataplex_aspect_type_fqn(&resource.project_id, &resource.resource_name)
                }
            };
            state.dataplex.get_iam_policy(&fqn).await
        }
    };
    match result {
        // No policy on the resource is evidence, not an error.
        Err(ApiError::NotFound(_)) => Ok(Vec::new()),
        other => other,
    }
}

pub async fn handle(
    State(state): State<Arc<WorkerState>>,
    Json(task): Json<FetchPoliciesTask>,
) -> Reply {
    let resource = &task.resource;
    let legacy_fqn = match task.resource_type {
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

    let bindings = match fetch_bindings(&state, &task).await {
        Ok(bindings) => bindings,
        Err(err) => {
            error!(resource = %legacy_fqn, "policy fetch failed: {err}");
            return retry(err.to_string());
        }
    };

    let row = IamPolicyRow {
        resource_name: legacy_fqn.clone(),
        system: resource.system,
        bindings: bindings
            .into_iter()
            .map(|binding| IamBinding {
                role: binding.role,
                members: binding.members,
            })
            .collect(),
    };
    if let Err(err) = state.warehouse.insert_rows(TableName::IamPolicies, &[row]).await {
        error!(resource = %legacy_fqn, "policy write failed: {err}");
        return retry(err.to_string());
    }
    ok("Task processed")
}
