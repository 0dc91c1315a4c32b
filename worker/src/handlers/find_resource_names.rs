//! Resolves the Dataplex name of one legacy resource. Two candidates are
//! probed in order: the identity-preserving name, then the region-suffixed
//! `<id>_<location>` convention Dataplex uses to dodge cross-region id
//! collisions. A candidate counts only when the resource exists *and*
//! carries a transfer status. No hit is still a clean 200: the missing
//! mapping row is the signal downstream.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use tracing::error;
use tracing::info;

use transfer_catalog_clients::ApiError;
use transfer_catalog_clients::DataplexClient;
use transfer_entities::ResourceKind;
use transfer_entities::ResourceTask;
use transfer_entities::dataplex_aspect_type_fqn;
use transfer_entities::dataplex_entry_group_fqn;
use transfer_entities::legacy_entry_group_fqn;
use transfer_entities::legacy_tag_template_fqn;
use transfer_warehouse::MappingRow;
use transfer_warehouse::TableName;

use crate::response::Reply;
use crate::response::ok;
use crate::response::retry;
use crate::state::WorkerState;

async fn probe(
    dataplex: &DataplexClient,
    kind: ResourceKind,
    fqn: &str,
) -> Result<bool, ApiError> {
    let resource = match kind {
        ResourceKind::EntryGroup => dataplex.get_entry_group(fqn).await?,
        ResourceKind::TagTemplate => dataplex.get_aspect_type(fqn).await?,
    };
    Ok(resource.is_some_and(|r| r.is_confirmed()))
}

fn candidates(task: &ResourceTask) -> Vec<String> {
    let resource = &task.resource;
    let suffixed = format!("{}_{}", resource.resource_name, resource.location);
    match task.resource_type {
        ResourceKind::EntryGroup => vec![
            dataplex_entry_group_fqn(&resource.project_id, &resource.location, &resource.resource_name),
            dataplex_entry_group_fqn(&resource.project_id, &resource.location, &suffixed),
        ],
        ResourceKind::TagTemplate => vec![
            dataplex_aspect_type_fqn(&resource.project_id, &resource.resource_name),
            dataplex_aspect_type_fqn(&resource.project_id, &suffixed),
        ],
    }
}

pub async fn handle(
    State(state): State<Arc<WorkerState>>,
    Json(task): Json<ResourceTask>,
) -> Reply {
    let resource = &task.resource;
    let (table, legacy_fqn) = match task.resource_type {
        ResourceKind::EntryGroup => (
            TableName::EntryGroupsResourceMapping,
            legacy_entry_group_fqn(&resource.project_id, &resource.location, &resource.resource_name),
        ),
        ResourceKind::TagTemplate => (
            TableName::TagTemplatesResourceMapping,
            legacy_tag_template_fqn(&resource.project_id, &resource.location, &resource.resource_name),
        ),
    };

    let mut dataplex_fqn = None;
    for candidate in candidates(&task) {
        match probe(&state.dataplex, task.resource_type, &candidate).await {
            Ok(true) => {
                dataplex_fqn = Some(candidate);
                break;
            }
            Ok(false) => {
                info!(%candidate, "no confirmed resource under this name, trying next");
            }
            Err(err) => {
                error!(%candidate, "probe failed: {err}");
                return retry(err.to_string());
            }
        }
    }

    let Some(dataplex_fqn) = dataplex_fqn else {
        info!(legacy = %legacy_fqn, "no dataplex resource found");
        return ok("Resource not found");
    };

    let row = MappingRow {
        data_catalog_resource_name: legacy_fqn,
        dataplex_resource_name: dataplex_fqn,
    };
    if let Err(err) = state.warehouse.insert_rows(table, &[row]).await {
        error!("mapping write failed: {err}");
        return retry(err.to_string());
    }
    ok("Task processed")
}
