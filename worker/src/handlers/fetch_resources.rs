//! Fetches exactly one search page, writes the hits into the snapshot and
//! hands the continuation token to a single successor task. The worker is a
//! self-chained paginator: per-stream order comes from the chain, not from
//! the queue.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use tracing::error;

use transfer_entities::FetchResourcesTask;
use transfer_entities::SearchResourceType;
use transfer_warehouse::EntryGroupRow;
use transfer_warehouse::TableName;
use transfer_warehouse::TagTemplateRow;

use crate::response::Reply;
use crate::response::bad_request;
use crate::response::ok;
use crate::response::retry;
use crate::state::WorkerState;

pub async fn handle(
    State(state): State<Arc<WorkerState>>,
    Json(task): Json<FetchResourcesTask>,
) -> Reply {
    if let Err(err) = task.validate() {
        return bad_request(err.to_string());
    }

    let scope = vec![task.scope.clone()];
    let next_page_token = match task.resource_type {
        SearchResourceType::EntryGroup => {
            let page = match state
                .datacatalog
                .search_entry_groups(&scope, task.is_transferred, task.next_page_token.as_deref())
                .await
            {
                Ok(page) => page,
                Err(err) => {
                    error!(scope = %task.scope, "entry group search failed: {err}");
                    return retry(err.to_string());
                }
            };
            let rows: Vec<EntryGroupRow> = page
                .items
                .iter()
                .map(|eg| EntryGroupRow::from_entry_group(eg, task.created_at))
                .collect();
            if let Err(err) = state.warehouse.insert_rows(TableName::EntryGroups, &rows).await {
                error!(scope = %task.scope, "entry group write failed: {err}");
                return retry(err.to_string());
            }
            page.next_page_token
        }
        SearchResourceType::TagTemplate => {
            let page = match state
                .datacatalog
                .search_tag_templates(
                    &scope,
                    task.is_public.unwrap_or_default(),
                    task.is_transferred,
                    task.next_page_token.as_deref(),
                )
                .await
            {
                Ok(page) => page,
                Err(err) => {
                    error!(scope = %task.scope, "tag template search failed: {err}");
                    return retry(err.to_string());
                }
            };
            let rows: Vec<TagTemplateRow> = page
                .items
                .iter()
                .map(|tt| TagTemplateRow::from_tag_template(tt, task.created_at))
                .collect();
            if let Err(err) = state.warehouse.insert_rows(TableName::TagTemplates, &rows).await {
                error!(scope = %task.scope, "tag template write failed: {err}");
                return retry(err.to_string());
            }
            page.next_page_token
        }
    };

    if let Some(token) = next_page_token {
        let successor = task.with_next_page_token(token);
        if let Err(err) = state
            .publisher
            .create_task(
                &successor,
                &state.handler_name,
                &state.project,
                &state.service_location,
            )
            .await
        {
            error!(scope = %task.scope, "successor task creation failed: {err}");
            return retry(err.to_string());
        }
    }

    ok("Task processed")
}
