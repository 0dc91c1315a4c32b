//! Analytics setup. Pure view creation: verifies every input surface exists
//! first and refuses to create anything if one is missing, so a half-built
//! dataset never gets half-working reports.

use std::sync::Arc;

use anyhow::bail;
use tracing::info;
use tracing::warn;

use transfer_gcp_auth::MetadataTokenProvider;
use transfer_gcp_auth::SharedTokenProvider;
use transfer_warehouse::AUDIT_LOG_TABLE;
use transfer_warehouse::TableName;
use transfer_warehouse::ViewName;
use transfer_warehouse::Warehouse;

use crate::cli::AnalyticsArgs;

const REQUIRED_VIEWS: [ViewName; 2] = [ViewName::EntryGroups, ViewName::TagTemplates];
const VIEWS_TO_CREATE: [ViewName; 3] = [
    ViewName::ResourceInteractions,
    ViewName::ResourceInteractionsSummary,
    ViewName::IamPoliciesComparison,
];

pub async fn run(args: AnalyticsArgs) -> anyhow::Result<()> {
    let tokens: SharedTokenProvider = Arc::new(MetadataTokenProvider::new());
    let warehouse = Warehouse::new(
        &args.common.project,
        args.common.dataset_name(),
        &args.common.dataset_location,
        tokens,
    );

    let mut required: Vec<String> = vec![
        AUDIT_LOG_TABLE.to_string(),
        TableName::IamPolicies.as_str().to_string(),
    ];
    required.extend(REQUIRED_VIEWS.iter().map(|v| v.as_str().to_string()));

    let mut missing = Vec::new();
    for name in &required {
        if !warehouse.table_or_view_exists(name).await? {
            warn!(%name, "required table or view is missing");
            missing.push(name.clone());
        }
    }
    if !missing.is_empty() {
        bail!(
            "the following required tables or views are missing: {}",
            missing.join(", ")
        );
    }

    for view in VIEWS_TO_CREATE {
        info!(view = %view, "creating view");
        warehouse.ensure_view(view).await?;
    }
    Ok(())
}
