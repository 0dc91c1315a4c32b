//! Audit-log export setup. Ensures the dataset exists and wires a Cloud
//! Logging sink that streams data-access entries from both catalogs into it.
//! The sink's writer identity still needs dataset access granted out of
//! band; the job reports it for that purpose.

use std::sync::Arc;

use tracing::info;

use transfer_catalog_clients::LoggingClient;
use transfer_gcp_auth::MetadataTokenProvider;
use transfer_gcp_auth::SharedTokenProvider;
use transfer_warehouse::Warehouse;

use crate::cli::AuditLogsArgs;

fn default_log_filter() -> String {
    "protoPayload.serviceName=(\"datacatalog.googleapis.com\" OR \"dataplex.googleapis.com\") \
     AND log_id(\"cloudaudit.googleapis.com/data_access\")"
        .to_string()
}

pub async fn run(args: AuditLogsArgs) -> anyhow::Result<()> {
    let tokens: SharedTokenProvider = Arc::new(MetadataTokenProvider::new());
    let dataset = args.common.dataset_name();
    let warehouse = Warehouse::new(
        &args.common.project,
        &dataset,
        &args.common.dataset_location,
        tokens.clone(),
    );
    warehouse.ensure_dataset().await?;

    let filter = args.log_filter.unwrap_or_else(default_log_filter);
    let sink = LoggingClient::new(tokens)
        .create_sink(&args.common.project, &args.log_sink_name, &dataset, &filter)
        .await?;

    info!(
        name = %sink.name,
        destination = %sink.destination,
        writer_identity = sink.writer_identity.as_deref().unwrap_or(""),
        "audit log sink ready"
    );
    Ok(())
}
