//! Entry point for the `transfer-worker` binary. One process serves one
//! stage's handler, selected by `--handler-name`; the queue delivers task
//! payloads as authenticated POSTs to `/`.

use std::sync::Arc;

use clap::Parser;

use transfer_common::CommonArgs;
use transfer_gcp_auth::MetadataTokenProvider;
use transfer_gcp_auth::SharedTokenProvider;
use transfer_worker::WorkerKind;
use transfer_worker::WorkerState;

#[derive(Parser, Debug)]
#[command(version, about = "Catalog transfer tooling task handler")]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,

    /// Which stage handler to serve.
    #[arg(long)]
    handler_name: WorkerKind,

    /// Region the handler service and its base queue live in.
    #[arg(long, short = 'l', default_value = "us-central1")]
    service_location: String,

    /// Base queue used for self-chained successor tasks.
    #[arg(long, short = 'q')]
    queue: Option<String>,

    /// Port to listen on.
    #[arg(long, default_value_t = 8080, env = "PORT")]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    transfer_common::init_logging("info");

    let cli = Cli::parse();
    let tokens: SharedTokenProvider = Arc::new(MetadataTokenProvider::new());
    let state = WorkerState::new(
        cli.handler_name,
        &cli.common.project,
        cli.common.dataset_name(),
        &cli.common.dataset_location,
        &cli.service_location,
        cli.queue.clone(),
        Some(cli.handler_name.handler_name().to_string()),
        tokens,
    );

    transfer_worker::serve(cli.handler_name, state, cli.port).await
}
