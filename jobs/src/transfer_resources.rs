//! Transfer controller: every resource still managed by Data Catalog within
//! scope gets a transfer task. The mutation itself is server-side; the
//! handler only has to trigger it.

use transfer_entities::ManagingSystem;

use crate::cli::TransferArgs;
use crate::context::JobContext;
use crate::resource_sweep;

pub const QUEUE: &str = "transfer-resources";
pub const HANDLER: &str = "transfer-resources-handler";

pub async fn run(args: TransferArgs) -> anyhow::Result<()> {
    let ctx = JobContext::new(&args.common, &args.service, HANDLER);
    run_with(args, ctx).await
}

pub async fn run_with(args: TransferArgs, ctx: JobContext) -> anyhow::Result<()> {
    resource_sweep::run(args, ctx, ManagingSystem::DataCatalog, QUEUE).await
}
