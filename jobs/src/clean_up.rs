//! Cleanup controller: resources already managed by Dataplex get a deletion
//! task for their legacy copy. The handler re-checks the transfer flag
//! before deleting anything.

use transfer_entities::ManagingSystem;

use crate::cli::TransferArgs;
use crate::context::JobContext;
use crate::resource_sweep;

pub const QUEUE: &str = "clean-up";
pub const HANDLER: &str = "clean-up-handler";

pub async fn run(args: TransferArgs) -> anyhow::Result<()> {
    let ctx = JobContext::new(&args.common, &args.service, HANDLER);
    run_with(args, ctx).await
}

pub async fn run_with(args: TransferArgs, ctx: JobContext) -> anyhow::Result<()> {
    resource_sweep::run(args, ctx, ManagingSystem::Dataplex, QUEUE).await
}
