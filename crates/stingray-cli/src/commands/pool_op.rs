use anyhow::Result;
use stingray_core::{PoolOperation, Reconciler, ResourceId, Transport};

use crate::cli::{OutputFormat, PoolOpArgs};
use crate::output::print_outcome;

pub async fn run<T: Transport>(
    reconciler: &Reconciler<T>,
    args: &PoolOpArgs,
    check: bool,
    format: OutputFormat,
) -> Result<()> {
    let resource = ResourceId::pool(&args.pool);
    let op = PoolOperation::parse(&args.operation, &args.nodes, &resource)?;
    let outcome = reconciler.run_pool_operation(&args.pool, &op, check).await?;
    print_outcome(&outcome, format)?;
    Ok(())
}
