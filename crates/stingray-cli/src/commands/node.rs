use anyhow::Result;
use stingray_core::{NodeAttributes, NodeMode, NodeState, Reconciler, ResourceId, Transport};

use super::UsageError;
use crate::cli::{NodeArgs, OutputFormat};
use crate::output::print_outcome;

fn desired_attributes(args: &NodeArgs, mode: NodeMode) -> Result<NodeAttributes, UsageError> {
    if let NodeMode::SetState(_) = mode
        && (args.lb_state.is_some() || args.weight.is_some() || args.priority.is_some())
    {
        return Err(UsageError(format!(
            "--state {} only sets the node state; --lb-state, --weight and --priority need --state present",
            args.state
        )));
    }

    let mut desired = NodeAttributes::new();
    if let Some(raw) = &args.lb_state {
        let state: NodeState = raw.parse().map_err(|e| UsageError(format!("--lb-state: {e}")))?;
        desired = desired.with_state(state);
    }
    if let Some(weight) = args.weight {
        desired = desired.with_weight(weight);
    }
    if let Some(priority) = args.priority {
        desired = desired.with_priority(priority);
    }
    Ok(desired)
}

pub async fn run<T: Transport>(
    reconciler: &Reconciler<T>,
    args: &NodeArgs,
    check: bool,
    format: OutputFormat,
) -> Result<()> {
    let resource = ResourceId::node(&args.pool, &args.name);
    let mode = NodeMode::parse(&args.state, &resource)?;
    let desired = desired_attributes(args, mode)?;

    let outcome = reconciler
        .reconcile_node(&args.pool, &args.name, &desired, mode, check)
        .await?;
    print_outcome(&outcome, format)?;
    Ok(())
}
