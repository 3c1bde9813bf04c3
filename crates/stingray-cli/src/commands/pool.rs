use std::fs;

use anyhow::Result;
use stingray_core::{PoolProperties, PoolState, Reconciler, ResourceId, Transport};

use super::UsageError;
use crate::cli::{OutputFormat, PoolArgs};
use crate::output::print_outcome;

/// Parse `--properties`: inline JSON, or `@path` naming a JSON file.
fn read_properties(raw: &str) -> Result<PoolProperties> {
    let content = match raw.strip_prefix('@') {
        Some(path) => {
            fs::read_to_string(path)
                .map_err(|e| UsageError(format!("failed to read --properties file {path}: {e}")))?
        }
        None => raw.to_string(),
    };
    let value: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| UsageError(format!("--properties is not valid JSON: {e}")))?;
    let properties =
        PoolProperties::try_from(value).map_err(|e| UsageError(format!("--properties: {e}")))?;
    Ok(properties)
}

pub async fn run<T: Transport>(
    reconciler: &Reconciler<T>,
    args: &PoolArgs,
    check: bool,
    format: OutputFormat,
) -> Result<()> {
    let resource = ResourceId::pool(&args.name);
    let state = PoolState::parse(&args.state, &resource)?;
    let desired = match &args.properties {
        Some(raw) => read_properties(raw)?,
        None => PoolProperties::new(),
    };

    let outcome = reconciler
        .reconcile_pool(&args.name, &desired, state, check)
        .await?;
    print_outcome(&outcome, format)?;
    Ok(())
}
