mod cli;
mod commands;
mod observability;
mod output;

use anyhow::Result;
use clap::Parser;
use stingray_client::ClientError;
use stingray_config::{ConfigError, load_config};
use stingray_core::{ErrorCategory, ReconcileError};

use cli::{Cli, Commands, ConfigCommands};
use commands::UsageError;
use output::print_error;

/// Exit status for configuration and usage errors, including unsupported states and
/// missing parameters. Other reconciliation failures exit with 1.
const EXIT_CONFIG: i32 = 2;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        log_failure(&e);
        print_error(&format!("{e:#}"));
        std::process::exit(exit_code(&e));
    }
}

fn log_failure(err: &anyhow::Error) {
    let Some(e) = err.downcast_ref::<ReconcileError>() else {
        return;
    };
    match e.attempt() {
        Some(attempt) => tracing::error!(
            category = %e.category(),
            resource = %e.resource(),
            %attempt,
            "reconciliation failed"
        ),
        None => tracing::error!(
            category = %e.category(),
            resource = %e.resource(),
            "invalid request"
        ),
    }
}

fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(e) = err.downcast_ref::<ReconcileError>() {
        return match e.category() {
            ErrorCategory::Validation => EXIT_CONFIG,
            _ => 1,
        };
    }
    if err.downcast_ref::<ConfigError>().is_some()
        || err.downcast_ref::<ClientError>().is_some()
        || err.downcast_ref::<UsageError>().is_some()
    {
        EXIT_CONFIG
    } else {
        1
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    observability::init_tracing_with_level(cli.log_level.as_deref().unwrap_or("warn"));
    let format = cli.format.unwrap_or_default();

    let cfg = load_config(cli.config.as_deref(), &cli.overrides())?;
    observability::apply_logging_level(&cfg.logging.level);

    if let Commands::Config(args) = &cli.command {
        match args.command {
            ConfigCommands::Show => print!("{}", cfg.to_redacted_toml()?),
        }
        return Ok(());
    }

    let reconciler = stingray_client::reconciler(&cfg.connection)?;
    match &cli.command {
        Commands::Pool(args) => commands::pool::run(&reconciler, args, cli.check, format).await?,
        Commands::Node(args) => commands::node::run(&reconciler, args, cli.check, format).await?,
        Commands::PoolOp(args) => {
            commands::pool_op::run(&reconciler, args, cli.check, format).await?
        }
        Commands::Config(_) => {}
    }

    Ok(())
}
