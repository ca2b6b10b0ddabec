//! `broker` command implementation.

use anyhow::{Context, Result};
use dispatcher::{StompSink, StompSinkConfig};
use scheduler::Scheduler;
use tracing::info;

use super::{connect_interval, load_catalogue, resolve_catalogue_paths, run_dispatch};
use crate::cli::BrokerArgs;

/// Execute the `broker` command
pub async fn run_broker(args: &BrokerArgs) -> Result<()> {
    let paths = resolve_catalogue_paths(args.catalogue_files.as_deref(), &args.catalogue_dir)?;
    let catalogue = load_catalogue(&paths)?;

    let scheduler = Scheduler::new(&catalogue).context("Failed to compile catalogue")?;

    info!(broker = %args.broker, user = %args.user, "Connecting to message broker...");
    let config = StompSinkConfig {
        broker: args.broker.clone(),
        login: args.user.clone(),
        passcode: args.password.clone(),
        connect_attempts: args.run.connect_attempts,
        connect_interval: connect_interval(args.run.connect_interval)?,
    };
    let sink = StompSink::connect("amq", &config)
        .await
        .context("Failed to connect to message broker")?;

    run_dispatch(scheduler, sink, args.run.max_records).await
}
