//! `database` command implementation.

use anyhow::{Context, Result};
use dispatcher::{PgProcedureSink, PgSinkConfig};
use scheduler::Scheduler;
use tracing::info;

use super::{connect_interval, load_catalogue, resolve_catalogue_paths, run_dispatch};
use crate::cli::DatabaseArgs;

/// Execute the `database` command
pub async fn run_database(args: &DatabaseArgs) -> Result<()> {
    let paths = resolve_catalogue_paths(args.catalogue_files.as_deref(), &args.catalogue_dir)?;
    let catalogue = load_catalogue(&paths)?;

    let scheduler = Scheduler::new(&catalogue).context("Failed to compile catalogue")?;

    info!(
        host = %args.host,
        port = args.port,
        database = %args.database_name,
        user = %args.user,
        "Connecting to database..."
    );
    let config = PgSinkConfig {
        host: args.host.clone(),
        port: args.port,
        user: args.user.clone(),
        password: args.password.clone(),
        database: args.database_name.clone(),
        connect_attempts: args.run.connect_attempts,
        connect_interval: connect_interval(args.run.connect_interval)?,
    };
    let sink = PgProcedureSink::connect("pv", &config)
        .await
        .context("Failed to connect to database")?;

    run_dispatch(scheduler, sink, args.run.max_records).await
}
