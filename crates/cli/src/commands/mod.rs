//! Command implementations.

mod broker;
mod database;
mod validate;

pub use broker::run_broker;
pub use database::run_database;
pub use validate::run_validate;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use catalogue_loader::{default_catalogue_files, Catalogue, CatalogueLoader};
use contracts::BroadcastSink;
use dispatcher::{DispatchStats, Dispatcher, TokioPacer};
use scheduler::Scheduler;
use tracing::{info, warn};

/// Resolve catalogue file paths: explicit comma-separated list, or every
/// JSON file in the service directory
pub(crate) fn resolve_catalogue_paths(
    explicit: Option<&str>,
    dir: &Path,
) -> Result<Vec<PathBuf>> {
    let paths = match explicit {
        Some(list) => list
            .split(',')
            .map(|p| PathBuf::from(p.trim()))
            .filter(|p| !p.as_os_str().is_empty())
            .collect(),
        None => default_catalogue_files(dir)
            .with_context(|| format!("Failed to list catalogue files in {}", dir.display()))?,
    };

    if paths.is_empty() {
        anyhow::bail!("No catalogue files to broadcast");
    }
    Ok(paths)
}

/// Parse the connect-interval flag into a duration
///
/// Rejects negative, non-finite and overflowing values instead of
/// panicking inside `Duration`.
pub(crate) fn connect_interval(seconds: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(seconds)
        .map_err(|e| anyhow::anyhow!("invalid connect interval '{seconds}': {e}"))
}

/// Load, merge and validate the catalogue
pub(crate) fn load_catalogue(paths: &[PathBuf]) -> Result<Catalogue> {
    let catalogue = CatalogueLoader::load(paths).context("Failed to load catalogue")?;
    info!(
        files = paths.len(),
        destinations = catalogue.len(),
        items = catalogue.item_count(),
        "Catalogue loaded"
    );
    Ok(catalogue)
}

/// Drive the dispatch loop until completion or shutdown signal
pub(crate) async fn run_dispatch<S: BroadcastSink>(
    scheduler: Scheduler,
    sink: S,
    max_records: u64,
) -> Result<()> {
    let dispatcher = Dispatcher::new(sink).with_max_records(max_records);

    info!("Starting broadcast...");

    tokio::select! {
        result = dispatcher.run(scheduler, TokioPacer) => {
            let stats = result.context("Broadcast failed")?;
            info!(
                records = stats.records_sent,
                ticks = stats.ticks,
                duration_secs = stats.duration.as_secs_f64(),
                rate = format!("{:.2}", stats.rate()),
                "Broadcast completed"
            );
            print_summary(&stats);
        }
        _ = shutdown_signal() => {
            warn!("Received shutdown signal, stopping broadcaster...");
        }
    }

    Ok(())
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print run statistics for bounded runs
fn print_summary(stats: &DispatchStats) {
    println!("\n=== Broadcast Summary ===\n");
    println!("Records sent: {}", stats.records_sent);
    println!("Ticks:        {}", stats.ticks);
    println!("Duration:     {:.2}s", stats.duration.as_secs_f64());
    println!("Rate:         {:.2} records/s", stats.rate());

    if !stats.summary.per_destination.is_empty() {
        println!("\nPer destination:");
        let mut rows: Vec<_> = stats.summary.per_destination.iter().collect();
        rows.sort();
        for (destination, count) in rows {
            println!("  {destination}: {count}");
        }
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_explicit_paths_trims_whitespace() {
        let paths =
            resolve_catalogue_paths(Some("a.json, b.json ,c.json"), Path::new("unused")).unwrap();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("a.json"),
                PathBuf::from("b.json"),
                PathBuf::from("c.json")
            ]
        );
    }

    #[test]
    fn test_resolve_empty_list_fails() {
        assert!(resolve_catalogue_paths(Some(" , "), Path::new("unused")).is_err());
    }

    #[test]
    fn test_resolve_falls_back_to_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("x.json"), "{}").unwrap();

        let paths = resolve_catalogue_paths(None, dir.path()).unwrap();
        assert_eq!(paths.len(), 1);
    }

    #[test]
    fn test_connect_interval_rejects_unrepresentable_values() {
        assert_eq!(connect_interval(5.0).unwrap(), Duration::from_secs(5));
        assert!(connect_interval(-1.0).is_err());
        assert!(connect_interval(f64::NAN).is_err());
        assert!(connect_interval(1e300).is_err());
    }
}
