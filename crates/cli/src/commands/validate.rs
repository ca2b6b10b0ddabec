//! `validate` command implementation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use scheduler::Scheduler;

use super::{load_catalogue, resolve_catalogue_paths};
use crate::cli::ValidateArgs;

/// Service directories checked when neither files nor a directory are given
const DEFAULT_SERVICE_DIRS: [&str; 2] = ["services/broker", "services/database"];

/// Execute the `validate` command
///
/// Loads and merges each catalogue set, then compiles it so malformed
/// expression templates surface too, not just structural errors. Broker and
/// database catalogues are separate sets; their keys never merge.
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    let sets = catalogue_sets(
        args.catalogue_files.as_deref(),
        args.catalogue_dir.as_deref(),
    )?;

    let mut catalogues = Vec::with_capacity(sets.len());
    for paths in &sets {
        let catalogue = load_catalogue(paths)?;
        Scheduler::new(&catalogue).context("Catalogue failed to compile")?;
        catalogues.push(catalogue);
    }

    if args.json {
        let reports: Vec<_> = sets
            .iter()
            .zip(&catalogues)
            .map(|(paths, catalogue)| {
                let destinations: Vec<_> = catalogue
                    .iter()
                    .map(|entry| {
                        serde_json::json!({
                            "destination": entry.destination,
                            "items": entry.items.len(),
                        })
                    })
                    .collect();
                serde_json::json!({
                    "files": paths
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect::<Vec<_>>(),
                    "destinations": destinations,
                })
            })
            .collect();
        let report = serde_json::json!({
            "valid": true,
            "catalogues": reports,
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("\n=== Catalogue Summary ===\n");
        for (paths, catalogue) in sets.iter().zip(&catalogues) {
            println!("Files:        {}", paths.len());
            println!("Destinations: {}", catalogue.len());
            println!("Items:        {}", catalogue.item_count());
            for entry in catalogue {
                println!("  {} ({} items)", entry.destination, entry.items.len());
            }
            println!();
        }
        println!("All catalogues are valid.\n");
    }

    Ok(())
}

/// Resolve the catalogue sets to validate: the explicit file list as one
/// set, otherwise one set per target directory
fn catalogue_sets(files: Option<&str>, dir: Option<&Path>) -> Result<Vec<Vec<PathBuf>>> {
    if files.is_some() {
        return Ok(vec![resolve_catalogue_paths(
            files,
            dir.unwrap_or_else(|| Path::new(DEFAULT_SERVICE_DIRS[0])),
        )?]);
    }

    target_dirs(dir)
        .iter()
        .map(|d| resolve_catalogue_paths(None, d))
        .collect()
}

/// Directories to scan: the explicit one, or every default service directory
fn target_dirs(dir: Option<&Path>) -> Vec<PathBuf> {
    match dir {
        Some(d) => vec![d.to_path_buf()],
        None => DEFAULT_SERVICE_DIRS.iter().map(PathBuf::from).collect(),
    }
}
