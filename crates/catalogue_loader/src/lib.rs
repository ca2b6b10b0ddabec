//! # Catalogue Loader
//!
//! Catalogue file loading and parsing module.
//!
//! Responsibilities:
//! - Parse JSON catalogue files
//! - Merge multiple files into one `Catalogue` (later files win per
//!   destination key)
//! - Validate catalogue legality
//!
//! # Example
//!
//! ```no_run
//! use catalogue_loader::CatalogueLoader;
//! use std::path::Path;
//!
//! let catalogue =
//!     CatalogueLoader::load(&[Path::new("services/dasmon.json")]).unwrap();
//! println!("Destinations: {}", catalogue.len());
//! ```

mod parser;
mod validator;

pub use contracts::Catalogue;

use contracts::BroadcastError;
use std::path::{Path, PathBuf};
use tracing::info;

/// Catalogue loader
///
/// Provides static methods to load catalogues from files or strings.
pub struct CatalogueLoader;

impl CatalogueLoader {
    /// Load and merge catalogue files, in order
    ///
    /// Later files overwrite earlier ones at the destination-key level.
    /// Any load, parse or validation failure aborts the whole load; no
    /// partial catalogue is ever returned.
    ///
    /// # Errors
    /// - File read failure
    /// - Parse failure
    /// - Validation failure
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Catalogue, BroadcastError> {
        let mut catalogue = Catalogue::new();
        for path in paths {
            let path = path.as_ref();
            info!(file = %path.display(), "Loading catalogue file");
            let single = Self::load_single(path)?;
            catalogue.merge(single);
        }
        validator::validate(&catalogue)?;
        Ok(catalogue)
    }

    /// Load catalogue content from a string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(content: &str) -> Result<Catalogue, BroadcastError> {
        let catalogue = parser::parse(content)?;
        validator::validate(&catalogue)?;
        Ok(catalogue)
    }

    /// Load one file without validating (validation runs once after merge)
    fn load_single(path: &Path) -> Result<Catalogue, BroadcastError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            BroadcastError::catalogue_parse_with_source(
                format!("cannot read {}", path.display()),
                e,
            )
        })?;
        parser::parse(&content)
    }
}

/// All `*.json` catalogue files under a service directory, sorted by name
///
/// Mirrors the default content set of the CLI: every JSON file in the
/// directory is broadcast unless explicit paths are given.
///
/// # Errors
/// Returns an error when the directory cannot be read.
pub fn default_catalogue_files(dir: &Path) -> Result<Vec<PathBuf>, BroadcastError> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    Ok(files)
}
