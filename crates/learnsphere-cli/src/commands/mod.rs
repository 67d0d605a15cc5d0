//! Subcommand implementations.

pub mod badge;
pub mod courses;
pub mod init;
pub mod progress;
pub mod report;
pub mod score;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use learnsphere_core::config::EngineConfig;
use learnsphere_core::model::Catalog;
use learnsphere_core::parser;

/// Load the catalog named on the command line, or the configured one.
///
/// A directory must hold exactly one loadable catalog.
pub(crate) fn load_catalog(path: Option<PathBuf>, config: &EngineConfig) -> Result<Catalog> {
    let path = path.or_else(|| config.catalog.clone()).context(
        "no catalog given: pass --catalog or set `catalog` in learnsphere.toml",
    )?;
    tracing::debug!("loading catalog from {}", path.display());

    if path.is_dir() {
        let mut catalogs = parser::load_catalog_directory(&path, &config.default_rewards)?;
        match catalogs.len() {
            1 => Ok(catalogs.remove(0)),
            0 => anyhow::bail!("no catalog found in {}", path.display()),
            n => anyhow::bail!(
                "{} holds {n} catalogs; pass a single catalog file",
                path.display()
            ),
        }
    } else {
        parser::parse_catalog(&path, &config.default_rewards)
    }
}

pub(crate) fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    learnsphere_core::config::load_config_from(path)
}

/// Split a comma-separated list, dropping empty entries.
pub(crate) fn split_list(s: &str) -> Vec<&str> {
    s.split(',').map(str::trim).filter(|s| !s.is_empty()).collect()
}
