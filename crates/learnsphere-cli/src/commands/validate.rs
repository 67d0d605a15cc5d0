//! The `learnsphere validate` command.

use std::path::PathBuf;

use anyhow::Result;

use learnsphere_core::error::EngineError;
use learnsphere_core::model::Catalog;
use learnsphere_core::parser;

pub fn execute(catalog_path: PathBuf, config_path: Option<PathBuf>) -> Result<()> {
    let config = super::load_config(config_path.as_deref())?;
    let defaults = &config.default_rewards;
    let loaded = if catalog_path.is_dir() {
        parser::load_catalog_directory(&catalog_path, defaults)
    } else {
        parser::parse_catalog(&catalog_path, defaults).map(|c| vec![c])
    };
    let catalogs: Vec<Catalog> = match loaded {
        Ok(catalogs) => catalogs,
        Err(e) if breaks_integrity(&e) => {
            return Err(e.context("catalog failed its data integrity checks"))
        }
        Err(e) => return Err(e),
    };

    let mut total_warnings = 0;

    for catalog in &catalogs {
        let lessons: usize = catalog
            .courses()
            .iter()
            .map(|c| catalog.total_lessons(&c.id).unwrap_or(0))
            .sum();
        println!(
            "Catalog: {} ({} courses, {} lessons, {} quizzes)",
            catalog.name(),
            catalog.courses().len(),
            lessons,
            catalog.quizzes().len()
        );

        let warnings = parser::validate_catalog(catalog);
        for w in &warnings {
            let prefix = w
                .subject
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All catalogs valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}

/// Whether a load failure comes from inconsistent catalog data rather than
/// an unreadable file.
fn breaks_integrity(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|e| e.downcast_ref::<EngineError>())
        .any(EngineError::is_data_integrity)
}
