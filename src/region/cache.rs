//! JSON cache for the region directory

use crate::region::CountryDirectory;
use crate::Result;
use std::path::Path;

/// Loads and validates a cached directory
pub fn load_directory(path: &Path) -> Result<CountryDirectory> {
    let content = std::fs::read_to_string(path)?;
    let directory: CountryDirectory = serde_json::from_str(&content)?;
    directory.validate()?;

    tracing::info!(
        "Loaded region directory from {}: {} federal regions, {} districts",
        path.display(),
        directory.regions.len(),
        directory.district_count()
    );
    Ok(directory)
}

/// Writes the directory as pretty JSON, creating parent directories
pub fn save_directory(path: &Path, directory: &CountryDirectory) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let content = serde_json::to_string_pretty(directory)?;
    std::fs::write(path, content)?;

    tracing::info!("Saved region directory to {}", path.display());
    Ok(())
}
