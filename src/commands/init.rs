//! Init command implementation.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use crate::config::{write_atomic, Config};

/// Write the commented default configuration to `config_path`.
pub fn run(force: bool, config_path: &Path) -> Result<()> {
    if config_path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {:?} (use --force to overwrite)",
            config_path
        );
    }

    if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }

    write_atomic(config_path, &Config::generate_default_yaml())?;
    info!("Configuration written to {:?}", config_path);
    Ok(())
}
