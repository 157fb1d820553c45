//! Subcommands.

pub mod batch;
pub mod config;
pub mod scan;

use std::path::Path;

use anyhow::Context;
use tracing::debug;

use keihi_core::models::config::KeihiConfig;
use keihi_core::{create_client, Scanner};

/// Load the explicit config file, else the per-user one, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<KeihiConfig> {
    if let Some(path) = config_path {
        return KeihiConfig::from_file(Path::new(path))
            .with_context(|| format!("Failed to read config file {}", path));
    }

    let default_path = config::default_config_path();
    if default_path.exists() {
        debug!("Using config file {}", default_path.display());
        return KeihiConfig::from_file(&default_path)
            .with_context(|| format!("Failed to read config file {}", default_path.display()));
    }

    Ok(KeihiConfig::default())
}

/// Build the process-wide model client and the scanner around it.
pub fn build_scanner(config: &KeihiConfig) -> anyhow::Result<Scanner> {
    let client = create_client(&config.model).context("Failed to create model client")?;
    debug!("Using model {}", client.model_name());
    Ok(Scanner::new(client, config))
}
