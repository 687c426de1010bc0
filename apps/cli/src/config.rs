//! Configuration loading for the CLI.

use crate::commands::types::{ConfigSourceArgs, DEFAULT_CONFIG_NAME};
use anyhow::{Context, Result};
use kiln_config::{locate_config, resolve, ConfigError, OverrideSource, ResolvedConfig, Schema};
use std::path::PathBuf;

/// Find the configuration file to layer over the schema defaults.
///
/// An explicit `--config-name` must exist. The default name is optional, so
/// `kiln train key=value ...` works without any file.
fn config_file(source: &ConfigSourceArgs) -> Result<Option<PathBuf>> {
    match &source.config_name {
        Some(name) => Ok(Some(locate_config(&source.config_path, name)?)),
        None => match locate_config(&source.config_path, DEFAULT_CONFIG_NAME) {
            Ok(path) => Ok(Some(path)),
            Err(ConfigError::ConfigNotFound { .. }) => {
                tracing::debug!(dir = %source.config_path.display(), "no default configuration file, using schema defaults");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        },
    }
}

/// Resolve schema defaults, the config file and the CLI overrides.
///
/// Precedence (highest first):
/// 1. CLI overrides
/// 2. Configuration file
/// 3. Schema defaults
pub fn load_resolved(schema: &Schema, source: &ConfigSourceArgs) -> Result<ResolvedConfig> {
    let mut overrides = OverrideSource::new();
    if let Some(path) = config_file(source)? {
        tracing::debug!(path = %path.display(), "loading configuration file");
        overrides = overrides
            .with_file(&path, schema)
            .with_context(|| format!("Failed to load configuration file {}", path.display()))?;
    }
    let overrides = overrides.with_cli_args(&source.overrides)?;

    let config = resolve(schema, &overrides).context("Invalid configuration")?;
    Ok(config)
}
