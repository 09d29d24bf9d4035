// src/config/loader.rs

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::config::model::ConfigFile;
use crate::config::validate::validate_config;

/// Load configuration from `path`, falling back to the built-in defaults
/// when the file does not exist.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_or_default(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();

    if !path.exists() {
        debug!(?path, "no config file found; using defaults");
        return Ok(ConfigFile::default());
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading config file at {:?}", path))?;

    let config: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("parsing TOML config from {:?}", path))?;

    Ok(config)
}

/// Load configuration and run basic validation.
///
/// This is the entry point the rest of the application uses:
///
/// - Reads TOML (or falls back to defaults when the file is absent).
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks that every glob pattern compiles and that the watch/server
///   settings are sane.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let config = load_or_default(&path)?;
    validate_config(&config)?;
    Ok(config)
}
