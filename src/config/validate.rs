// src/config/validate.rs

use anyhow::{anyhow, Context, Result};

use crate::config::model::ConfigFile;
use crate::fileset::PathSet;

/// Run basic semantic validation against a loaded configuration.
///
/// This checks:
/// - every glob pattern in every path set compiles
/// - `debounce_ms >= 1`
/// - the server port is non-zero
///
/// Stage-graph validation (unknown dependencies, cycles) lives in
/// `pipeline::graph`, next to the graphs themselves.
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    validate_path_sets(cfg)?;
    validate_watch(cfg)?;
    validate_server(cfg)?;
    Ok(())
}

fn validate_path_sets(cfg: &ConfigFile) -> Result<()> {
    compile_checked(&cfg.paths.templates, "paths.templates")?;
    compile_checked(&cfg.paths.styles, "paths.styles")?;
    compile_checked(&cfg.paths.images, "paths.images")?;
    compile_checked(&cfg.paths.sprites, "paths.sprites")?;
    Ok(())
}

fn compile_checked(set: &PathSet, what: &str) -> Result<()> {
    set.compile()
        .map(|_| ())
        .with_context(|| format!("invalid glob patterns in [{what}]"))
}

fn validate_watch(cfg: &ConfigFile) -> Result<()> {
    if cfg.watch.debounce_ms == 0 {
        return Err(anyhow!("[watch].debounce_ms must be >= 1 (got 0)"));
    }
    Ok(())
}

fn validate_server(cfg: &ConfigFile) -> Result<()> {
    if cfg.server.port == 0 {
        return Err(anyhow!("[server].port must be non-zero"));
    }
    Ok(())
}
