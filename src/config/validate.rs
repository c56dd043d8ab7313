// src/config/validate.rs

use anyhow::{Context, Result, anyhow};

use crate::config::model::ConfigFile;
use crate::watch::patterns::build_globset;

/// Longest quiet period accepted for `[watch].debounce_ms`.
const MAX_DEBOUNCE_MS: u64 = 60_000;

/// Run basic semantic validation against a loaded configuration.
///
/// This checks:
/// - the build command is non-empty
/// - there is at least one watch pattern
/// - every watch / exclude pattern compiles
/// - `debounce_ms` is within bounds
/// - the notification title is non-empty
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    validate_build(cfg)?;
    validate_watch(cfg)?;
    validate_notify(cfg)?;
    Ok(())
}

fn validate_build(cfg: &ConfigFile) -> Result<()> {
    if cfg.build.cmd.trim().is_empty() {
        return Err(anyhow!("[build].cmd must not be empty"));
    }
    Ok(())
}

fn validate_watch(cfg: &ConfigFile) -> Result<()> {
    if cfg.watch.patterns.is_empty() {
        return Err(anyhow!(
            "[watch].patterns must contain at least one glob pattern"
        ));
    }

    build_globset(&cfg.watch.patterns).context("invalid [watch].patterns")?;
    build_globset(&cfg.watch.exclude).context("invalid [watch].exclude")?;

    if cfg.watch.debounce_ms > MAX_DEBOUNCE_MS {
        return Err(anyhow!(
            "[watch].debounce_ms must be <= {MAX_DEBOUNCE_MS} (got {})",
            cfg.watch.debounce_ms
        ));
    }

    Ok(())
}

fn validate_notify(cfg: &ConfigFile) -> Result<()> {
    if cfg.notify.title.trim().is_empty() {
        return Err(anyhow!("[notify].title must not be empty"));
    }
    Ok(())
}
