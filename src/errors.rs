// src/errors.rs

//! Crate-wide error types.
//!
//! Library code returns [`DevloopError`] where the failure is part of the
//! domain (watcher setup, globs, spawning). Config loading and the
//! application edges use `anyhow` to attach context.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DevloopError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("invalid glob pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("failed to spawn {path:?}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, DevloopError>;
