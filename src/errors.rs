// src/errors.rs

//! Error types shared by the build tasks.
//!
//! The top level of the application uses `anyhow`; tasks report failures
//! through the structured [`TaskError`] so the engine can decide whether a
//! failure is fatal (production) or isolated to one invocation (watch mode).

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use anyhow::Result;

/// A failure inside a single task invocation.
#[derive(Debug, Error)]
pub enum TaskError {
    /// An external transform (template render, style compile, image codec)
    /// rejected its input.
    #[error("transform failed for {}: {message}", path.display())]
    Transform { path: PathBuf, message: String },

    /// Filesystem access failed. Always fatal; never retried.
    #[error("i/o error at {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A glob pattern in a path set did not compile.
    #[error("invalid glob pattern '{pattern}'")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

impl TaskError {
    pub fn transform(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::Transform {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}
