use std::path::PathBuf;

use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error>;

/// Failures that end a run.
///
/// Every variant leaves the last promoted output untouched; the next
/// invocation resumes from it.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("failed to open input {path}: {source}")]
    InputOpen {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
    #[error("failed reading frames from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
    #[error("transform failed on frame {index}: {source}")]
    Transform {
        index: usize,
        #[source]
        source: BoxError,
    },
    #[error("checkpoint failure at {path}: {source}")]
    Checkpoint {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
    #[error("failed writing {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
    #[error("audio remux into {path} failed: {reason}")]
    Remux { path: PathBuf, reason: String },
    #[error("run already executed")]
    AlreadyExecuted,
}

impl RunError {
    pub fn checkpoint(path: impl Into<PathBuf>, source: impl Into<BoxError>) -> Self {
        Self::Checkpoint {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn read(path: impl Into<PathBuf>, source: impl Into<BoxError>) -> Self {
        Self::Read {
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: impl Into<BoxError>) -> Self {
        Self::Write {
            path: path.into(),
            source: source.into(),
        }
    }
}
