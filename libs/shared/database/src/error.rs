use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error on {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path} changed since it was read (expected version {expected}, found {found})")]
    VersionMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },

    #[error("Duplicate key {key} in {path}")]
    DuplicateKey { path: PathBuf, key: String },
}

impl StoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io { path: path.into(), source }
    }

    pub fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        StoreError::Csv { path: path.into(), source }
    }

    pub fn is_version_mismatch(&self) -> bool {
        matches!(self, StoreError::VersionMismatch { .. })
    }
}
