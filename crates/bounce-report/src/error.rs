//! Error types for writing result tables.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while emitting outputs.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Output directory could not be created.
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create, write or flush a staged file.
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV serialization failed.
    #[error("failed to write {table} table: {source}")]
    Csv {
        table: &'static str,
        #[source]
        source: csv::Error,
    },

    /// Run summary serialization failed.
    #[error("failed to serialize run summary: {source}")]
    Json {
        #[source]
        source: serde_json::Error,
    },

    /// A staged file could not be moved to its final name.
    #[error("failed to move {from} to {to}: {source}")]
    Commit {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ReportError {
    pub(crate) fn csv(table: &'static str) -> impl FnOnce(csv::Error) -> Self {
        move |source| Self::Csv { table, source }
    }
}

/// Result type for report operations.
pub type Result<T> = std::result::Result<T, ReportError>;
