//! Error types for event table ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading input tables.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Input file not found.
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to open or read a file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === CSV Parsing Errors ===
    /// Malformed CSV.
    #[error("failed to parse CSV {path}: {source}")]
    CsvParse {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// CSV file has no header row.
    #[error("CSV file is empty: {path}")]
    EmptyCsv { path: PathBuf },

    // === Schema Errors ===
    /// Required column not found in the header.
    #[error("required column '{column}' not found in {path}")]
    MissingColumn { column: String, path: PathBuf },

    /// Required value is blank.
    #[error("{path} row {row}: missing value for '{column}'")]
    MissingValue {
        path: PathBuf,
        row: usize,
        column: String,
    },

    /// Value could not be interpreted.
    #[error("{path} row {row}: invalid {column} value '{value}': {reason}")]
    InvalidValue {
        path: PathBuf,
        row: usize,
        column: String,
        value: String,
        reason: String,
    },
}

impl IngestError {
    pub(crate) fn open(path: PathBuf, source: csv::Error) -> Self {
        let not_found = matches!(
            source.kind(),
            csv::ErrorKind::Io(io) if io.kind() == std::io::ErrorKind::NotFound
        );
        if not_found {
            Self::FileNotFound { path }
        } else {
            Self::CsvParse { path, source }
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
