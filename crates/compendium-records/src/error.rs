/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for record pipelines.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a record pipeline.
///
/// Rendering problems inside a record never show up here; they are
/// reported to the render observer instead.
#[derive(Debug, Error)]
pub enum RecordsError {
    /// Reading or writing a local file failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A remote document could not be fetched.
    #[error("Failed to fetch {path}: {source}")]
    Http {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    /// A document was not valid JSON.
    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// A document fetched from a [`crate::MemorySource`] that has no entry.
    #[error("Document not found: {path}")]
    NotFound { path: String },

    /// A record or document is missing a field the pipeline needs.
    #[error("{record}: missing field '{field}'")]
    MissingField { record: String, field: String },

    /// A field is present but has the wrong shape.
    #[error("{record}: invalid field '{field}': {message}")]
    InvalidField {
        record: String,
        field: String,
        message: String,
    },

    /// A document path that would resolve outside its cache directory.
    #[error("Refusing unsafe document path: {path}")]
    UnsafePath { path: String },

    /// An SRD name list could not be read.
    #[error("Failed to read SRD list {path}: {source}")]
    Srd {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RecordsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RecordsError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn missing(record: impl Into<String>, field: impl Into<String>) -> Self {
        RecordsError::MissingField {
            record: record.into(),
            field: field.into(),
        }
    }

    pub(crate) fn invalid(
        record: impl Into<String>,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        RecordsError::InvalidField {
            record: record.into(),
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result type for record pipelines.
pub type Result<T> = std::result::Result<T, RecordsError>;
