/*
 * error.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Error types for local rendering failures.
//!
//! None of these escape [`crate::BlockRenderer::render`] or
//! [`crate::TagSubstitutor::substitute`]. They are produced by individual
//! node and tag handlers and then reported through the observer as
//! diagnostics, while the caller still receives best-effort text.

use thiserror::Error;

/// Local failures while rendering a single node or tag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MarkupError {
    /// A payload or field that must be an integer was not one.
    #[error("expected an integer, found '{value}'")]
    InvalidInteger { value: String },
}

/// Result type for node and tag handlers.
pub type MarkupResult<T> = Result<T, MarkupError>;
