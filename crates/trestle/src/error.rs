//! Error types for Trestle operations.
//!
//! This module provides the main error type [`TrestleError`] which wraps
//! the failures that can occur while parsing, laying out and exporting
//! diagrams.

use std::io;

use thiserror::Error;

use trestle_core::DiagramError;
use trestle_parser::ParseError;

/// The main error type for Trestle operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant carries the source text next to the diagnostics so
/// that callers can render labelled snippets.
#[derive(Debug, Error)]
pub enum TrestleError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse { err: ParseError, src: String },

    #[error(transparent)]
    Diagram(#[from] DiagramError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Export error: {0}")]
    Export(Box<dyn std::error::Error + Send + Sync>),
}

impl From<crate::export::Error> for TrestleError {
    fn from(error: crate::export::Error) -> Self {
        Self::Export(Box::new(error))
    }
}

impl TrestleError {
    /// Create a new `Parse` error with the associated source code.
    pub fn new_parse_error(err: ParseError, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}
