//! Export functionality for rendered diagrams.
//!
//! This module provides the [`Exporter`] trait that defines the interface for
//! writing a rendered [`Document`] to an output format. It is the final stage
//! in the Trestle processing pipeline.
//!
//! # Pipeline Position
//!
//! ```text
//! Source Text
//!     ↓ parse
//! Node tree
//!     ↓ measure
//! Measured tree
//!     ↓ render
//! Document
//!     ↓ export (this module)
//! Output File
//! ```
//!
//! # Available Backends
//!
//! - [`svg`] — SVG output via [`svg::Svg`], plus [`svg::read_primitives`] to
//!   parse a serialized document back
//!
//! # Error Handling
//!
//! Export operations return [`Error`], covering malformed input when reading
//! back and I/O errors. [`Error`] converts into
//! [`TrestleError::Export`] at the crate boundary.
//!
//! [`TrestleError::Export`]: crate::TrestleError::Export

/// SVG export backend.
pub mod svg;

use trestle_core::document::Document;

/// Abstraction for diagram export backends.
pub trait Exporter {
    /// Exports a rendered document to the backend's output format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if writing the output fails.
    fn export_document(&mut self, document: &Document) -> Result<(), Error>;
}

/// Errors that can occur during diagram export.
///
/// This type is converted into [`TrestleError::Export`] at the crate
/// boundary via the [`From`] implementation in [`crate::error`].
///
/// [`TrestleError::Export`]: crate::TrestleError::Export
#[derive(Debug)]
pub enum Error {
    /// A serialized document that could not be read back.
    Parse(String),
    /// An I/O error encountered while writing output.
    Io(std::io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(msg) => write!(f, "Parse error: {msg}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(_) => None,
            Self::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
