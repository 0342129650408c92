//! Trestle Core Types and Definitions
//!
//! This crate provides the foundational types for Trestle railroad diagrams.
//! It includes:
//!
//! - **Diagram AST**: the composable rule tree ([`diagram::Node`])
//! - **Colors**: Color handling with CSS color support ([`color::Color`])
//! - **Geometry**: Basic geometric types ([`geometry`] module)
//! - **Draw**: Stroke, text and text measurement definitions ([`draw`] module)
//! - **Document**: The format-independent rendered diagram ([`document::Document`])

pub mod color;
pub mod diagram;
pub mod document;
pub mod draw;
pub mod geometry;

mod error;

pub use error::DiagramError;
