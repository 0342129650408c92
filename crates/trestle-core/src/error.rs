//! Error type shared by diagram construction, measurement and rendering.

use thiserror::Error;

/// Failure raised while building, measuring or rendering a diagram.
///
/// Both variants are fatal to the call that raised them: no partial
/// geometry or document is ever returned alongside an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DiagramError {
    /// A structural invariant does not hold (empty choice, default index out
    /// of range, repetition of nothing).
    #[error("malformed diagram: {0}")]
    MalformedDiagram(String),

    /// The text measurement function failed or produced an unusable width.
    #[error("cannot measure text `{text}`: {reason}")]
    UnmeasurableText { text: String, reason: String },
}

impl DiagramError {
    /// Create a new `MalformedDiagram` error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedDiagram(message.into())
    }

    /// Create a new `UnmeasurableText` error for the given label.
    pub fn unmeasurable(text: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnmeasurableText {
            text: text.into(),
            reason: reason.into(),
        }
    }
}
