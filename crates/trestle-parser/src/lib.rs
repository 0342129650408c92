//! # Trestle Parser
//!
//! Parser for the Trestle railroad diagram notation. A source file declares
//! reusable `let` bindings and any number of named diagrams:
//!
//! ```text
//! // line comment
//! let name = nonterminal("name", "Name.html#name");
//! diagram "ObjectName" = optional(sequence(name, "."), skip), name;
//! ```
//!
//! ## Usage
//!
//! ```
//! # use trestle_parser::{parse, ParseError};
//! fn main() -> Result<(), ParseError> {
//!     let source = r#"
//!         let column = nonterminal("column");
//!         diagram "Select" = "SELECT", one_or_more(column, ",");
//!     "#;
//!
//!     let diagrams = parse(source)?;
//!     assert_eq!(diagrams[0].name(), "Select");
//!     Ok(())
//! }
//! ```

mod elaborate;
pub mod error;
mod lexer;
mod parser;
mod parser_types;
mod span;
mod tokens;

pub use elaborate::NamedDiagram;
pub use error::{Diagnostic, ErrorCode, ParseError};
pub use span::Span;

use log::warn;

use elaborate::Builder;

/// Parse source text into named diagrams.
///
/// This is the main entry point for parsing Trestle source code. It runs
/// the complete pipeline:
///
/// 1. **Tokenize** - Convert source text to tokens
/// 2. **Parse** - Build statements from tokens
/// 3. **Elaborate** - Resolve bindings and build the diagram trees
///
/// Warnings are logged and otherwise dropped; use [`parse_with_warnings`] to
/// receive them.
///
/// # Errors
///
/// Returns a [`ParseError`] carrying every diagnostic of the failing phase.
pub fn parse(source: &str) -> Result<Vec<NamedDiagram>, ParseError> {
    let (diagrams, warnings) = parse_with_warnings(source)?;
    for warning in &warnings {
        warn!(code:? = warning.code(); "{warning}");
    }
    Ok(diagrams)
}

/// Parse source text, also returning the warnings of a successful parse.
///
/// # Errors
///
/// Same as [`parse`].
pub fn parse_with_warnings(
    source: &str,
) -> Result<(Vec<NamedDiagram>, Vec<Diagnostic>), ParseError> {
    // Step 1: Tokenize
    let tokens = lexer::tokenize(source)?;

    // Step 2: Parse
    let statements = parser::build_source(&tokens)?;

    // Step 3: Elaborate
    Builder::new().build(&statements)
}
