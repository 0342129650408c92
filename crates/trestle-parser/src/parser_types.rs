//! Syntax tree produced by the [`parser`](super::parser).
//!
//! The tree mirrors the source closely; names are not resolved and calls are
//! not checked against the builtin functions until elaboration.

use crate::span::Spanned;

/// An expression: a literal, a reference to a `let` binding or a call.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr<'src> {
    /// A string literal. In diagram position it denotes a Terminal.
    Literal(String),
    /// A non-negative integer, used for the default index of `choice`.
    Integer(usize),
    /// An identifier without arguments.
    Reference(&'src str),
    /// A function call such as `optional(x, skip)`.
    Call {
        name: Spanned<&'src str>,
        args: Vec<Spanned<Expr<'src>>>,
    },
}

/// A top-level statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement<'src> {
    /// `let name = expr;`
    Let {
        name: Spanned<&'src str>,
        value: Spanned<Expr<'src>>,
    },
    /// `diagram "Name" = expr, expr, ...;`
    Diagram {
        name: Spanned<String>,
        body: Vec<Spanned<Expr<'src>>>,
    },
}
