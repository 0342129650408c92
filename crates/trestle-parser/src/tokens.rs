//! Token definitions produced by the [`lexer`](super::lexer).

use std::fmt;

use crate::span::Span;

/// A lexical token of the Trestle notation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'src> {
    // Keywords
    Let,
    Diagram,

    Identifier(&'src str),
    StringLiteral(String),
    Integer(usize),

    Equals,
    Comma,
    Semicolon,
    LeftParen,
    RightParen,

    Whitespace,
    Newline,
    LineComment(&'src str),
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Let => write!(f, "let"),
            Token::Diagram => write!(f, "diagram"),
            Token::Identifier(name) => write!(f, "{name}"),
            Token::StringLiteral(s) => write!(f, "\"{s}\""),
            Token::Integer(n) => write!(f, "{n}"),
            Token::Equals => write!(f, "="),
            Token::Comma => write!(f, ","),
            Token::Semicolon => write!(f, ";"),
            Token::LeftParen => write!(f, "("),
            Token::RightParen => write!(f, ")"),
            Token::Whitespace => write!(f, " "),
            Token::Newline => writeln!(f),
            Token::LineComment(text) => write!(f, "//{text}"),
        }
    }
}

/// A token together with its location in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedToken<'src> {
    pub token: Token<'src>,
    pub span: Span,
}

impl<'src> PositionedToken<'src> {
    pub fn new(token: Token<'src>, span: Span) -> Self {
        Self { token, span }
    }

    /// Returns `true` for tokens the parser skips between meaningful tokens.
    pub fn is_trivia(&self) -> bool {
        matches!(
            self.token,
            Token::Whitespace | Token::Newline | Token::LineComment(_)
        )
    }
}
