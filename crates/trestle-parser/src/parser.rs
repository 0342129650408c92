//! Parser for Trestle source tokens.
//!
//! This module transforms a token stream from the [`lexer`](super::lexer) into
//! the statements defined in [`parser_types`](super::parser_types). The public
//! entry point is [`build_source`].
//!
//! # Grammar
//!
//! ```text
//! source     := statement*
//! statement  := "let" IDENT "=" expr ";"
//!             | "diagram" STRING "=" expr ("," expr)* ";"
//! expr       := STRING | INTEGER | IDENT | IDENT "(" (expr ("," expr)*)? ")"
//! ```
//!
//! Whitespace and `//` comments may appear between any two tokens.

use winnow::{
    Parser as _,
    combinator::{alt, opt, preceded, repeat, separated},
    error::{AddContext, ContextError, ErrMode},
    stream::{Stream, TokenSlice},
    token::any,
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    parser_types as types,
    span::{Span, Spanned},
    tokens::{PositionedToken, Token},
};

/// Context type for parser errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Context {
    /// Description of what is currently being parsed
    Label(&'static str),
    /// Remaining token count (`eof_offset()`) at the start of the statement
    StartOffset(usize),
}

type Input<'src> = TokenSlice<'src, PositionedToken<'src>>;
type IResult<O> = std::result::Result<O, ErrMode<ContextError<Context>>>;

/// Run `f`, turning any failure into a Cut error that remembers where it started.
fn cut_err<'src, O, F>(input: &mut Input<'src>, f: F) -> IResult<O>
where
    F: FnOnce(&mut Input<'src>) -> IResult<O>,
{
    let start_remaining = input.eof_offset();

    match f(input) {
        Ok(o) => Ok(o),
        Err(ErrMode::Backtrack(mut e)) | Err(ErrMode::Cut(mut e)) => {
            e.push(Context::StartOffset(start_remaining));
            Err(ErrMode::Cut(e))
        }
        Err(e) => Err(e),
    }
}

/// Parse whitespace and comments
fn ws_comment<'src>(input: &mut Input<'src>) -> IResult<()> {
    any.verify(|token: &PositionedToken<'_>| token.is_trivia())
        .void()
        .parse_next(input)
}

/// Parse zero or more whitespace/comments
fn ws_comments0<'src>(input: &mut Input<'src>) -> IResult<()> {
    repeat(0.., ws_comment).parse_next(input)
}

/// Parse one token matching `expected`, after optional whitespace.
fn token_span<'src>(input: &mut Input<'src>, expected: fn(&Token<'_>) -> bool) -> IResult<Span> {
    preceded(
        ws_comments0,
        any.verify_map(|token: &PositionedToken<'_>| expected(&token.token).then_some(token.span)),
    )
    .parse_next(input)
}

/// Like [`token_span`], labelling the failure with what was expected.
fn symbol<'src>(
    input: &mut Input<'src>,
    expected: fn(&Token<'_>) -> bool,
    label: &'static str,
) -> IResult<Span> {
    let start = input.checkpoint();
    token_span(input, expected).map_err(|e| e.add_context(input, &start, Context::Label(label)))
}

fn semicolon<'src>(input: &mut Input<'src>) -> IResult<Span> {
    symbol(input, |t| matches!(t, Token::Semicolon), "`;`")
}

fn equals<'src>(input: &mut Input<'src>) -> IResult<Span> {
    symbol(input, |t| matches!(t, Token::Equals), "`=`")
}

fn comma<'src>(input: &mut Input<'src>) -> IResult<Span> {
    symbol(input, |t| matches!(t, Token::Comma), "`,`")
}

fn left_paren<'src>(input: &mut Input<'src>) -> IResult<Span> {
    symbol(input, |t| matches!(t, Token::LeftParen), "`(`")
}

fn right_paren<'src>(input: &mut Input<'src>) -> IResult<Span> {
    symbol(input, |t| matches!(t, Token::RightParen), "`)`")
}

fn identifier_token<'src>(input: &mut Input<'src>) -> IResult<Spanned<&'src str>> {
    preceded(
        ws_comments0,
        any.verify_map(|token: &PositionedToken<'src>| match token.token {
            Token::Identifier(name) => Some(Spanned::new(name, token.span)),
            _ => None,
        }),
    )
    .parse_next(input)
}

fn string_token<'src>(input: &mut Input<'src>) -> IResult<Spanned<String>> {
    preceded(
        ws_comments0,
        any.verify_map(|token: &PositionedToken<'_>| match &token.token {
            Token::StringLiteral(s) => Some(Spanned::new(s.clone(), token.span)),
            _ => None,
        }),
    )
    .parse_next(input)
}

fn integer_token<'src>(input: &mut Input<'src>) -> IResult<Spanned<usize>> {
    preceded(
        ws_comments0,
        any.verify_map(|token: &PositionedToken<'_>| match token.token {
            Token::Integer(value) => Some(Spanned::new(value, token.span)),
            _ => None,
        }),
    )
    .parse_next(input)
}

/// Parse an identifier, optionally followed by a parenthesized argument list.
fn call_or_reference<'src>(input: &mut Input<'src>) -> IResult<Spanned<types::Expr<'src>>> {
    let name = identifier_token.parse_next(input)?;

    if opt(left_paren).parse_next(input)?.is_none() {
        return Ok(name.map(types::Expr::Reference));
    }

    // Committed once the opening parenthesis is seen
    cut_err(input, |input| {
        let args: Vec<_> = separated(0.., expression, comma).parse_next(input)?;
        let close = right_paren(input)?;
        let span = name.span().union(close);
        Ok(Spanned::new(types::Expr::Call { name, args }, span))
    })
}

/// Parse an expression
fn expression<'src>(input: &mut Input<'src>) -> IResult<Spanned<types::Expr<'src>>> {
    alt((
        string_token.map(|s| s.map(types::Expr::Literal)),
        integer_token.map(|n| n.map(types::Expr::Integer)),
        call_or_reference,
    ))
    .context(Context::Label("expression"))
    .parse_next(input)
}

/// Parse `let name = expr;`
fn let_statement<'src>(input: &mut Input<'src>) -> IResult<Spanned<types::Statement<'src>>> {
    let start = token_span(input, |t| matches!(t, Token::Let))?;

    cut_err(input, |input| {
        let name = identifier_token
            .context(Context::Label("identifier"))
            .parse_next(input)?;
        equals(input)?;
        let value = expression.parse_next(input)?;
        let end = semicolon(input)?;
        Ok(Spanned::new(
            types::Statement::Let { name, value },
            start.union(end),
        ))
    })
}

/// Parse `diagram "Name" = expr, ...;`
fn diagram_statement<'src>(input: &mut Input<'src>) -> IResult<Spanned<types::Statement<'src>>> {
    let start = token_span(input, |t| matches!(t, Token::Diagram))?;

    cut_err(input, |input| {
        let name = string_token
            .context(Context::Label("string literal"))
            .parse_next(input)?;
        equals(input)?;
        let body: Vec<_> = separated(1.., expression, comma).parse_next(input)?;
        let end = semicolon(input)?;
        Ok(Spanned::new(
            types::Statement::Diagram { name, body },
            start.union(end),
        ))
    })
}

fn statement<'src>(input: &mut Input<'src>) -> IResult<Spanned<types::Statement<'src>>> {
    alt((let_statement, diagram_statement))
        .context(Context::Label("`let` or `diagram` statement"))
        .parse_next(input)
}

/// Skip to the next statement after an error.
///
/// Stops after a `;` or before a `let`/`diagram` keyword, always consuming at
/// least one token when `must_advance` is set.
fn recover<'src>(input: &mut Input<'src>, mut must_advance: bool) {
    loop {
        let checkpoint = input.checkpoint();
        let Some(token) = input.next_token() else {
            return;
        };
        match token.token {
            Token::Semicolon => return,
            Token::Let | Token::Diagram if !must_advance => {
                input.reset(&checkpoint);
                return;
            }
            _ => {}
        }
        if !token.is_trivia() {
            must_advance = false;
        }
    }
}

/// Convert a winnow error into a diagnostic.
///
/// `current_remaining` is the number of tokens left when the error surfaced;
/// the offending token is the first meaningful token from there on.
fn convert_error(
    error: ErrMode<ContextError<Context>>,
    tokens: &[PositionedToken],
    current_remaining: usize,
) -> Diagnostic {
    let (expected, start_remaining) = match &error {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => (
            e.context().find_map(|ctx| match ctx {
                Context::Label(label) => Some(*label),
                Context::StartOffset(_) => None,
            }),
            // Outermost start: the statement rather than a nested call
            e.context()
                .filter_map(|ctx| match ctx {
                    Context::StartOffset(n) => Some(*n),
                    Context::Label(_) => None,
                })
                .last(),
        ),
        ErrMode::Incomplete(_) => (None, None),
    };

    let end_offset = tokens.len().saturating_sub(current_remaining);
    let offending = tokens[end_offset.min(tokens.len())..]
        .iter()
        .find(|t| !t.is_trivia());

    let expected = expected.map_or_else(String::new, |label| format!(", expected {label}"));

    let mut diagnostic = match offending {
        Some(token) => Diagnostic::error(format!("unexpected `{}`{expected}", token.token))
            .with_code(ErrorCode::E100)
            .with_label(token.span, "unexpected token"),
        None => {
            let last = tokens
                .iter()
                .rev()
                .find(|t| !t.is_trivia())
                .map(|t| t.span)
                .unwrap_or_default();
            Diagnostic::error(format!("unexpected end of input{expected}"))
                .with_code(ErrorCode::E101)
                .with_label(Span::new(last.end()..last.end()), "input ends here")
                .with_help("every statement ends with `;`")
        }
    };

    if let Some(statement_start) = start_remaining
        .map(|remaining| tokens.len().saturating_sub(remaining))
        .and_then(|offset| tokens.get(offset.saturating_sub(1)))
        .filter(|token| matches!(token.token, Token::Let | Token::Diagram))
    {
        diagnostic = diagnostic.with_secondary_label(statement_start.span, "in this statement");
    }

    diagnostic
}

/// Parse every statement of a token stream.
///
/// Syntax errors are collected statement by statement: after an error the
/// parser skips to the next statement and keeps going.
pub fn build_source<'src>(
    tokens: &'src [PositionedToken<'src>],
) -> Result<Vec<Spanned<types::Statement<'src>>>, ParseError> {
    let mut input = TokenSlice::new(tokens);
    let mut statements = Vec::new();
    let mut diagnostics = DiagnosticCollector::new();

    loop {
        let _ = ws_comments0(&mut input);
        if input.eof_offset() == 0 {
            break;
        }

        let before = input.eof_offset();
        match statement(&mut input) {
            Ok(statement) => statements.push(statement),
            Err(e) => {
                let remaining = input.eof_offset();
                diagnostics.emit(convert_error(e, tokens, remaining));
                recover(&mut input, remaining == before);
            }
        }
    }

    diagnostics.finish()?;
    Ok(statements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_ok<'a>(tokens: &'a [PositionedToken<'a>]) -> Vec<Spanned<types::Statement<'a>>> {
        build_source(tokens).expect("parse")
    }

    fn parse_err(source: &str) -> ParseError {
        let tokens = tokenize(source).expect("tokenize");
        build_source(&tokens).expect_err("expected a parse error")
    }

    #[test]
    fn test_let_statement() {
        let tokens = tokenize("let name = nonterminal(\"name\", \"Name.html#name\");").unwrap();
        let statements = parse_ok(&tokens);
        assert_eq!(statements.len(), 1);

        let types::Statement::Let { name, value } = statements[0].inner() else {
            panic!("expected let statement");
        };
        assert_eq!(*name.inner(), "name");
        let types::Expr::Call { name, args } = value.inner() else {
            panic!("expected call");
        };
        assert_eq!(*name.inner(), "nonterminal");
        assert_eq!(args.len(), 2);
        assert_eq!(
            args[0].inner(),
            &types::Expr::Literal("name".to_string())
        );
    }

    #[test]
    fn test_diagram_statement_with_several_expressions() {
        let tokens =
            tokenize("diagram \"ObjectName\" = optional(sequence(name, \".\"), skip), name;")
                .unwrap();
        let statements = parse_ok(&tokens);

        let types::Statement::Diagram { name, body } = statements[0].inner() else {
            panic!("expected diagram statement");
        };
        assert_eq!(name.inner(), "ObjectName");
        assert_eq!(body.len(), 2);
        assert_eq!(body[1].inner(), &types::Expr::Reference("name"));
    }

    #[test]
    fn test_nested_calls_and_integers() {
        let tokens = tokenize("let x = choice(1, \"A\", \"B\", skip());").unwrap();
        let statements = parse_ok(&tokens);
        let types::Statement::Let { value, .. } = statements[0].inner() else {
            panic!("expected let statement");
        };
        let types::Expr::Call { args, .. } = value.inner() else {
            panic!("expected call");
        };
        assert_eq!(args[0].inner(), &types::Expr::Integer(1));
        let types::Expr::Call { args: inner, .. } = args[3].inner() else {
            panic!("expected nested call");
        };
        assert!(inner.is_empty());
    }

    #[test]
    fn test_comments_and_whitespace() {
        let source = "// header\nlet a = \"a\"; // trailing\n\n  diagram \"A\" =\n  a ;\n";
        let tokens = tokenize(source).unwrap();
        assert_eq!(parse_ok(&tokens).len(), 2);

        let tokens = tokenize("  // nothing here\n").unwrap();
        assert!(parse_ok(&tokens).is_empty());
    }

    #[test]
    fn test_statement_span() {
        let source = "  let a = \"a\";";
        let tokens = tokenize(source).unwrap();
        let statements = build_source(&tokens).unwrap();
        assert_eq!(statements[0].span(), Span::new(2..14));
    }

    #[test]
    fn test_missing_semicolon() {
        let err = parse_err("let a = \"a\"\nlet b = \"b\";");
        assert_eq!(err.diagnostics().len(), 1);

        let diag = &err.diagnostics()[0];
        assert_eq!(diag.code(), Some(ErrorCode::E100));
        assert!(diag.message().contains("expected `;`"), "{}", diag.message());
    }

    #[test]
    fn test_errors_in_several_statements() {
        let err = parse_err("let = \"a\";\ndiagram A = a;\nlet ok = \"x\";");
        assert_eq!(err.diagnostics().len(), 2);
        assert!(err.diagnostics()[0].message().contains("identifier"));
        assert!(err.diagnostics()[1].message().contains("string literal"));
    }

    #[test]
    fn test_unclosed_call() {
        let err = parse_err("let a = sequence(\"a\", \"b\";");
        let diag = &err.diagnostics()[0];
        assert!(diag.message().contains("`)`"), "{}", diag.message());
        assert!(diag.labels().iter().any(|l| l.is_secondary()));
    }

    #[test]
    fn test_incomplete_input() {
        let err = parse_err("diagram \"A\" = ");
        assert_eq!(err.diagnostics()[0].code(), Some(ErrorCode::E101));
    }

    #[test]
    fn test_stray_token() {
        let err = parse_err("; let a = \"a\";");
        assert_eq!(err.diagnostics().len(), 1);
        assert!(err.diagnostics()[0].message().contains("`let` or `diagram`"));
    }
}
