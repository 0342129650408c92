//! Lexical analyzer for Trestle source text.
//!
//! The lexer converts source text into a stream of [`Token`]s for parsing.
//! It handles whitespace, line comments, string and integer literals, the
//! two statement keywords and punctuation.
//!
//! The public entry point is [`tokenize`], which recovers after errors and
//! collects all diagnostics in a single pass.

use winnow::{
    Parser as _,
    ascii::digit1,
    combinator::{alt, cut_err, delimited, not, peek, preceded, repeat, terminated},
    error::{AddContext, ContextError, ErrMode, ModalResult},
    stream::{LocatingSlice, Location, Stream},
    token::{literal, none_of, one_of, take_till, take_while},
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, ParseError},
    span::Span,
    tokens::{PositionedToken, Token},
};

/// Diagnostic information attached to winnow errors via `.context()`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LexerDiagnostic {
    code: ErrorCode,
    message: &'static str,
    help: Option<&'static str>,
    /// The error span covers from `start` to the error position.
    start: usize,
}

type Input<'a> = LocatingSlice<&'a str>;
type IResult<O> = ModalResult<O, ContextError<LexerDiagnostic>>;

/// How the lexer resumes after an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Recovery {
    /// Skip the offending character.
    Char,
    /// Skip to the end of the line.
    Line,
    /// The failing parser already consumed the bad input.
    InPlace,
}

/// Returns `true` for characters that may continue an identifier.
fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Parse a unicode escape after the backslash: `u{XXXX}` with 1-6 hex digits.
fn string_escape_unicode(input: &mut Input<'_>, escape_start: usize) -> IResult<char> {
    preceded(
        'u',
        cut_err(
            delimited('{', take_while(1..=6, |c: char| c.is_ascii_hexdigit()), '}')
                .verify_map(|hex: &str| u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)),
        )
        .context(LexerDiagnostic {
            code: ErrorCode::E004,
            message: "invalid unicode escape",
            help: Some("use `\\u{XXXX}` with 1-6 hex digits naming a valid codepoint"),
            start: escape_start,
        }),
    )
    .parse_next(input)
}

fn backslash(input: &mut Input<'_>) -> IResult<char> {
    '\\'.parse_next(input)
}

fn opening_quote(input: &mut Input<'_>) -> IResult<char> {
    '"'.parse_next(input)
}

/// Parse a standard escape character after the backslash.
fn string_escape_char(input: &mut Input<'_>) -> IResult<char> {
    one_of(['n', 't', '\\', '"', '\''])
        .map(|c| match c {
            'n' => '\n',
            't' => '\t',
            other => other,
        })
        .parse_next(input)
}

/// Parse an escape sequence starting with a backslash.
fn string_escape(input: &mut Input<'_>) -> IResult<char> {
    let escape_start = input.current_token_start();

    backslash(input)?;

    match string_escape_unicode(input, escape_start) {
        Ok(ch) => return Ok(ch),
        Err(ErrMode::Backtrack(_)) => {}
        Err(e) => return Err(e),
    }

    if let Ok(ch) = string_escape_char(input) {
        return Ok(ch);
    }

    Err(ErrMode::Cut(ContextError::new().add_context(
        input,
        &input.checkpoint(),
        LexerDiagnostic {
            code: ErrorCode::E003,
            message: "invalid escape sequence",
            help: Some("valid escapes: `\\n`, `\\t`, `\\\\`, `\\\"`, `\\'`, `\\u{}`"),
            start: escape_start,
        },
    )))
}

/// Parse a double-quoted string literal. Strings may not span lines.
fn string_literal<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    let string_char = none_of(['"', '\\', '\n', '\r']);
    let string_content = repeat(0.., alt((string_escape, string_char))).fold(
        String::new,
        |mut acc, ch| {
            acc.push(ch);
            acc
        },
    );

    let start_pos = input.current_token_start();

    opening_quote(input)?;

    // Commit after the opening quote
    cut_err(terminated(string_content, '"'))
        .context(LexerDiagnostic {
            code: ErrorCode::E001,
            message: "unterminated string literal",
            help: Some("add closing `\"` before the end of the line"),
            start: start_pos,
        })
        .parse_next(input)
        .map(Token::StringLiteral)
}

/// A run of decimal digits not followed by an identifier character.
fn digits<'a>(input: &mut Input<'a>) -> IResult<&'a str> {
    terminated(digit1, peek(not(one_of(is_ident_char)))).parse_next(input)
}

/// Parse a non-negative integer literal.
fn integer_literal<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    let start_pos = input.current_token_start();

    match digits(input)?.parse::<usize>() {
        Ok(value) => Ok(Token::Integer(value)),
        Err(_) => Err(ErrMode::Cut(ContextError::new().add_context(
            input,
            &input.checkpoint(),
            LexerDiagnostic {
                code: ErrorCode::E005,
                message: "integer literal out of range",
                help: None,
                start: start_pos,
            },
        ))),
    }
}

/// Parse line comment starting with '//'
fn line_comment<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    preceded("//", take_till(0.., '\n'))
        .map(Token::LineComment)
        .parse_next(input)
}

/// Parse keywords with word boundary checking
fn keyword<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    terminated(
        alt((literal("let"), literal("diagram"))),
        peek(not(one_of(is_ident_char))),
    )
    .map(|keyword: &str| match keyword {
        "let" => Token::Let,
        _ => Token::Diagram,
    })
    .parse_next(input)
}

/// Parse identifiers: a letter or underscore, then letters, digits or underscores.
fn identifier<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    take_while(1.., is_ident_char)
        .verify(|s: &str| {
            s.chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        })
        .map(Token::Identifier)
        .parse_next(input)
}

/// Parse single character tokens
fn single_char_token<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    alt((
        '='.value(Token::Equals),
        ','.value(Token::Comma),
        ';'.value(Token::Semicolon),
        '('.value(Token::LeftParen),
        ')'.value(Token::RightParen),
    ))
    .parse_next(input)
}

/// Parse whitespace (spaces, tabs, etc. but not newlines)
fn whitespace<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    take_while(1.., |c: char| c.is_whitespace() && c != '\n')
        .value(Token::Whitespace)
        .parse_next(input)
}

/// Parse newline
fn newline<'a>(input: &mut Input<'a>) -> IResult<Token<'a>> {
    '\n'.value(Token::Newline).parse_next(input)
}

/// Consume everything up to (not including) the next newline.
fn rest_of_line<'a>(input: &mut Input<'a>) -> IResult<&'a str> {
    take_till(0.., '\n').parse_next(input)
}

/// Parse a single token with position tracking
fn positioned_token<'a>(input: &mut Input<'a>) -> IResult<PositionedToken<'a>> {
    let start_pos = input.current_token_start();

    let token = alt((
        line_comment,      // Must come before any single char
        string_literal,    // Must come before any single char
        keyword,           // Must come before identifier
        integer_literal,   // Must come before identifier
        identifier,        // Must come before single chars
        single_char_token, // Single character tokens
        newline,           // Must come before whitespace
        whitespace,        // General whitespace
    ))
    .parse_next(input)?;

    let end_pos = input.current_token_start();

    Ok(PositionedToken::new(token, Span::new(start_pos..end_pos)))
}

/// Lexer that accumulates tokens and diagnostics during tokenization.
struct Lexer<'a> {
    tokens: Vec<PositionedToken<'a>>,
    diagnostics: DiagnosticCollector,
}

impl<'a> Lexer<'a> {
    fn new() -> Self {
        Self {
            tokens: Vec::new(),
            diagnostics: DiagnosticCollector::new(),
        }
    }

    /// Tokenize the input, collecting tokens and errors.
    fn tokenize(&mut self, mut input: Input<'a>) {
        while !input.is_empty() {
            match positioned_token(&mut input) {
                Ok(token) => self.tokens.push(token),
                Err(e) => {
                    let error_pos = input.current_token_start();
                    let (diagnostic, recovery) = Self::convert_err_mode(e, error_pos);
                    self.diagnostics.emit(diagnostic);

                    match recovery {
                        // Resuming mid-string would lex its closing quote as a new string
                        Recovery::Line => {
                            let _ = rest_of_line(&mut input);
                        }
                        Recovery::Char if !input.is_empty() => {
                            input.next_token();
                        }
                        Recovery::Char | Recovery::InPlace => {}
                    }
                }
            }
        }
    }

    /// Finish lexing and return tokens or collected errors.
    fn finish(self) -> Result<Vec<PositionedToken<'a>>, ParseError> {
        self.diagnostics.finish().map(|_| self.tokens)
    }

    /// Convert an ErrMode and error position to a Diagnostic.
    ///
    /// Also decides how to resume. Falls back to E002 (unexpected character)
    /// if no context is attached.
    fn convert_err_mode(
        err: ErrMode<ContextError<LexerDiagnostic>>,
        error_pos: usize,
    ) -> (Diagnostic, Recovery) {
        let context_error = match err {
            ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => ctx,
            ErrMode::Incomplete(_) => ContextError::new(),
        };

        if let Some(LexerDiagnostic {
            code,
            message,
            help,
            start,
        }) = context_error.context().next()
        {
            let span = Span::new(*start..error_pos.max(*start + 1));

            let mut diag = Diagnostic::error(*message)
                .with_code(*code)
                .with_label(span, code.description());
            if let Some(h) = help {
                diag = diag.with_help(*h);
            }
            let recovery = match code {
                ErrorCode::E001 | ErrorCode::E003 | ErrorCode::E004 => Recovery::Line,
                ErrorCode::E005 => Recovery::InPlace,
                _ => Recovery::Char,
            };
            return (diag, recovery);
        }

        let span = Span::new(error_pos..error_pos.saturating_add(1));
        let diag = Diagnostic::error("unexpected character")
            .with_code(ErrorCode::E002)
            .with_label(span, ErrorCode::E002.description());
        (diag, Recovery::Char)
    }
}

/// Tokenize source text, collecting every lexical error.
///
/// # Returns
///
/// - `Ok(tokens)` - All tokens successfully lexed
/// - `Err(ParseError)` - One or more errors occurred; contains all diagnostics
pub fn tokenize(input: &str) -> Result<Vec<PositionedToken<'_>>, ParseError> {
    let mut lexer = Lexer::new();
    lexer.tokenize(LocatingSlice::new(input));
    lexer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_single_token(input: &str, expected: Token<'_>) {
        let mut located_input = LocatingSlice::new(input);
        let result = positioned_token(&mut located_input);
        assert!(result.is_ok(), "Failed to parse: {}", input);
        assert_eq!(result.unwrap().token, expected);
    }

    fn assert_error_codes(input: &str, expected: &[ErrorCode]) {
        let err = tokenize(input).expect_err("expected lexing to fail");
        let codes: Vec<_> = err.diagnostics().iter().map(|d| d.code()).collect();
        let expected: Vec<_> = expected.iter().copied().map(Some).collect();
        assert_eq!(codes, expected, "error codes for input {input:?}");
    }

    #[test]
    fn test_keywords() {
        test_single_token("let", Token::Let);
        test_single_token("diagram", Token::Diagram);
    }

    #[test]
    fn test_keyword_word_boundaries() {
        test_single_token("letter", Token::Identifier("letter"));
        test_single_token("diagrams", Token::Identifier("diagrams"));
        test_single_token("let_", Token::Identifier("let_"));
    }

    #[test]
    fn test_identifiers() {
        test_single_token("one_or_more", Token::Identifier("one_or_more"));
        test_single_token("_private", Token::Identifier("_private"));
        test_single_token("expr2", Token::Identifier("expr2"));
    }

    #[test]
    fn test_integers() {
        test_single_token("0", Token::Integer(0));
        test_single_token("42", Token::Integer(42));
    }

    #[test]
    fn test_punctuation() {
        test_single_token("=", Token::Equals);
        test_single_token(",", Token::Comma);
        test_single_token(";", Token::Semicolon);
        test_single_token("(", Token::LeftParen);
        test_single_token(")", Token::RightParen);
    }

    #[test]
    fn test_string_literals() {
        test_single_token("\"SELECT\"", Token::StringLiteral("SELECT".to_string()));
        test_single_token("\"\"", Token::StringLiteral(String::new()));
        test_single_token("\"a,b\"", Token::StringLiteral("a,b".to_string()));
    }

    #[test]
    fn test_string_escapes() {
        test_single_token("\"\\\"\"", Token::StringLiteral("\"".to_string()));
        test_single_token("\"a\\\\b\"", Token::StringLiteral("a\\b".to_string()));
        test_single_token("\"tab\\t\"", Token::StringLiteral("tab\t".to_string()));
        test_single_token("\"\\u{3B5}\"", Token::StringLiteral("ε".to_string()));
    }

    #[test]
    fn test_line_comment() {
        test_single_token("// note", Token::LineComment(" note"));
    }

    #[test]
    fn test_span_tracking() {
        let tokens = tokenize("let x").unwrap();

        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].span, Span::new(0..3));
        assert_eq!(tokens[1].span, Span::new(3..4));
        assert_eq!(tokens[2].span, Span::new(4..5));
    }

    #[test]
    fn test_full_statement() {
        let tokens = tokenize("let a = optional(\"x\", skip);").unwrap();
        let meaningful: Vec<_> = tokens
            .iter()
            .filter(|t| !t.is_trivia())
            .map(|t| t.token.clone())
            .collect();

        assert_eq!(
            meaningful,
            vec![
                Token::Let,
                Token::Identifier("a"),
                Token::Equals,
                Token::Identifier("optional"),
                Token::LeftParen,
                Token::StringLiteral("x".to_string()),
                Token::Comma,
                Token::Identifier("skip"),
                Token::RightParen,
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn test_error_unterminated_string() {
        assert_error_codes("\"unterminated", &[ErrorCode::E001]);
        assert_error_codes("\"", &[ErrorCode::E001]);
    }

    #[test]
    fn test_error_unterminated_string_span() {
        let input = "let a = \"hello\nlet b";
        let err = tokenize(input).unwrap_err();
        let diag = &err.diagnostics()[0];
        let span = diag.labels()[0].span();

        assert_eq!(span.start(), 8);
        assert_eq!(span.end(), 14);
    }

    #[test]
    fn test_error_invalid_escape_does_not_cascade() {
        assert_error_codes("\"test\\x\"", &[ErrorCode::E003]);
        assert_error_codes("\"test\\u{}\"", &[ErrorCode::E004]);
        assert_error_codes("\"test\\u{D800}\"", &[ErrorCode::E004]);
    }

    #[test]
    fn test_error_integer_out_of_range() {
        assert_error_codes("99999999999999999999999999", &[ErrorCode::E005]);
        assert_error_codes("choice(99999999999999999999999999, \"a\")", &[ErrorCode::E005]);
    }

    #[test]
    fn test_error_unexpected_character() {
        assert_error_codes("let a = #;", &[ErrorCode::E002]);
    }

    #[test]
    fn test_errors_collected_across_lines() {
        assert_error_codes(
            "let a = \"x;\nlet b = @;\nlet c = \"y\\q\";",
            &[ErrorCode::E001, ErrorCode::E002, ErrorCode::E003],
        );
    }
}
