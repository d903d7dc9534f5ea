//! Lexer for Corefiles (Caddyfile syntax)
//!
//! Tokenizes the whitespace-block language CoreDNS reads.
//!
//! Key features:
//! - Newlines are significant: a statement's arguments end at end of line
//! - Braces are structural only when they stand alone (`{`, `}`); `{}` and
//!   placeholders such as `{remote}` are ordinary words
//! - "..." for quoted strings, `\"` and `\\` are unescaped
//! - `#` at the start of a token opens a comment that runs to end of line

use logos::{Logos, Span};
use std::fmt;

/// Source location for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub start: usize,
    pub end: usize,
}

impl From<Span> for Location {
    fn from(span: Span) -> Self {
        Self {
            start: span.start,
            end: span.end,
        }
    }
}

/// A token with its location in the source
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub value: T,
    pub span: Location,
}

impl<T> Spanned<T> {
    pub fn new(value: T, span: impl Into<Location>) -> Self {
        Self {
            value,
            span: span.into(),
        }
    }
}

/// Token types for Corefile syntax
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\f\r]+")]
pub enum Token {
    #[regex(r"#[^\n]*", logos::skip)]
    Comment,

    // ============================================================
    // Structural
    // ============================================================
    #[token("{", priority = 10)]
    BlockOpen,

    #[token("}", priority = 10)]
    BlockClose,

    #[token("\n")]
    Newline,

    // ============================================================
    // Values
    // ============================================================

    /// Quoted string literal: "..."
    #[regex(r#""([^"\\]|\\(.|\n))*""#, |lex| {
        let s = lex.slice();
        unescape_string(&s[1..s.len()-1])
    })]
    QuotedString(String),

    /// Unquoted word: labels, plugin names, addresses, paths
    #[regex(r##"[^ \t\f\r\n"#][^ \t\f\r\n"]*"##, |lex| lex.slice().to_string())]
    Word(String),
}

impl Token {
    /// Text of a value token, `None` for structure
    pub fn as_value(&self) -> Option<&str> {
        match self {
            Token::QuotedString(s) | Token::Word(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::BlockOpen => write!(f, "{{"),
            Token::BlockClose => write!(f, "}}"),
            Token::Newline => write!(f, "\\n"),
            Token::QuotedString(s) => write!(f, "\"{}\"", s),
            Token::Word(s) => write!(f, "{}", s),
            Token::Comment => write!(f, "#"),
        }
    }
}

/// Unescape a quoted string body. `\"` and `\\` are escapes; any other
/// backslash is kept as written.
fn unescape_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('\\', Some(&next @ ('"' | '\\'))) => {
                result.push(next);
                chars.next();
            }
            _ => result.push(c),
        }
    }

    result
}

/// Lexer result type
pub type LexResult = Result<Vec<Spanned<Token>>, LexError>;

/// Lexer error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    #[error("Unterminated quoted string starting at position {position}")]
    UnterminatedString { position: usize },

    #[error("Unexpected character at position {position}")]
    UnexpectedChar { position: usize },
}

impl LexError {
    pub fn position(&self) -> usize {
        match self {
            LexError::UnterminatedString { position } | LexError::UnexpectedChar { position } => {
                *position
            }
        }
    }
}

/// Tokenize a Corefile source string
pub fn tokenize(source: &str) -> LexResult {
    let lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    for (result, span) in lexer.spanned() {
        match result {
            Ok(Token::Comment) => continue,
            Ok(token) => tokens.push(Spanned::new(token, span)),
            Err(_) => {
                let position = span.start;
                return Err(if source[position..].starts_with('"') {
                    LexError::UnterminatedString { position }
                } else {
                    LexError::UnexpectedChar { position }
                });
            }
        }
    }

    Ok(tokens)
}

/// Line-oriented cursor over a token stream.
///
/// `advance` steps over newlines, so the current token is always a value or
/// a brace. `remaining_args_on_line` collects the values that follow on the
/// same line, stopping before a newline or brace.
#[derive(Debug)]
pub struct TokenCursor<'a> {
    tokens: &'a [Spanned<Token>],
    pos: Option<usize>,
}

impl<'a> TokenCursor<'a> {
    pub fn new(tokens: &'a [Spanned<Token>]) -> Self {
        Self { tokens, pos: None }
    }

    /// Move to the next non-newline token. Returns `false` at end of input.
    pub fn advance(&mut self) -> bool {
        let mut next = self.pos.map_or(0, |p| p + 1);
        while let Some(tok) = self.tokens.get(next) {
            if tok.value != Token::Newline {
                self.pos = Some(next);
                return true;
            }
            next += 1;
        }
        self.pos = Some(self.tokens.len());
        false
    }

    pub fn current(&self) -> Option<&'a Spanned<Token>> {
        self.pos.and_then(|p| self.tokens.get(p))
    }

    pub fn current_token(&self) -> Option<&'a Token> {
        self.current().map(|s| &s.value)
    }

    pub fn current_span(&self) -> Location {
        self.current()
            .map(|s| s.span)
            .unwrap_or(Location { start: 0, end: 0 })
    }

    pub fn remaining_args_on_line(&mut self) -> Vec<String> {
        let mut args = Vec::new();
        let mut next = self.pos.map_or(0, |p| p + 1);
        while let Some(arg) = self.tokens.get(next).and_then(|t| t.value.as_value()) {
            args.push(arg.to_string());
            self.pos = Some(next);
            next += 1;
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(source: &str) -> Vec<Token> {
        tokenize(source).unwrap().into_iter().map(|s| s.value).collect()
    }

    #[test]
    fn test_basic_directive() {
        let tokens = tokenize("forward . 8.8.8.8").unwrap();
        assert_eq!(tokens[0].value, Token::Word("forward".to_string()));
        assert_eq!(tokens[1].value, Token::Word(".".to_string()));
        assert_eq!(tokens[2].value, Token::Word("8.8.8.8".to_string()));
        assert_eq!(tokens[2].span, Location { start: 10, end: 17 });
    }

    #[test]
    fn test_block() {
        let t = values(".:53 {\n  hosts\n}");
        assert_eq!(
            t,
            vec![
                Token::Word(".:53".to_string()),
                Token::BlockOpen,
                Token::Newline,
                Token::Word("hosts".to_string()),
                Token::Newline,
                Token::BlockClose,
            ]
        );
    }

    #[test]
    fn test_braces_inside_words() {
        let t = values("log . \"{remote}\" {common}\nhosts{}");
        assert_eq!(t[2], Token::QuotedString("{remote}".to_string()));
        assert_eq!(t[3], Token::Word("{common}".to_string()));
        assert_eq!(t[5], Token::Word("hosts{}".to_string()));
    }

    #[test]
    fn test_quotes_and_comments() {
        let source = r#"
            # This is a comment
            root "/var/www/my html" # Inline comment
            tag a#b
        "#;
        let t: Vec<Token> = values(source)
            .into_iter()
            .filter(|t| *t != Token::Newline)
            .collect();
        assert_eq!(t[0], Token::Word("root".to_string()));
        assert_eq!(t[1], Token::QuotedString("/var/www/my html".to_string()));
        assert_eq!(t[2], Token::Word("tag".to_string()));
        assert_eq!(t[3], Token::Word("a#b".to_string()));
        assert_eq!(t.len(), 4);
    }

    #[test]
    fn test_escaped_quote() {
        let t = values(r#"say "he said \"hi\"" c:\path"#);
        assert_eq!(t[1], Token::QuotedString(r#"he said "hi""#.to_string()));
        assert_eq!(t[2], Token::Word(r"c:\path".to_string()));
    }

    #[test]
    fn test_escaped_backslash() {
        let t = values(r#"log "a b\\" "c:\\dir\x" d"#);
        assert_eq!(t[1], Token::QuotedString(r"a b\".to_string()));
        assert_eq!(t[2], Token::QuotedString(r"c:\dir\x".to_string()));
        assert_eq!(t[3], Token::Word("d".to_string()));
    }

    #[test]
    fn test_lone_braces_are_structural() {
        let t = values("{ } {x} x}");
        assert_eq!(
            t,
            vec![
                Token::BlockOpen,
                Token::BlockClose,
                Token::Word("{x}".to_string()),
                Token::Word("x}".to_string()),
            ]
        );
    }

    #[test]
    fn test_crlf_line_endings() {
        let t = values("a b\r\nc");
        assert_eq!(
            t,
            vec![
                Token::Word("a".to_string()),
                Token::Word("b".to_string()),
                Token::Newline,
                Token::Word("c".to_string()),
            ]
        );
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("hosts {\n  1.2.3.4 \"foo.com\n}").unwrap_err();
        assert_eq!(err, LexError::UnterminatedString { position: 18 });
    }

    #[test]
    fn test_cursor_line_args() {
        let tokens = tokenize("example.org:53 example.net:53 {\n  forward . 1.1.1.1\n}\n").unwrap();
        let mut cursor = TokenCursor::new(&tokens);

        assert!(cursor.advance());
        assert_eq!(cursor.current_token(), Some(&Token::Word("example.org:53".to_string())));
        assert_eq!(cursor.remaining_args_on_line(), vec!["example.net:53"]);

        assert!(cursor.advance());
        assert_eq!(cursor.current_token(), Some(&Token::BlockOpen));
        assert!(cursor.remaining_args_on_line().is_empty());

        assert!(cursor.advance());
        assert_eq!(cursor.current_token(), Some(&Token::Word("forward".to_string())));
        assert_eq!(cursor.remaining_args_on_line(), vec![".", "1.1.1.1"]);

        assert!(cursor.advance());
        assert_eq!(cursor.current_token(), Some(&Token::BlockClose));
        assert!(!cursor.advance());
        assert!(!cursor.advance());
    }
}
