use thiserror::Error;
use tracing::trace;

use crate::ast::{Token, TokenKind};

/// Characters of surrounding text quoted on each side of an error position.
const CONTEXT_RADIUS: usize = 12;

/// What went wrong while reading the query text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxErrorKind {
    #[error("invalid character '{0}'")]
    InvalidCharacter(char),

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("invalid escape sequence '\\{0}'")]
    InvalidEscape(char),

    #[error("unterminated {0} literal")]
    UnterminatedLiteral(&'static str),

    #[error("expected a digit after the decimal point")]
    MissingFraction,

    #[error("number '{0}' is out of range")]
    NumberOutOfRange(String),

    #[error("expected {expected}, found {found}")]
    Unexpected { expected: String, found: String },

    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),

    #[error("maximum nesting depth of {0} exceeded")]
    DepthExceeded(usize),

    #[error("invalid {kind} literal: {reason}")]
    InvalidLiteral { kind: &'static str, reason: String },

    #[error("parser context is missing {0}")]
    MissingContext(&'static str),
}

/// A syntax error: fatal to the current parse.
///
/// `position` is the 0-based character offset into the query text and
/// `near` quotes the text surrounding it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at position {position} near `{near}`")]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub position: usize,
    pub near: String,
}

impl SyntaxError {
    pub fn new(kind: SyntaxErrorKind, input: &[char], position: usize) -> Self {
        let start = position.saturating_sub(CONTEXT_RADIUS);
        let end = (position + CONTEXT_RADIUS).min(input.len());
        let near = input.get(start..end).unwrap_or_default().iter().collect();
        SyntaxError {
            kind,
            position,
            near,
        }
    }
}

/// Lazy tokenizer over the query text.
///
/// Tokens are scanned on demand. `current()` is always available, `peek()`
/// scans one token ahead and caches it until the next `advance()`.
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    current: Token,
    peeked: Option<Token>,
}

impl Lexer {
    pub fn new(input: &str) -> Result<Self, SyntaxError> {
        let mut lexer = Lexer {
            input: input.chars().collect(),
            position: 0,
            current: Token::new(TokenKind::Eof, "", 0),
            peeked: None,
        };
        lexer.current = lexer.next_token()?;
        Ok(lexer)
    }

    /// The query text as characters, for error reporting.
    pub fn input(&self) -> &[char] {
        &self.input
    }

    pub fn current(&self) -> &Token {
        &self.current
    }

    /// One token of lookahead. Repeated calls do not rescan.
    pub fn peek(&mut self) -> Result<&Token, SyntaxError> {
        if self.peeked.is_none() {
            let token = self.next_token()?;
            self.peeked = Some(token);
        }
        Ok(self.peeked.get_or_insert_with(|| Token::new(TokenKind::Eof, "", 0)))
    }

    /// Moves to the next token and returns the one just left behind.
    pub fn advance(&mut self) -> Result<Token, SyntaxError> {
        let next = match self.peeked.take() {
            Some(token) => token,
            None => self.next_token()?,
        };
        Ok(std::mem::replace(&mut self.current, next))
    }

    /// Rescans the current `[` as a balanced array literal.
    ///
    /// Only the parser knows whether a bracket opens a path segment or an
    /// embedded array, so it asks for this when it expects a constant.
    pub fn reinterpret_current_as_array(&mut self) -> Result<(), SyntaxError> {
        if !self.current.is(TokenKind::LBracket) {
            return Err(self.error(
                SyntaxErrorKind::Unexpected {
                    expected: TokenKind::LBracket.to_string(),
                    found: self.current.to_string(),
                },
                self.current.position,
            ));
        }
        self.position = self.current.position;
        self.peeked = None;
        self.current = self.read_balanced('[', ']', TokenKind::ArrayLiteral, "array")?;
        trace!(token = ?self.current, "reinterpreted as array literal");
        Ok(())
    }

    pub fn error(&self, kind: SyntaxErrorKind, position: usize) -> SyntaxError {
        SyntaxError::new(kind, &self.input, position)
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance_char(&mut self) {
        self.position += 1;
    }

    fn text(&self, start: usize) -> String {
        self.input[start..self.position].iter().collect()
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance_char();
            } else {
                break;
            }
        }
    }

    fn single(&mut self, kind: TokenKind) -> Token {
        let start = self.position;
        self.advance_char();
        Token::new(kind, self.text(start), start)
    }

    fn read_identifier(&mut self) -> Token {
        let start = self.position;
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() {
                self.advance_char();
            } else {
                break;
            }
        }

        let text = self.text(start);
        let kind = match text.as_str() {
            "true" | "false" => TokenKind::Boolean,
            "null" => TokenKind::Null,
            _ => TokenKind::Identifier,
        };
        Token::new(kind, text, start)
    }

    fn read_string(&mut self) -> Result<Token, SyntaxError> {
        let start = self.position;
        self.advance_char(); // Consume opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                '"' => {
                    self.advance_char();
                    return Ok(Token::new(TokenKind::String, self.text(start), start));
                }
                '\\' => {
                    self.advance_char(); // Consume backslash
                    match self.current_char() {
                        Some('"' | '\\' | 'n' | 't' | 'r') => self.advance_char(),
                        Some(other) => {
                            return Err(
                                self.error(SyntaxErrorKind::InvalidEscape(other), self.position)
                            );
                        }
                        None => break,
                    }
                }
                _ => self.advance_char(),
            }
        }

        Err(self.error(SyntaxErrorKind::UnterminatedString, start))
    }

    fn read_number(&mut self) -> Result<Token, SyntaxError> {
        let start = self.position;
        if self.current_char() == Some('-') {
            self.advance_char();
        }

        while self.current_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance_char();
        }

        if self.current_char() == Some('.') {
            self.advance_char();
            if !self.current_char().is_some_and(|c| c.is_ascii_digit()) {
                return Err(self.error(SyntaxErrorKind::MissingFraction, self.position));
            }
            while self.current_char().is_some_and(|c| c.is_ascii_digit()) {
                self.advance_char();
            }
        }

        Ok(Token::new(TokenKind::Number, self.text(start), start))
    }

    /// Scans a literal delimited by `open`/`close`, counting nesting depth
    /// and skipping over string contents.
    fn read_balanced(
        &mut self,
        open: char,
        close: char,
        kind: TokenKind,
        name: &'static str,
    ) -> Result<Token, SyntaxError> {
        let start = self.position;
        let mut depth = 0usize;
        let mut in_string = false;

        while let Some(ch) = self.current_char() {
            self.advance_char();
            if in_string {
                match ch {
                    '\\' => self.advance_char(),
                    '"' => in_string = false,
                    _ => {}
                }
                continue;
            }

            if ch == '"' {
                in_string = true;
            } else if ch == open {
                depth += 1;
            } else if ch == close {
                depth -= 1;
                if depth == 0 {
                    return Ok(Token::new(kind, self.text(start), start));
                }
            }
        }

        self.position = self.position.min(self.input.len());
        Err(self.error(SyntaxErrorKind::UnterminatedLiteral(name), start))
    }

    fn next_token(&mut self) -> Result<Token, SyntaxError> {
        self.skip_whitespace();

        let token = match self.current_char() {
            None => Token::new(TokenKind::Eof, "", self.position),
            Some('(') => self.single(TokenKind::LParen),
            Some(')') => self.single(TokenKind::RParen),
            Some(',') => self.single(TokenKind::Comma),
            Some('.') => self.single(TokenKind::Dot),
            Some('[') => self.single(TokenKind::LBracket),
            Some(']') => self.single(TokenKind::RBracket),
            Some('{') => self.read_balanced('{', '}', TokenKind::ObjectLiteral, "object")?,
            Some('"') => self.read_string()?,
            Some('$') => {
                let is_marker = self.peek_char(1) == Some('i')
                    && self.peek_char(2) == Some('t')
                    && !self.peek_char(3).is_some_and(|c| c.is_alphanumeric());
                if !is_marker {
                    return Err(self.error(SyntaxErrorKind::InvalidCharacter('$'), self.position));
                }
                let start = self.position;
                self.position += 3;
                Token::new(TokenKind::CurrentItem, self.text(start), start)
            }
            Some('-') if self.peek_char(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.read_number()?
            }
            Some(ch) if ch.is_ascii_digit() => self.read_number()?,
            Some(ch) if ch.is_alphabetic() => self.read_identifier(),
            Some(ch) => {
                return Err(self.error(SyntaxErrorKind::InvalidCharacter(ch), self.position));
            }
        };

        trace!(kind = ?token.kind, text = %token.text, position = token.position, "token");
        Ok(token)
    }
}

/// Decodes the text of a string token, quotes included.
pub fn unescape(text: &str) -> String {
    let inner = text
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(text);

    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some(other) => result.push(other),
            None => result.push('\\'),
        }
    }
    result
}

/// Encodes `value` as a string token text.
pub fn quote(value: &str) -> String {
    let mut result = String::with_capacity(value.len() + 2);
    result.push('"');
    for ch in value.chars() {
        match ch {
            '"' => result.push_str("\\\""),
            '\\' => result.push_str("\\\\"),
            '\n' => result.push_str("\\n"),
            '\t' => result.push_str("\\t"),
            '\r' => result.push_str("\\r"),
            c => result.push(c),
        }
    }
    result.push('"');
    result
}
