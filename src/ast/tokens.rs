use std::fmt;

/// Kind of a lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Punctuation
    /// Left parenthesis opening an argument list
    LParen,

    /// Right parenthesis
    RParen,

    /// Comma separating arguments
    Comma,

    /// Dot between field path segments
    ///
    /// # Examples
    /// ```text
    /// address.city
    /// ```
    Dot,

    /// Left bracket opening a bracketed path segment
    ///
    /// # Examples
    /// ```text
    /// address["zip code"]
    /// ```
    LBracket,

    /// Right bracket
    RBracket,

    // Literals
    /// Integer or decimal number, with an optional leading minus
    ///
    /// # Examples
    /// ```text
    /// 42
    /// -3.25
    /// ```
    Number,

    /// Double-quoted string literal (token text keeps the quotes)
    String,

    /// `true` or `false`
    Boolean,

    /// `null`
    Null,

    /// Balanced `{ ... }` literal, passed through as opaque text
    ObjectLiteral,

    /// Balanced `[ ... ]` literal, produced only on request of the parser
    ArrayLiteral,

    // Names
    /// Function or field name
    ///
    /// Starts with a letter, followed by letters or digits.
    Identifier,

    /// Current collection item inside a quantifier (`$it`)
    CurrentItem,

    /// End of input
    Eof,
}

impl TokenKind {
    /// Human readable name used in diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::Comma => "','",
            TokenKind::Dot => "'.'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Number => "number",
            TokenKind::String => "string",
            TokenKind::Boolean => "boolean",
            TokenKind::Null => "null",
            TokenKind::ObjectLiteral => "object literal",
            TokenKind::ArrayLiteral => "array literal",
            TokenKind::Identifier => "identifier",
            TokenKind::CurrentItem => "'$it'",
            TokenKind::Eof => "end of input",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A positioned token. `position` is the 0-based character offset of the
/// first character of `text` in the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, position: usize) -> Self {
        Token {
            kind,
            text: text.into(),
            position,
        }
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    /// True for an identifier token spelled exactly `name`.
    pub fn is_identifier(&self, name: &str) -> bool {
        self.kind == TokenKind::Identifier && self.text == name
    }

    /// Character offset just past the token.
    pub fn end(&self) -> usize {
        self.position + self.text.chars().count()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => f.write_str("end of input"),
            kind => write!(f, "{} `{}`", kind, self.text),
        }
    }
}
