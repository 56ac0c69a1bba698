// Python token types

/// Flavour of a string literal, decided by its prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrKind {
    /// Plain, raw or unicode text literal: a compile-time `str` constant.
    Text,
    /// `b"..."` / `rb"..."`.
    Bytes,
    /// `f"..."` / `rf"..."`: computed at run time, never a constant.
    Formatted,
    /// Text literal with a `\N{...}` escape, kept undecoded.
    Named,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or keyword (`def`, `class` and friends are not split out).
    Name(String),
    /// String literal with its decoded value.
    Str { value: String, kind: StrKind },
    Number(String),
    /// Operator or delimiter, e.g. `(`, `**`, `->`, `:=`.
    Op(&'static str),
    /// End of a logical line.
    Newline,
    Indent,
    Dedent,
    EndMarker,
}

/// A token with its 1-based source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn new(kind: TokenKind, line: usize, column: usize) -> Self {
        Self { kind, line, column }
    }

    /// The identifier text, if this is a name token.
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Name(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_name(&self, expected: &str) -> bool {
        self.name() == Some(expected)
    }

    pub fn is_op(&self, expected: &str) -> bool {
        matches!(self.kind, TokenKind::Op(op) if op == expected)
    }

    /// Check for an opening bracket: `(`, `[` or `{`.
    pub fn opens(&self) -> bool {
        matches!(self.kind, TokenKind::Op("(" | "[" | "{"))
    }

    /// Check for a closing bracket: `)`, `]` or `}`.
    pub fn closes(&self) -> bool {
        matches!(self.kind, TokenKind::Op(")" | "]" | "}"))
    }
}

/// Three-character operators, longest match first.
pub(crate) const OPS_3: &[&str] = &["**=", "//=", ">>=", "<<=", "..."];

pub(crate) const OPS_2: &[&str] = &[
    "**", "//", ">>", "<<", "<=", ">=", "==", "!=", "->", ":=", "+=", "-=", "*=", "/=", "%=",
    "&=", "|=", "^=", "@=",
];

pub(crate) const OPS_1: &[&str] = &[
    "(", ")", "[", "]", "{", "}", ",", ":", ".", ";", "@", "=", "+", "-", "*", "/", "%", "&",
    "|", "^", "~", "<", ">",
];
