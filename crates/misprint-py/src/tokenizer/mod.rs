// Python tokenizer
//
// Produces the logical-line token stream the syntax layer walks: names,
// decoded string literals, operators, and NEWLINE / INDENT / DEDENT markers.
// Newlines inside brackets and after a backslash continuation are not
// logical line ends. Blank and comment-only lines never affect indentation.

pub mod token;

pub use token::{StrKind, Token, TokenKind};

use token::{OPS_1, OPS_2, OPS_3};

/// Error type for tokenization failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    #[error("unterminated string literal starting at line {line}")]
    UnterminatedString { line: usize },
    #[error("unindent does not match any outer indentation level at line {line}")]
    InconsistentDedent { line: usize },
    #[error("unexpected character {ch:?} at line {line}, column {column}")]
    UnexpectedChar { ch: char, line: usize, column: usize },
}

/// Tokenize a complete Python source text.
///
/// The returned stream always ends with `EndMarker`, preceded by a `Newline`
/// (if any token was produced) and one `Dedent` per open indentation level.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).run()
}

/// Tab stops are every 8 columns, as in CPython.
const TAB_SIZE: usize = 8;

struct Lexer {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
    /// Bracket nesting depth; logical lines cannot end while it is non-zero.
    depth: usize,
    indents: Vec<usize>,
    at_line_start: bool,
    tokens: Vec<Token>,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 1,
            depth: 0,
            indents: vec![0],
            at_line_start: true,
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Token>, LexError> {
        loop {
            if self.at_line_start && self.depth == 0 && !self.start_line()? {
                continue;
            }
            let Some(c) = self.current() else { break };
            match c {
                ' ' | '\t' | '\x0c' => {
                    self.advance();
                }
                '#' => self.skip_comment(),
                '\\' if matches!(self.peek(1), Some('\n' | '\r')) => {
                    self.advance();
                    self.consume_newline();
                }
                '\n' | '\r' => {
                    let (line, column) = (self.line, self.column);
                    self.consume_newline();
                    if self.depth == 0 {
                        self.push(TokenKind::Newline, line, column);
                        self.at_line_start = true;
                    }
                }
                '"' | '\'' => {
                    let (line, column) = (self.line, self.column);
                    self.read_string(StrKind::Text, false, line, column)?;
                }
                '.' if self.peek(1).is_some_and(|d| d.is_ascii_digit()) => self.read_number(),
                c if c.is_ascii_digit() => self.read_number(),
                c if is_ident_start(c) => self.read_name()?,
                _ => self.read_op()?,
            }
        }

        let (line, column) = (self.line, self.column);
        if self
            .tokens
            .last()
            .is_some_and(|t| !matches!(t.kind, TokenKind::Newline | TokenKind::Dedent))
        {
            self.push(TokenKind::Newline, line, column);
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            self.push(TokenKind::Dedent, line, column);
        }
        self.push(TokenKind::EndMarker, line, column);
        Ok(self.tokens)
    }

    /// Measure indentation at the start of a physical line and emit
    /// INDENT/DEDENT. Returns `false` if the line was blank or comment-only
    /// and has been consumed entirely.
    fn start_line(&mut self) -> Result<bool, LexError> {
        let mut width = 0;
        while let Some(c) = self.current() {
            match c {
                ' ' => width += 1,
                '\t' => width = (width / TAB_SIZE + 1) * TAB_SIZE,
                '\x0c' => width = 0,
                _ => break,
            }
            self.advance();
        }

        match self.current() {
            None => {
                self.at_line_start = false;
                return Ok(true);
            }
            Some('#') => {
                self.skip_comment();
                if matches!(self.current(), Some('\n' | '\r')) {
                    self.consume_newline();
                }
                return Ok(false);
            }
            Some('\n' | '\r') => {
                self.consume_newline();
                return Ok(false);
            }
            _ => {}
        }

        let (line, column) = (self.line, self.column);
        let top = self.indents.last().copied().unwrap_or(0);
        if width > top {
            self.indents.push(width);
            self.push(TokenKind::Indent, line, column);
        } else if width < top {
            while self.indents.last().is_some_and(|&level| level > width) {
                self.indents.pop();
                self.push(TokenKind::Dedent, line, column);
            }
            if self.indents.last() != Some(&width) {
                return Err(LexError::InconsistentDedent { line });
            }
        }
        self.at_line_start = false;
        Ok(true)
    }

    fn read_name(&mut self) -> Result<(), LexError> {
        let (line, column) = (self.line, self.column);
        let mut ident = String::new();
        while let Some(c) = self.current() {
            if !is_ident_continue(c) {
                break;
            }
            ident.push(c);
            self.advance();
        }

        if matches!(self.current(), Some('"' | '\'')) {
            if let Some((kind, raw)) = string_prefix(&ident) {
                return self.read_string(kind, raw, line, column);
            }
        }
        self.push(TokenKind::Name(ident), line, column);
        Ok(())
    }

    /// Read a string literal; the cursor is on the opening quote.
    fn read_string(
        &mut self,
        kind: StrKind,
        raw: bool,
        line: usize,
        column: usize,
    ) -> Result<(), LexError> {
        let Some(quote) = self.current() else {
            return Err(LexError::UnterminatedString { line });
        };
        let triple = self.peek(1) == Some(quote) && self.peek(2) == Some(quote);
        let opening = if triple { 3 } else { 1 };
        for _ in 0..opening {
            self.advance();
        }

        let mut value = String::new();
        let mut named = false;
        loop {
            let Some(c) = self.current() else {
                return Err(LexError::UnterminatedString { line });
            };
            match c {
                '\\' => {
                    self.advance();
                    let Some(escaped) = self.current() else {
                        return Err(LexError::UnterminatedString { line });
                    };
                    if raw {
                        value.push('\\');
                        value.push(escaped);
                        self.advance();
                    } else {
                        named |= !self.read_escape(kind, &mut value);
                    }
                }
                c if c == quote => {
                    if !triple {
                        self.advance();
                        break;
                    }
                    if self.peek(1) == Some(quote) && self.peek(2) == Some(quote) {
                        for _ in 0..3 {
                            self.advance();
                        }
                        break;
                    }
                    value.push(c);
                    self.advance();
                }
                '\n' | '\r' if !triple => return Err(LexError::UnterminatedString { line }),
                c => {
                    value.push(c);
                    self.advance();
                }
            }
        }

        let kind = if named { StrKind::Named } else { kind };
        self.push(TokenKind::Str { value, kind }, line, column);
        Ok(())
    }

    /// Decode one escape sequence; the cursor is just past the backslash.
    ///
    /// Returns `false` for a `\N{...}` escape. Character names are not
    /// resolved, so that escape is kept verbatim.
    fn read_escape(&mut self, kind: StrKind, value: &mut String) -> bool {
        let Some(escaped) = self.current() else {
            return true;
        };
        self.advance();
        let text = kind != StrKind::Bytes;

        let code = match escaped {
            '\n' => return true,
            '\r' => {
                if self.current() == Some('\n') {
                    self.advance();
                }
                return true;
            }
            '\\' | '\'' | '"' => Some(u32::from(escaped)),
            'a' => Some(0x07),
            'b' => Some(0x08),
            'f' => Some(0x0c),
            'n' => Some(0x0a),
            'r' => Some(0x0d),
            't' => Some(0x09),
            'v' => Some(0x0b),
            '0'..='7' => {
                let mut code = escaped.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    let Some(digit) = self.current().and_then(|c| c.to_digit(8)) else {
                        break;
                    };
                    code = code * 8 + digit;
                    self.advance();
                }
                Some(code)
            }
            'x' => self.read_hex(2),
            'u' if text => self.read_hex(4),
            'U' if text => self.read_hex(8),
            'N' if text && self.current() == Some('{') => {
                value.push_str("\\N");
                while let Some(c) = self.current() {
                    if !(c == '{' || c == ' ' || c == '-' || c.is_ascii_alphanumeric()) {
                        break;
                    }
                    value.push(c);
                    self.advance();
                }
                if self.current() == Some('}') {
                    value.push('}');
                    self.advance();
                }
                return false;
            }
            _ => None,
        };

        match code {
            Some(code) => value.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)),
            None => {
                value.push('\\');
                value.push(escaped);
            }
        }
        true
    }

    /// Consume exactly `digits` hex digits, or nothing if fewer follow.
    fn read_hex(&mut self, digits: usize) -> Option<u32> {
        let hex: String = (0..digits).map_while(|i| self.peek(i)).collect();
        if hex.chars().count() != digits || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let code = u32::from_str_radix(&hex, 16).ok()?;
        for _ in 0..digits {
            self.advance();
        }
        Some(code)
    }

    fn read_number(&mut self) {
        let (line, column) = (self.line, self.column);
        let mut text = String::new();
        while let Some(c) = self.current() {
            let exponent_sign = matches!(c, '+' | '-')
                && matches!(text.chars().last(), Some('e' | 'E'))
                && !text.starts_with("0x")
                && !text.starts_with("0X");
            if c.is_ascii_alphanumeric() || c == '_' || c == '.' || exponent_sign {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        self.push(TokenKind::Number(text), line, column);
    }

    fn read_op(&mut self) -> Result<(), LexError> {
        let (line, column) = (self.line, self.column);
        for table in [OPS_3, OPS_2, OPS_1] {
            if let Some(op) = table.iter().copied().find(|op| self.looking_at(op)) {
                for _ in 0..op.chars().count() {
                    self.advance();
                }
                match op {
                    "(" | "[" | "{" => self.depth += 1,
                    ")" | "]" | "}" => self.depth = self.depth.saturating_sub(1),
                    _ => {}
                }
                self.push(TokenKind::Op(op), line, column);
                return Ok(());
            }
        }
        Err(LexError::UnexpectedChar {
            ch: self.current().unwrap_or('\0'),
            line,
            column,
        })
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.current() {
            if matches!(c, '\n' | '\r') {
                break;
            }
            self.advance();
        }
    }

    /// Consume `\n`, `\r\n` or a lone `\r` as one line break.
    fn consume_newline(&mut self) {
        match self.current() {
            Some('\r') => {
                self.pos += 1;
                if self.current() == Some('\n') {
                    self.pos += 1;
                }
            }
            Some('\n') => self.pos += 1,
            _ => return,
        }
        self.line += 1;
        self.column = 1;
    }

    fn looking_at(&self, text: &str) -> bool {
        text.chars()
            .enumerate()
            .all(|(i, expected)| self.peek(i) == Some(expected))
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) {
        if let Some(c) = self.current() {
            self.pos += 1;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn push(&mut self, kind: TokenKind, line: usize, column: usize) {
        self.tokens.push(Token::new(kind, line, column));
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

/// Interpret an identifier directly followed by a quote as a string prefix.
/// Returns the literal kind and whether it is raw.
fn string_prefix(ident: &str) -> Option<(StrKind, bool)> {
    let lower = ident.to_ascii_lowercase();
    let (kind, raw) = match lower.as_str() {
        "u" => (StrKind::Text, false),
        "r" => (StrKind::Text, true),
        "b" => (StrKind::Bytes, false),
        "br" | "rb" => (StrKind::Bytes, true),
        "f" => (StrKind::Formatted, false),
        "fr" | "rf" => (StrKind::Formatted, true),
        _ => return None,
    };
    Some((kind, raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    fn name(s: &str) -> TokenKind {
        TokenKind::Name(s.to_string())
    }

    fn text(s: &str) -> TokenKind {
        TokenKind::Str {
            value: s.to_string(),
            kind: StrKind::Text,
        }
    }

    #[test]
    fn simple_statement() {
        assert_eq!(
            kinds("x = kwargs['foo']\n"),
            vec![
                name("x"),
                TokenKind::Op("="),
                name("kwargs"),
                TokenKind::Op("["),
                text("foo"),
                TokenKind::Op("]"),
                TokenKind::Newline,
                TokenKind::EndMarker,
            ]
        );
    }

    #[test]
    fn indent_and_dedent() {
        let k = kinds("def f():\n    return 1\nx\n");
        assert!(k.contains(&TokenKind::Indent));
        let indent = k.iter().position(|t| *t == TokenKind::Indent).unwrap();
        let dedent = k.iter().position(|t| *t == TokenKind::Dedent).unwrap();
        assert!(indent < dedent);
        assert_eq!(k[dedent + 1], name("x"));
    }

    #[test]
    fn dedents_closed_at_eof_without_trailing_newline() {
        let k = kinds("class A:\n    def f(self):\n        pass");
        let dedents = k.iter().filter(|t| **t == TokenKind::Dedent).count();
        assert_eq!(dedents, 2);
        assert_eq!(k.last(), Some(&TokenKind::EndMarker));
    }

    #[test]
    fn blank_and_comment_lines_do_not_change_indentation() {
        let k = kinds("if x:\n    a = 1\n\n  # comment\n    b = 2\n");
        let indents = k.iter().filter(|t| **t == TokenKind::Indent).count();
        assert_eq!(indents, 1);
    }

    #[test]
    fn newlines_inside_brackets_are_ignored() {
        let k = kinds("f(a,\n  b)\n");
        let newlines = k.iter().filter(|t| **t == TokenKind::Newline).count();
        assert_eq!(newlines, 1);
        assert!(!k.contains(&TokenKind::Indent));
    }

    #[test]
    fn backslash_continuation() {
        let k = kinds("x = 1 + \\\n    2\n");
        assert!(!k.contains(&TokenKind::Indent));
        assert_eq!(k.iter().filter(|t| **t == TokenKind::Newline).count(), 1);
    }

    #[test]
    fn string_prefixes() {
        let k = kinds("b'x' f\"y\" r'\\d' U'z'\n");
        assert_eq!(
            k[0],
            TokenKind::Str { value: "x".into(), kind: StrKind::Bytes }
        );
        assert_eq!(
            k[1],
            TokenKind::Str { value: "y".into(), kind: StrKind::Formatted }
        );
        assert_eq!(k[2], text("\\d"));
        assert_eq!(k[3], text("z"));
    }

    #[test]
    fn triple_quoted_string_spans_lines() {
        let tokens = tokenize("'''a\nb'''\nx\n").unwrap();
        assert_eq!(tokens[0].kind, text("a\nb"));
        let x = tokens.iter().find(|t| t.is_name("x")).unwrap();
        assert_eq!(x.line, 3);
    }

    #[test]
    fn escapes_are_decoded() {
        assert_eq!(kinds(r#""a\"b""#)[0], text("a\"b"));
    }

    #[test]
    fn numeric_and_control_escapes() {
        assert_eq!(kinds(r"'\x66oo'")[0], text("foo"));
        assert_eq!(kinds(r"'\u0062ar'")[0], text("bar"));
        assert_eq!(kinds(r"'\U0001F600'")[0], text("\u{1F600}"));
        assert_eq!(kinds(r"'\142\141z'")[0], text("baz"));
        assert_eq!(kinds(r"'\a\b\f\v\0'")[0], text("\x07\x08\x0c\x0b\0"));
    }

    #[test]
    fn malformed_and_unknown_escapes_stay_verbatim() {
        assert_eq!(kinds(r"'\xZ1'")[0], text("\\xZ1"));
        assert_eq!(kinds(r"'\d'")[0], text("\\d"));
        assert_eq!(
            kinds(r"b'\u0041'")[0],
            TokenKind::Str { value: "\\u0041".into(), kind: StrKind::Bytes }
        );
    }

    #[test]
    fn named_escape_is_not_decoded() {
        assert_eq!(
            kinds(r"'\N{LATIN SMALL LETTER A}b'")[0],
            TokenKind::Str { value: "\\N{LATIN SMALL LETTER A}b".into(), kind: StrKind::Named }
        );
    }

    #[test]
    fn multi_char_operators() {
        let k = kinds("def f(**kw) -> None: x //= 2\n");
        assert!(k.contains(&TokenKind::Op("**")));
        assert!(k.contains(&TokenKind::Op("->")));
        assert!(k.contains(&TokenKind::Op("//=")));
    }

    #[test]
    fn numbers_with_exponent() {
        let k = kinds("x = 1e-3 + 0x1F\n");
        assert_eq!(k[2], TokenKind::Number("1e-3".into()));
        assert_eq!(k[4], TokenKind::Number("0x1F".into()));
    }

    #[test]
    fn positions_are_one_based() {
        let tokens = tokenize("a\n  \nb = 1\n").unwrap();
        let b = tokens.iter().find(|t| t.is_name("b")).unwrap();
        assert_eq!((b.line, b.column), (3, 1));
    }

    #[test]
    fn unterminated_string() {
        assert_eq!(
            tokenize("x = 'abc\ny = 1\n"),
            Err(LexError::UnterminatedString { line: 1 })
        );
        assert_eq!(
            tokenize("x = \"\"\"abc"),
            Err(LexError::UnterminatedString { line: 1 })
        );
    }

    #[test]
    fn inconsistent_dedent() {
        let err = tokenize("if x:\n    a\n  b\n").unwrap_err();
        assert_eq!(err, LexError::InconsistentDedent { line: 3 });
    }

    #[test]
    fn unexpected_character() {
        let err = tokenize("x = $y\n").unwrap_err();
        assert!(matches!(err, LexError::UnexpectedChar { ch: '$', line: 1, column: 5 }));
    }

    #[test]
    fn crlf_line_endings() {
        let k = kinds("a\r\nb\r\n");
        assert_eq!(
            k,
            vec![
                name("a"),
                TokenKind::Newline,
                name("b"),
                TokenKind::Newline,
                TokenKind::EndMarker
            ]
        );
    }
}
