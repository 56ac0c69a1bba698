// Statement-level parser over the token stream

use std::ops::Range;

use super::{ClassDef, FunctionDef, Param, ParamKind, ParseError};
use crate::tokenizer::{Token, TokenKind};

/// The namespace a definition lives in; decides its qualified name.
enum Scope {
    Module,
    Function(String),
    Class(String),
}

impl Scope {
    fn qualify(&self, name: &str) -> String {
        match self {
            Scope::Module => name.to_string(),
            Scope::Function(outer) => format!("{outer}.<locals>.{name}"),
            Scope::Class(outer) => format!("{outer}.{name}"),
        }
    }
}

/// Definitions collected from one block, plus the token spans they occupy.
#[derive(Default)]
struct Suite {
    functions: Vec<FunctionDef>,
    classes: Vec<ClassDef>,
    spans: Vec<Range<usize>>,
}

impl Suite {
    fn absorb(&mut self, other: Suite) {
        self.functions.extend(other.functions);
        self.classes.extend(other.classes);
        self.spans.extend(other.spans);
    }
}

pub(super) struct Parser<'a> {
    tokens: &'a [Token],
    lines: &'a [&'a str],
    pos: usize,
}

impl<'a> Parser<'a> {
    pub(super) fn new(tokens: &'a [Token], lines: &'a [&'a str]) -> Self {
        Self {
            tokens,
            lines,
            pos: 0,
        }
    }

    pub(super) fn parse_module(mut self) -> Result<(Vec<FunctionDef>, Vec<ClassDef>), ParseError> {
        let suite = self.parse_suite(&Scope::Module, false)?;
        Ok((suite.functions, suite.classes))
    }

    /// Parse statements until the end of input or, for an indented block,
    /// until its closing DEDENT (consumed).
    fn parse_suite(&mut self, scope: &Scope, indented: bool) -> Result<Suite, ParseError> {
        let mut suite = Suite::default();
        while let Some(token) = self.tokens.get(self.pos) {
            match &token.kind {
                TokenKind::EndMarker => break,
                TokenKind::Dedent => {
                    self.pos += 1;
                    if indented {
                        break;
                    }
                }
                TokenKind::Newline => self.pos += 1,
                TokenKind::Indent => {
                    // Only reachable for source that starts indented, e.g. a
                    // method cut out of its class.
                    self.pos += 1;
                    let inner = self.parse_suite(scope, true)?;
                    suite.absorb(inner);
                }
                _ => self.parse_statement(scope, &mut suite)?,
            }
        }
        Ok(suite)
    }

    fn parse_statement(&mut self, scope: &Scope, suite: &mut Suite) -> Result<(), ParseError> {
        let start = self.pos;
        while self.at_op("@") {
            self.skip_logical_line();
        }

        let is_async = self.at_name("async") && self.nth_is_name(1, "def");
        if is_async {
            self.pos += 1;
        }

        if self.at_name("def") {
            let function = self.parse_function(scope, start, is_async)?;
            suite.functions.push(function);
            suite.spans.push(start..self.pos);
            return Ok(());
        }
        if self.at_name("class") {
            let class = self.parse_class(scope)?;
            suite.classes.push(class);
            suite.spans.push(start..self.pos);
            return Ok(());
        }

        // Any other simple or compound statement. Definitions inside
        // compound blocks (if/try/with...) belong to the same scope.
        self.skip_logical_line();
        if self.at_kind(&TokenKind::Indent) {
            self.pos += 1;
            let inner = self.parse_suite(scope, true)?;
            suite.absorb(inner);
        }
        Ok(())
    }

    fn parse_function(
        &mut self,
        scope: &Scope,
        start: usize,
        is_async: bool,
    ) -> Result<FunctionDef, ParseError> {
        let line = self.line();
        self.pos += 1; // `def`
        let name = self.expect_name("function", line)?;
        self.skip_type_params()?;
        if !self.at_op("(") {
            return Err(ParseError::MalformedHeader { what: "function", line });
        }
        self.pos += 1;
        let close = self.find_closing("parameter list")?;
        let params = parse_params(&self.tokens[self.pos..close], line)?;
        self.pos = close + 1;
        self.skip_to_colon("function", line)?;

        let qualname = scope.qualify(&name);
        let (suite, body_range) = self.parse_body(&Scope::Function(qualname.clone()))?;
        let body = body_range
            .filter(|i| !suite.spans.iter().any(|span| span.contains(i)))
            .map(|i| self.tokens[i].clone())
            .collect();

        Ok(FunctionDef {
            name,
            qualname,
            line,
            is_async,
            params,
            body,
            source: self.source_since(start),
            functions: suite.functions,
            classes: suite.classes,
        })
    }

    fn parse_class(&mut self, scope: &Scope) -> Result<ClassDef, ParseError> {
        let line = self.line();
        self.pos += 1; // `class`
        let name = self.expect_name("class", line)?;
        self.skip_type_params()?;

        let mut bases = Vec::new();
        if self.at_op("(") {
            self.pos += 1;
            let close = self.find_closing("class bases")?;
            bases = class_bases(&self.tokens[self.pos..close]);
            self.pos = close + 1;
        }
        self.skip_to_colon("class", line)?;

        let qualname = scope.qualify(&name);
        let (suite, _) = self.parse_body(&Scope::Class(qualname.clone()))?;
        Ok(ClassDef {
            name,
            qualname,
            line,
            bases,
            methods: suite.functions,
            classes: suite.classes,
        })
    }

    /// Parse the body after a header's colon: either an indented block or
    /// the rest of the header line. Returns the block's definitions and the
    /// token range of the whole body.
    fn parse_body(&mut self, scope: &Scope) -> Result<(Suite, Range<usize>), ParseError> {
        if !self.at_kind(&TokenKind::Newline) {
            let start = self.pos;
            self.skip_logical_line();
            return Ok((Suite::default(), start..self.pos));
        }

        let line = self.line();
        self.pos += 1;
        if !self.at_kind(&TokenKind::Indent) {
            return Err(ParseError::MalformedHeader { what: "block", line });
        }
        self.pos += 1;
        let start = self.pos;
        let suite = self.parse_suite(scope, true)?;
        Ok((suite, start..self.pos))
    }

    /// With the cursor just past an opening bracket, find the index of the
    /// matching closing bracket.
    fn find_closing(&self, what: &'static str) -> Result<usize, ParseError> {
        let mut depth = 1usize;
        for (i, token) in self.tokens.iter().enumerate().skip(self.pos) {
            if token.opens() {
                depth += 1;
            } else if token.closes() {
                depth -= 1;
                if depth == 0 {
                    return Ok(i);
                }
            } else if token.kind == TokenKind::EndMarker {
                break;
            }
        }
        Err(ParseError::UnexpectedEof { what })
    }

    /// Skip a type parameter list such as `[T, *Ts]` after a definition's
    /// name.
    fn skip_type_params(&mut self) -> Result<(), ParseError> {
        if self.at_op("[") {
            self.pos += 1;
            self.pos = self.find_closing("type parameters")? + 1;
        }
        Ok(())
    }

    /// Skip a return annotation (if any) and the header's colon.
    fn skip_to_colon(&mut self, what: &'static str, line: usize) -> Result<(), ParseError> {
        let mut depth = 0usize;
        while let Some(token) = self.tokens.get(self.pos) {
            if token.opens() {
                depth += 1;
            } else if token.closes() {
                depth = depth.saturating_sub(1);
            } else if depth == 0 && token.is_op(":") {
                self.pos += 1;
                return Ok(());
            } else if matches!(token.kind, TokenKind::Newline | TokenKind::EndMarker) {
                break;
            }
            self.pos += 1;
        }
        Err(ParseError::MalformedHeader { what, line })
    }

    /// Advance past the next NEWLINE (or up to the end marker).
    fn skip_logical_line(&mut self) {
        while let Some(token) = self.tokens.get(self.pos) {
            match token.kind {
                TokenKind::EndMarker => return,
                TokenKind::Newline => {
                    self.pos += 1;
                    return;
                }
                _ => self.pos += 1,
            }
        }
    }

    fn expect_name(&mut self, what: &'static str, line: usize) -> Result<String, ParseError> {
        let name = self
            .tokens
            .get(self.pos)
            .and_then(Token::name)
            .ok_or(ParseError::MalformedHeader { what, line })?
            .to_string();
        self.pos += 1;
        Ok(name)
    }

    /// Source text from the line of token `start` to the last line consumed.
    fn source_since(&self, start: usize) -> String {
        let first = self.tokens[start].line;
        let last = self.tokens[..self.pos]
            .iter()
            .rev()
            .find(|t| !matches!(t.kind, TokenKind::Dedent | TokenKind::Indent))
            .map_or(first, |t| t.line);
        let from = first.saturating_sub(1).min(self.lines.len());
        let to = last.min(self.lines.len()).max(from);
        self.lines[from..to].join("\n")
    }

    fn line(&self) -> usize {
        self.tokens.get(self.pos).map_or(0, |t| t.line)
    }

    fn at_kind(&self, kind: &TokenKind) -> bool {
        self.tokens.get(self.pos).is_some_and(|t| t.kind == *kind)
    }

    fn at_op(&self, op: &str) -> bool {
        self.tokens.get(self.pos).is_some_and(|t| t.is_op(op))
    }

    fn at_name(&self, name: &str) -> bool {
        self.nth_is_name(0, name)
    }

    fn nth_is_name(&self, n: usize, name: &str) -> bool {
        self.tokens.get(self.pos + n).is_some_and(|t| t.is_name(name))
    }
}

/// Split a bracketed token list on commas that are not nested deeper.
///
/// The parameters of a `lambda` count as nested up to its colon, so a
/// default such as `cb=lambda x, **o: o` stays in one piece.
fn split_top_level(tokens: &[Token]) -> Vec<&[Token]> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    // Bracket depths of the lambdas whose colon is still pending.
    let mut lambdas: Vec<usize> = Vec::new();
    let mut start = 0;
    for (i, token) in tokens.iter().enumerate() {
        if token.opens() {
            depth += 1;
        } else if token.closes() {
            depth = depth.saturating_sub(1);
        } else if token.is_name("lambda") {
            lambdas.push(depth);
        } else if token.is_op(":") && lambdas.last() == Some(&depth) {
            lambdas.pop();
        } else if depth == 0 && lambdas.is_empty() && token.is_op(",") {
            parts.push(&tokens[start..i]);
            start = i + 1;
        }
    }
    parts.push(&tokens[start..]);
    parts
}

/// Check for `=` outside any bracket nested in `tokens`.
fn has_top_level_assign(tokens: &[Token]) -> bool {
    let mut depth = 0usize;
    tokens.iter().any(|token| {
        if token.opens() {
            depth += 1;
        } else if token.closes() {
            depth = depth.saturating_sub(1);
        }
        depth == 0 && token.is_op("=")
    })
}

fn parse_params(tokens: &[Token], line: usize) -> Result<Vec<Param>, ParseError> {
    let malformed = ParseError::MalformedParameters { line };
    let mut params: Vec<Param> = Vec::new();
    let mut keyword_only = false;

    for chunk in split_top_level(tokens) {
        let Some(first) = chunk.first() else {
            continue;
        };

        if first.is_op("/") {
            if chunk.len() != 1 {
                return Err(malformed);
            }
            for p in &mut params {
                if p.kind == ParamKind::PositionalOrKeyword {
                    p.kind = ParamKind::PositionalOnly;
                }
            }
            continue;
        }

        if first.is_op("*") {
            keyword_only = true;
            if let Some(next) = chunk.get(1) {
                let name = next.name().ok_or_else(|| malformed.clone())?;
                params.push(Param::new(name, ParamKind::VarPositional, false));
            }
            continue;
        }

        if first.is_op("**") {
            let name = chunk
                .get(1)
                .and_then(Token::name)
                .ok_or_else(|| malformed.clone())?;
            params.push(Param::new(name, ParamKind::VarKeyword, false));
            continue;
        }

        let name = first.name().ok_or_else(|| malformed.clone())?;
        let kind = if keyword_only {
            ParamKind::KeywordOnly
        } else {
            ParamKind::PositionalOrKeyword
        };
        params.push(Param::new(name, kind, has_top_level_assign(&chunk[1..])));
    }

    Ok(params)
}

/// Keep the bases that are (dotted) names, optionally subscripted as in
/// `Generic[T]`; keyword arguments and starred expressions are skipped.
fn class_bases(tokens: &[Token]) -> Vec<String> {
    split_top_level(tokens)
        .into_iter()
        .filter(|chunk| !chunk.is_empty() && !has_top_level_assign(chunk))
        .filter_map(|chunk| {
            let mut parts = Vec::new();
            let mut rest = chunk;
            loop {
                let (head, tail) = rest.split_first()?;
                parts.push(head.name()?);
                match tail.first() {
                    None => break,
                    Some(t) if t.is_op("[") => break,
                    Some(t) if t.is_op(".") => rest = &tail[1..],
                    Some(_) => return None,
                }
            }
            Some(parts.join("."))
        })
        .collect()
}
