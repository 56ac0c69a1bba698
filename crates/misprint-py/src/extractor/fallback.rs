// Best-effort text scan for definitions that cannot be tokenized
//
// Used only when the structural path is unavailable. It may under-recover:
// multi-line lookups and anything but `kw.get(...)` / `kw[...]` are missed.

use std::ops::Range;

use regex::Regex;

use super::Inspect;
use crate::syntax::{Param, ParamKind};
use crate::tokenizer::Token;

/// A definition known only as raw source text.
///
/// The signature is recovered from the first `def` header in the text and
/// only that definition's block is scanned; if there is no header, the
/// definition cannot be introspected at all.
#[derive(Debug, Clone)]
pub struct SourceText {
    text: String,
    name: Option<String>,
    params: Option<Vec<Param>>,
}

impl SourceText {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        match find_definition(&text) {
            Some(def) => Self {
                text: text[def.block].to_string(),
                name: Some(def.name),
                params: Some(def.params),
            },
            None => Self {
                text,
                name: None,
                params: None,
            },
        }
    }
}

impl Inspect for SourceText {
    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn parameters(&self) -> Option<&[Param]> {
        self.params.as_deref()
    }

    fn body(&self) -> Option<&[Token]> {
        None
    }

    fn source(&self) -> Option<&str> {
        Some(&self.text)
    }
}

/// Find every `catch_all.get(<literal>` and `catch_all[<literal>]` in the
/// text and return the literal with its quotes stripped. Occurrences whose
/// argument is not a quoted literal are skipped.
pub fn scan_source(text: &str, catch_all: &str) -> Vec<String> {
    let pattern = format!(
        r"(?:^|[^\w.]){}\s*(?:\.\s*get\s*\(\s*([^\s,)]+)|\[\s*([^\]]+?)\s*\])",
        regex::escape(catch_all)
    );
    let Ok(lookup) = Regex::new(&pattern) else {
        return Vec::new();
    };

    let mut keys = Vec::new();
    for line in text.lines() {
        for caps in lookup.captures_iter(line) {
            let argument = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str());
            if let Some(key) = argument.and_then(strip_quotes) {
                keys.push(key.to_string());
            }
        }
    }
    keys
}

/// `"name"` / `'name'` -> `name`; anything else is not a literal key.
fn strip_quotes(token: &str) -> Option<&str> {
    let first = token.chars().next()?;
    if !matches!(first, '"' | '\'') || token.len() < 2 || !token.ends_with(first) {
        return None;
    }
    Some(&token[1..token.len() - 1])
}

/// A `def` header located in raw text.
struct Definition {
    name: String,
    params: Vec<Param>,
    /// Byte range of the header plus its indented block.
    block: Range<usize>,
}

/// Locate the first `def` header whose parameter list can be recovered.
///
/// Headers may carry a type parameter list, as in `def f[T](x: T)`. The
/// block runs from the header line to the last following line indented
/// deeper than the header.
fn find_definition(text: &str) -> Option<Definition> {
    let header = Regex::new(r"(?m)^([ \t]*)(?:async\s+)?def\s+(\w+)").ok()?;
    header.captures_iter(text).find_map(|caps| {
        let whole = caps.get(0)?;
        let indent = caps.get(1)?.as_str().len();
        let name = caps.get(2)?.as_str().to_string();

        let after_name = skip_type_params(text, whole.end())?;
        let open = after_name + text[after_name..].len() - text[after_name..].trim_start().len();
        if !text[open..].starts_with('(') {
            return None;
        }
        let close = open + 1 + closing_bracket(&text[open + 1..])?;
        let params = parse_params(&strip_comments(&text[open + 1..close]));

        let end = block_end(text, close, indent);
        Some(Definition {
            name,
            params,
            block: whole.start()..end,
        })
    })
}

/// Skip whitespace and a bracketed `[...]` list at `pos`; returns the
/// offset after it (or after the whitespace when there is no list).
fn skip_type_params(text: &str, pos: usize) -> Option<usize> {
    let trimmed = text[pos..].trim_start();
    let at = text.len() - trimmed.len();
    if trimmed.starts_with('[') {
        Some(at + 1 + closing_bracket(&trimmed[1..])? + 1)
    } else {
        Some(at)
    }
}

/// Offset of the bracket closing an already opened one, ignoring brackets
/// inside string literals.
fn closing_bracket(text: &str) -> Option<usize> {
    let mut depth = 1usize;
    let mut quote: Option<char> = None;
    for (i, c) in text.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(' | '[' | '{') => depth += 1,
            (None, ')' | ']' | '}') => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// End of the block whose header closes its parameter list at `close`:
/// the header's last line plus every following line that is blank, a
/// comment, or indented deeper than `indent`.
fn block_end(text: &str, close: usize, indent: usize) -> usize {
    let mut end = text[close..].find('\n').map_or(text.len(), |i| close + i + 1);
    while end < text.len() {
        let line_end = text[end..].find('\n').map_or(text.len(), |i| end + i + 1);
        let line = &text[end..line_end];
        let body = line.trim_start();
        let deeper = line.len() - body.len() > indent;
        if !(body.trim().is_empty() || body.starts_with('#') || deeper) {
            break;
        }
        end = line_end;
    }
    end
}

fn parse_params(inner: &str) -> Vec<Param> {
    let mut params = Vec::new();
    let mut keyword_only = false;
    for part in split_commas(inner) {
        let part = part.trim();
        if part.is_empty() || part == "/" {
            continue;
        }
        if let Some(rest) = part.strip_prefix("**") {
            if let Some(name) = leading_identifier(rest) {
                params.push(Param::new(name, ParamKind::VarKeyword, false));
            }
            continue;
        }
        if let Some(rest) = part.strip_prefix('*') {
            keyword_only = true;
            if let Some(name) = leading_identifier(rest) {
                params.push(Param::new(name, ParamKind::VarPositional, false));
            }
            continue;
        }
        if let Some(name) = leading_identifier(part) {
            let kind = if keyword_only {
                ParamKind::KeywordOnly
            } else {
                ParamKind::PositionalOrKeyword
            };
            params.push(Param::new(name, kind, has_default(part)));
        }
    }
    params
}

fn strip_comments(text: &str) -> String {
    text.lines()
        .map(|line| line.split('#').next().unwrap_or(""))
        .collect::<Vec<_>>()
        .join("\n")
}

fn leading_identifier(text: &str) -> Option<&str> {
    let text = text.trim_start();
    let end = text
        .find(|c: char| !(c == '_' || c.is_alphanumeric()))
        .unwrap_or(text.len());
    (end > 0).then(|| &text[..end])
}

/// Split on commas outside brackets, quotes and `lambda` parameter lists.
fn split_commas(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut in_lambda = false;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(' | '[' | '{') => depth += 1,
            (None, ')' | ']' | '}') => depth = depth.saturating_sub(1),
            (None, 'l') if depth == 0 && starts_lambda(text, i) => in_lambda = true,
            (None, ':') if depth == 0 => in_lambda = false,
            (None, ',') if depth == 0 && !in_lambda => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

/// Check for the keyword `lambda` starting at byte `i`.
fn starts_lambda(text: &str, i: usize) -> bool {
    let word = |c: char| c == '_' || c.is_alphanumeric();
    text[i..].starts_with("lambda")
        && !text[..i].chars().next_back().is_some_and(word)
        && !text[i + "lambda".len()..].chars().next().is_some_and(word)
}

/// A lone `=` outside brackets marks a default value.
fn has_default(part: &str) -> bool {
    let chars: Vec<char> = part.chars().collect();
    let mut depth = 0usize;
    for (i, &c) in chars.iter().enumerate() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            '=' if depth == 0 => {
                let before = i.checked_sub(1).map(|j| chars[j]);
                let after = chars.get(i + 1).copied();
                if !matches!(before, Some('=' | '<' | '>' | '!' | ':')) && after != Some('=') {
                    return true;
                }
            }
            _ => {}
        }
    }
    false
}
