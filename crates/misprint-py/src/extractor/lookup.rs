// Structural scan for literal lookups on the catch-all keyword parameter

use crate::tokenizer::{StrKind, Token, TokenKind};

/// Where the scan is inside the `kw -> [field] -> literal` pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    /// Just saw the bare catch-all name.
    Local,
    /// `kw .`
    Dot,
    /// `kw . attr`
    Field,
    /// `kw [` or `kw . attr (`: a string literal completes the pattern.
    Key,
}

/// Collect the string keys read out of `catch_all` in a function body.
///
/// Recognised shapes are `kw["name"]` and `kw.attr("name", ...)` for any
/// method `attr` (`get`, `pop`, `setdefault`...). `kw` must be a bare name,
/// not the tail of `self.kw`. Adjacent literals are joined as the compiler
/// would; byte strings, f-strings and literals with a `\N{...}` escape are
/// not constant keys. Anything else
/// resets the scan and the partial match is dropped.
pub fn scan_lookups(body: &[Token], catch_all: &str) -> Vec<String> {
    let mut keys = Vec::new();
    let mut state = State::Idle;
    let mut i = 0;

    while i < body.len() {
        let token = &body[i];
        let after_dot = i > 0 && body[i - 1].is_op(".");

        if token.is_name(catch_all) && !after_dot {
            state = State::Local;
            i += 1;
            continue;
        }

        if state == State::Key && matches!(token.kind, TokenKind::Str { .. }) {
            let (key, consumed) = constant_string(&body[i..]);
            keys.extend(key);
            i += consumed;
            state = State::Idle;
            continue;
        }

        state = match (state, &token.kind) {
            (State::Local, TokenKind::Op("[")) => State::Key,
            (State::Local, TokenKind::Op(".")) => State::Dot,
            (State::Dot, TokenKind::Name(_)) => State::Field,
            (State::Field, TokenKind::Op("(")) => State::Key,
            _ => State::Idle,
        };
        i += 1;
    }

    keys
}

/// Fold a run of adjacent string literals into one constant. Returns the
/// constant (if the run is plain text) and the number of tokens consumed.
fn constant_string(tokens: &[Token]) -> (Option<String>, usize) {
    let mut value = String::new();
    let mut constant = true;
    let mut consumed = 0;
    for token in tokens {
        let TokenKind::Str { value: part, kind } = &token.kind else {
            break;
        };
        constant &= *kind == StrKind::Text;
        value.push_str(part);
        consumed += 1;
    }
    (constant.then_some(value), consumed)
}
