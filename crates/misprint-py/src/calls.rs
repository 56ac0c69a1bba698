// Static call-site scan: `name(... key=value ...)` in a token stream

use crate::tokenizer::{Token, TokenKind};

/// One call expression with a bare-name callee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub callee: String,
    /// 1-based line of the callee name.
    pub line: usize,
    /// Literal keyword argument names, in source order.
    pub keywords: Vec<String>,
    /// The call also unpacks a mapping with `**`.
    pub unpacks_mapping: bool,
}

/// Find every call whose callee is a bare name (not `obj.name`, not the name
/// in a `def`/`class` header). Nested calls are reported separately.
pub fn scan_calls(tokens: &[Token]) -> Vec<CallSite> {
    let mut calls = Vec::new();
    for (i, token) in tokens.iter().enumerate() {
        let Some(callee) = token.name() else {
            continue;
        };
        if !tokens.get(i + 1).is_some_and(|t| t.is_op("(")) {
            continue;
        }
        if i > 0 {
            let prev = &tokens[i - 1];
            if prev.is_op(".") || prev.is_name("def") || prev.is_name("class") {
                continue;
            }
        }
        let (keywords, unpacks_mapping) = call_arguments(&tokens[i + 1..]);
        calls.push(CallSite {
            callee: callee.to_string(),
            line: token.line,
            keywords,
            unpacks_mapping,
        });
    }
    calls
}

/// Walk an argument list starting at its `(`.
fn call_arguments(tokens: &[Token]) -> (Vec<String>, bool) {
    let mut keywords = Vec::new();
    let mut unpacks = false;
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate() {
        if token.opens() {
            depth += 1;
        } else if token.closes() {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                break;
            }
        }
        if depth != 1 || i == 0 {
            continue;
        }
        let at_argument_start = tokens[i - 1].is_op("(") || tokens[i - 1].is_op(",");
        if !at_argument_start {
            continue;
        }
        match &token.kind {
            TokenKind::Name(name) if tokens.get(i + 1).is_some_and(|t| t.is_op("=")) => {
                keywords.push(name.clone());
            }
            TokenKind::Op("**") => unpacks = true,
            _ => {}
        }
    }
    (keywords, unpacks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    fn calls(source: &str) -> Vec<CallSite> {
        scan_calls(&tokenize(source).unwrap())
    }

    #[test]
    fn keyword_arguments_of_a_call() {
        let found = calls("foo(0, arg3=100, foo=10)\n");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].callee, "foo");
        assert_eq!(found[0].line, 1);
        assert_eq!(found[0].keywords, vec!["arg3", "foo"]);
        assert!(!found[0].unpacks_mapping);
    }

    #[test]
    fn nested_calls_are_separate() {
        let found = calls("outer(a=inner(b=1), c=[x for x in y])\n");
        let summary: Vec<(&str, Vec<String>)> = found
            .iter()
            .map(|c| (c.callee.as_str(), c.keywords.clone()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("outer", vec!["a".to_string(), "c".to_string()]),
                ("inner", vec!["b".to_string()]),
            ]
        );
    }

    #[test]
    fn comparisons_and_lambdas_are_not_keywords() {
        let found = calls("f(x == 1, key=lambda v=2: v)\n");
        assert_eq!(found[0].keywords, vec!["key"]);
    }

    #[test]
    fn definitions_and_methods_are_skipped() {
        let found = calls("def f(a=1):\n    obj.method(b=2)\nclass C(Base):\n    pass\n");
        assert!(found.is_empty());
    }

    #[test]
    fn mapping_unpack_is_flagged() {
        let found = calls("f(a=1, **extra)\ng(*args)\n");
        assert!(found[0].unpacks_mapping);
        assert_eq!(found[0].keywords, vec!["a"]);
        assert!(!found[1].unpacks_mapping);
    }

    #[test]
    fn multi_line_call_reports_callee_line() {
        let found = calls("x = 1\nfoo(\n    a=1,\n    b=2,\n)\n");
        assert_eq!(found[0].line, 2);
        assert_eq!(found[0].keywords, vec!["a", "b"]);
    }
}
