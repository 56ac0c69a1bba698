// Keyword vocabulary extraction
//
// A callable's vocabulary is the set of names it is prepared to receive
// through its catch-all keyword parameter: every literal key it reads out of
// that parameter, plus its own defaulted parameters.

#[cfg(feature = "fallback")]
pub mod fallback;
pub mod lookup;

use misprint_core::KeywordVocabulary;
use tracing::debug;

use crate::syntax::{FunctionDef, Module, Param, ParamKind};
use crate::tokenizer::Token;

/// Introspection capabilities of a callable definition.
pub trait Inspect {
    /// Name used in log output.
    fn name(&self) -> Option<&str> {
        None
    }

    /// Declared parameters, or `None` when the signature is unavailable.
    fn parameters(&self) -> Option<&[Param]>;

    /// Structurally parsed body, when there is one.
    fn body(&self) -> Option<&[Token]>;

    /// Raw source text, for the text fallback.
    fn source(&self) -> Option<&str> {
        None
    }
}

impl Inspect for FunctionDef {
    fn name(&self) -> Option<&str> {
        Some(&self.qualname)
    }

    fn parameters(&self) -> Option<&[Param]> {
        Some(&self.params)
    }

    fn body(&self) -> Option<&[Token]> {
        Some(&self.body)
    }

    fn source(&self) -> Option<&str> {
        Some(&self.source)
    }
}

/// Compute the keyword vocabulary of a callable.
///
/// A callable without a catch-all keyword parameter accepts no extra names,
/// so its vocabulary is empty even when it has defaulted parameters. Never
/// fails: anything that cannot be introspected yields fewer names.
pub fn extract<C: Inspect + ?Sized>(callable: &C) -> KeywordVocabulary {
    let mut vocabulary = KeywordVocabulary::new();
    let name = callable.name().unwrap_or("<unknown>");

    let Some(params) = callable.parameters() else {
        debug!(callable = name, "signature unavailable, empty vocabulary");
        return vocabulary;
    };
    let Some(catch_all) = params.iter().rfind(|p| p.kind == ParamKind::VarKeyword) else {
        debug!(callable = name, "no catch-all keyword parameter");
        return vocabulary;
    };

    vocabulary.extend(
        params
            .iter()
            .filter(|p| p.has_default && p.accepts_keyword())
            .map(|p| p.name.as_str()),
    );
    match callable.body() {
        Some(body) => vocabulary.extend(lookup::scan_lookups(body, &catch_all.name)),
        None => vocabulary.extend(scan_text(callable, &catch_all.name)),
    }

    debug!(callable = name, %vocabulary, "extracted keyword vocabulary");
    vocabulary
}

/// Extract the vocabulary of the first function defined in `source`.
///
/// Falls back to a text scan when the source cannot be tokenized or parsed.
pub fn extract_source(source: &str) -> KeywordVocabulary {
    match Module::parse(source) {
        Ok(module) => module
            .functions
            .first()
            .map(|f| extract(f))
            .unwrap_or_default(),
        Err(err) => {
            debug!(%err, "structural parse failed, scanning source text");
            extract_text(source)
        }
    }
}

/// Extract the vocabulary of the first function in `text` without
/// tokenizing it. Empty when the `fallback` feature is disabled.
#[cfg(feature = "fallback")]
pub fn extract_text(text: &str) -> KeywordVocabulary {
    extract(&fallback::SourceText::new(text))
}

/// Extract the vocabulary of the first function in `text` without
/// tokenizing it. Empty when the `fallback` feature is disabled.
#[cfg(not(feature = "fallback"))]
pub fn extract_text(_text: &str) -> KeywordVocabulary {
    KeywordVocabulary::new()
}

#[cfg(feature = "fallback")]
fn scan_text<C: Inspect + ?Sized>(callable: &C, catch_all: &str) -> Vec<String> {
    callable
        .source()
        .map(|text| fallback::scan_source(text, catch_all))
        .unwrap_or_default()
}

#[cfg(not(feature = "fallback"))]
fn scan_text<C: Inspect + ?Sized>(_callable: &C, _catch_all: &str) -> Vec<String> {
    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(vocabulary: &KeywordVocabulary) -> Vec<&str> {
        vocabulary.iter().collect()
    }

    #[test]
    fn lookups_and_defaults() {
        let v = extract_source(
            "def foo(arg1, arg2=1, **kwargs):\n    a = kwargs['foo']\n    b = kwargs.get('bar', 200)\n    return a, b\n",
        );
        assert_eq!(names(&v), vec!["arg2", "bar", "foo"]);
    }

    #[test]
    fn no_catch_all_means_empty() {
        let v = extract_source("def foo(arg1, arg2=1, *, flag=False):\n    return arg1\n");
        assert!(v.is_empty());
    }

    #[test]
    fn keyword_only_defaults_are_included() {
        let v = extract_source("def foo(a, *args, flag=False, other, **kw):\n    pass\n");
        assert_eq!(names(&v), vec!["flag"]);
    }

    #[test]
    fn positional_only_defaults_are_excluded() {
        let v = extract_source("def foo(a=1, /, b=2, **kw):\n    pass\n");
        assert_eq!(names(&v), vec!["b"]);
    }

    #[test]
    fn catch_all_under_another_name() {
        let v = extract_source("def foo(**options):\n    x = options['verbose']\n    y = kwargs['nope']\n");
        assert_eq!(names(&v), vec!["verbose"]);
    }

    #[test]
    fn nested_definitions_are_not_attributed() {
        let v = extract_source(
            "def outer(**kw):\n    a = kw['mine']\n    def inner(**kw):\n        return kw['theirs']\n    return inner\n",
        );
        assert_eq!(names(&v), vec!["mine"]);
    }

    #[test]
    fn no_function_in_source() {
        assert!(extract_source("x = 1\n").is_empty());
    }

    #[test]
    fn parse_failure_uses_text_scan() {
        let v = extract_source("def foo(**kwargs):\n    a = kwargs['foo']\n    s = 'unterminated\n");
        if cfg!(feature = "fallback") {
            assert_eq!(names(&v), vec!["foo"]);
        } else {
            assert!(v.is_empty());
        }
    }

    #[test]
    fn lambda_default_does_not_hide_catch_all() {
        let v = extract_source("def f(cb=lambda x, **o: o, **kwargs):\n    return kwargs['alpha']\n");
        assert_eq!(names(&v), vec!["alpha", "cb"]);
    }

    #[test]
    fn generic_function_header() {
        let source = "def foo[T](x: T, **kwargs):\n    return kwargs.get('bar')\n\ndef ok(**kw):\n    return kw['a']\n";
        assert_eq!(names(&extract_source(source)), vec!["bar"]);
    }

    #[test]
    fn text_scan_is_limited_to_the_first_function() {
        let v = extract_source("def first(**kwargs): kwargs['mine']\ndef second(**kwargs): kwargs['theirs']; s = 'oops\n");
        if cfg!(feature = "fallback") {
            assert_eq!(names(&v), vec!["mine"]);
        } else {
            assert!(v.is_empty());
        }
    }

    struct Opaque;

    impl Inspect for Opaque {
        fn parameters(&self) -> Option<&[Param]> {
            None
        }

        fn body(&self) -> Option<&[Token]> {
            None
        }
    }

    #[test]
    fn uninspectable_callable() {
        assert!(extract(&Opaque).is_empty());
    }
}
