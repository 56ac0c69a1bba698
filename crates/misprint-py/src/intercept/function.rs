// Checked functions: the decorator entry point

use std::sync::OnceLock;

use misprint_core::{Diagnostic, KeywordVocabulary, Prefixed};
use tracing::debug;

use super::{Kwargs, SharedSink, default_sink};
use crate::classifier::{CheckOptions, check_misprints};
use crate::extractor::extract;
use crate::syntax::FunctionDef;

/// A function wrapped with keyword misprint detection.
///
/// The vocabulary comes from the Python definition and is extracted on first
/// use. Every [`call`](Checked::call) classifies the supplied keyword names,
/// reports through the sink with a `Calling <name>(): ` prefix, then runs the
/// wrapped closure with the arguments unchanged.
pub struct Checked<F> {
    definition: FunctionDef,
    function: F,
    name: String,
    vocabulary: OnceLock<KeywordVocabulary>,
    sink: SharedSink,
    options: CheckOptions,
}

impl<F> Checked<F> {
    pub fn new(definition: FunctionDef, function: F) -> Self {
        let name = format!("detect_misprints_{}", definition.name);
        Self {
            definition,
            function,
            name,
            vocabulary: OnceLock::new(),
            sink: default_sink(),
            options: CheckOptions::default(),
        }
    }

    pub fn with_sink(mut self, sink: SharedSink) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_options(mut self, options: CheckOptions) -> Self {
        self.options = options;
        self
    }

    /// Name of the wrapper, `detect_misprints_<function>`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn definition(&self) -> &FunctionDef {
        &self.definition
    }

    /// The function's keyword vocabulary. Extracted once, then cached.
    pub fn vocabulary(&self) -> &KeywordVocabulary {
        self.vocabulary.get_or_init(|| extract(&self.definition))
    }

    /// Classify supplied keyword names without calling the function.
    pub fn check<I, S>(&self, supplied: I) -> Vec<Diagnostic>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let vocabulary = self.vocabulary();
        if vocabulary.is_empty() && self.options.skip_empty_vocabulary {
            debug!(function = %self.definition.qualname, "empty vocabulary, check skipped");
            return Vec::new();
        }
        let sink = Prefixed::calling(&self.definition.name, &*self.sink);
        check_misprints(vocabulary, supplied, &self.options, &sink)
    }

    /// Check the keyword names, then call the wrapped function and return
    /// its result as is.
    pub fn call<A, V, R>(&self, args: A, kwargs: Kwargs<V>) -> R
    where
        F: Fn(A, Kwargs<V>) -> R,
    {
        self.check(kwargs.keys());
        (self.function)(args, kwargs)
    }
}

/// Wrap `function` with misprint detection driven by `definition`.
pub fn detect_misprints<F>(definition: FunctionDef, function: F) -> Checked<F> {
    Checked::new(definition, function)
}
