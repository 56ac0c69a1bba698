// MisprintDetector: top-level integration point for one Python module.
//
// Owns the parsed module, a type registry for its classes and a cache of
// function vocabularies, and offers per-call checks plus a static scan of
// every call site in the module.
//
// Design notes:
// - Function vocabularies are extracted on first request and cached behind
//   an RwLock; extraction is deterministic so a racing recompute is harmless.
// - Classes are registered eagerly at construction, in definition order, so
//   each class sees the vocabularies of bases defined above it.
// - `from_source` never fails on bad syntax: top-level definitions that do
//   not parse are kept as text and go through the text scan instead.

use std::fmt;
use std::sync::{Arc, RwLock};

use hashbrown::HashMap;
use misprint_core::{Diagnostic, KeywordVocabulary, Prefixed};
use tracing::debug;

use crate::calls::scan_calls;
use crate::classifier::{CheckOptions, check_misprints, classify};
use crate::extractor::{extract, extract_text};
use crate::intercept::{SharedSink, TypeRegistry, default_sink};
use crate::syntax::{Module, ParseError, Unparsed, UnparsedKind};

/// Error type for MisprintDetector operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DetectorError {
    /// The module source could not be parsed (strict construction only).
    #[error("failed to parse module: {0}")]
    Parse(#[from] ParseError),

    /// Neither a module-level function nor a known class has this name.
    #[error("unknown callee: {0}")]
    UnknownCallee(String),
}

/// Diagnostics for one call site found by [`MisprintDetector::check_calls`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallReport {
    pub callee: String,
    pub line: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl fmt::Display for CallReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, diagnostic) in self.diagnostics.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "line {}: {}(): {}", self.line, self.callee, diagnostic)?;
        }
        Ok(())
    }
}

/// Misprint detection over the functions and classes of one module.
pub struct MisprintDetector {
    module: Module,
    registry: TypeRegistry,
    /// Function vocabularies by qualified name.
    vocabularies: RwLock<HashMap<String, Arc<KeywordVocabulary>>>,
    /// Source text of top-level functions that failed to parse, by name.
    unparsed: HashMap<String, String>,
    sink: SharedSink,
    options: CheckOptions,
}

impl MisprintDetector {
    /// Parse `source` and register its classes.
    ///
    /// Syntax errors do not fail construction: each top-level definition
    /// that cannot be parsed keeps a degraded vocabulary from a text scan
    /// of its own lines, and the rest of the module is analysed as usual.
    pub fn from_source(source: &str) -> Self {
        let recovered = Module::parse_recovering(source);
        if let Some(err) = &recovered.error {
            debug!(%err, unparsed = recovered.unparsed.len(), "module loaded with errors");
        }
        Self::build(recovered.module, recovered.unparsed)
    }

    /// Like [`from_source`](Self::from_source), but any syntax error fails
    /// the whole module.
    pub fn parse(source: &str) -> Result<Self, DetectorError> {
        let module = Module::parse(source)?;
        Ok(Self::build(module, Vec::new()))
    }

    fn build(module: Module, unparsed: Vec<Unparsed>) -> Self {
        let mut registry = TypeRegistry::new();
        let mut text_classes = unparsed
            .iter()
            .filter(|u| u.kind == UnparsedKind::Class)
            .peekable();
        for class in module.all_classes() {
            while let Some(text) = text_classes.next_if(|u| u.line < class.line) {
                register_text(&mut registry, text);
            }
            registry.redefine(class);
        }
        for text in text_classes {
            register_text(&mut registry, text);
        }

        let unparsed: HashMap<String, String> = unparsed
            .into_iter()
            .filter(|u| u.kind == UnparsedKind::Function)
            .map(|u| (u.name, u.source))
            .collect();
        debug!(
            functions = module.functions.len() + unparsed.len(),
            classes = registry.len(),
            "module loaded"
        );
        Self {
            module,
            registry,
            vocabularies: RwLock::new(HashMap::new()),
            unparsed,
            sink: default_sink(),
            options: CheckOptions::default(),
        }
    }

    pub fn with_sink(mut self, sink: SharedSink) -> Self {
        self.set_sink(sink);
        self
    }

    pub fn with_options(mut self, options: CheckOptions) -> Self {
        self.set_options(options);
        self
    }

    /// Replace the sink used by `check_call`, for functions and classes alike.
    pub fn set_sink(&mut self, sink: SharedSink) {
        self.registry = std::mem::take(&mut self.registry).with_sink(Arc::clone(&sink));
        self.sink = sink;
    }

    pub fn set_options(&mut self, options: CheckOptions) {
        self.registry = std::mem::take(&mut self.registry).with_options(options);
        self.options = options;
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn options(&self) -> &CheckOptions {
        &self.options
    }

    /// Vocabulary of a function or method by qualified name.
    pub fn function_vocabulary(&self, qualname: &str) -> Option<Arc<KeywordVocabulary>> {
        if let Some(cached) = self.read_cache().get(qualname) {
            return Some(Arc::clone(cached));
        }
        let vocabulary = match self.module.function(qualname) {
            Some(definition) => extract(definition),
            None => extract_text(self.unparsed.get(qualname)?),
        };
        let vocabulary = Arc::new(vocabulary);
        let mut cache = self
            .vocabularies
            .write()
            .unwrap_or_else(|e| e.into_inner());
        Some(Arc::clone(cache.entry(qualname.to_string()).or_insert(vocabulary)))
    }

    /// Aggregated constructor vocabulary of a class.
    pub fn class_vocabulary(&self, name: &str) -> Option<KeywordVocabulary> {
        self.registry.kwarg_names(name)
    }

    /// Vocabulary of whatever `name` refers to, functions first.
    pub fn vocabulary(&self, name: &str) -> Option<KeywordVocabulary> {
        self.function_vocabulary(name)
            .map(|v| (*v).clone())
            .or_else(|| self.class_vocabulary(name))
    }

    /// Check the keyword names of one call to `callee` and report the
    /// diagnostics through the sink.
    pub fn check_call<I, S>(
        &self,
        callee: &str,
        supplied: I,
    ) -> Result<Vec<Diagnostic>, DetectorError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if let Some(vocabulary) = self.function_vocabulary(callee) {
            if vocabulary.is_empty() && self.options.skip_empty_vocabulary {
                return Ok(Vec::new());
            }
            let name = callee.rsplit('.').next().unwrap_or(callee);
            let sink = Prefixed::calling(name, &*self.sink);
            return Ok(check_misprints(&vocabulary, supplied, &self.options, &sink));
        }
        match self.registry.get(callee) {
            Some(registered) => Ok(self.registry.check(&registered, supplied)),
            None => Err(DetectorError::UnknownCallee(callee.to_string())),
        }
    }

    /// Classify every call in the module whose callee is a module-level
    /// function or a known class. Calls with nothing to report are left out;
    /// nothing is sent to the sink.
    pub fn check_calls(&self) -> Vec<CallReport> {
        let mut reports = Vec::new();
        for call in scan_calls(self.module.tokens()) {
            let Some(vocabulary) = self.vocabulary(&call.callee) else {
                continue;
            };
            if vocabulary.is_empty() && self.options.skip_empty_vocabulary {
                continue;
            }
            if call.unpacks_mapping {
                debug!(callee = %call.callee, line = call.line, "`**` arguments not checked");
            }
            let diagnostics = classify(&vocabulary, &call.keywords, &self.options).diagnostics();
            if !diagnostics.is_empty() {
                reports.push(CallReport {
                    callee: call.callee,
                    line: call.line,
                    diagnostics,
                });
            }
        }
        reports
    }

    fn read_cache(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Arc<KeywordVocabulary>>> {
        self.vocabularies.read().unwrap_or_else(|e| e.into_inner())
    }
}

/// Register a class that only survived as text, from its `__init__` text.
fn register_text(registry: &mut TypeRegistry, class: &Unparsed) {
    let own = class
        .constructor_source()
        .map(extract_text)
        .unwrap_or_default();
    registry.redefine_parts(&class.name, &class.bases, own);
}

#[cfg(test)]
mod tests {
    use super::*;
    use misprint_core::CollectingSink;

    const MODULE: &str = "\
def foo(arg1, arg2=1, **kwargs):
    kwa1 = kwargs[\"foo\"]
    kwa2 = kwargs.get(\"bar\", 200)
    return arg1 + arg2 + kwa1 + kwa2

def plain(a, b=2):
    return a + b

class Shape:
    def __init__(self, **opts):
        self.color = opts.get('color')

class Circle(Shape):
    def __init__(self, radius, **opts):
        super().__init__(**opts)
        self.fill = opts.get('fill')

foo(0, arg3=1, foo=2, bas=3)
c = Circle(1, colr='red', fil=True, zzz=0)
plain(1, b=3, q=4)
foo(1, foo=1)
";

    fn detector() -> (MisprintDetector, Arc<CollectingSink>) {
        let sink = Arc::new(CollectingSink::new());
        let detector = MisprintDetector::parse(MODULE)
            .unwrap()
            .with_sink(sink.clone());
        (detector, sink)
    }

    #[test]
    fn vocabularies_of_functions_and_classes() {
        let (detector, _) = detector();
        let foo: Vec<String> = detector.vocabulary("foo").unwrap().iter().map(String::from).collect();
        assert_eq!(foo, vec!["arg2", "bar", "foo"]);
        let circle = detector.class_vocabulary("Circle").unwrap();
        assert_eq!(circle.iter().collect::<Vec<_>>(), vec!["color", "fill"]);
        assert!(detector.vocabulary("missing").is_none());
    }

    #[test]
    fn function_vocabulary_is_cached() {
        let (detector, _) = detector();
        let first = detector.function_vocabulary("foo").unwrap();
        let second = detector.function_vocabulary("foo").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn check_call_prefixes_by_callee_kind() {
        let (detector, sink) = detector();
        detector.check_call("foo", ["fo"]).unwrap();
        detector.check_call("Circle", ["fil"]).unwrap();
        assert_eq!(
            sink.messages(),
            vec![
                "Calling foo(): potential misprint in keyword argument name: expected foo - got fo",
                "Creating Circle: potential misprint in keyword argument name: expected fill - got fil",
            ]
        );
    }

    #[test]
    fn check_call_unknown_callee() {
        let (detector, _) = detector();
        let err = detector.check_call("nope", ["x"]).unwrap_err();
        assert_eq!(err, DetectorError::UnknownCallee("nope".into()));
    }

    #[test]
    fn static_scan_reports_lines() {
        let (detector, sink) = detector();
        let reports = detector.check_calls();
        assert_eq!(reports.len(), 2);

        assert_eq!(reports[0].callee, "foo");
        assert_eq!(reports[0].line, 18);
        assert_eq!(
            reports[0].diagnostics,
            vec![
                Diagnostic::misprint(vec!["arg2".into()], "arg3"),
                Diagnostic::misprint(vec!["bar".into()], "bas"),
            ]
        );

        assert_eq!(reports[1].callee, "Circle");
        assert_eq!(reports[1].line, 19);
        assert_eq!(
            reports[1].to_string(),
            "line 19: Circle(): potential misprint in keyword argument name: expected color - got colr\n\
             line 19: Circle(): potential misprint in keyword argument name: expected fill - got fil\n\
             line 19: Circle(): ignored the following keyword arguments: zzz"
        );
        assert!(sink.is_empty());
    }

    #[test]
    fn strict_parse_errors_surface() {
        let err = MisprintDetector::parse("x = 'oops\n").err().unwrap();
        assert!(matches!(err, DetectorError::Parse(_)));
    }

    const BROKEN: &str = "\
def foo[T](x: T, **kwargs):
    return kwargs.get('bar')

def bad(**kwargs):
    a = kwargs['alpha']
    s = 'unterminated

class Base:
    def __init__(self, **kw):
        self.v = kw['depth']

class Shaky(Base):
    def __init__(self, **kw):
        self.c = kw.get('color')
        s = 'unterminated

class Child(Shaky):
    pass

def ok(**kw):
    return kw['a']

foo(1, baz=2)
bad(alpah=1)
";

    #[test]
    fn one_bad_definition_degrades_alone() {
        let sink = Arc::new(CollectingSink::new());
        let detector = MisprintDetector::from_source(BROKEN).with_sink(sink.clone());
        let names = |name: &str| -> Vec<String> {
            detector.vocabulary(name).unwrap().iter().map(String::from).collect()
        };

        assert_eq!(names("foo"), vec!["bar"]);
        assert_eq!(names("ok"), vec!["a"]);
        assert_eq!(names("bad"), vec!["alpha"]);
        assert_eq!(names("Shaky"), vec!["color", "depth"]);
        assert_eq!(names("Child"), vec!["color", "depth"]);

        detector.check_call("bad", ["alpah"]).unwrap();
        assert_eq!(
            sink.messages(),
            vec!["Calling bad(): potential misprint in keyword argument name: expected alpha - got alpah"]
        );

        let reports = detector.check_calls();
        let lines: Vec<(usize, &str)> = reports.iter().map(|r| (r.line, r.callee.as_str())).collect();
        assert_eq!(lines, vec![(23, "foo"), (24, "bad")]);
    }
}
