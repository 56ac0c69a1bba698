//! Keyword-argument misprint detection for Python source.
//!
//! Functions and classes that accept a `**kwargs` catch-all silently swallow
//! mistyped option names. This crate recovers which names a definition
//! actually reads out of its catch-all and checks the keyword names of a call
//! against them:
//!
//! - [`tokenizer`] and [`syntax`] -- a lightweight Python front end
//! - [`extractor`] -- keyword vocabulary recovery (structural, with a text
//!   fallback behind the `fallback` feature)
//! - [`classifier`] -- exact / misprint / ignored classification
//! - [`intercept`] -- checked functions and checked construction
//! - [`MisprintDetector`] -- everything above for one module, plus a static
//!   scan of its call sites
//!
//! ```
//! use misprint_py::extractor::extract_source;
//!
//! let vocabulary = extract_source(
//!     "def foo(arg1, arg2=1, **kwargs):\n    return kwargs.get('bar')\n",
//! );
//! assert_eq!(vocabulary.iter().collect::<Vec<_>>(), vec!["arg2", "bar"]);
//! ```

pub mod calls;
pub mod classifier;
pub mod extractor;
pub mod handle;
pub mod intercept;
pub mod syntax;
pub mod tokenizer;

pub use classifier::{CheckOptions, Classification, Verdict, check_misprints, classify};
pub use extractor::{Inspect, extract, extract_source, extract_text};
pub use handle::{CallReport, DetectorError, MisprintDetector};
pub use intercept::{Checked, Kwargs, SharedSink, TypeRegistry, detect_misprints};
pub use syntax::{
    ClassDef, FunctionDef, Module, Param, ParamKind, ParseError, Recovered, Unparsed, UnparsedKind,
};

pub use misprint_core::{
    CollectingSink, Diagnostic, DiagnosticSink, KeywordVocabulary, TracingSink,
};
