//! Shared types for keyword-argument misprint detection.
//!
//! This crate holds the pieces every front end needs regardless of how the
//! keyword vocabulary of a callable was recovered:
//!
//! - [`vocabulary`] -- the immutable set of keyword names a callable reads
//! - [`diagnostic`] -- the two advisory messages (misprint, ignored)
//! - [`sink`] -- where diagnostics go (`tracing`, a closure, a buffer)
//! - [`distance`] -- Damerau-Levenshtein edit distance

pub mod diagnostic;
pub mod distance;
pub mod sink;
pub mod vocabulary;

pub use diagnostic::Diagnostic;
pub use distance::damerau_levenshtein;
pub use sink::{CollectingSink, DiagnosticSink, Prefixed, TracingSink};
pub use vocabulary::KeywordVocabulary;

/// Default edit-distance tolerance for misprint candidates.
pub const DEFAULT_TOLERANCE: usize = 1;
