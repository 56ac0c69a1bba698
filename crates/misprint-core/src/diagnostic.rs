// Advisory diagnostics produced by misprint classification

use std::fmt;

/// An advisory message about the keyword arguments of one call.
///
/// Diagnostics never block or alter the call they describe. The `Display`
/// form is the exact text handed to a [`DiagnosticSink`](crate::DiagnosticSink).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum Diagnostic {
    /// `got` is within tolerance of one or more known names.
    /// `expected` is non-empty and sorted.
    Misprint { expected: Vec<String>, got: String },

    /// Supplied names that match nothing in the vocabulary. Sorted, non-empty,
    /// and reported at most once per call.
    Ignored { names: Vec<String> },
}

impl Diagnostic {
    /// Build a misprint diagnostic; sorts the candidates.
    pub fn misprint(mut expected: Vec<String>, got: impl Into<String>) -> Self {
        expected.sort();
        Diagnostic::Misprint {
            expected,
            got: got.into(),
        }
    }

    /// Build the aggregate ignored-names diagnostic; sorts the names.
    pub fn ignored(mut names: Vec<String>) -> Self {
        names.sort();
        Diagnostic::Ignored { names }
    }

    /// Every supplied name this diagnostic talks about.
    pub fn supplied_names(&self) -> Vec<&str> {
        match self {
            Diagnostic::Misprint { got, .. } => vec![got.as_str()],
            Diagnostic::Ignored { names } => names.iter().map(String::as_str).collect(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::Misprint { expected, got } => write!(
                f,
                "potential misprint in keyword argument name: expected {} - got {}",
                expected.join(" or "),
                got
            ),
            Diagnostic::Ignored { names } => write!(
                f,
                "ignored the following keyword arguments: {}",
                names.join(", ")
            ),
        }
    }
}
