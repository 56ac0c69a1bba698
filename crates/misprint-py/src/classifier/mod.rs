// Misprint classification of supplied keyword names
//
// Each supplied name is either an exact match, a probable misprint of one or
// more known names, or unmatched. Misprints get one diagnostic each; the
// unmatched names share a single aggregate diagnostic.

pub mod matrix;
pub mod options;

use std::collections::BTreeSet;

use misprint_core::{Diagnostic, DiagnosticSink, KeywordVocabulary};
use tracing::debug;

pub use matrix::DistanceMatrix;
pub use options::CheckOptions;

/// Outcome for one supplied name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The name is in the vocabulary.
    Matched,
    /// Not in the vocabulary, but close to these names (sorted, non-empty).
    Misprint(Vec<String>),
    /// Close to nothing.
    Unmatched,
}

/// Verdicts for every distinct supplied name of one call, ordered by name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Classification {
    verdicts: Vec<(String, Verdict)>,
}

impl Classification {
    pub fn verdict(&self, name: &str) -> Option<&Verdict> {
        self.verdicts
            .binary_search_by(|(n, _)| n.as_str().cmp(name))
            .ok()
            .map(|i| &self.verdicts[i].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Verdict)> {
        self.verdicts.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.verdicts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verdicts.is_empty()
    }

    /// True when every supplied name matched exactly.
    pub fn is_clean(&self) -> bool {
        self.verdicts.iter().all(|(_, v)| *v == Verdict::Matched)
    }

    /// The diagnostics this classification produces: one per misprint in
    /// name order, then at most one aggregate for the unmatched names.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let mut ignored = Vec::new();
        for (name, verdict) in &self.verdicts {
            match verdict {
                Verdict::Matched => {}
                Verdict::Misprint(expected) => {
                    diagnostics.push(Diagnostic::misprint(expected.clone(), name.clone()));
                }
                Verdict::Unmatched => ignored.push(name.clone()),
            }
        }
        if !ignored.is_empty() {
            diagnostics.push(Diagnostic::ignored(ignored));
        }
        diagnostics
    }
}

/// Classify the supplied names of one call against a vocabulary.
///
/// Duplicate supplied names are classified once.
pub fn classify<I, S>(
    vocabulary: &KeywordVocabulary,
    supplied: I,
    options: &CheckOptions,
) -> Classification
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let supplied: BTreeSet<String> = supplied
        .into_iter()
        .map(|s| s.as_ref().to_string())
        .collect();
    let rows: Vec<&str> = supplied.iter().map(String::as_str).collect();
    let known: Vec<&str> = vocabulary.iter().collect();
    let mut matrix = DistanceMatrix::new(&rows, &known);

    let mut verdicts = Vec::with_capacity(rows.len());
    for (row, name) in rows.iter().enumerate() {
        let verdict = if matrix.fill_row(row) {
            Verdict::Matched
        } else {
            // `known` iterates in sorted order, so candidates are sorted too.
            let near = matrix.near(row, options.tolerance);
            if near.is_empty() {
                Verdict::Unmatched
            } else {
                Verdict::Misprint(near.into_iter().map(str::to_string).collect())
            }
        };
        verdicts.push((name.to_string(), verdict));
    }

    debug!(
        supplied = rows.len(),
        known = known.len(),
        distances = matrix.computed(),
        "classified keyword names"
    );
    Classification { verdicts }
}

/// Classify and deliver every resulting diagnostic to `sink`.
///
/// Runs even when the vocabulary is empty; the interceptors decide whether
/// to skip that case. Returns the diagnostics that were reported.
pub fn check_misprints<I, S>(
    vocabulary: &KeywordVocabulary,
    supplied: I,
    options: &CheckOptions,
    sink: &dyn DiagnosticSink,
) -> Vec<Diagnostic>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let diagnostics = classify(vocabulary, supplied, options).diagnostics();
    for diagnostic in &diagnostics {
        sink.report(&diagnostic.to_string());
    }
    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;
    use misprint_core::CollectingSink;

    fn vocabulary(names: &[&str]) -> KeywordVocabulary {
        names.iter().copied().collect()
    }

    #[test]
    fn mixed_call_produces_five_diagnostics() {
        let v = vocabulary(&["arg2", "foo", "bar", "baz"]);
        let sink = CollectingSink::new();
        let reported = check_misprints(
            &v,
            ["arg3", "foo", "fo", "bard", "bas", "oth", "last"],
            &CheckOptions::default(),
            &sink,
        );
        assert_eq!(reported.len(), 5);
        let messages = sink.messages();
        assert_eq!(messages.len(), 5);
        for expected in [
            "potential misprint in keyword argument name: expected arg2 - got arg3",
            "potential misprint in keyword argument name: expected foo - got fo",
            "potential misprint in keyword argument name: expected bar - got bard",
            "potential misprint in keyword argument name: expected bar or baz - got bas",
            "ignored the following keyword arguments: last, oth",
        ] {
            assert!(messages.iter().any(|m| m == expected), "missing {expected:?}");
        }
        assert!(!messages.iter().any(|m| m.contains("got foo")));
    }

    #[test]
    fn empty_vocabulary_reports_everything_ignored() {
        let sink = CollectingSink::new();
        check_misprints(
            &KeywordVocabulary::new(),
            ["y", "x"],
            &CheckOptions::default(),
            &sink,
        );
        assert_eq!(
            sink.messages(),
            vec!["ignored the following keyword arguments: x, y"]
        );
    }

    #[test]
    fn exact_matches_are_silent() {
        let v = vocabulary(&["foo", "fooo"]);
        let c = classify(&v, ["foo"], &CheckOptions::default());
        assert!(c.is_clean());
        assert!(c.diagnostics().is_empty());
    }

    #[test]
    fn zero_tolerance_disables_misprints() {
        let v = vocabulary(&["foo"]);
        let c = classify(&v, ["fo"], &CheckOptions::default().with_tolerance(0));
        assert_eq!(c.verdict("fo"), Some(&Verdict::Unmatched));
    }

    #[test]
    fn wider_tolerance_finds_more_candidates() {
        let v = vocabulary(&["color", "colour"]);
        let c = classify(&v, ["colr"], &CheckOptions::default().with_tolerance(2));
        assert_eq!(
            c.verdict("colr"),
            Some(&Verdict::Misprint(vec!["color".into(), "colour".into()]))
        );
    }

    #[test]
    fn duplicates_are_classified_once() {
        let v = vocabulary(&["foo"]);
        let c = classify(&v, ["fo", "fo", "zzz", "zzz"], &CheckOptions::default());
        assert_eq!(c.len(), 2);
        assert_eq!(c.diagnostics().len(), 2);
    }

    #[test]
    fn every_unmatched_name_appears_exactly_once() {
        let v = vocabulary(&["alpha", "beta"]);
        let supplied = ["alpa", "gamma", "delta", "beta"];
        let diagnostics = classify(&v, supplied, &CheckOptions::default()).diagnostics();
        for name in ["alpa", "gamma", "delta"] {
            let hits = diagnostics
                .iter()
                .filter(|d| d.supplied_names().contains(&name))
                .count();
            assert_eq!(hits, 1, "{name}");
        }
        assert!(diagnostics.iter().all(|d| !d.supplied_names().contains(&"beta")));
    }

    #[test]
    fn nothing_supplied() {
        let c = classify(&vocabulary(&["a"]), Vec::<String>::new(), &CheckOptions::default());
        assert!(c.is_empty());
        assert!(c.diagnostics().is_empty());
    }
}
