// Keyword vocabulary: the set of keyword names a callable is known to read

use std::collections::BTreeSet;
use std::fmt;

/// The keyword names recovered for one callable (or one type, aggregated
/// over its ancestors).
///
/// Duplicates collapse and iteration is always in lexicographic order, which
/// keeps diagnostics deterministic. A vocabulary is built once by an
/// extractor and then shared read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct KeywordVocabulary {
    names: BTreeSet<String>,
}

impl KeywordVocabulary {
    /// Create an empty vocabulary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a name. Returns `false` if it was already present.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        self.names.insert(name.into())
    }

    /// Add every name of `other` to this vocabulary.
    pub fn union_with(&mut self, other: &KeywordVocabulary) {
        self.names.extend(other.names.iter().cloned());
    }

    /// Check whether `name` is part of the vocabulary.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Check whether every name of `other` is also in `self`.
    pub fn is_superset(&self, other: &KeywordVocabulary) -> bool {
        self.names.is_superset(&other.names)
    }

    /// Iterate over the names in lexicographic order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for KeywordVocabulary {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<S: Into<String>> Extend<S> for KeywordVocabulary {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.names.extend(iter.into_iter().map(Into::into));
    }
}

impl<'a> IntoIterator for &'a KeywordVocabulary {
    type Item = &'a String;
    type IntoIter = std::collections::btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter()
    }
}

impl fmt::Display for KeywordVocabulary {
    /// Formats as `{a, b, c}`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, name) in self.names.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(name)?;
        }
        f.write_str("}")
    }
}
