// Damerau-Levenshtein edit distance (optimal string alignment variant)

/// Compute the edit distance between two strings where insertions,
/// deletions, substitutions and transpositions of two adjacent characters
/// each cost 1.
///
/// This is the restricted ("optimal string alignment") form: a substring
/// is never edited more than once, so `"ca"` -> `"abc"` is 3, not 2.
/// Distances are counted in Unicode scalar values, not bytes.
///
/// Total over all inputs, including empty strings.
pub fn damerau_levenshtein(a: &str, b: &str) -> usize {
    strsim::osa_distance(a, b)
}
