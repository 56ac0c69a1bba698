// Per-call distance matrix between supplied and known names

use hashbrown::HashMap;
use misprint_core::damerau_levenshtein;
use tracing::trace;

/// Lazily filled `(supplied, known) -> distance` table.
///
/// Lives for one classification only; supplied names differ per call so
/// nothing here is worth keeping.
pub struct DistanceMatrix<'a> {
    supplied: &'a [&'a str],
    known: &'a [&'a str],
    cells: HashMap<(usize, usize), usize>,
}

impl<'a> DistanceMatrix<'a> {
    pub fn new(supplied: &'a [&'a str], known: &'a [&'a str]) -> Self {
        Self {
            supplied,
            known,
            cells: HashMap::new(),
        }
    }

    /// Distance between `supplied[row]` and `known[col]`, computed on first use.
    pub fn distance(&mut self, row: usize, col: usize) -> usize {
        let (supplied, known) = (self.supplied[row], self.known[col]);
        *self.cells.entry((row, col)).or_insert_with(|| {
            let d = damerau_levenshtein(supplied, known);
            trace!(supplied, known, distance = d, "edit distance");
            d
        })
    }

    /// Fill row `row` until an exact match is found. Returns whether one was.
    pub fn fill_row(&mut self, row: usize) -> bool {
        (0..self.known.len()).any(|col| self.distance(row, col) == 0)
    }

    /// Known names at distance `1..=tolerance` from `supplied[row]`, in the
    /// order of `known`. Only meaningful after `fill_row` found no match.
    pub fn near(&self, row: usize, tolerance: usize) -> Vec<&'a str> {
        (0..self.known.len())
            .filter(|&col| {
                self.cells
                    .get(&(row, col))
                    .is_some_and(|&d| d > 0 && d <= tolerance)
            })
            .map(|col| self.known[col])
            .collect()
    }

    /// Number of distances actually computed.
    pub fn computed(&self) -> usize {
        self.cells.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stops_at_exact_match() {
        let supplied = ["foo"];
        let known = ["bar", "foo", "baz", "qux"];
        let mut matrix = DistanceMatrix::new(&supplied, &known);
        assert!(matrix.fill_row(0));
        assert_eq!(matrix.computed(), 2);
    }

    #[test]
    fn near_names_within_tolerance() {
        let supplied = ["bas"];
        let known = ["arg2", "bar", "baz", "foo"];
        let mut matrix = DistanceMatrix::new(&supplied, &known);
        assert!(!matrix.fill_row(0));
        assert_eq!(matrix.near(0, 1), vec!["bar", "baz"]);
        assert!(matrix.near(0, 0).is_empty());
    }

    #[test]
    fn cells_are_memoized() {
        let supplied = ["ab"];
        let known = ["ba"];
        let mut matrix = DistanceMatrix::new(&supplied, &known);
        assert_eq!(matrix.distance(0, 0), 1);
        assert_eq!(matrix.distance(0, 0), 1);
        assert_eq!(matrix.computed(), 1);
    }
}
