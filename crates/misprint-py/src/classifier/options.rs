// Options controlling misprint classification

use misprint_core::DEFAULT_TOLERANCE;

/// Options for classification and for the interceptors built on top of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckOptions {
    /// Largest edit distance at which a supplied name is still reported as
    /// a misprint of a known name. Zero disables misprint detection.
    pub tolerance: usize,
    /// Skip classification at interception points when the vocabulary is
    /// empty. Direct calls to the classifier are not affected.
    pub skip_empty_vocabulary: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            skip_empty_vocabulary: true,
        }
    }
}

impl CheckOptions {
    pub fn with_tolerance(mut self, tolerance: usize) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_skip_empty_vocabulary(mut self, skip: bool) -> Self {
        self.skip_empty_vocabulary = skip;
        self
    }
}
