/// Options of a single query evaluation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EvaluationOptions {
    /// Disables the elimination of successive duplicate edges.
    pub skip_duplicate_test: bool,
    /// Matches `rdf:type` edges through the class hierarchy if the graph has entailment.
    pub type_matching: bool,
    /// A hard cap on the number of raw solutions.
    pub limit: Option<usize>,
}

impl EvaluationOptions {
    #[must_use]
    pub fn with_skip_duplicate_test(mut self, skip: bool) -> Self {
        self.skip_duplicate_test = skip;
        self
    }

    #[must_use]
    pub fn with_type_matching(mut self, type_matching: bool) -> Self {
        self.type_matching = type_matching;
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }
}
