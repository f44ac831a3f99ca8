use kgram_common::error::StorageError;
use kgram_logical::PatternId;
use kgram_model::Variable;
use spargebra::SparqlSyntaxError;

/// A structural error of the query evaluation.
///
/// Errors of individual expressions are not reported through this type. They are the "error"
/// value of SPARQL's three-valued logic and never abort an evaluation.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum QueryError {
    /// An error in SPARQL parsing.
    #[error(transparent)]
    Syntax(#[from] SparqlSyntaxError),
    /// An error from the storage.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// An `EXISTS` refers to a sub-pattern that is not registered in the query.
    #[error("The pattern {0:?} is not declared in the query")]
    UndeclaredPattern(PatternId),
    /// An `EXISTS` is evaluated by an interpreter without a sub-evaluator.
    #[error("No sub-evaluator is available to evaluate EXISTS")]
    MissingSubEvaluator,
    /// A variable is not declared in the query.
    #[error("The variable {0} is not declared in the query")]
    UnknownVariable(Variable),
    #[error("A feature has not yet been implemented: {0}")]
    NotImplemented(String),
}

impl QueryError {
    pub fn not_implemented<T>(feature: impl Into<String>) -> Result<T, Self> {
        Err(QueryError::NotImplemented(feature.into()))
    }
}
