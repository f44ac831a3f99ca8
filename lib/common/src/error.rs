use kgram_model::{Position, Term};
use std::error::Error;

/// An error related to storage operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StorageError {
    /// The term cannot be stored at the given position (e.g., a literal as a predicate).
    #[error("The term {term} cannot be stored in the {position} position.")]
    InvalidTerm { term: Term, position: Position },
    /// Only IRIs can be predicates.
    #[error("The term {0} cannot be used as a predicate.")]
    InvalidPredicate(Term),
    /// The dictionary ran out of node ids.
    #[error("The graph cannot hold more than {0} distinct terms.")]
    DictionaryFull(u32),
    #[error("{0}")]
    Other(#[source] Box<dyn Error + Send + Sync + 'static>),
}
