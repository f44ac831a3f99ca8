//! The SPARQL front end.
//!
//! Queries are parsed with [spargebra] and lowered into the query model of the engine.

mod rewriting;

pub use rewriting::QueryRewriter;

use crate::error::QueryError;
use kgram_logical::Query;

/// Parses a SPARQL query and lowers it for evaluation.
pub fn parse_query(query: &str) -> Result<Query, QueryError> {
    let query = spargebra::Query::parse(query, None)?;
    QueryRewriter::new().rewrite(&query)
}
