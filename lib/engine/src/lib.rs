//! The evaluation core of the KGRAM query engine.
//!
//! A query is evaluated by three cooperating components:
//!
//! - the [Producer] turns patterns into lazy sequences of candidate edges of a
//!   [GraphIndex](kgram_common::GraphIndex),
//! - the [Interpreter] evaluates filters and computed values with the three-valued logic of
//!   SPARQL,
//! - [CompleteSparql] finalizes the raw solutions: select expressions, `DISTINCT` and the keys
//!   of `ORDER BY` and `GROUP BY`.
//!
//! The join engine in [eval] drives them and [sparql] lowers SPARQL queries into the query
//! model.

mod complete;
mod environment;
pub mod error;
pub mod eval;
mod interpreter;
mod mapping;
mod options;
pub mod producer;
pub mod sparql;

pub use complete::CompleteSparql;
pub use environment::{Binding, Environment, LocalScope, Memory, MappingEnvironment};
pub use error::QueryError;
pub use eval::{evaluate_query, JoinSubEvaluator};
pub use interpreter::{
    Bindings, EvaluationResult, ExistsListener, Interpreter, SubEvaluation, SubEvaluator,
};
pub use mapping::{Mapping, Mappings};
pub use options::EvaluationOptions;
pub use producer::{PathRequest, Producer};
