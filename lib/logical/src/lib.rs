//! The query model.
//!
//! A [Query] is a tree of [GraphPattern]s whose filters and computed values are [Expr]s. It is
//! built once, usually by lowering a SPARQL algebra tree, and then shared read-only by the
//! evaluation.

mod expr;
mod function;
mod pattern;
mod query;

pub use expr::*;
pub use function::*;
pub use pattern::*;
pub use query::*;
