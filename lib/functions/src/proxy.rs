use kgram_logical::{AggregateFunction, BinaryOp, BuiltinFunction, UnaryOp};
use kgram_model::{Term, ThinResult};
use std::cmp::Ordering;
use std::fmt::Debug;
use std::sync::Arc;

/// A reference-counted pointer to an implementation of the [ValueProxy] trait.
pub type ValueProxyRef = Arc<dyn ValueProxy>;

/// A host value that can be cast into a [Term].
#[derive(Clone, Debug, PartialEq)]
pub enum HostValue {
    Boolean(bool),
    Integer(i64),
    Double(f64),
    String(String),
}

/// Owns the value semantics of the query engine.
///
/// The interpreter is only responsible for control flow and the propagation of errors. Every
/// operation on actual values goes through this trait. Failures are reported as a
/// [ThinError](kgram_model::ThinError) and become the "error" value of SPARQL's three-valued
/// logic.
pub trait ValueProxy: Debug + Send + Sync {
    /// Computes the [effective boolean value](https://www.w3.org/TR/sparql11-query/#ebv) of a
    /// value. Fails if the value has no boolean interpretation.
    fn effective_boolean_value(&self, value: &Term) -> ThinResult<bool>;

    /// Evaluates a binary operator.
    fn binary(&self, op: BinaryOp, lhs: &Term, rhs: &Term) -> ThinResult<Term>;

    /// Evaluates a unary operator.
    fn unary(&self, op: UnaryOp, value: &Term) -> ThinResult<Term>;

    /// Evaluates a built-in function on already evaluated arguments.
    fn function(&self, function: BuiltinFunction, args: &[Term]) -> ThinResult<Term>;

    /// Accumulates the values of a group. Unbound values are passed as `None`.
    fn aggregate(
        &self,
        function: &AggregateFunction,
        distinct: bool,
        values: &mut dyn Iterator<Item = Option<Term>>,
    ) -> ThinResult<Term>;

    /// A total order on terms, used by `ORDER BY`.
    fn compare(&self, lhs: &Term, rhs: &Term) -> Ordering;

    /// Casts a host value into a term.
    fn cast(&self, value: HostValue) -> Term;
}
