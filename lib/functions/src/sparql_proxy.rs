use crate::proxy::HostValue;
use crate::value::TypedValue;
use crate::{aggregates, builtin, ValueProxy};
use kgram_logical::{AggregateFunction, BinaryOp, BuiltinFunction, UnaryOp};
use kgram_model::{Literal, Term, ThinError, ThinResult};
use std::cmp::Ordering;

/// Implements the value semantics of
/// [SPARQL 1.1](https://www.w3.org/TR/sparql11-query/#OperatorMapping).
#[derive(Clone, Copy, Debug, Default)]
pub struct SparqlValueProxy;

impl SparqlValueProxy {
    /// [RDFterm-equal](https://www.w3.org/TR/sparql11-query/#func-RDFterm-equal) extended by
    /// the value equality of the known datatypes.
    pub fn equal(&self, lhs: &Term, rhs: &Term) -> ThinResult<bool> {
        if lhs.same(rhs) {
            return Ok(true);
        }
        match (TypedValue::from_term(lhs), TypedValue::from_term(rhs)) {
            (TypedValue::Numeric(lhs), TypedValue::Numeric(rhs)) => {
                Ok(lhs.partial_cmp_numeric(rhs) == Some(Ordering::Equal))
            }
            (
                TypedValue::String {
                    value: lhs_value,
                    language: lhs_language,
                },
                TypedValue::String {
                    value: rhs_value,
                    language: rhs_language,
                },
            ) => Ok(lhs_value == rhs_value && lhs_language == rhs_language),
            (TypedValue::Boolean(lhs), TypedValue::Boolean(rhs)) => Ok(lhs == rhs),
            (TypedValue::DateTime(lhs), TypedValue::DateTime(rhs)) => Ok(lhs == rhs),
            // Two literals of which one has an unknown datatype cannot be compared.
            (TypedValue::Other(_), rhs) if is_literal_value(rhs) => ThinError::expected(),
            (lhs, TypedValue::Other(_)) if is_literal_value(lhs) => ThinError::expected(),
            _ => Ok(false),
        }
    }

    /// Compares two values for the `<`, `<=`, `>` and `>=` operators.
    pub fn compare_values(&self, lhs: &Term, rhs: &Term) -> ThinResult<Ordering> {
        let ordering = match (TypedValue::from_term(lhs), TypedValue::from_term(rhs)) {
            (TypedValue::Numeric(lhs), TypedValue::Numeric(rhs)) => lhs.partial_cmp_numeric(rhs),
            (
                TypedValue::String {
                    value: lhs_value,
                    language: lhs_language,
                },
                TypedValue::String {
                    value: rhs_value,
                    language: rhs_language,
                },
            ) if lhs_language == rhs_language => Some(lhs_value.cmp(rhs_value)),
            (TypedValue::Boolean(lhs), TypedValue::Boolean(rhs)) => Some(lhs.cmp(&rhs)),
            (TypedValue::DateTime(lhs), TypedValue::DateTime(rhs)) => lhs.partial_cmp(&rhs),
            _ => None,
        };
        ordering.ok_or(ThinError::default())
    }
}

fn is_literal_value(value: TypedValue<'_>) -> bool {
    !matches!(
        value,
        TypedValue::NamedNode(_) | TypedValue::BlankNode | TypedValue::Object
    )
}

impl ValueProxy for SparqlValueProxy {
    fn effective_boolean_value(&self, value: &Term) -> ThinResult<bool> {
        match TypedValue::from_term(value) {
            TypedValue::Boolean(value) => Ok(value),
            TypedValue::Numeric(value) => Ok(!value.is_zero() && !value.is_nan()),
            TypedValue::String {
                value,
                language: None,
            } => Ok(!value.is_empty()),
            _ => ThinError::expected(),
        }
    }

    fn binary(&self, op: BinaryOp, lhs: &Term, rhs: &Term) -> ThinResult<Term> {
        let result = match op {
            BinaryOp::Equal => Literal::from(self.equal(lhs, rhs)?),
            BinaryOp::SameTerm => Literal::from(lhs.same(rhs)),
            BinaryOp::Greater => Literal::from(self.compare_values(lhs, rhs)?.is_gt()),
            BinaryOp::GreaterOrEqual => Literal::from(self.compare_values(lhs, rhs)?.is_ge()),
            BinaryOp::Less => Literal::from(self.compare_values(lhs, rhs)?.is_lt()),
            BinaryOp::LessOrEqual => Literal::from(self.compare_values(lhs, rhs)?.is_le()),
            BinaryOp::Add | BinaryOp::Subtract | BinaryOp::Multiply | BinaryOp::Divide => {
                let lhs = TypedValue::from_term(lhs).as_numeric()?;
                let rhs = TypedValue::from_term(rhs).as_numeric()?;
                let result = match op {
                    BinaryOp::Add => lhs.checked_add(rhs),
                    BinaryOp::Subtract => lhs.checked_sub(rhs),
                    BinaryOp::Multiply => lhs.checked_mul(rhs),
                    _ => lhs.checked_div(rhs),
                }?;
                result.into_literal()
            }
        };
        Ok(result.into())
    }

    fn unary(&self, op: UnaryOp, value: &Term) -> ThinResult<Term> {
        let value = TypedValue::from_term(value).as_numeric()?;
        let result = match op {
            UnaryOp::Plus => value,
            UnaryOp::Minus => value.checked_neg()?,
        };
        Ok(result.into_literal().into())
    }

    fn function(&self, function: BuiltinFunction, args: &[Term]) -> ThinResult<Term> {
        builtin::evaluate(function, args)
    }

    fn aggregate(
        &self,
        function: &AggregateFunction,
        distinct: bool,
        values: &mut dyn Iterator<Item = Option<Term>>,
    ) -> ThinResult<Term> {
        aggregates::aggregate(self, function, distinct, values)
    }

    /// Blank nodes sort before IRIs, IRIs before literals and literals before internal objects.
    /// Literals that are not comparable are ordered by datatype and lexical form.
    fn compare(&self, lhs: &Term, rhs: &Term) -> Ordering {
        match (lhs, rhs) {
            (Term::BlankNode(lhs), Term::BlankNode(rhs)) => lhs.as_str().cmp(rhs.as_str()),
            (Term::NamedNode(lhs), Term::NamedNode(rhs)) => lhs.as_str().cmp(rhs.as_str()),
            (Term::Literal(lhs_literal), Term::Literal(rhs_literal)) => {
                self.compare_values(lhs, rhs).unwrap_or_else(|_| {
                    lhs_literal
                        .datatype()
                        .as_str()
                        .cmp(rhs_literal.datatype().as_str())
                        .then_with(|| lhs_literal.language().cmp(&rhs_literal.language()))
                        .then_with(|| lhs_literal.value().cmp(rhs_literal.value()))
                })
            }
            (Term::Object(lhs), Term::Object(rhs)) => lhs.label().cmp(rhs.label()),
            (lhs, rhs) => kind_rank(lhs).cmp(&kind_rank(rhs)),
        }
    }

    fn cast(&self, value: HostValue) -> Term {
        match value {
            HostValue::Boolean(value) => Literal::from(value).into(),
            HostValue::Integer(value) => Literal::from(value).into(),
            HostValue::Double(value) => Literal::from(value).into(),
            HostValue::String(value) => Literal::new_simple_literal(value).into(),
        }
    }
}

fn kind_rank(term: &Term) -> u8 {
    match term {
        Term::BlankNode(_) => 0,
        Term::NamedNode(_) => 1,
        Term::Literal(_) => 2,
        Term::Object(_) => 3,
    }
}
