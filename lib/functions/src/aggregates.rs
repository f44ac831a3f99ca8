//! The set functions of [SPARQL 1.1](https://www.w3.org/TR/sparql11-query/#setFunctions).

use crate::builtin::lexical_form;
use crate::value::TypedValue;
use crate::{Numeric, SparqlValueProxy, ValueProxy};
use itertools::Itertools;
use kgram_logical::AggregateFunction;
use kgram_model::{Literal, Term, ThinError, ThinResult};
use oxsdatatypes::Integer;

/// Accumulates the bound values of a group. Unbound values are skipped.
pub(crate) fn aggregate(
    proxy: &SparqlValueProxy,
    function: &AggregateFunction,
    distinct: bool,
    values: &mut dyn Iterator<Item = Option<Term>>,
) -> ThinResult<Term> {
    let values: Vec<Term> = if distinct {
        let mut seen: Vec<Term> = Vec::new();
        for value in values.flatten() {
            if !seen.iter().any(|term| term.same(&value)) {
                seen.push(value);
            }
        }
        seen
    } else {
        values.flatten().collect()
    };

    match function {
        AggregateFunction::Count => Ok(Literal::from(i64::try_from(values.len())?).into()),
        AggregateFunction::Sum => Ok(sum(&values)?.into_literal().into()),
        AggregateFunction::Avg => {
            if values.is_empty() {
                return Ok(Literal::from(0).into());
            }
            let count = Numeric::Integer(Integer::from(i64::try_from(values.len())?));
            Ok(sum(&values)?.checked_div(count)?.into_literal().into())
        }
        AggregateFunction::Min => values
            .into_iter()
            .min_by(|lhs, rhs| proxy.compare(lhs, rhs))
            .ok_or(ThinError::default()),
        AggregateFunction::Max => values
            .into_iter()
            .max_by(|lhs, rhs| proxy.compare(lhs, rhs))
            .ok_or(ThinError::default()),
        AggregateFunction::Sample => values.into_iter().next().ok_or(ThinError::default()),
        AggregateFunction::GroupConcat { separator } => {
            let parts = values
                .iter()
                .map(lexical_form)
                .collect::<ThinResult<Vec<_>>>()?;
            Ok(Literal::new_simple_literal(parts.iter().join(separator)).into())
        }
        AggregateFunction::And => {
            let mut result = true;
            for value in &values {
                result &= proxy.effective_boolean_value(value)?;
            }
            Ok(Literal::from(result).into())
        }
    }
}

fn sum(values: &[Term]) -> ThinResult<Numeric> {
    values
        .iter()
        .try_fold(Numeric::Integer(Integer::from(0)), |sum, value| {
            sum.checked_add(TypedValue::from_term(value).as_numeric()?)
        })
}
