//! Finalizes the raw solutions of a query.

use crate::environment::MappingEnvironment;
use crate::error::QueryError;
use crate::interpreter::Interpreter;
use crate::mapping::{Mapping, Mappings};
use crate::producer::Producer;
use kgram_logical::{key_variable, Expr, Query};
use kgram_model::Node;

/// Completes the raw solutions of a query with the SPARQL solution modifiers that operate on
/// individual solutions.
///
/// Completing a sequence resolves the select expressions, removes duplicates of distinct
/// queries and computes the keys used by `ORDER BY` and `GROUP BY`.
#[derive(Debug, Clone, Copy)]
pub struct CompleteSparql<'a> {
    query: &'a Query,
    interpreter: &'a Interpreter,
}

impl<'a> CompleteSparql<'a> {
    pub fn new(query: &'a Query, interpreter: &'a Interpreter) -> Self {
        Self { query, interpreter }
    }

    pub fn query(&self) -> &'a Query {
        self.query
    }

    pub fn interpreter(&self) -> &'a Interpreter {
        self.interpreter
    }

    /// Completes `mappings` in place.
    ///
    /// Aggregate select expressions are left for the grouping. Distinct aggregate queries are
    /// deduplicated after the grouping as well.
    pub fn complete(&self, producer: &Producer, mappings: &mut Mappings) -> Result<(), QueryError> {
        if !self.query.select_expressions().is_empty() {
            for mapping in mappings.take() {
                if let Some(mapping) = self.select(mapping, None, producer)? {
                    mappings.add(mapping);
                }
            }
        }

        if self.query.is_distinct() && !self.query.is_aggregate() {
            mappings.resubmit();
        }

        for mapping in mappings.iter_mut() {
            self.keys(mapping, None, producer)?;
        }
        Ok(())
    }

    /// Binds the variables of the select expressions in declaration order.
    ///
    /// Without a group, aggregate expressions are skipped. Returns `None` if a variable is
    /// already bound to a different value.
    pub fn select(
        &self,
        mut mapping: Mapping,
        group: Option<&[Mapping]>,
        producer: &Producer,
    ) -> Result<Option<Mapping>, QueryError> {
        for select in self.query.select_expressions() {
            if group.is_none() && select.is_aggregate() {
                continue;
            }
            let slot = self
                .query
                .slot(&select.variable)
                .ok_or_else(|| QueryError::UnknownVariable(select.variable.clone()))?;

            let Some(value) = self.evaluate(&select.expr, &mapping, group, producer)? else {
                continue;
            };
            match mapping.get(slot) {
                None => mapping.set(slot, Some(value)),
                Some(current) if *current == value => {}
                Some(current) => {
                    tracing::warn!(
                        "Rejecting a solution: {} is bound to {current} and computed as {value}",
                        select.variable
                    );
                    return Ok(None);
                }
            }
        }
        Ok(Some(mapping))
    }

    /// Computes the `ORDER BY` and `GROUP BY` keys of a mapping.
    ///
    /// A key that is a bound variable takes its value. Otherwise the key expression is
    /// evaluated, unless it is an aggregate and there is no group.
    pub fn keys(
        &self,
        mapping: &mut Mapping,
        group: Option<&[Mapping]>,
        producer: &Producer,
    ) -> Result<(), QueryError> {
        let mut order_by = Vec::with_capacity(self.query.order_by().len());
        for key in self.query.order_by() {
            order_by.push(self.key(&key.expr, mapping, group, producer)?);
        }
        let mut group_by = Vec::with_capacity(self.query.group_by().len());
        for expr in self.query.group_by() {
            group_by.push(self.key(expr, mapping, group, producer)?);
        }
        mapping.set_order_by(order_by);
        mapping.set_group_by(group_by);
        Ok(())
    }

    fn key(
        &self,
        expr: &Expr,
        mapping: &Mapping,
        group: Option<&[Mapping]>,
        producer: &Producer,
    ) -> Result<Option<Node>, QueryError> {
        let bound = key_variable(expr)
            .and_then(|variable| self.query.slot(variable))
            .and_then(|slot| mapping.get(slot));
        if let Some(bound) = bound {
            return Ok(Some(bound.clone()));
        }
        if group.is_none() && expr.is_aggregate() {
            return Ok(None);
        }
        self.evaluate(expr, mapping, group, producer)
    }

    fn evaluate(
        &self,
        expr: &Expr,
        mapping: &Mapping,
        group: Option<&[Mapping]>,
        producer: &Producer,
    ) -> Result<Option<Node>, QueryError> {
        let mut env = match group {
            Some(group) => MappingEnvironment::grouped(self.query, mapping, group),
            None => MappingEnvironment::new(self.query, mapping),
        };
        Ok(self
            .interpreter
            .evaluate(expr, &mut env, producer)?
            .map(|value| producer.node(&value)))
    }
}
