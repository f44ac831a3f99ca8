use crate::error::QueryError;
use crate::sparql::rewriting::{ExpressionRewriter, GraphPatternRewriter};
use kgram_logical::{Expr, OrderKey, Query, SelectExpression};
use kgram_model::{Term, Variable};
use spargebra::algebra::{GraphPattern, OrderExpression, QueryDataset};

/// Lowers `SELECT` and `ASK` queries into a [Query].
///
/// The solution modifiers are peeled off the algebra tree from the outside in: slice,
/// distinct, projection, order, select expressions, `HAVING` and grouping. What remains is the
/// body of the query.
#[derive(Debug, Default, Clone, Copy)]
pub struct QueryRewriter;

/// The solution modifiers found on top of the body.
#[derive(Default)]
struct Modifiers {
    offset: usize,
    limit: Option<usize>,
    distinct: bool,
    projection: Option<Vec<Variable>>,
    order_by: Vec<OrderKey>,
    /// Outermost first.
    extends: Vec<SelectExpression>,
    having: Vec<Expr>,
    group_by: Vec<Expr>,
    aggregates: Vec<SelectExpression>,
}

impl QueryRewriter {
    pub fn new() -> Self {
        Self
    }

    pub fn rewrite(&self, query: &spargebra::Query) -> Result<Query, QueryError> {
        match query {
            spargebra::Query::Select {
                dataset, pattern, ..
            } => Self::rewrite_query(dataset.as_ref(), pattern, false),
            spargebra::Query::Ask {
                dataset, pattern, ..
            } => Self::rewrite_query(dataset.as_ref(), pattern, true),
            spargebra::Query::Construct { .. } => QueryError::not_implemented("CONSTRUCT"),
            spargebra::Query::Describe { .. } => QueryError::not_implemented("DESCRIBE"),
        }
    }

    fn rewrite_query(
        dataset: Option<&QueryDataset>,
        pattern: &GraphPattern,
        ask: bool,
    ) -> Result<Query, QueryError> {
        let patterns = GraphPatternRewriter::default();
        let mut modifiers = Modifiers::default();
        let body = peel(&patterns, pattern, &mut modifiers)?;
        let body = patterns.rewrite(body)?;

        let mut builder = Query::builder(body)
            .distinct(modifiers.distinct)
            .offset(modifiers.offset)
            .limit(if ask { Some(1) } else { modifiers.limit });
        if ask {
            builder = builder.project(Vec::new());
        } else if let Some(projection) = modifiers.projection {
            builder = builder.project(projection);
        }
        if let Some(dataset) = dataset {
            builder = builder
                .from(dataset.default.iter().cloned().map(Term::from).collect())
                .from_named(
                    dataset
                        .named
                        .iter()
                        .flatten()
                        .cloned()
                        .map(Term::from)
                        .collect(),
                );
        }

        // Aggregates first, the select expressions may refer to them.
        let selects = modifiers
            .aggregates
            .into_iter()
            .chain(modifiers.extends.into_iter().rev());
        for select in selects {
            builder = builder.select_expression(select.variable, select.expr);
        }
        for expr in modifiers.group_by {
            builder = builder.group_by(expr);
        }
        for expr in modifiers.having {
            builder = builder.having(expr);
        }
        for key in modifiers.order_by {
            builder = builder.order_by(key);
        }
        // Sub-patterns of EXISTS, in the order of their ids.
        for pattern in patterns.take_registered() {
            builder.register_pattern(pattern);
        }
        Ok(builder.build())
    }
}

/// Collects the solution modifiers and returns the body.
fn peel<'p>(
    patterns: &GraphPatternRewriter,
    mut pattern: &'p GraphPattern,
    modifiers: &mut Modifiers,
) -> Result<&'p GraphPattern, QueryError> {
    if let GraphPattern::Slice {
        inner,
        start,
        length,
    } = pattern
    {
        modifiers.offset = *start;
        modifiers.limit = *length;
        pattern = inner;
    }
    if let GraphPattern::Distinct { inner } | GraphPattern::Reduced { inner } = pattern {
        modifiers.distinct = matches!(pattern, GraphPattern::Distinct { .. });
        pattern = inner;
    }
    if let GraphPattern::Project { inner, variables } = pattern {
        modifiers.projection = Some(variables.clone());
        pattern = inner;
    }
    if let GraphPattern::OrderBy { inner, expression } = pattern {
        for key in expression {
            modifiers.order_by.push(match key {
                OrderExpression::Asc(expr) => {
                    OrderKey::ascending(rewrite_expression(patterns, expr)?)
                }
                OrderExpression::Desc(expr) => {
                    OrderKey::descending(rewrite_expression(patterns, expr)?)
                }
            });
        }
        pattern = inner;
    }
    while let GraphPattern::Extend {
        inner,
        variable,
        expression,
    } = pattern
    {
        let projected = modifiers
            .projection
            .as_ref()
            .is_some_and(|projection| projection.contains(variable));
        if !projected {
            break;
        }
        modifiers.extends.push(SelectExpression {
            variable: variable.clone(),
            expr: rewrite_expression(patterns, expression)?,
        });
        pattern = inner;
    }
    if let GraphPattern::Filter { expr, inner } = pattern {
        if matches!(inner.as_ref(), GraphPattern::Group { .. }) {
            modifiers.having.push(rewrite_expression(patterns, expr)?);
            pattern = inner;
        }
    }
    if let GraphPattern::Group {
        inner,
        variables,
        aggregates,
    } = pattern
    {
        modifiers.group_by = variables.iter().map(Expr::variable).collect();
        for (variable, aggregate) in aggregates {
            modifiers.aggregates.push(SelectExpression {
                variable: variable.clone(),
                expr: ExpressionRewriter::new(patterns).rewrite_aggregate(aggregate)?,
            });
        }
        pattern = inner;
    }
    Ok(pattern)
}

fn rewrite_expression(
    patterns: &GraphPatternRewriter,
    expression: &spargebra::algebra::Expression,
) -> Result<Expr, QueryError> {
    ExpressionRewriter::new(patterns).rewrite(expression)
}
