use crate::error::QueryError;
use crate::sparql::rewriting::ExpressionRewriter;
use kgram_logical::{
    EdgePattern, Expr, GraphPattern, PathExpr, PathPattern, PatternId, PatternNode,
};
use kgram_model::{Term, Variable};
use spargebra::algebra;
use spargebra::algebra::PropertyPathExpression;
use spargebra::term::{GroundTerm, NamedNodePattern, TermPattern};
use std::cell::RefCell;

/// Lowers the body of a query.
///
/// The patterns of `EXISTS` expressions are lowered as well and collected until they are moved
/// into the query.
#[derive(Debug, Default)]
pub(super) struct GraphPatternRewriter {
    registered: RefCell<Vec<GraphPattern>>,
}

impl GraphPatternRewriter {
    pub fn rewrite(&self, pattern: &algebra::GraphPattern) -> Result<GraphPattern, QueryError> {
        match pattern {
            algebra::GraphPattern::Bgp { patterns } => Ok(GraphPattern::And(
                patterns
                    .iter()
                    .map(|triple| {
                        GraphPattern::Edge(EdgePattern::new(
                            rewrite_term_pattern(&triple.subject),
                            rewrite_named_node_pattern(&triple.predicate),
                            rewrite_term_pattern(&triple.object),
                        ))
                    })
                    .collect(),
            )),
            algebra::GraphPattern::Path {
                subject,
                path,
                object,
            } => Ok(GraphPattern::Path(PathPattern {
                subject: rewrite_term_pattern(subject),
                path: rewrite_path(path),
                object: rewrite_term_pattern(object),
            })),
            algebra::GraphPattern::Join { left, right } => {
                Ok(sequence(self.rewrite(left)?, self.rewrite(right)?))
            }
            algebra::GraphPattern::LeftJoin {
                left,
                right,
                expression,
            } => Ok(GraphPattern::Optional {
                left: Box::new(self.rewrite(left)?),
                right: Box::new(self.rewrite(right)?),
                filter: expression
                    .as_ref()
                    .map(|expr| self.rewrite_expression(expr))
                    .transpose()?,
            }),
            algebra::GraphPattern::Filter { expr, inner } => {
                let filter = GraphPattern::Filter(self.rewrite_expression(expr)?);
                Ok(sequence(self.rewrite(inner)?, filter))
            }
            algebra::GraphPattern::Union { left, right } => Ok(GraphPattern::Union(
                Box::new(self.rewrite(left)?),
                Box::new(self.rewrite(right)?),
            )),
            algebra::GraphPattern::Minus { left, right } => Ok(GraphPattern::Minus(
                Box::new(self.rewrite(left)?),
                Box::new(self.rewrite(right)?),
            )),
            algebra::GraphPattern::Graph { name, inner } => Ok(GraphPattern::Graph {
                name: rewrite_named_node_pattern(name),
                inner: Box::new(self.rewrite(inner)?),
            }),
            algebra::GraphPattern::Extend {
                inner,
                variable,
                expression,
            } => {
                let bind = GraphPattern::Bind {
                    variable: variable.clone(),
                    expr: self.rewrite_expression(expression)?,
                };
                Ok(sequence(self.rewrite(inner)?, bind))
            }
            algebra::GraphPattern::Values {
                variables,
                bindings,
            } => Ok(GraphPattern::Values {
                variables: variables.clone(),
                rows: bindings
                    .iter()
                    .map(|row| {
                        row.iter()
                            .map(|value| value.as_ref().map(ground_term))
                            .collect()
                    })
                    .collect(),
            }),
            algebra::GraphPattern::Service { .. } => QueryError::not_implemented("SERVICE"),
            algebra::GraphPattern::OrderBy { .. }
            | algebra::GraphPattern::Project { .. }
            | algebra::GraphPattern::Distinct { .. }
            | algebra::GraphPattern::Reduced { .. }
            | algebra::GraphPattern::Slice { .. }
            | algebra::GraphPattern::Group { .. } => {
                QueryError::not_implemented(format!("sub-query: {pattern}"))
            }
        }
    }

    /// Lowers the pattern of an `EXISTS` and returns its id.
    pub fn register(&self, pattern: &algebra::GraphPattern) -> Result<PatternId, QueryError> {
        let pattern = self.rewrite(pattern)?;
        let mut registered = self.registered.borrow_mut();
        registered.push(pattern);
        Ok(PatternId::new(registered.len() - 1))
    }

    /// Removes the registered patterns.
    pub fn take_registered(&self) -> Vec<GraphPattern> {
        self.registered.take()
    }

    fn rewrite_expression(
        &self,
        expression: &algebra::Expression,
    ) -> Result<Expr, QueryError> {
        ExpressionRewriter::new(self).rewrite(expression)
    }
}

/// Joins two patterns into a flat sequence.
fn sequence(lhs: GraphPattern, rhs: GraphPattern) -> GraphPattern {
    let mut items = match lhs {
        GraphPattern::And(items) => items,
        other => vec![other],
    };
    match rhs {
        GraphPattern::And(rhs) => items.extend(rhs),
        other => items.push(other),
    }
    GraphPattern::And(items)
}

fn rewrite_term_pattern(pattern: &TermPattern) -> PatternNode {
    match pattern {
        TermPattern::NamedNode(node) => PatternNode::Constant(node.clone().into()),
        TermPattern::Literal(literal) => PatternNode::Constant(literal.clone().into()),
        // Blank nodes of a query are variables that are never projected.
        TermPattern::BlankNode(node) => {
            PatternNode::Variable(Variable::new_unchecked(format!("_{}", node.as_str())))
        }
        TermPattern::Variable(variable) => PatternNode::Variable(variable.clone()),
    }
}

fn rewrite_named_node_pattern(pattern: &NamedNodePattern) -> PatternNode {
    match pattern {
        NamedNodePattern::NamedNode(node) => PatternNode::Constant(node.clone().into()),
        NamedNodePattern::Variable(variable) => PatternNode::Variable(variable.clone()),
    }
}

fn ground_term(term: &GroundTerm) -> Term {
    match term {
        GroundTerm::NamedNode(node) => node.clone().into(),
        GroundTerm::Literal(literal) => literal.clone().into(),
    }
}

fn rewrite_path(path: &PropertyPathExpression) -> PathExpr {
    match path {
        PropertyPathExpression::NamedNode(node) => PathExpr::Predicate(node.clone()),
        PropertyPathExpression::Reverse(inner) => PathExpr::Reverse(Box::new(rewrite_path(inner))),
        PropertyPathExpression::Sequence(lhs, rhs) => {
            PathExpr::Sequence(Box::new(rewrite_path(lhs)), Box::new(rewrite_path(rhs)))
        }
        PropertyPathExpression::Alternative(lhs, rhs) => {
            PathExpr::Alternative(Box::new(rewrite_path(lhs)), Box::new(rewrite_path(rhs)))
        }
        PropertyPathExpression::ZeroOrMore(inner) => {
            PathExpr::ZeroOrMore(Box::new(rewrite_path(inner)))
        }
        PropertyPathExpression::OneOrMore(inner) => {
            PathExpr::OneOrMore(Box::new(rewrite_path(inner)))
        }
        PropertyPathExpression::ZeroOrOne(inner) => {
            PathExpr::ZeroOrOne(Box::new(rewrite_path(inner)))
        }
        PropertyPathExpression::NegatedPropertySet(excluded) => PathExpr::Negated(excluded.clone()),
    }
}
