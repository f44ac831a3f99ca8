use crate::error::QueryError;
use crate::sparql::rewriting::GraphPatternRewriter;
use kgram_logical::{
    Aggregate, AggregateFunction, BinaryOp, BuiltinFunction, Expr, Function, UnaryOp,
};
use kgram_model::vocab::kg;
use spargebra::algebra;
use spargebra::algebra::{AggregateExpression, Expression};

pub(super) struct ExpressionRewriter<'rewriter> {
    graph_rewriter: &'rewriter GraphPatternRewriter,
}

impl<'rewriter> ExpressionRewriter<'rewriter> {
    pub fn new(graph_rewriter: &'rewriter GraphPatternRewriter) -> Self {
        Self { graph_rewriter }
    }

    /// Rewrites an [Expression].
    pub fn rewrite(&self, expression: &Expression) -> Result<Expr, QueryError> {
        Ok(match expression {
            Expression::NamedNode(node) => Expr::constant(node.clone()),
            Expression::Literal(literal) => Expr::constant(literal.clone()),
            Expression::Variable(variable) => Expr::variable(variable),
            Expression::Or(..) => {
                let mut args = Vec::new();
                self.flatten(expression, &mut args, |e| match e {
                    Expression::Or(lhs, rhs) => Some((lhs.as_ref(), rhs.as_ref())),
                    _ => None,
                })?;
                Expr::Or(args)
            }
            Expression::And(..) => {
                let mut args = Vec::new();
                self.flatten(expression, &mut args, |e| match e {
                    Expression::And(lhs, rhs) => Some((lhs.as_ref(), rhs.as_ref())),
                    _ => None,
                })?;
                Expr::And(args)
            }
            Expression::Equal(lhs, rhs) => self.binary(BinaryOp::Equal, lhs, rhs)?,
            Expression::SameTerm(lhs, rhs) => self.binary(BinaryOp::SameTerm, lhs, rhs)?,
            Expression::Greater(lhs, rhs) => self.binary(BinaryOp::Greater, lhs, rhs)?,
            Expression::GreaterOrEqual(lhs, rhs) => {
                self.binary(BinaryOp::GreaterOrEqual, lhs, rhs)?
            }
            Expression::Less(lhs, rhs) => self.binary(BinaryOp::Less, lhs, rhs)?,
            Expression::LessOrEqual(lhs, rhs) => self.binary(BinaryOp::LessOrEqual, lhs, rhs)?,
            Expression::Add(lhs, rhs) => self.binary(BinaryOp::Add, lhs, rhs)?,
            Expression::Subtract(lhs, rhs) => self.binary(BinaryOp::Subtract, lhs, rhs)?,
            Expression::Multiply(lhs, rhs) => self.binary(BinaryOp::Multiply, lhs, rhs)?,
            Expression::Divide(lhs, rhs) => self.binary(BinaryOp::Divide, lhs, rhs)?,
            Expression::UnaryPlus(inner) => Expr::Unary(UnaryOp::Plus, self.boxed(inner)?),
            Expression::UnaryMinus(inner) => Expr::Unary(UnaryOp::Minus, self.boxed(inner)?),
            Expression::Not(inner) => Expr::Not(self.boxed(inner)?),
            Expression::In(lhs, list) => Expr::In(self.boxed(lhs)?, self.rewrite_all(list)?),
            Expression::Exists(pattern) => Expr::Exists(self.graph_rewriter.register(pattern)?),
            Expression::Bound(variable) => Expr::Bound(variable.clone()),
            Expression::If(condition, then, otherwise) => Expr::If(
                self.boxed(condition)?,
                self.boxed(then)?,
                Some(self.boxed(otherwise)?),
            ),
            Expression::Coalesce(args) => Expr::Coalesce(self.rewrite_all(args)?),
            Expression::FunctionCall(function, args) => self.rewrite_function_call(function, args)?,
        })
    }

    /// Rewrites an [AggregateExpression].
    pub fn rewrite_aggregate(&self, expression: &AggregateExpression) -> Result<Expr, QueryError> {
        let aggregate = match expression {
            AggregateExpression::CountSolutions { distinct } => Aggregate {
                function: AggregateFunction::Count,
                argument: None,
                distinct: *distinct,
            },
            AggregateExpression::FunctionCall {
                name,
                expr,
                distinct,
            } => {
                let function = match name {
                    algebra::AggregateFunction::Count => AggregateFunction::Count,
                    algebra::AggregateFunction::Sum => AggregateFunction::Sum,
                    algebra::AggregateFunction::Avg => AggregateFunction::Avg,
                    algebra::AggregateFunction::Min => AggregateFunction::Min,
                    algebra::AggregateFunction::Max => AggregateFunction::Max,
                    algebra::AggregateFunction::Sample => AggregateFunction::Sample,
                    algebra::AggregateFunction::GroupConcat { separator } => {
                        AggregateFunction::GroupConcat {
                            separator: separator.clone().unwrap_or_else(|| " ".to_owned()),
                        }
                    }
                    algebra::AggregateFunction::Custom(name) => {
                        return QueryError::not_implemented(format!("custom aggregate {name}"))
                    }
                };
                Aggregate {
                    function,
                    argument: Some(self.boxed(expr)?),
                    distinct: *distinct,
                }
            }
        };
        Ok(Expr::Aggregate(aggregate))
    }

    fn rewrite_function_call(
        &self,
        function: &algebra::Function,
        args: &[Expression],
    ) -> Result<Expr, QueryError> {
        let builtin = match function {
            algebra::Function::Custom(name) if name.as_ref() == kg::SYSTEM => {
                let target = match args {
                    [] => None,
                    [Expression::NamedNode(target)] => Some(target.clone().into()),
                    _ => return QueryError::not_implemented("kg:system with arguments"),
                };
                return Ok(Expr::System(target));
            }
            algebra::Function::Custom(name) => {
                return Ok(Expr::call(
                    Function::Extension(name.clone()),
                    self.rewrite_all(args)?,
                ));
            }
            algebra::Function::Str => BuiltinFunction::Str,
            algebra::Function::Lang => BuiltinFunction::Lang,
            algebra::Function::LangMatches => BuiltinFunction::LangMatches,
            algebra::Function::Datatype => BuiltinFunction::Datatype,
            algebra::Function::Iri => BuiltinFunction::Iri,
            algebra::Function::StrLen => BuiltinFunction::StrLen,
            algebra::Function::SubStr => BuiltinFunction::SubStr,
            algebra::Function::UCase => BuiltinFunction::UCase,
            algebra::Function::LCase => BuiltinFunction::LCase,
            algebra::Function::StrStarts => BuiltinFunction::StrStarts,
            algebra::Function::StrEnds => BuiltinFunction::StrEnds,
            algebra::Function::Contains => BuiltinFunction::Contains,
            algebra::Function::Concat => BuiltinFunction::Concat,
            algebra::Function::Regex => BuiltinFunction::Regex,
            algebra::Function::Abs => BuiltinFunction::Abs,
            algebra::Function::Ceil => BuiltinFunction::Ceil,
            algebra::Function::Floor => BuiltinFunction::Floor,
            algebra::Function::Round => BuiltinFunction::Round,
            algebra::Function::IsIri => BuiltinFunction::IsIri,
            algebra::Function::IsBlank => BuiltinFunction::IsBlank,
            algebra::Function::IsLiteral => BuiltinFunction::IsLiteral,
            algebra::Function::IsNumeric => BuiltinFunction::IsNumeric,
            algebra::Function::StrDt => BuiltinFunction::StrDt,
            algebra::Function::StrLang => BuiltinFunction::StrLang,
            unsupported => return QueryError::not_implemented(format!("function {unsupported}")),
        };
        Ok(Expr::call(Function::Builtin(builtin), self.rewrite_all(args)?))
    }

    fn binary(
        &self,
        op: BinaryOp,
        lhs: &Expression,
        rhs: &Expression,
    ) -> Result<Expr, QueryError> {
        Ok(Expr::binary(op, self.rewrite(lhs)?, self.rewrite(rhs)?))
    }

    fn boxed(&self, expression: &Expression) -> Result<Box<Expr>, QueryError> {
        self.rewrite(expression).map(Box::new)
    }

    fn rewrite_all(&self, expressions: &[Expression]) -> Result<Vec<Expr>, QueryError> {
        expressions.iter().map(|e| self.rewrite(e)).collect()
    }

    /// Collects the operands of nested binary `&&` or `||` expressions.
    fn flatten<'e>(
        &self,
        expression: &'e Expression,
        args: &mut Vec<Expr>,
        split: impl Fn(&'e Expression) -> Option<(&'e Expression, &'e Expression)> + Copy,
    ) -> Result<(), QueryError> {
        match split(expression) {
            Some((lhs, rhs)) => {
                self.flatten(lhs, args, split)?;
                self.flatten(rhs, args, split)
            }
            None => {
                args.push(self.rewrite(expression)?);
                Ok(())
            }
        }
    }
}
