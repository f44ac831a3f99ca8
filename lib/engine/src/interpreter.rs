//! Evaluates expressions with the three-valued logic of SPARQL.

use crate::environment::{Environment, LocalScope, MappingEnvironment};
use crate::error::QueryError;
use crate::mapping::{Mapping, Mappings};
use crate::producer::Producer;
use kgram_functions::{ExtensionProvider, ExtensionRegistryRef, ValueProxyRef};
use kgram_logical::{
    Aggregate, BinaryOp, Expr, Function, FunctionCall, GraphPattern, PatternId,
    PatternNode, Query,
};
use kgram_model::vocab::kg;
use kgram_model::{InternalObject, Literal, Node, Term, Variable};
use rustc_hash::FxHashSet;
use std::fmt::Debug;
use std::sync::Arc;

/// The result of an expression. `None` is the error value of the three-valued logic.
pub type EvaluationResult = Result<Option<Term>, QueryError>;

/// Everything a [SubEvaluator] needs to evaluate the pattern of an `EXISTS`.
#[derive(Debug)]
pub struct SubEvaluation<'a> {
    pub interpreter: &'a Interpreter,
    pub producer: &'a Producer,
    pub query: &'a Query,
    pub pattern: &'a GraphPattern,
    /// The bindings of the solution that is tested.
    pub memory: Mapping,
    pub locals: Vec<(Variable, Node)>,
    pub graph_node: Option<PatternNode>,
    pub limit: Option<usize>,
}

/// Evaluates the graph pattern of an `EXISTS` expression.
pub trait SubEvaluator: Debug {
    fn evaluate(&self, evaluation: SubEvaluation<'_>) -> Result<Mappings, QueryError>;
}

/// Observes the outcome of `EXISTS` evaluations.
pub trait ExistsListener: Debug {
    fn exists(&self, pattern: PatternId, exists: bool);
}

/// A snapshot of bindings returned by `kg:system`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bindings(pub Vec<(Variable, Node)>);

/// A recursive evaluator of [Expr]s.
///
/// Operations on values are delegated to the value proxy. Extension functions are resolved in
/// three tiers: the definition cached on the call, the functions defined by the query and the
/// extension registry.
#[derive(Debug, Clone)]
pub struct Interpreter {
    proxy: ValueProxyRef,
    registry: ExtensionRegistryRef,
    sub_evaluator: Option<Arc<dyn SubEvaluator>>,
    listener: Option<Arc<dyn ExistsListener>>,
}

impl Interpreter {
    pub fn new(proxy: ValueProxyRef, registry: ExtensionRegistryRef) -> Self {
        Self {
            proxy,
            registry,
            sub_evaluator: None,
            listener: None,
        }
    }

    #[must_use]
    pub fn with_sub_evaluator(mut self, sub_evaluator: Arc<dyn SubEvaluator>) -> Self {
        self.sub_evaluator = Some(sub_evaluator);
        self
    }

    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn ExistsListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn proxy(&self) -> &ValueProxyRef {
        &self.proxy
    }

    /// Evaluates `expr` and returns whether its effective boolean value is true.
    pub fn test(
        &self,
        expr: &Expr,
        env: &mut dyn Environment,
        producer: &Producer,
    ) -> Result<bool, QueryError> {
        Ok(self
            .effective_boolean_value(expr, env, producer)?
            .unwrap_or(false))
    }

    /// Evaluates `expr`.
    ///
    /// Returns `Ok(None)` if the expression has no value, e.g., because of a type error. Only
    /// structural problems of the query are reported as errors.
    pub fn evaluate(
        &self,
        expr: &Expr,
        env: &mut dyn Environment,
        producer: &Producer,
    ) -> EvaluationResult {
        match expr {
            Expr::Constant(term) => Ok(Some(term.clone())),
            Expr::Variable(variable) => Ok(env.get(variable).map(|node| node.term().clone())),
            // Stops at the first operand that is false or has no value.
            Expr::And(args) => {
                for arg in args {
                    match self.effective_boolean_value(arg, env, producer)? {
                        Some(true) => {}
                        Some(false) => return Ok(Some(boolean(false))),
                        None => return Ok(None),
                    }
                }
                Ok(Some(boolean(true)))
            }
            Expr::Or(args) => {
                let mut error = false;
                for arg in args {
                    match self.effective_boolean_value(arg, env, producer)? {
                        Some(true) => return Ok(Some(boolean(true))),
                        Some(false) => {}
                        None => error = true,
                    }
                }
                Ok((!error).then(|| boolean(false)))
            }
            Expr::Not(inner) => Ok(self
                .effective_boolean_value(inner, env, producer)?
                .map(|value| boolean(!value))),
            Expr::Binary(op, lhs, rhs) => {
                let Some(lhs) = self.evaluate(lhs, env, producer)? else {
                    return Ok(None);
                };
                let Some(rhs) = self.evaluate(rhs, env, producer)? else {
                    return Ok(None);
                };
                Ok(self.proxy.binary(*op, &lhs, &rhs).ok())
            }
            Expr::Unary(op, inner) => {
                let Some(value) = self.evaluate(inner, env, producer)? else {
                    return Ok(None);
                };
                Ok(self.proxy.unary(*op, &value).ok())
            }
            Expr::In(lhs, list) => self.evaluate_in(lhs, list, env, producer),
            Expr::Bound(variable) => Ok(Some(boolean(env.get(variable).is_some()))),
            Expr::Coalesce(args) => {
                for arg in args {
                    if let Some(value) = self.evaluate(arg, env, producer)? {
                        return Ok(Some(value));
                    }
                }
                Ok(None)
            }
            Expr::If(condition, then, otherwise) => {
                match self.effective_boolean_value(condition, env, producer)? {
                    Some(true) => self.evaluate(then, env, producer),
                    Some(false) => match otherwise {
                        Some(otherwise) => self.evaluate(otherwise, env, producer),
                        None => Ok(None),
                    },
                    None => Ok(None),
                }
            }
            Expr::Let(variable, value, body) => {
                let Some(value) = self.evaluate(value, env, producer)? else {
                    return Ok(None);
                };
                let mut scope = LocalScope::new(env);
                scope.bind(variable, producer.node(&value));
                self.evaluate(body, &mut *scope, producer)
            }
            Expr::Exists(pattern) => self.evaluate_exists(*pattern, env, producer),
            Expr::Aggregate(aggregate) => self.evaluate_aggregate(aggregate, env, producer),
            Expr::Function(call) => self.evaluate_function(call, env, producer),
            Expr::System(target) => Ok(Some(system(target.as_ref(), env))),
        }
    }

    fn effective_boolean_value(
        &self,
        expr: &Expr,
        env: &mut dyn Environment,
        producer: &Producer,
    ) -> Result<Option<bool>, QueryError> {
        Ok(self
            .evaluate(expr, env, producer)?
            .and_then(|value| self.proxy.effective_boolean_value(&value).ok()))
    }

    /// `lhs IN (list)` is true on the first equal element. If no element is equal and some
    /// element could not be compared, there is no value.
    fn evaluate_in(
        &self,
        lhs: &Expr,
        list: &[Expr],
        env: &mut dyn Environment,
        producer: &Producer,
    ) -> EvaluationResult {
        let Some(lhs) = self.evaluate(lhs, env, producer)? else {
            return Ok(None);
        };
        let mut error = false;
        for element in list {
            let equal = self.evaluate(element, env, producer)?.and_then(|value| {
                self.proxy
                    .binary(BinaryOp::Equal, &lhs, &value)
                    .and_then(|result| self.proxy.effective_boolean_value(&result))
                    .ok()
            });
            match equal {
                Some(true) => return Ok(Some(boolean(true))),
                Some(false) => {}
                None => error = true,
            }
        }
        Ok((!error).then(|| boolean(false)))
    }

    fn evaluate_exists(
        &self,
        pattern: PatternId,
        env: &mut dyn Environment,
        producer: &Producer,
    ) -> EvaluationResult {
        let query = env.query();
        let graph_pattern = query
            .pattern(pattern)
            .ok_or(QueryError::UndeclaredPattern(pattern))?;
        let sub_evaluator = self
            .sub_evaluator
            .as_ref()
            .ok_or(QueryError::MissingSubEvaluator)?;

        let solutions = sub_evaluator.evaluate(SubEvaluation {
            interpreter: self,
            producer,
            query,
            pattern: graph_pattern,
            memory: env.to_mapping(),
            locals: env.locals().to_vec(),
            graph_node: env.graph_node().cloned(),
            limit: Some(1),
        })?;
        let exists = !solutions.is_empty();
        if let Some(listener) = &self.listener {
            listener.exists(pattern, exists);
        }
        Ok(Some(boolean(exists)))
    }

    /// Aggregates are only defined while a group is evaluated.
    fn evaluate_aggregate(
        &self,
        aggregate: &Aggregate,
        env: &mut dyn Environment,
        producer: &Producer,
    ) -> EvaluationResult {
        let Some(group) = env.group() else {
            return Ok(None);
        };
        let query = env.query();

        let (values, distinct) = match aggregate.argument.as_deref() {
            None => {
                let solutions = if aggregate.distinct {
                    group.iter().collect::<FxHashSet<_>>().len()
                } else {
                    group.len()
                };
                (vec![Some(boolean(true)); solutions], false)
            }
            Some(Expr::Variable(variable)) => {
                let slot = query.slot(variable);
                let values = group
                    .iter()
                    .map(|mapping| {
                        slot.and_then(|slot| mapping.get(slot))
                            .map(|node| node.term().clone())
                    })
                    .collect();
                (values, aggregate.distinct)
            }
            Some(argument) => {
                let mut values = Vec::with_capacity(group.len());
                for mapping in group {
                    let mut env = MappingEnvironment::new(query, mapping);
                    values.push(self.evaluate(argument, &mut env, producer)?);
                }
                (values, aggregate.distinct)
            }
        };

        Ok(self
            .proxy
            .aggregate(&aggregate.function, distinct, &mut values.into_iter())
            .ok())
    }

    fn evaluate_function(
        &self,
        call: &FunctionCall,
        env: &mut dyn Environment,
        producer: &Producer,
    ) -> EvaluationResult {
        let mut args = Vec::with_capacity(call.args().len());
        for arg in call.args() {
            match self.evaluate(arg, env, producer)? {
                Some(value) => args.push(value),
                None => return Ok(None),
            }
        }

        let name = match call.function() {
            Function::Builtin(function) => return Ok(self.proxy.function(*function, &args).ok()),
            Function::Extension(name) => name,
        };

        let definition = match call.cached_definition() {
            Some(definition) => Arc::clone(definition),
            None => {
                let resolved = env
                    .query()
                    .functions()
                    .definition(name, &args)
                    .or_else(|| self.registry.resolve(name, &args));
                let Some(resolved) = resolved else {
                    tracing::trace!("Unknown extension function {name}/{}", args.len());
                    return Ok(None);
                };
                Arc::clone(call.cache_definition(resolved))
            }
        };
        if definition.arity() != args.len() {
            return Ok(None);
        }

        let mut scope = LocalScope::new(env);
        for (parameter, value) in definition.parameters().iter().zip(&args) {
            scope.bind(parameter, producer.node(value));
        }
        self.evaluate(definition.body(), &mut *scope, producer)
    }
}

fn boolean(value: bool) -> Term {
    Literal::from(value).into()
}

/// `kg:memory` returns the query bindings, `kg:stack` the local bindings.
fn system(target: Option<&Term>, env: &dyn Environment) -> Term {
    let target = target.and_then(Term::as_named_node);
    if target.is_some_and(|target| target.as_ref() == kg::STACK) {
        return InternalObject::new("stack", Bindings(env.locals().to_vec())).into();
    }

    let mapping = env.to_mapping();
    let bindings = env
        .query()
        .variables()
        .iter()
        .enumerate()
        .filter_map(|(slot, variable)| Some((variable.clone(), mapping.get(slot)?.clone())))
        .collect();
    InternalObject::new("memory", Bindings(bindings)).into()
}
