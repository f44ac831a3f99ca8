//! A depth-first join engine over [GraphPattern]s.
//!
//! Patterns are evaluated in continuation-passing style: every solution of a pattern is handed
//! to a continuation while its bindings are in the [Memory]. Continuations return whether the
//! evaluation should go on, which allows stopping at a limit without materializing solutions.

mod group;
mod path;

use crate::complete::CompleteSparql;
use crate::environment::{Binding, Environment, Memory};
use crate::error::QueryError;
use crate::interpreter::{Interpreter, SubEvaluation, SubEvaluator};
use crate::mapping::{Mapping, Mappings};
use crate::producer::Producer;
use kgram_logical::{EdgePattern, GraphPattern, PatternNode, Query};
use kgram_model::{Entity, Node, Position, Term, Variable};
use std::cmp::Ordering;
use std::sync::Arc;

type Continuation<'k, 'q> = dyn FnMut(&mut Memory<'q>) -> Result<bool, QueryError> + 'k;

/// Evaluates a query and applies all solution modifiers.
pub fn evaluate_query(
    query: &Query,
    producer: &Producer,
    interpreter: &Interpreter,
) -> Result<Mappings, QueryError> {
    let mut mappings = Mappings::for_query(query);
    let mut memory = Memory::new(query);
    let limit = producer.options().limit;
    Eval::new(query, producer, interpreter).eval(query.body(), &mut memory, &mut |memory| {
        Ok(add_within_limit(&mut mappings, memory, limit))
    })?;
    tracing::debug!("Found {} raw solutions", mappings.len());

    let complete = CompleteSparql::new(query, interpreter);
    complete.complete(producer, &mut mappings)?;
    if query.is_aggregate() {
        group::group(&complete, producer, &mut mappings)?;
        tracing::debug!("Grouped into {} solutions", mappings.len());
    }
    if !query.order_by().is_empty() {
        sort(query, interpreter, &mut mappings);
    }
    mappings.slice(query.offset(), query.limit());
    Ok(mappings)
}

/// Sorts by the `ORDER BY` keys. Unbound keys come first.
fn sort(query: &Query, interpreter: &Interpreter, mappings: &mut Mappings) {
    let proxy = interpreter.proxy();
    mappings.sort_by(|lhs, rhs| {
        query
            .order_by()
            .iter()
            .zip(lhs.order_by().iter().zip(rhs.order_by()))
            .map(|(key, (lhs, rhs))| {
                let ordering = match (lhs, rhs) {
                    (None, None) => Ordering::Equal,
                    (None, Some(_)) => Ordering::Less,
                    (Some(_), None) => Ordering::Greater,
                    (Some(lhs), Some(rhs)) => proxy.compare(lhs.term(), rhs.term()),
                };
                if key.descending {
                    ordering.reverse()
                } else {
                    ordering
                }
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    });
}

/// Evaluates the graph patterns of `EXISTS` with the join engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct JoinSubEvaluator;

impl JoinSubEvaluator {
    pub fn new_ref() -> Arc<dyn SubEvaluator> {
        Arc::new(Self)
    }
}

/// Adds the solution of `memory` unless `limit` is reached. Returns whether to go on.
fn add_within_limit(mappings: &mut Mappings, memory: &Memory<'_>, limit: Option<usize>) -> bool {
    if limit.is_some_and(|limit| mappings.len() >= limit) {
        return false;
    }
    mappings.add(memory.to_mapping());
    limit.map_or(true, |limit| mappings.len() < limit)
}

impl SubEvaluator for JoinSubEvaluator {
    fn evaluate(&self, evaluation: SubEvaluation<'_>) -> Result<Mappings, QueryError> {
        let SubEvaluation {
            interpreter,
            producer,
            query,
            pattern,
            memory,
            locals,
            graph_node,
            limit,
        } = evaluation;

        let mut mappings = Mappings::new(query.variables().into(), Vec::new(), false);
        let mut memory = Memory::from_snapshot(query, &memory, locals, graph_node);
        Eval::new(query, producer, interpreter).eval(pattern, &mut memory, &mut |memory| {
            Ok(add_within_limit(&mut mappings, memory, limit))
        })?;
        Ok(mappings)
    }
}

/// The join engine of a single query.
#[derive(Debug, Clone, Copy)]
pub struct Eval<'q> {
    query: &'q Query,
    producer: &'q Producer,
    interpreter: &'q Interpreter,
}

impl<'q> Eval<'q> {
    pub fn new(query: &'q Query, producer: &'q Producer, interpreter: &'q Interpreter) -> Self {
        Self {
            query,
            producer,
            interpreter,
        }
    }

    /// Calls `next` for every solution of `pattern` that extends the bindings of `memory`.
    ///
    /// Returns `Ok(false)` if a continuation asked to stop.
    pub fn eval(
        &self,
        pattern: &GraphPattern,
        memory: &mut Memory<'q>,
        next: &mut Continuation<'_, 'q>,
    ) -> Result<bool, QueryError> {
        match pattern {
            GraphPattern::Edge(edge) => self.eval_edge(edge, memory, next),
            GraphPattern::Path(path) => self.eval_path(path, memory, next),
            GraphPattern::And(items) => self.eval_sequence(items, memory, next),
            GraphPattern::Optional {
                left,
                right,
                filter,
            } => self.eval(left, memory, &mut |memory| {
                let mut found = false;
                let go_on = self.eval(right, memory, &mut |memory| {
                    if let Some(filter) = filter {
                        if !self.interpreter.test(filter, memory, self.producer)? {
                            return Ok(true);
                        }
                    }
                    found = true;
                    next(memory)
                })?;
                match (go_on, found) {
                    (false, _) => Ok(false),
                    (true, true) => Ok(true),
                    (true, false) => next(memory),
                }
            }),
            GraphPattern::Union(lhs, rhs) => {
                Ok(self.eval(lhs, memory, next)? && self.eval(rhs, memory, next)?)
            }
            GraphPattern::Minus(lhs, rhs) => {
                let excluded = self.solutions(rhs, memory.graph_node().cloned())?;
                self.eval(lhs, memory, &mut |memory| {
                    let solution = memory.to_mapping();
                    let is_excluded = excluded.iter().any(|other| {
                        solution.shares_variable(other) && solution.is_compatible(other)
                    });
                    if is_excluded {
                        Ok(true)
                    } else {
                        next(memory)
                    }
                })
            }
            GraphPattern::Filter(expr) => {
                if self.interpreter.test(expr, memory, self.producer)? {
                    next(memory)
                } else {
                    Ok(true)
                }
            }
            GraphPattern::Bind { variable, expr } => {
                match self.interpreter.evaluate(expr, memory, self.producer)? {
                    Some(value) => {
                        let value = self.producer.node(&value);
                        self.with_binding(variable, &value, memory, next)
                    }
                    None => next(memory),
                }
            }
            GraphPattern::Graph { name, inner } => self.eval_graph(name, inner, memory, next),
            GraphPattern::Values { variables, rows } => {
                for row in rows {
                    let mut bound = Vec::new();
                    let mut compatible = true;
                    for (variable, value) in variables.iter().zip(row) {
                        let Some(value) = value else {
                            continue;
                        };
                        match memory.bind(variable, &self.producer.node(value))? {
                            Binding::New => bound.push(variable.clone()),
                            Binding::Existing => {}
                            Binding::Conflict => {
                                compatible = false;
                                break;
                            }
                        }
                    }
                    let go_on = !compatible || next(memory)?;
                    memory.unbind(&bound);
                    if !go_on {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }

    fn eval_sequence(
        &self,
        items: &[GraphPattern],
        memory: &mut Memory<'q>,
        next: &mut Continuation<'_, 'q>,
    ) -> Result<bool, QueryError> {
        match items {
            [] => next(memory),
            [item] => self.eval(item, memory, next),
            [item, rest @ ..] => self.eval(item, memory, &mut |memory| {
                self.eval_sequence(rest, memory, next)
            }),
        }
    }

    fn eval_edge(
        &self,
        edge: &EdgePattern,
        memory: &mut Memory<'q>,
        next: &mut Continuation<'_, 'q>,
    ) -> Result<bool, QueryError> {
        let graph_node = memory.graph_node().cloned();
        let from = self.from(graph_node.as_ref());
        let entities = self
            .producer
            .match_edge(edge, graph_node.as_ref(), from, &*memory);

        for entity in entities {
            let mut bound = Vec::new();
            let matches = self.bind_edge(edge, graph_node.as_ref(), &entity, memory, &mut bound)?;
            let go_on = !matches || next(memory)?;
            memory.unbind(&bound);
            if !go_on {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Binds the pattern to an entity. The producer only guarantees the nodes it used for the
    /// index lookup, hence every position is checked.
    fn bind_edge(
        &self,
        edge: &EdgePattern,
        graph_node: Option<&PatternNode>,
        entity: &Entity,
        memory: &mut Memory<'q>,
        bound: &mut Vec<Variable>,
    ) -> Result<bool, QueryError> {
        if let PatternNode::Variable(variable) = &edge.predicate {
            if !self.bind_node(variable, &entity.edge().predicate, memory, bound)? {
                return Ok(false);
            }
        }
        for (node, position) in [
            (Some(&edge.subject), Position::Subject),
            (Some(&edge.object), Position::Object),
            (graph_node, Position::Graph),
        ] {
            let Some(node) = node else {
                continue;
            };
            if !self.bind_position(node, entity, position, memory, bound)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn bind_position(
        &self,
        node: &PatternNode,
        entity: &Entity,
        position: Position,
        memory: &mut Memory<'q>,
        bound: &mut Vec<Variable>,
    ) -> Result<bool, QueryError> {
        let Some(actual) = entity.node(position) else {
            return Ok(false);
        };
        match node {
            PatternNode::Constant(term) => {
                Ok(self
                    .producer
                    .accepts(entity, position, &self.producer.node(term)))
            }
            PatternNode::Variable(variable) => match memory.get(variable).cloned() {
                Some(expected) => Ok(self.producer.accepts(entity, position, &expected)),
                None => self.bind_node(variable, actual, memory, bound),
            },
        }
    }

    fn bind_node(
        &self,
        variable: &Variable,
        value: &Node,
        memory: &mut Memory<'q>,
        bound: &mut Vec<Variable>,
    ) -> Result<bool, QueryError> {
        Ok(match memory.bind(variable, value)? {
            Binding::New => {
                bound.push(variable.clone());
                true
            }
            Binding::Existing => true,
            Binding::Conflict => false,
        })
    }

    fn with_binding(
        &self,
        variable: &Variable,
        value: &Node,
        memory: &mut Memory<'q>,
        next: &mut Continuation<'_, 'q>,
    ) -> Result<bool, QueryError> {
        match memory.bind(variable, value)? {
            Binding::New => {
                let go_on = next(memory);
                memory.unbind(std::slice::from_ref(variable));
                go_on
            }
            Binding::Existing => next(memory),
            Binding::Conflict => Ok(true),
        }
    }

    fn eval_graph(
        &self,
        name: &PatternNode,
        inner: &GraphPattern,
        memory: &mut Memory<'q>,
        next: &mut Continuation<'_, 'q>,
    ) -> Result<bool, QueryError> {
        let previous = memory.replace_graph_node(Some(name.clone()));
        let result = match name {
            // Edges bind the graph variable themselves, paths need a graph to walk in.
            PatternNode::Variable(variable)
                if memory.get(variable).is_none() && contains_path(inner) =>
            {
                let mut result = Ok(true);
                for graph in self.producer.named_graphs(self.query.from_named()) {
                    result = self.with_binding(variable, &graph, memory, &mut |memory| {
                        self.eval(inner, memory, next)
                    });
                    if !matches!(result, Ok(true)) {
                        break;
                    }
                }
                result
            }
            _ => self.eval(inner, memory, next),
        };
        memory.replace_graph_node(previous);
        result
    }

    /// Collects the solutions of `pattern` on its own.
    fn solutions(
        &self,
        pattern: &GraphPattern,
        graph_node: Option<PatternNode>,
    ) -> Result<Vec<Mapping>, QueryError> {
        let mut solutions = Vec::new();
        let mut memory = Memory::new(self.query);
        memory.replace_graph_node(graph_node);
        self.eval(pattern, &mut memory, &mut |memory| {
            solutions.push(memory.to_mapping());
            Ok(true)
        })?;
        Ok(solutions)
    }

    /// The dataset clause that applies inside or outside of a `GRAPH` clause.
    fn from(&self, graph_node: Option<&PatternNode>) -> &'q [Term] {
        match graph_node {
            Some(_) => self.query.from_named(),
            None => self.query.from(),
        }
    }
}

fn contains_path(pattern: &GraphPattern) -> bool {
    match pattern {
        GraphPattern::Path(_) => true,
        GraphPattern::Edge(_)
        | GraphPattern::Filter(_)
        | GraphPattern::Bind { .. }
        | GraphPattern::Values { .. } => false,
        GraphPattern::And(items) => items.iter().any(contains_path),
        GraphPattern::Optional { left, right, .. } => contains_path(left) || contains_path(right),
        GraphPattern::Union(lhs, rhs) | GraphPattern::Minus(lhs, rhs) => {
            contains_path(lhs) || contains_path(rhs)
        }
        GraphPattern::Graph { inner, .. } => contains_path(inner),
    }
}
