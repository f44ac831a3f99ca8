//! Turns patterns into lazy sequences of candidate edges.

mod adapters;
mod matcher;

pub use adapters::{EntityIteratorExt, InGraphs, Matching, SuccessiveDistinct};
pub use matcher::{Matcher, TypeMatcher};

use crate::environment::Environment;
use crate::options::EvaluationOptions;
use kgram_common::{is_type_predicate, EntityIterator, GraphIndex};
use kgram_logical::{EdgePattern, PathExpr, PathPattern, PatternNode};
use kgram_model::{Entity, Node, Position, Term};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::iter;
use std::sync::Arc;

/// A request for the edges of a single step of a property path.
#[derive(Clone, Copy, Debug)]
pub struct PathRequest<'a> {
    pub pattern: &'a PathPattern,
    /// A predicate, a negated property set or the reverse of either.
    pub step: &'a PathExpr,
    /// The start node. If `None`, the endpoint of the pattern at `position` is used.
    pub start: Option<&'a Node>,
    /// The position of the start node in the path.
    pub position: Position,
    pub graph_node: Option<&'a PatternNode>,
    pub from: &'a [Term],
}

/// Produces the candidate edges of patterns from a [GraphIndex].
///
/// The producer caches the nodes of constants, hence it must not be shared between threads.
/// Create a new producer for each evaluation.
#[derive(Debug)]
pub struct Producer {
    graph: Arc<dyn GraphIndex>,
    options: EvaluationOptions,
    matcher: Option<Arc<dyn Matcher>>,
    cache: RefCell<FxHashMap<Term, Node>>,
}

/// The outcome of resolving a pattern node against the graph.
enum Lookup {
    Unbound,
    Bound(Node),
    /// The node is constant or bound but not part of the graph.
    Missing,
}

impl Producer {
    /// Creates a new producer. A [TypeMatcher] is installed if type matching is enabled and the
    /// graph has entailment.
    pub fn new(graph: Arc<dyn GraphIndex>, options: EvaluationOptions) -> Self {
        let matcher: Option<Arc<dyn Matcher>> = (options.type_matching
            && graph.has_entailment())
        .then(|| Arc::new(TypeMatcher) as Arc<dyn Matcher>);
        Self {
            graph,
            options,
            matcher,
            cache: RefCell::default(),
        }
    }

    /// Replaces the matcher.
    #[must_use]
    pub fn with_matcher(mut self, matcher: Arc<dyn Matcher>) -> Self {
        self.matcher = Some(matcher);
        self
    }

    pub fn graph(&self) -> &dyn GraphIndex {
        self.graph.as_ref()
    }

    pub fn options(&self) -> &EvaluationOptions {
        &self.options
    }

    /// Returns the candidate edges of `pattern` in the context of `env`.
    ///
    /// `graph_node` is the pattern node of the enclosing `GRAPH` clause. `from` lists the graphs
    /// of the `FROM` clause, or of the `FROM NAMED` clause if there is a graph node. The result
    /// is empty if a constant or bound node is not part of the graph.
    pub fn match_edge(
        &self,
        pattern: &EdgePattern,
        graph_node: Option<&PatternNode>,
        from: &[Term],
        env: &dyn Environment,
    ) -> EntityIterator<'_> {
        let predicates = match &pattern.predicate {
            PatternNode::Constant(term) => match self.graph.property_node(term) {
                Some(predicate) => vec![predicate],
                None => return empty("predicate is not in the graph"),
            },
            PatternNode::Variable(variable) => match env.get(variable) {
                Some(value) => match self.graph.property_node(value.term()) {
                    Some(predicate) => vec![predicate],
                    None => return empty("predicate is not in the graph"),
                },
                None => self.graph.predicates(),
            },
        };
        let is_type = predicates.len() == 1 && is_type_predicate(predicates[0].term());

        // First-fit index selection.
        let mut selected = None;
        for position in Position::INDEX_ORDER {
            let node = match position {
                Position::Graph => graph_node,
                Position::Object if is_type && self.graph.has_entailment() => continue,
                _ => pattern.node(position),
            };
            let Some(node) = node else {
                continue;
            };
            match self.lookup(node, position, env) {
                Lookup::Unbound => {}
                Lookup::Missing => return empty("bound node is not in the graph"),
                Lookup::Bound(value) => {
                    selected = Some((position, value));
                    break;
                }
            }
        }

        let second = match &selected {
            Some((Position::Subject, _)) if !is_type => {
                match self.lookup(&pattern.object, Position::Object, env) {
                    Lookup::Unbound => None,
                    Lookup::Bound(object) => Some(object),
                    Lookup::Missing => return empty("bound object is not in the graph"),
                }
            }
            _ => None,
        };

        let from_nodes = self.graph_nodes(from);
        let graph = self.graph();
        let entities: EntityIterator<'_> = match (&selected, graph_node) {
            (None, Some(_)) if !from.is_empty() => {
                tracing::trace!("Scanning {} graphs of FROM NAMED", from_nodes.len());
                let graphs = from_nodes.clone();
                Box::new(predicates.into_iter().flat_map(move |predicate| {
                    graphs.clone().into_iter().flat_map(move |named| {
                        graph.edges_for(&predicate, Some(&named), None, Position::Graph)
                    })
                }))
            }
            (None, None) if !from.is_empty() && from_nodes.is_empty() => {
                return empty("no graph of FROM is in the graph");
            }
            _ => {
                let (position, bound) = match selected {
                    Some((position, value)) => (position, Some(value)),
                    None => (Position::Subject, None),
                };
                tracing::trace!("Selected the {position} index for {pattern}");
                Box::new(predicates.into_iter().flat_map(move |predicate| {
                    graph.edges_for(&predicate, bound.as_ref(), second.as_ref(), position)
                }))
            }
        };

        let entities = self.complete(entities, graph_node, from_nodes, env);
        match (&self.matcher, is_type) {
            (Some(matcher), true) => {
                let class = match self.lookup(&pattern.object, Position::Object, env) {
                    Lookup::Bound(class) => Some(class),
                    Lookup::Unbound | Lookup::Missing => None,
                };
                Box::new(entities.matching(Arc::clone(matcher), self.graph(), class))
            }
            _ => entities,
        }
    }

    /// Returns the edges of a single path step.
    ///
    /// The start node is found at [Producer::effective_index] of the returned entities.
    pub fn match_path(&self, request: PathRequest<'_>, env: &dyn Environment) -> EntityIterator<'_> {
        let Some((predicates, _)) = self.step_predicates(request.step) else {
            return empty("path is not a single step");
        };
        let position = Self::effective_index(request.step, request.position);

        let start = match request.start {
            Some(start) => match self.graph.node(start.term()) {
                Some(start) => Some(start),
                None => return empty("start node is not in the graph"),
            },
            None => match request.pattern.node(request.position) {
                Some(node) => match self.lookup(node, position, env) {
                    Lookup::Unbound => None,
                    Lookup::Bound(start) => Some(start),
                    Lookup::Missing => return empty("path endpoint is not in the graph"),
                },
                None => None,
            },
        };

        let graph = self.graph();
        let entities: EntityIterator<'_> =
            Box::new(predicates.into_iter().flat_map(move |predicate| {
                graph.edges_for(&predicate, start.as_ref(), None, position)
            }));
        let from_nodes = self.graph_nodes(request.from);
        self.complete(entities, request.graph_node, from_nodes, env)
    }

    /// The position of the start node in the edges returned for `step`.
    pub fn effective_index(step: &PathExpr, position: Position) -> Position {
        match step {
            PathExpr::Reverse(inner) => Self::effective_index(inner, position).reverse(),
            _ => position,
        }
    }

    /// Returns whether the graph accepts `actual` for a pattern that requests `expected` at
    /// `position` of `entity`.
    pub fn accepts(&self, entity: &Entity, position: Position, expected: &Node) -> bool {
        let Some(actual) = entity.node(position) else {
            return false;
        };
        if actual == expected {
            return true;
        }
        match &self.matcher {
            Some(matcher) if position == Position::Object => {
                self.graph.is_type_edge(entity.edge())
                    && matcher.matches(expected, actual, self.graph())
            }
            _ => false,
        }
    }

    /// Returns the node of a term, preferring the node of the graph.
    pub fn node(&self, term: &Term) -> Node {
        if let Some(node) = self.cache.borrow().get(term) {
            return node.clone();
        }
        let node = self
            .graph
            .node(term)
            .unwrap_or_else(|| Node::external(term.clone()));
        self.cache.borrow_mut().insert(term.clone(), node.clone());
        node
    }

    /// The named graphs of the graph that are listed in `from`.
    pub fn graph_nodes(&self, from: &[Term]) -> Vec<Node> {
        if from.is_empty() {
            return Vec::new();
        }
        from.iter()
            .filter_map(|term| self.graph.graph_node(term))
            .collect()
    }

    /// All named graphs that a `GRAPH ?g` clause iterates over.
    pub fn named_graphs(&self, from_named: &[Term]) -> Vec<Node> {
        if from_named.is_empty() {
            self.graph.graph_nodes()
        } else {
            self.graph_nodes(from_named)
        }
    }

    pub fn is_graph_node(&self, node: &Node) -> bool {
        self.graph.is_graph_node(node)
    }

    /// All subject and object nodes, optionally of a single named graph.
    pub fn nodes(&self, graph: Option<&Node>) -> Vec<Node> {
        self.graph.nodes(graph)
    }

    fn lookup(&self, node: &PatternNode, position: Position, env: &dyn Environment) -> Lookup {
        let value = match node {
            PatternNode::Constant(term) => term,
            PatternNode::Variable(variable) => match env.get(variable) {
                Some(value) => value.term(),
                None => return Lookup::Unbound,
            },
        };
        let node = match position {
            Position::Graph => self.graph.graph_node(value),
            _ => self.graph.node(value),
        };
        node.map_or(Lookup::Missing, Lookup::Bound)
    }

    /// The predicates of a path step and whether the step is reversed.
    fn step_predicates(&self, step: &PathExpr) -> Option<(Vec<Node>, bool)> {
        match step {
            PathExpr::Predicate(predicate) => Some((
                self.graph
                    .property_node(&Term::from(predicate.clone()))
                    .into_iter()
                    .collect(),
                false,
            )),
            PathExpr::Negated(excluded) => Some((
                self.graph
                    .predicates()
                    .into_iter()
                    .filter(|predicate| {
                        !excluded
                            .iter()
                            .any(|excluded| predicate.term().as_named_node() == Some(excluded))
                    })
                    .collect(),
                false,
            )),
            PathExpr::Reverse(inner) => self
                .step_predicates(inner)
                .map(|(predicates, reversed)| (predicates, !reversed)),
            _ => None,
        }
    }

    /// Applies the graph restrictions and the duplicate elimination.
    fn complete<'p>(
        &'p self,
        entities: EntityIterator<'p>,
        graph_node: Option<&PatternNode>,
        from_nodes: Vec<Node>,
        env: &dyn Environment,
    ) -> EntityIterator<'p> {
        match graph_node {
            None => Box::new(
                entities.successive_distinct(from_nodes, self.options.skip_duplicate_test),
            ),
            Some(graph_node) => {
                let graph = match self.lookup(graph_node, Position::Graph, env) {
                    Lookup::Unbound => None,
                    Lookup::Bound(graph) => Some(graph),
                    Lookup::Missing => return empty("graph is not a named graph"),
                };
                Box::new(entities.in_graphs(graph, from_nodes))
            }
        }
    }
}

fn empty<'a>(reason: &str) -> EntityIterator<'a> {
    tracing::trace!("No candidates: {reason}");
    Box::new(iter::empty())
}
