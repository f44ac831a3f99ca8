use super::{Continuation, Eval};
use crate::environment::{Environment, Memory};
use crate::error::QueryError;
use crate::producer::{PathRequest, Producer};
use kgram_logical::{PathExpr, PathPattern, PatternNode};
use kgram_model::{Node, Position};
use rustc_hash::FxHashSet;

/// An ordered set of reached nodes.
#[derive(Default)]
struct Reached {
    nodes: Vec<Node>,
    seen: FxHashSet<Node>,
}

impl Reached {
    fn insert(&mut self, node: Node) -> bool {
        let inserted = self.seen.insert(node.clone());
        if inserted {
            self.nodes.push(node);
        }
        inserted
    }

    fn extend(&mut self, nodes: impl IntoIterator<Item = Node>) {
        for node in nodes {
            self.insert(node);
        }
    }
}

impl<'q> Eval<'q> {
    /// Evaluates a property path by reachability from its bound endpoint.
    ///
    /// If both endpoints are unbound, the path is walked from every node of the graph.
    pub(super) fn eval_path(
        &self,
        path: &PathPattern,
        memory: &mut Memory<'q>,
        next: &mut Continuation<'_, 'q>,
    ) -> Result<bool, QueryError> {
        let subject = self.endpoint(&path.subject, memory);
        let object = self.endpoint(&path.object, memory);

        let (starts, expr, start_pattern, end) = match (subject, object) {
            (Some(subject), _) => (
                vec![subject],
                path.path.clone(),
                &path.subject,
                &path.object,
            ),
            (None, Some(object)) => (
                vec![object],
                path.path.reverse(),
                &path.object,
                &path.subject,
            ),
            (None, None) => (
                self.start_nodes(memory),
                path.path.clone(),
                &path.subject,
                &path.object,
            ),
        };

        for start in starts {
            let mut bound = Vec::new();
            if let PatternNode::Variable(variable) = start_pattern {
                if !self.bind_node(variable, &start, memory, &mut bound)? {
                    continue;
                }
            }
            let reached = self.reach(path, &expr, &start, memory)?;
            for node in reached.nodes {
                let go_on = match end {
                    PatternNode::Constant(term) => {
                        if node == self.producer.node(term) {
                            next(memory)?
                        } else {
                            true
                        }
                    }
                    PatternNode::Variable(variable) => {
                        self.with_binding(variable, &node, memory, next)?
                    }
                };
                if !go_on {
                    memory.unbind(&bound);
                    return Ok(false);
                }
            }
            memory.unbind(&bound);
        }
        Ok(true)
    }

    fn endpoint(&self, node: &PatternNode, memory: &Memory<'q>) -> Option<Node> {
        match node {
            PatternNode::Constant(term) => Some(self.producer.node(term)),
            PatternNode::Variable(variable) => memory.get(variable).cloned(),
        }
    }

    /// The nodes of the current graph, or of the whole graph outside of a `GRAPH` clause.
    fn start_nodes(&self, memory: &Memory<'q>) -> Vec<Node> {
        let graph = match memory.graph_node() {
            None => None,
            Some(PatternNode::Variable(variable)) => match memory.get(variable) {
                Some(graph) => Some(graph.clone()),
                None => return self.producer.nodes(None),
            },
            Some(PatternNode::Constant(term)) => match self.producer.graph().graph_node(term) {
                Some(graph) => Some(graph),
                None => return Vec::new(),
            },
        };
        self.producer.nodes(graph.as_ref())
    }

    /// Returns the nodes reachable from `start` through `expr`.
    fn reach(
        &self,
        path: &PathPattern,
        expr: &PathExpr,
        start: &Node,
        memory: &Memory<'q>,
    ) -> Result<Reached, QueryError> {
        let mut reached = Reached::default();
        match expr {
            PathExpr::Predicate(_) | PathExpr::Negated(_) => {
                reached.extend(self.step(path, expr, start, memory));
            }
            PathExpr::Reverse(inner) if inner.is_step() => {
                reached.extend(self.step(path, expr, start, memory));
            }
            PathExpr::Reverse(inner) => {
                return self.reach(path, &inner.reverse(), start, memory);
            }
            PathExpr::Sequence(lhs, rhs) => {
                for middle in self.reach(path, lhs, start, memory)?.nodes {
                    reached.extend(self.reach(path, rhs, &middle, memory)?.nodes);
                }
            }
            PathExpr::Alternative(lhs, rhs) => {
                reached.extend(self.reach(path, lhs, start, memory)?.nodes);
                reached.extend(self.reach(path, rhs, start, memory)?.nodes);
            }
            PathExpr::ZeroOrOne(inner) => {
                reached.insert(start.clone());
                reached.extend(self.reach(path, inner, start, memory)?.nodes);
            }
            PathExpr::ZeroOrMore(inner) => {
                reached.insert(start.clone());
                self.closure(path, inner, vec![start.clone()], &mut reached, memory)?;
            }
            PathExpr::OneOrMore(inner) => {
                self.closure(path, inner, vec![start.clone()], &mut reached, memory)?;
            }
        }
        Ok(reached)
    }

    /// Breadth-first transitive closure of `inner`.
    fn closure(
        &self,
        path: &PathPattern,
        inner: &PathExpr,
        mut frontier: Vec<Node>,
        reached: &mut Reached,
        memory: &Memory<'q>,
    ) -> Result<(), QueryError> {
        while !frontier.is_empty() {
            let mut following = Vec::new();
            for node in frontier {
                for target in self.reach(path, inner, &node, memory)?.nodes {
                    if reached.insert(target.clone()) {
                        following.push(target);
                    }
                }
            }
            frontier = following;
        }
        Ok(())
    }

    /// The nodes at the other end of the edges of a single step.
    fn step(
        &self,
        path: &PathPattern,
        step: &PathExpr,
        start: &Node,
        memory: &Memory<'q>,
    ) -> Vec<Node> {
        let graph_node = memory.graph_node();
        let request = PathRequest {
            pattern: path,
            step,
            start: Some(start),
            position: Position::Subject,
            graph_node,
            from: self.from(graph_node),
        };
        let end = Producer::effective_index(step, Position::Subject).reverse();
        self.producer
            .match_path(request, memory)
            .filter_map(|entity| entity.node(end).cloned())
            .collect()
    }
}
