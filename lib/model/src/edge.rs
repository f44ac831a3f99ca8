use crate::{Node, Position};
use std::fmt::{Display, Formatter};

/// A statement of a graph.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Edge {
    pub subject: Node,
    pub predicate: Node,
    pub object: Node,
}

impl Edge {
    pub fn new(subject: Node, predicate: Node, object: Node) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }

    /// Returns the node at `position`. Edges have no graph or list slot.
    pub fn node(&self, position: Position) -> Option<&Node> {
        match position {
            Position::Subject => Some(&self.subject),
            Position::Object => Some(&self.object),
            Position::Graph | Position::List => None,
        }
    }
}

impl Display for Edge {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.subject, self.predicate, self.object)
    }
}

/// An occurrence of an [Edge] in a graph.
///
/// The same logical edge can occur in the default graph and in several named graphs. Each
/// occurrence is a distinct entity.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Entity {
    edge: Edge,
    graph: Option<Node>,
}

impl Entity {
    pub fn new(edge: Edge, graph: Option<Node>) -> Self {
        Self { edge, graph }
    }

    pub fn edge(&self) -> &Edge {
        &self.edge
    }

    /// The named graph of this occurrence. `None` for the default graph.
    pub fn graph(&self) -> Option<&Node> {
        self.graph.as_ref()
    }

    /// Returns the node at `position`, including the graph slot.
    pub fn node(&self, position: Position) -> Option<&Node> {
        match position {
            Position::Graph => self.graph.as_ref(),
            other => self.edge.node(other),
        }
    }

    pub fn into_edge(self) -> Edge {
        self.edge
    }
}

impl Display for Entity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.graph {
            Some(graph) => write!(f, "{} {graph}", self.edge),
            None => Display::fmt(&self.edge, f),
        }
    }
}
