use kgram_model::{vocab::rdf, Edge, Entity, Node, Position, Term};
use std::fmt::Debug;

/// A lazy sequence of candidate edges.
pub type EntityIterator<'graph> = Box<dyn Iterator<Item = Entity> + 'graph>;

/// The read interface of a graph that the query engine evaluates against.
///
/// Implementations keep per-predicate indexes for the subject, object and graph positions. The
/// iteration order of [GraphIndex::edges_for] is part of the contract: entities are sorted by the
/// looked-up node, then by the other endpoint and finally by the graph, the default graph first.
/// Hence, all occurrences of the same logical edge are consecutive.
///
/// The graph is read-mostly. It may be shared by concurrent queries as long as no one mutates it.
pub trait GraphIndex: Debug + Send + Sync {
    /// Returns the edges of `predicate` whose node at `position` is `bound`.
    ///
    /// If `bound` is `None`, all edges of the predicate are returned. `second` further
    /// restricts the other endpoint of the edge (the object for [Position::Subject] and the
    /// subject for [Position::Object]).
    fn edges_for(
        &self,
        predicate: &Node,
        bound: Option<&Node>,
        second: Option<&Node>,
        position: Position,
    ) -> EntityIterator<'_>;

    /// Resolves a term to the node of this graph.
    fn node(&self, term: &Term) -> Option<Node>;

    /// Resolves a term to a predicate of this graph.
    fn property_node(&self, term: &Term) -> Option<Node>;

    /// Resolves a term to a named graph of this graph.
    fn graph_node(&self, term: &Term) -> Option<Node>;

    /// Returns whether `node` is a named graph.
    fn is_graph_node(&self, node: &Node) -> bool;

    /// Returns all named graphs.
    fn graph_nodes(&self) -> Vec<Node>;

    /// Returns all declared predicates in the order of the index.
    fn predicates(&self) -> Vec<Node>;

    /// Returns all nodes that occur as subject or object, optionally within a single named graph.
    fn nodes(&self, graph: Option<&Node>) -> Vec<Node>;

    /// Returns whether the graph infers `rdf:type` edges through the class hierarchy.
    fn has_entailment(&self) -> bool;

    /// Returns whether the edge is an `rdf:type` edge.
    fn is_type_edge(&self, edge: &Edge) -> bool {
        is_type_predicate(edge.predicate.term())
    }
}

/// Checks whether `term` is `rdf:type`.
pub fn is_type_predicate(term: &Term) -> bool {
    term.as_named_node()
        .is_some_and(|predicate| predicate.as_ref() == rdf::TYPE)
}
