use crate::dictionary::TermDictionary;
use crate::index::{EncodedEdge, PredicateIndex};
use kgram_common::error::StorageError;
use kgram_common::{EntityIterator, GraphIndex};
use kgram_model::{
    DecodedTerm, Edge, Entity, GraphName, Node, NodeId, Position, QuadRef, Subject, Term,
};
use std::collections::{BTreeMap, BTreeSet};
use std::iter;

/// An in-memory graph of edges in a default graph and in named graphs.
///
/// The graph is mutated through `&mut self` and read through the [GraphIndex] trait, hence it
/// can be shared with concurrent queries behind an `Arc` once it is filled.
///
/// # Example
///
/// ```
/// # use kgram_common::GraphIndex;
/// # use kgram_model::{NamedNode, Position, Term};
/// # use kgram_storage::MemGraph;
/// let mut graph = MemGraph::new();
/// let knows = Term::from(NamedNode::new_unchecked("http://example.com/knows"));
/// graph.insert(
///     NamedNode::new_unchecked("http://example.com/alice").into(),
///     knows.clone(),
///     NamedNode::new_unchecked("http://example.com/bob").into(),
///     None,
/// )?;
///
/// let predicate = graph.property_node(&knows).unwrap();
/// assert_eq!(graph.edges_for(&predicate, None, None, Position::Subject).count(), 1);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// ```
#[derive(Debug, Default)]
pub struct MemGraph {
    dictionary: TermDictionary,
    predicates: BTreeMap<NodeId, PredicateIndex>,
    named_graphs: BTreeSet<NodeId>,
    entailment: bool,
    len: usize,
}

impl MemGraph {
    /// Creates a new empty [MemGraph].
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables `rdf:type` entailment through the class hierarchy.
    #[must_use]
    pub fn with_entailment(mut self, entailment: bool) -> Self {
        self.entailment = entailment;
        self
    }

    /// Inserts an edge into the default graph (`graph` is `None`) or into a named graph.
    ///
    /// Returns `false` if the edge already was in that graph.
    ///
    /// # Errors
    ///
    /// Fails if a term cannot be stored at its position, for example, a literal as subject.
    pub fn insert(
        &mut self,
        subject: Term,
        predicate: Term,
        object: Term,
        graph: Option<Term>,
    ) -> Result<bool, StorageError> {
        if subject.is_literal() || subject.as_object().is_some() {
            return Err(StorageError::InvalidTerm {
                term: subject,
                position: Position::Subject,
            });
        }
        if !predicate.is_named_node() {
            return Err(StorageError::InvalidPredicate(predicate));
        }
        if object.as_object().is_some() {
            return Err(StorageError::InvalidTerm {
                term: object,
                position: Position::Object,
            });
        }
        if let Some(graph) = &graph {
            if graph.is_literal() || graph.as_object().is_some() {
                return Err(StorageError::InvalidTerm {
                    term: graph.clone(),
                    position: Position::Graph,
                });
            }
        }

        let subject = self.encode(subject)?;
        let predicate = self.encode(predicate)?;
        let object = self.encode(object)?;
        let graph = graph
            .map(|graph| self.insert_graph_term(graph))
            .transpose()?;

        let inserted = self
            .predicates
            .entry(predicate)
            .or_default()
            .insert(EncodedEdge {
                subject,
                object,
                graph,
            });
        if inserted {
            self.len += 1;
        }
        Ok(inserted)
    }

    /// Inserts a quad.
    pub fn insert_quad(&mut self, quad: QuadRef<'_>) -> Result<bool, StorageError> {
        let subject: Subject = quad.subject.into_owned();
        let graph = match quad.graph_name.into_owned() {
            GraphName::NamedNode(node) => Some(node.into()),
            GraphName::BlankNode(node) => Some(node.into()),
            GraphName::DefaultGraph => None,
        };
        self.insert(
            DecodedTerm::from(subject).into(),
            quad.predicate.into_owned().into(),
            Term::from(quad.object.into_owned()),
            graph,
        )
    }

    /// Inserts all quads. Returns the number of quads that were not yet present.
    pub fn extend<'a>(
        &mut self,
        quads: impl IntoIterator<Item = QuadRef<'a>>,
    ) -> Result<usize, StorageError> {
        let mut count = 0;
        for quad in quads {
            if self.insert_quad(quad)? {
                count += 1;
            }
        }
        tracing::debug!("Inserted {count} quads, the graph now contains {} edges", self.len);
        Ok(count)
    }

    /// Declares a named graph, even if it has no edges.
    pub fn insert_named_graph(&mut self, graph: Term) -> Result<bool, StorageError> {
        if graph.is_literal() || graph.as_object().is_some() {
            return Err(StorageError::InvalidTerm {
                term: graph,
                position: Position::Graph,
            });
        }
        let id = self.encode(graph)?;
        Ok(self.named_graphs.insert(id))
    }

    /// The number of edge occurrences in all graphs.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn encode(&mut self, term: Term) -> Result<NodeId, StorageError> {
        let node = self.dictionary.encode(term)?;
        node.id().ok_or(StorageError::DictionaryFull(NodeId::MAX.as_u32()))
    }

    fn insert_graph_term(&mut self, graph: Term) -> Result<NodeId, StorageError> {
        let id = self.encode(graph)?;
        self.named_graphs.insert(id);
        Ok(id)
    }

    fn entity(&self, predicate: &Node, edge: EncodedEdge) -> Entity {
        Entity::new(
            Edge::new(
                self.dictionary.node(edge.subject).clone(),
                predicate.clone(),
                self.dictionary.node(edge.object).clone(),
            ),
            edge.graph.map(|graph| self.dictionary.node(graph).clone()),
        )
    }
}

impl GraphIndex for MemGraph {
    fn edges_for(
        &self,
        predicate: &Node,
        bound: Option<&Node>,
        second: Option<&Node>,
        position: Position,
    ) -> EntityIterator<'_> {
        let Some((id, index)) = self
            .dictionary
            .resolve(predicate)
            .and_then(|id| Some((id, self.predicates.get(&id)?)))
        else {
            tracing::trace!("Predicate {predicate} has no edges");
            return Box::new(iter::empty());
        };
        let predicate = self.dictionary.node(id);

        let Some(bound) = bound else {
            return Box::new(index.all().map(move |edge| self.entity(predicate, edge)));
        };
        let Some(key) = self.dictionary.resolve(bound) else {
            return Box::new(iter::empty());
        };
        let second = match second.map(|node| self.dictionary.resolve(node)) {
            None => None,
            Some(Some(second)) => Some(second),
            Some(None) => return Box::new(iter::empty()),
        };

        match position {
            Position::Subject => Box::new(
                index
                    .by_subject(key, second)
                    .map(move |edge| self.entity(predicate, edge)),
            ),
            Position::Object => Box::new(
                index
                    .by_object(key, second)
                    .map(move |edge| self.entity(predicate, edge)),
            ),
            Position::Graph => Box::new(
                index
                    .by_graph(key)
                    .map(move |edge| self.entity(predicate, edge)),
            ),
            Position::List => Box::new(index.all().map(move |edge| self.entity(predicate, edge))),
        }
    }

    fn node(&self, term: &Term) -> Option<Node> {
        self.dictionary
            .id(term)
            .map(|id| self.dictionary.node(id).clone())
    }

    fn property_node(&self, term: &Term) -> Option<Node> {
        self.dictionary
            .id(term)
            .filter(|id| self.predicates.contains_key(id))
            .map(|id| self.dictionary.node(id).clone())
    }

    fn graph_node(&self, term: &Term) -> Option<Node> {
        self.dictionary
            .id(term)
            .filter(|id| self.named_graphs.contains(id))
            .map(|id| self.dictionary.node(id).clone())
    }

    fn is_graph_node(&self, node: &Node) -> bool {
        self.dictionary
            .resolve(node)
            .is_some_and(|id| self.named_graphs.contains(&id))
    }

    fn graph_nodes(&self) -> Vec<Node> {
        self.named_graphs
            .iter()
            .map(|id| self.dictionary.node(*id).clone())
            .collect()
    }

    fn predicates(&self) -> Vec<Node> {
        self.predicates
            .keys()
            .map(|id| self.dictionary.node(*id).clone())
            .collect()
    }

    fn nodes(&self, graph: Option<&Node>) -> Vec<Node> {
        let graph = match graph {
            None => None,
            Some(graph) => match self.dictionary.resolve(graph) {
                Some(graph) => Some(graph),
                None => return Vec::new(),
            },
        };

        let mut nodes = BTreeSet::new();
        for index in self.predicates.values() {
            let edges: Box<dyn Iterator<Item = EncodedEdge> + '_> = match graph {
                Some(graph) => Box::new(index.by_graph(graph)),
                None => Box::new(index.all()),
            };
            for edge in edges {
                nodes.insert(edge.subject);
                nodes.insert(edge.object);
            }
        }
        nodes
            .into_iter()
            .map(|id| self.dictionary.node(id).clone())
            .collect()
    }

    fn has_entailment(&self) -> bool {
        self.entailment
    }
}
