use kgram_model::NodeId;
use std::collections::BTreeSet;
use std::ops::RangeInclusive;

/// An occurrence of an edge, identified by its subject, object and optional named graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct EncodedEdge {
    pub(crate) subject: NodeId,
    pub(crate) object: NodeId,
    pub(crate) graph: Option<NodeId>,
}

/// The edges of a single predicate, sorted for each lookup position.
///
/// The subject and object indexes sort by (key, other endpoint, graph). As `None` sorts before
/// any graph, the default-graph occurrence of an edge comes first and all occurrences of the
/// same logical edge are adjacent.
#[derive(Debug, Default)]
pub(crate) struct PredicateIndex {
    by_subject: BTreeSet<(NodeId, NodeId, Option<NodeId>)>,
    by_object: BTreeSet<(NodeId, NodeId, Option<NodeId>)>,
    by_graph: BTreeSet<(NodeId, NodeId, NodeId)>,
}

impl PredicateIndex {
    /// Inserts an edge. Returns `false` if the edge was already present.
    pub(crate) fn insert(&mut self, edge: EncodedEdge) -> bool {
        if !self
            .by_subject
            .insert((edge.subject, edge.object, edge.graph))
        {
            return false;
        }
        self.by_object
            .insert((edge.object, edge.subject, edge.graph));
        if let Some(graph) = edge.graph {
            self.by_graph.insert((graph, edge.subject, edge.object));
        }
        true
    }

    pub(crate) fn len(&self) -> usize {
        self.by_subject.len()
    }

    pub(crate) fn all(&self) -> impl Iterator<Item = EncodedEdge> + '_ {
        self.by_subject
            .iter()
            .map(|(subject, object, graph)| EncodedEdge {
                subject: *subject,
                object: *object,
                graph: *graph,
            })
    }

    /// The edges with the given subject, optionally restricted to an object.
    pub(crate) fn by_subject(
        &self,
        subject: NodeId,
        object: Option<NodeId>,
    ) -> impl Iterator<Item = EncodedEdge> + '_ {
        self.by_subject
            .range(key_range(subject, object))
            .map(|(subject, object, graph)| EncodedEdge {
                subject: *subject,
                object: *object,
                graph: *graph,
            })
    }

    /// The edges with the given object, optionally restricted to a subject.
    pub(crate) fn by_object(
        &self,
        object: NodeId,
        subject: Option<NodeId>,
    ) -> impl Iterator<Item = EncodedEdge> + '_ {
        self.by_object
            .range(key_range(object, subject))
            .map(|(object, subject, graph)| EncodedEdge {
                subject: *subject,
                object: *object,
                graph: *graph,
            })
    }

    /// The edges that occur in the given named graph.
    pub(crate) fn by_graph(&self, graph: NodeId) -> impl Iterator<Item = EncodedEdge> + '_ {
        self.by_graph
            .range((graph, NodeId::MIN, NodeId::MIN)..=(graph, NodeId::MAX, NodeId::MAX))
            .map(|(graph, subject, object)| EncodedEdge {
                subject: *subject,
                object: *object,
                graph: Some(*graph),
            })
    }
}

fn key_range(
    key: NodeId,
    second: Option<NodeId>,
) -> RangeInclusive<(NodeId, NodeId, Option<NodeId>)> {
    match second {
        Some(second) => (key, second, None)..=(key, second, Some(NodeId::MAX)),
        None => (key, NodeId::MIN, None)..=(key, NodeId::MAX, Some(NodeId::MAX)),
    }
}
