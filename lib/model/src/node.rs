use crate::Term;
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// The index of a term in the dictionary of a graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub const MIN: Self = Self(0);
    pub const MAX: Self = Self(u32::MAX);

    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// A reference-counted handle to a canonical [Term].
///
/// Nodes created by a graph carry the [NodeId] of their term. Nodes built from computed values
/// (e.g., the result of a function call) are *external* and must be resolved against a graph
/// before they can be used for an index lookup.
///
/// Equality and hashing follow term identity ([Term::same]), which is why the wrapped term is
/// always kept in canonical form.
#[derive(Clone)]
pub struct Node(Arc<NodeData>);

struct NodeData {
    term: Term,
    id: Option<NodeId>,
}

impl Node {
    /// Creates a node that belongs to a graph dictionary.
    pub fn new(term: Term, id: NodeId) -> Self {
        Self(Arc::new(NodeData {
            term: term.into_canonical(),
            id: Some(id),
        }))
    }

    /// Creates a node that is not known to any graph.
    pub fn external(term: Term) -> Self {
        Self(Arc::new(NodeData {
            term: term.into_canonical(),
            id: None,
        }))
    }

    pub fn term(&self) -> &Term {
        &self.0.term
    }

    pub fn id(&self) -> Option<NodeId> {
        self.0.id
    }

    pub fn is_external(&self) -> bool {
        self.0.id.is_none()
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.term == other.0.term
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.term.hash(state);
    }
}

impl Debug for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.0.id {
            Some(id) => write!(f, "{}#{id}", self.0.term),
            None => write!(f, "{}", self.0.term),
        }
    }
}

impl Display for Node {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0.term, f)
    }
}

impl From<Term> for Node {
    fn from(value: Term) -> Self {
        Node::external(value)
    }
}
