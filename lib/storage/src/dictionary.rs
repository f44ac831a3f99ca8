use kgram_common::error::StorageError;
use kgram_model::{Node, NodeId, Term};
use rustc_hash::FxHashMap;

/// Maps canonical terms to node ids and back.
///
/// Node ids are allocated with a counter and are never reused.
#[derive(Debug, Default)]
pub(crate) struct TermDictionary {
    ids: FxHashMap<Term, NodeId>,
    nodes: Vec<Node>,
}

impl TermDictionary {
    /// Returns the node of `term`, allocating a new id if the term is unknown.
    pub(crate) fn encode(&mut self, term: Term) -> Result<Node, StorageError> {
        let term = term.into_canonical();
        if let Some(id) = self.ids.get(&term) {
            return Ok(self.node(*id).clone());
        }

        let id = u32::try_from(self.nodes.len())
            .ok()
            .filter(|id| *id < NodeId::MAX.as_u32())
            .map(NodeId::new)
            .ok_or(StorageError::DictionaryFull(NodeId::MAX.as_u32()))?;
        let node = Node::new(term.clone(), id);
        self.ids.insert(term, id);
        self.nodes.push(node.clone());
        Ok(node)
    }

    /// Looks up the id of `term` without allocating one.
    pub(crate) fn id(&self, term: &Term) -> Option<NodeId> {
        match self.ids.get(term) {
            Some(id) => Some(*id),
            None => self.ids.get(&term.clone().into_canonical()).copied(),
        }
    }

    /// Resolves a node of any origin to the id of this dictionary.
    pub(crate) fn resolve(&self, node: &Node) -> Option<NodeId> {
        match node.id() {
            Some(id) if self.get(id) == Some(node) => Some(id),
            _ => self.ids.get(node.term()).copied(),
        }
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(index(id))
    }

    /// Returns the node of an id that was allocated by this dictionary.
    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[index(id)]
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }
}

fn index(id: NodeId) -> usize {
    id.as_u32() as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use kgram_model::vocab::xsd;
    use kgram_model::Literal;

    #[test]
    fn equal_terms_share_an_id() {
        let mut dictionary = TermDictionary::default();
        let one = dictionary
            .encode(Literal::new_typed_literal("01", xsd::INTEGER).into())
            .unwrap();
        let other = dictionary.encode(Literal::from(1).into()).unwrap();
        assert_eq!(one.id(), other.id());
        assert_eq!(dictionary.len(), 1);
        assert_eq!(
            dictionary.id(&Literal::new_typed_literal("001", xsd::INTEGER).into()),
            one.id()
        );
    }

    #[test]
    fn external_nodes_are_resolved_by_term() {
        let mut dictionary = TermDictionary::default();
        let node = dictionary
            .encode(Literal::new_simple_literal("a").into())
            .unwrap();
        let external = Node::external(Literal::new_simple_literal("a").into());
        assert_eq!(dictionary.resolve(&external), node.id());
    }
}
