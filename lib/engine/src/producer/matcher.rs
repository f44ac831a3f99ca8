use kgram_common::GraphIndex;
use kgram_model::vocab::rdfs;
use kgram_model::{Node, Position, Term};
use rustc_hash::FxHashSet;
use std::collections::VecDeque;
use std::fmt::Debug;

/// Decides whether a value found in the graph satisfies the value requested by a pattern.
pub trait Matcher: Debug {
    /// Returns whether `actual` matches the `expected` object of an `rdf:type` edge.
    fn matches(&self, expected: &Node, actual: &Node, graph: &dyn GraphIndex) -> bool;
}

/// Matches `rdf:type` edges through the class hierarchy: an instance of a class is an instance
/// of all its super classes (`rdfs:subClassOf*`).
#[derive(Debug, Default)]
pub struct TypeMatcher;

impl Matcher for TypeMatcher {
    fn matches(&self, expected: &Node, actual: &Node, graph: &dyn GraphIndex) -> bool {
        if expected == actual {
            return true;
        }
        let Some(sub_class_of) = graph.property_node(&Term::from(rdfs::SUB_CLASS_OF)) else {
            return false;
        };

        let mut visited = FxHashSet::default();
        let mut queue = VecDeque::from([actual.clone()]);
        while let Some(class) = queue.pop_front() {
            if !visited.insert(class.clone()) {
                continue;
            }
            for entity in graph.edges_for(&sub_class_of, Some(&class), None, Position::Subject) {
                let super_class = &entity.edge().object;
                if super_class == expected {
                    return true;
                }
                queue.push_back(super_class.clone());
            }
        }
        false
    }
}
