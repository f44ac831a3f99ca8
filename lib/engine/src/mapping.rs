use kgram_logical::Query;
use kgram_model::{Node, Variable};
use rustc_hash::FxHashSet;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A single solution.
///
/// The bindings are stored in the declaration order of the query variables. The order and group
/// keys are computed by [CompleteSparql](crate::CompleteSparql) and are not part of the identity
/// of a mapping.
#[derive(Clone, Debug, Default)]
pub struct Mapping {
    nodes: Vec<Option<Node>>,
    order_by: Vec<Option<Node>>,
    group_by: Vec<Option<Node>>,
}

impl Mapping {
    pub fn new(nodes: Vec<Option<Node>>) -> Self {
        Self {
            nodes,
            order_by: Vec::new(),
            group_by: Vec::new(),
        }
    }

    /// A mapping with `len` unbound slots.
    pub fn unbound(len: usize) -> Self {
        Self::new(vec![None; len])
    }

    pub fn get(&self, slot: usize) -> Option<&Node> {
        self.nodes.get(slot)?.as_ref()
    }

    pub fn set(&mut self, slot: usize, value: Option<Node>) {
        if slot >= self.nodes.len() {
            self.nodes.resize(slot + 1, None);
        }
        self.nodes[slot] = value;
    }

    pub fn nodes(&self) -> &[Option<Node>] {
        &self.nodes
    }

    pub fn order_by(&self) -> &[Option<Node>] {
        &self.order_by
    }

    pub fn set_order_by(&mut self, keys: Vec<Option<Node>>) {
        self.order_by = keys;
    }

    pub fn group_by(&self) -> &[Option<Node>] {
        &self.group_by
    }

    pub fn set_group_by(&mut self, keys: Vec<Option<Node>>) {
        self.group_by = keys;
    }

    /// Returns whether two mappings agree on every variable bound in both.
    pub fn is_compatible(&self, other: &Mapping) -> bool {
        self.nodes
            .iter()
            .zip(&other.nodes)
            .all(|pair| match pair {
                (Some(lhs), Some(rhs)) => lhs == rhs,
                _ => true,
            })
    }

    /// Returns whether both mappings bind at least one common variable.
    pub fn shares_variable(&self, other: &Mapping) -> bool {
        self.nodes
            .iter()
            .zip(&other.nodes)
            .any(|(lhs, rhs)| lhs.is_some() && rhs.is_some())
    }

    fn projection_key(&self, projection: &[usize]) -> Vec<Option<Node>> {
        projection
            .iter()
            .map(|slot| self.get(*slot).cloned())
            .collect()
    }
}

impl PartialEq for Mapping {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes
    }
}

impl Eq for Mapping {}

impl Hash for Mapping {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.nodes.hash(state);
    }
}

/// An ordered sequence of solutions of a query.
///
/// If the sequence is distinct, [Mappings::submit] only accepts mappings that differ from all
/// previously accepted ones on the projected variables.
#[derive(Clone, Debug)]
pub struct Mappings {
    variables: Arc<[Variable]>,
    projection: Vec<usize>,
    distinct: bool,
    mappings: Vec<Mapping>,
    seen: FxHashSet<Vec<Option<Node>>>,
}

impl Mappings {
    /// Creates an empty sequence.
    ///
    /// `projection` contains the slots of the projected variables in `variables`.
    pub fn new(variables: Arc<[Variable]>, projection: Vec<usize>, distinct: bool) -> Self {
        Self {
            variables,
            projection,
            distinct,
            mappings: Vec::new(),
            seen: FxHashSet::default(),
        }
    }

    /// Creates an empty sequence for the solutions of `query`.
    pub fn for_query(query: &Query) -> Self {
        let projection = query
            .projection()
            .iter()
            .filter_map(|variable| query.slot(variable))
            .collect();
        Self::new(query.variables().into(), projection, query.is_distinct())
    }

    /// Adds a mapping unless the sequence is distinct and already contains an equal mapping.
    ///
    /// Returns whether the mapping was added.
    pub fn submit(&mut self, mapping: Mapping) -> bool {
        if self.distinct && !self.seen.insert(mapping.projection_key(&self.projection)) {
            return false;
        }
        self.mappings.push(mapping);
        true
    }

    /// Adds a mapping without checking for duplicates.
    pub fn add(&mut self, mapping: Mapping) {
        self.mappings.push(mapping);
    }

    /// Submits all mappings again. Keeps the first occurrence of each distinct mapping.
    pub fn resubmit(&mut self) {
        let mappings = self.take();
        for mapping in mappings {
            self.submit(mapping);
        }
    }

    /// Removes all mappings and resets the duplicate detection.
    pub fn take(&mut self) -> Vec<Mapping> {
        self.seen.clear();
        std::mem::take(&mut self.mappings)
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// The projected variables.
    pub fn projection(&self) -> impl Iterator<Item = &Variable> + '_ {
        self.projection.iter().map(|slot| &self.variables[*slot])
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Mapping> {
        self.mappings.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Mapping> {
        self.mappings.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Mapping> {
        self.mappings.iter_mut()
    }

    /// The value of `variable` in the mapping at `index`.
    pub fn value(&self, index: usize, variable: &Variable) -> Option<&Node> {
        let slot = self.variables.iter().position(|v| v == variable)?;
        self.mappings.get(index)?.get(slot)
    }

    pub fn sort_by(&mut self, compare: impl FnMut(&Mapping, &Mapping) -> std::cmp::Ordering) {
        self.mappings.sort_by(compare);
    }

    /// Keeps `limit` mappings after skipping the first `offset` ones.
    pub fn slice(&mut self, offset: usize, limit: Option<usize>) {
        self.mappings.drain(..offset.min(self.mappings.len()));
        if let Some(limit) = limit {
            self.mappings.truncate(limit);
        }
    }
}

impl<'a> IntoIterator for &'a Mappings {
    type Item = &'a Mapping;
    type IntoIter = std::slice::Iter<'a, Mapping>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> IntoIterator for &'a mut Mappings {
    type Item = &'a mut Mapping;
    type IntoIter = std::slice::IterMut<'a, Mapping>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl IntoIterator for Mappings {
    type Item = Mapping;
    type IntoIter = std::vec::IntoIter<Mapping>;

    fn into_iter(self) -> Self::IntoIter {
        self.mappings.into_iter()
    }
}

/// Renders the projected variables as a table.
impl Display for Mappings {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "|")?;
        for variable in self.projection() {
            write!(f, " {variable} |")?;
        }
        for mapping in &self.mappings {
            write!(f, "\n|")?;
            for slot in &self.projection {
                match mapping.get(*slot) {
                    Some(node) => write!(f, " {node} |")?,
                    None => write!(f, "  |")?,
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kgram_model::{Literal, Term};

    fn node(value: i64) -> Option<Node> {
        Some(Node::external(Term::from(Literal::from(value))))
    }

    fn mappings(distinct: bool) -> Mappings {
        let variables: Arc<[Variable]> =
            vec![Variable::new_unchecked("x"), Variable::new_unchecked("y")].into();
        Mappings::new(variables, vec![0], distinct)
    }

    #[test]
    fn submit_deduplicates_on_the_projection() {
        let mut mappings = mappings(true);
        assert!(mappings.submit(Mapping::new(vec![node(1), node(2)])));
        assert!(!mappings.submit(Mapping::new(vec![node(1), node(3)])));
        assert!(mappings.submit(Mapping::new(vec![node(2), node(3)])));
        mappings.add(Mapping::new(vec![node(1), node(4)]));
        assert_eq!(mappings.len(), 3);

        mappings.resubmit();
        assert_eq!(mappings.len(), 2);
        mappings.resubmit();
        assert_eq!(mappings.len(), 2);
        assert_eq!(mappings.to_string(), "| ?x |\n| \"1\"^^<http://www.w3.org/2001/XMLSchema#integer> |\n| \"2\"^^<http://www.w3.org/2001/XMLSchema#integer> |");
    }

    #[test]
    fn submit_keeps_duplicates_without_distinct() {
        let mut mappings = mappings(false);
        assert!(mappings.submit(Mapping::new(vec![node(1), None])));
        assert!(mappings.submit(Mapping::new(vec![node(1), None])));
        assert_eq!(mappings.len(), 2);
    }

    #[test]
    fn compatibility() {
        let lhs = Mapping::new(vec![node(1), None]);
        let rhs = Mapping::new(vec![node(1), node(2)]);
        let other = Mapping::new(vec![None, node(2)]);
        assert!(lhs.is_compatible(&rhs));
        assert!(lhs.shares_variable(&rhs));
        assert!(lhs.is_compatible(&other));
        assert!(!lhs.shares_variable(&other));
        assert!(!Mapping::new(vec![node(2), None]).is_compatible(&rhs));
    }

    #[test]
    fn slice() {
        let mut mappings = mappings(false);
        for i in 0..5 {
            mappings.add(Mapping::new(vec![node(i), None]));
        }
        mappings.slice(1, Some(2));
        assert_eq!(mappings.len(), 2);
        assert_eq!(mappings.get(0), Some(&Mapping::new(vec![node(1), None])));
    }
}
