use crate::producer::Matcher;
use kgram_common::GraphIndex;
use kgram_model::{Edge, Entity, Node};
use std::sync::Arc;

/// Composable completion steps for the candidate sequences of the [Producer](super::Producer).
pub trait EntityIteratorExt: Iterator<Item = Entity> + Sized {
    /// Collapses consecutive occurrences of the same logical edge.
    ///
    /// Entities of the default graph are kept as is. If `from` is not empty, only occurrences in
    /// one of these graphs are considered. If `skip` is set, the duplicate test is not performed.
    fn successive_distinct(self, from: Vec<Node>, skip: bool) -> SuccessiveDistinct<Self> {
        SuccessiveDistinct {
            inner: self,
            from,
            skip,
            previous: None,
        }
    }

    /// Keeps the occurrences in named graphs.
    ///
    /// If `graph` is set, only occurrences in that graph are kept. Otherwise, if `from_named` is
    /// not empty, only occurrences in one of the listed graphs are kept.
    fn in_graphs(self, graph: Option<Node>, from_named: Vec<Node>) -> InGraphs<Self> {
        InGraphs {
            inner: self,
            graph,
            from_named,
        }
    }

    /// Keeps the `rdf:type` edges whose class is accepted by `matcher`.
    fn matching(
        self,
        matcher: Arc<dyn Matcher>,
        graph: &dyn GraphIndex,
        class: Option<Node>,
    ) -> Matching<'_, Self> {
        Matching {
            inner: self,
            matcher,
            graph,
            class,
        }
    }
}

impl<I: Iterator<Item = Entity>> EntityIteratorExt for I {}

pub struct SuccessiveDistinct<I> {
    inner: I,
    from: Vec<Node>,
    skip: bool,
    previous: Option<Edge>,
}

impl<I: Iterator<Item = Entity>> Iterator for SuccessiveDistinct<I> {
    type Item = Entity;

    fn next(&mut self) -> Option<Entity> {
        loop {
            let entity = self.inner.next()?;
            if !self.from.is_empty()
                && !entity.graph().is_some_and(|graph| self.from.contains(graph))
            {
                continue;
            }
            if self.skip {
                return Some(entity);
            }
            if self.previous.as_ref() == Some(entity.edge()) {
                continue;
            }
            self.previous = Some(entity.edge().clone());
            return Some(entity);
        }
    }
}

pub struct InGraphs<I> {
    inner: I,
    graph: Option<Node>,
    from_named: Vec<Node>,
}

impl<I: Iterator<Item = Entity>> Iterator for InGraphs<I> {
    type Item = Entity;

    fn next(&mut self) -> Option<Entity> {
        let graph = &self.graph;
        let from_named = &self.from_named;
        self.inner.by_ref().find(|entity| match (entity.graph(), graph) {
            (None, _) => false,
            (Some(actual), Some(expected)) => actual == expected,
            (Some(actual), None) => from_named.is_empty() || from_named.contains(actual),
        })
    }
}

pub struct Matching<'graph, I> {
    inner: I,
    matcher: Arc<dyn Matcher>,
    graph: &'graph dyn GraphIndex,
    class: Option<Node>,
}

impl<I: Iterator<Item = Entity>> Iterator for Matching<'_, I> {
    type Item = Entity;

    fn next(&mut self) -> Option<Entity> {
        let Some(class) = &self.class else {
            return self.inner.next();
        };
        let matcher = &self.matcher;
        let graph = self.graph;
        self.inner.by_ref().find(|entity| {
            !graph.is_type_edge(entity.edge())
                || matcher.matches(class, &entity.edge().object, graph)
        })
    }
}
