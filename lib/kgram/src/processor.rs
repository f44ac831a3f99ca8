use kgram_common::GraphIndex;
use kgram_engine::sparql::QueryRewriter;
use kgram_engine::{
    evaluate_query, EvaluationOptions, Interpreter, JoinSubEvaluator, Mappings, Producer,
    QueryError,
};
use kgram_functions::{ExtensionRegistry, ExtensionRegistryRef, SparqlValueProxy, ValueProxyRef};
use kgram_logical::Query;
use kgram_storage::MemGraph;

use std::sync::Arc;

/// The result of a query.
#[derive(Debug)]
pub enum QueryResults {
    /// The solutions of a `SELECT` query.
    Solutions(Mappings),
    /// The answer to an `ASK` query.
    Boolean(bool),
}

/// Evaluates queries against a shared [MemGraph].
///
/// The processor itself is immutable. Each evaluation creates its own producer and interpreter,
/// hence a processor can be cloned and used from several threads.
#[derive(Debug, Clone)]
pub struct QueryProcessor {
    graph: Arc<MemGraph>,
    registry: ExtensionRegistryRef,
    proxy: ValueProxyRef,
    options: EvaluationOptions,
}

impl QueryProcessor {
    /// Creates a processor with the SPARQL value semantics and no extension functions.
    pub fn new(graph: Arc<MemGraph>) -> Self {
        Self {
            graph,
            registry: Arc::new(ExtensionRegistry::default()),
            proxy: Arc::new(SparqlValueProxy),
            options: EvaluationOptions::default(),
        }
    }

    #[must_use]
    pub fn with_registry(mut self, registry: ExtensionRegistryRef) -> Self {
        self.registry = registry;
        self
    }

    #[must_use]
    pub fn with_proxy(mut self, proxy: ValueProxyRef) -> Self {
        self.proxy = proxy;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: EvaluationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn graph(&self) -> &Arc<MemGraph> {
        &self.graph
    }

    pub fn options(&self) -> &EvaluationOptions {
        &self.options
    }

    /// Parses and evaluates a SPARQL `SELECT` or `ASK` query.
    pub fn query(&self, query: &str) -> Result<QueryResults, QueryError> {
        let parsed = spargebra::Query::parse(query, None)?;
        let is_ask = matches!(parsed, spargebra::Query::Ask { .. });
        let query = QueryRewriter::new().rewrite(&parsed)?;
        let solutions = self.evaluate(&query)?;
        Ok(if is_ask {
            QueryResults::Boolean(!solutions.is_empty())
        } else {
            QueryResults::Solutions(solutions)
        })
    }

    /// Evaluates a query built with the query model.
    pub fn evaluate(&self, query: &Query) -> Result<Mappings, QueryError> {
        let graph: Arc<dyn GraphIndex> = Arc::<MemGraph>::clone(&self.graph);
        let producer = Producer::new(graph, self.options.clone());
        let interpreter = Interpreter::new(Arc::clone(&self.proxy), Arc::clone(&self.registry))
            .with_sub_evaluator(JoinSubEvaluator::new_ref());
        let solutions = evaluate_query(query, &producer, &interpreter)?;
        tracing::debug!("Evaluated a query with {} solutions", solutions.len());
        Ok(solutions)
    }
}
