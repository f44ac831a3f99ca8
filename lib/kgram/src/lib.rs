//! KGRAM evaluates SPARQL queries over an in-memory knowledge graph.
//!
//! ```
//! use kgram::model::{Literal, NamedNode, Term};
//! use kgram::storage::MemGraph;
//! use kgram::{QueryProcessor, QueryResults};
//! use std::sync::Arc;
//!
//! let ex = |name: &str| Term::from(NamedNode::new_unchecked(format!("http://example.com/{name}")));
//! let mut graph = MemGraph::new();
//! graph.insert(ex("a"), ex("age"), Literal::from(42).into(), None)?;
//!
//! let processor = QueryProcessor::new(Arc::new(graph));
//! let QueryResults::Solutions(solutions) =
//!     processor.query("SELECT ?age WHERE { <http://example.com/a> <http://example.com/age> ?age }")?
//! else {
//!     unreachable!()
//! };
//! assert_eq!(solutions.len(), 1);
//! # Result::<_, Box<dyn std::error::Error>>::Ok(())
//! ```

mod processor;

pub use processor::{QueryProcessor, QueryResults};

pub mod model {
    pub use kgram_model::*;
}

pub mod logical {
    pub use kgram_logical::*;
}

pub mod functions {
    pub use kgram_functions::*;
}

pub mod storage {
    pub use kgram_storage::*;
}

pub mod engine {
    pub use kgram_engine::*;
}
