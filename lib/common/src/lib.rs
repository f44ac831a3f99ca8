pub mod error;
mod graph_index;

pub use graph_index::{is_type_predicate, EntityIterator, GraphIndex};
