//! An in-memory implementation of the [GraphIndex](kgram_common::GraphIndex) contract.
//!
//! Terms are interned in a dictionary that assigns each canonical term a
//! [NodeId](kgram_model::NodeId). Every predicate owns three sorted indexes, one per lookup
//! position.

mod dictionary;
mod graph;
mod index;

pub use graph::MemGraph;
