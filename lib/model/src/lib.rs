//! The data model shared by every KGRAM crate.
//!
//! A [Term] is an immutable RDF value. Graphs and queries wrap terms into [Node]s, which are
//! cheap to clone and compare by term identity. An [Edge] is a statement and an [Entity] is an
//! edge together with the named graph it was found in.

mod edge;
mod error;
mod node;
mod position;
mod term;
pub mod vocab;

pub use edge::*;
pub use error::*;
pub use node::*;
pub use position::*;
pub use term::*;

// Re-export some oxrdf types.
pub use oxrdf::Term as DecodedTerm;
pub use oxrdf::{
    BlankNode, GraphName, Literal, LiteralRef, NamedNode, NamedNodeRef, Quad, QuadRef, Subject,
    Variable, VariableRef,
};
