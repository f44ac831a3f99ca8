//! Value semantics of the query engine.
//!
//! The engine never interprets literals itself. Comparisons, arithmetic, built-in functions and
//! aggregates are delegated to a [ValueProxy]. [SparqlValueProxy] implements the SPARQL 1.1
//! semantics. Extension functions are resolved through an [ExtensionRegistry].

mod aggregates;
mod builtin;
mod numeric;
mod proxy;
mod registry;
mod sparql_proxy;
mod value;

pub use numeric::{Numeric, NumericPair};
pub use proxy::{HostValue, ValueProxy, ValueProxyRef};
pub use registry::{
    ExtensionProvider, ExtensionRegistry, ExtensionRegistryBuilder, ExtensionRegistryRef,
};
pub use sparql_proxy::SparqlValueProxy;
pub use value::TypedValue;
