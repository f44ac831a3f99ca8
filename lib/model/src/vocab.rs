//! Vocabularies used by the engine that are not part of `oxrdf::vocab`.

pub use oxrdf::vocab::{rdf, rdfs, xsd};

/// The KGRAM introspection namespace.
pub mod kg {
    use oxrdf::NamedNodeRef;

    /// `kg:system`, the introspection function.
    pub const SYSTEM: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://ns.inria.fr/corese/kgram/system");
    /// `kg:memory`, selects the current bindings in `kg:system`.
    pub const MEMORY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://ns.inria.fr/corese/kgram/memory");
    /// `kg:stack`, selects the local binding stack in `kg:system`.
    pub const STACK: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://ns.inria.fr/corese/kgram/stack");
}
