use crate::vocab::xsd;
use crate::DecodedTerm;
use oxrdf::{BlankNode, Literal, NamedNode, NamedNodeRef};
use oxsdatatypes::{Boolean, DateTime, Decimal, Double, Float, Integer};
use std::any::Any;
use std::fmt::{Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

/// An immutable value flowing through query evaluation.
///
/// Besides the three RDF term kinds, a term can carry an [InternalObject], an opaque host value
/// that is passed through evaluation without being interpreted.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Term {
    NamedNode(NamedNode),
    BlankNode(BlankNode),
    Literal(Literal),
    Object(InternalObject),
}

impl Term {
    pub fn is_named_node(&self) -> bool {
        matches!(self, Term::NamedNode(_))
    }

    pub fn is_blank_node(&self) -> bool {
        matches!(self, Term::BlankNode(_))
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal(_))
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Term::Literal(literal) => Some(literal),
            _ => None,
        }
    }

    pub fn as_named_node(&self) -> Option<&NamedNode> {
        match self {
            Term::NamedNode(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&InternalObject> {
        match self {
            Term::Object(object) => Some(object),
            _ => None,
        }
    }

    /// Returns the term with the canonical lexical form of its datatype.
    ///
    /// Only the numeric, boolean and `xsd:dateTime` datatypes are canonicalized. Literals with an
    /// invalid lexical form are returned unchanged.
    #[must_use]
    pub fn into_canonical(self) -> Self {
        match self {
            Term::Literal(literal) => match canonical_lexical_form(&literal) {
                Some(lexical) if lexical != literal.value() => Term::Literal(
                    Literal::new_typed_literal(lexical, literal.datatype().into_owned()),
                ),
                _ => Term::Literal(literal),
            },
            other => other,
        }
    }

    /// Checks whether two terms are the same term.
    ///
    /// Terms are the same iff their kind and canonical lexical form match. Literals with different
    /// datatypes are never the same term, even if they are numerically equal.
    pub fn same(&self, other: &Term) -> bool {
        match (self, other) {
            (Term::Literal(lhs), Term::Literal(rhs)) => {
                if lhs == rhs {
                    return true;
                }
                if lhs.datatype() != rhs.datatype() || lhs.language() != rhs.language() {
                    return false;
                }
                match (canonical_lexical_form(lhs), canonical_lexical_form(rhs)) {
                    (Some(lhs), Some(rhs)) => lhs == rhs,
                    _ => false,
                }
            }
            (lhs, rhs) => lhs == rhs,
        }
    }
}

fn canonical_lexical_form(literal: &Literal) -> Option<String> {
    let datatype = literal.datatype();
    let value = literal.value();
    if datatype == xsd::INTEGER {
        Integer::from_str(value).ok().map(|v| v.to_string())
    } else if datatype == xsd::DECIMAL {
        Decimal::from_str(value).ok().map(|v| v.to_string())
    } else if datatype == xsd::DOUBLE {
        Double::from_str(value).ok().map(|v| v.to_string())
    } else if datatype == xsd::FLOAT {
        Float::from_str(value).ok().map(|v| v.to_string())
    } else if datatype == xsd::BOOLEAN {
        Boolean::from_str(value).ok().map(|v| v.to_string())
    } else if datatype == xsd::DATE_TIME {
        DateTime::from_str(value).ok().map(|v| v.to_string())
    } else {
        None
    }
}

impl Display for Term {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Term::NamedNode(node) => Display::fmt(node, f),
            Term::BlankNode(node) => Display::fmt(node, f),
            Term::Literal(literal) => Display::fmt(literal, f),
            Term::Object(object) => Display::fmt(object, f),
        }
    }
}

impl From<DecodedTerm> for Term {
    fn from(value: DecodedTerm) -> Self {
        match value {
            DecodedTerm::NamedNode(node) => Term::NamedNode(node),
            DecodedTerm::BlankNode(node) => Term::BlankNode(node),
            DecodedTerm::Literal(literal) => Term::Literal(literal),
        }
    }
}

impl From<NamedNode> for Term {
    fn from(value: NamedNode) -> Self {
        Term::NamedNode(value)
    }
}

impl From<NamedNodeRef<'_>> for Term {
    fn from(value: NamedNodeRef<'_>) -> Self {
        Term::NamedNode(value.into_owned())
    }
}

impl From<BlankNode> for Term {
    fn from(value: BlankNode) -> Self {
        Term::BlankNode(value)
    }
}

impl From<Literal> for Term {
    fn from(value: Literal) -> Self {
        Term::Literal(value)
    }
}

impl From<InternalObject> for Term {
    fn from(value: InternalObject) -> Self {
        Term::Object(value)
    }
}

/// An opaque host value carried by a [Term].
///
/// Two internal objects are the same iff they share the same allocation.
#[derive(Clone)]
pub struct InternalObject {
    label: Arc<str>,
    value: Arc<dyn Any + Send + Sync>,
}

impl InternalObject {
    /// Wraps `value`. The `label` is only used for display purposes.
    pub fn new<T: Any + Send + Sync>(label: &str, value: T) -> Self {
        Self {
            label: label.into(),
            value: Arc::new(value),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the wrapped value if it has type `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    fn address(&self) -> *const () {
        Arc::as_ptr(&self.value).cast::<()>()
    }
}

impl PartialEq for InternalObject {
    fn eq(&self, other: &Self) -> bool {
        self.address() == other.address()
    }
}

impl Eq for InternalObject {}

impl Hash for InternalObject {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address().hash(state);
    }
}

impl Debug for InternalObject {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InternalObject")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl Display for InternalObject {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(value: &str, datatype: NamedNodeRef<'_>) -> Term {
        Term::Literal(Literal::new_typed_literal(value, datatype))
    }

    #[test]
    fn same_respects_canonical_form() {
        assert!(typed("01", xsd::INTEGER).same(&typed("1", xsd::INTEGER)));
        assert!(typed("true", xsd::BOOLEAN).same(&typed("1", xsd::BOOLEAN)));
    }

    #[test]
    fn same_distinguishes_datatypes() {
        assert!(!typed("1", xsd::INTEGER).same(&typed("1.0", xsd::DOUBLE)));
        assert!(!typed("1", xsd::INTEGER).same(&Term::Literal(Literal::new_simple_literal("1"))));
    }

    #[test]
    fn canonical_form_is_applied() {
        assert_eq!(
            typed("007", xsd::INTEGER).into_canonical(),
            typed("7", xsd::INTEGER)
        );
        assert_eq!(
            typed("abc", xsd::INTEGER).into_canonical(),
            typed("abc", xsd::INTEGER)
        );
    }

    #[test]
    fn internal_objects_compare_by_allocation() {
        let object = InternalObject::new("list", vec![1, 2, 3]);
        let other = InternalObject::new("list", vec![1, 2, 3]);
        assert_eq!(object, object.clone());
        assert_ne!(object, other);
        assert_eq!(object.downcast_ref::<Vec<i32>>(), Some(&vec![1, 2, 3]));
        assert_eq!(Term::Object(object).to_string(), "[list]");
    }
}
