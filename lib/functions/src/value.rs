use crate::Numeric;
use kgram_model::vocab::xsd;
use kgram_model::{Literal, NamedNode, Term, ThinError, ThinResult};
use oxsdatatypes::{Boolean, DateTime, Decimal, Double, Float, Integer};
use std::str::FromStr;

/// The value of a term as seen by the SPARQL operators.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TypedValue<'term> {
    NamedNode(&'term NamedNode),
    BlankNode,
    Boolean(bool),
    Numeric(Numeric),
    /// A simple literal, an `xsd:string` or a language-tagged string.
    String {
        value: &'term str,
        language: Option<&'term str>,
    },
    DateTime(DateTime),
    /// A literal whose datatype is not interpreted, or whose lexical form is invalid.
    Other(&'term Literal),
    Object,
}

impl<'term> TypedValue<'term> {
    pub fn from_term(term: &'term Term) -> Self {
        match term {
            Term::NamedNode(node) => TypedValue::NamedNode(node),
            Term::BlankNode(_) => TypedValue::BlankNode,
            Term::Literal(literal) => Self::from_literal(literal),
            Term::Object(_) => TypedValue::Object,
        }
    }

    pub fn from_literal(literal: &'term Literal) -> Self {
        let value = literal.value();
        if let Some(language) = literal.language() {
            return TypedValue::String {
                value,
                language: Some(language),
            };
        }
        let datatype = literal.datatype();
        let parsed = if datatype == xsd::STRING {
            Some(TypedValue::String {
                value,
                language: None,
            })
        } else if datatype == xsd::BOOLEAN {
            Boolean::from_str(value)
                .ok()
                .map(|v| TypedValue::Boolean(v.into()))
        } else if datatype == xsd::INTEGER || is_integer_datatype(datatype.as_str()) {
            Integer::from_str(value)
                .ok()
                .map(|v| TypedValue::Numeric(Numeric::Integer(v)))
        } else if datatype == xsd::DECIMAL {
            Decimal::from_str(value)
                .ok()
                .map(|v| TypedValue::Numeric(Numeric::Decimal(v)))
        } else if datatype == xsd::FLOAT {
            Float::from_str(value)
                .ok()
                .map(|v| TypedValue::Numeric(Numeric::Float(v)))
        } else if datatype == xsd::DOUBLE {
            Double::from_str(value)
                .ok()
                .map(|v| TypedValue::Numeric(Numeric::Double(v)))
        } else if datatype == xsd::DATE_TIME {
            DateTime::from_str(value).ok().map(TypedValue::DateTime)
        } else {
            None
        };
        parsed.unwrap_or(TypedValue::Other(literal))
    }

    pub fn as_numeric(self) -> ThinResult<Numeric> {
        match self {
            TypedValue::Numeric(numeric) => Ok(numeric),
            _ => ThinError::expected(),
        }
    }

    /// Returns the string and its language if the value is a string literal.
    pub fn as_string(self) -> ThinResult<(&'term str, Option<&'term str>)> {
        match self {
            TypedValue::String { value, language } => Ok((value, language)),
            _ => ThinError::expected(),
        }
    }

    /// Returns whether the value is a literal of the `rdf:langString` datatype.
    pub fn is_language_string(self) -> bool {
        matches!(
            self,
            TypedValue::String {
                language: Some(_),
                ..
            }
        )
    }
}

fn is_integer_datatype(iri: &str) -> bool {
    const DERIVED: [&str; 12] = [
        "byte",
        "short",
        "int",
        "long",
        "unsignedByte",
        "unsignedShort",
        "unsignedInt",
        "unsignedLong",
        "positiveInteger",
        "negativeInteger",
        "nonPositiveInteger",
        "nonNegativeInteger",
    ];
    iri.strip_prefix("http://www.w3.org/2001/XMLSchema#")
        .is_some_and(|local| DERIVED.contains(&local))
}
