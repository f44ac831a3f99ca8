use kgram_model::vocab::xsd;
use kgram_model::{Literal, ThinError, ThinResult};
use oxsdatatypes::{Decimal, Double, Float, Integer};
use std::cmp::Ordering;

/// A numeric value of one of the four primitive XSD numeric types.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Numeric {
    Integer(Integer),
    Decimal(Decimal),
    Float(Float),
    Double(Double),
}

impl Numeric {
    pub fn is_zero(self) -> bool {
        match self {
            Numeric::Integer(value) => value == Integer::from(0),
            Numeric::Decimal(value) => value == Decimal::from(0),
            Numeric::Float(value) => value == Float::from(0.0_f32),
            Numeric::Double(value) => value == Double::from(0.0_f64),
        }
    }

    pub fn is_nan(self) -> bool {
        match self {
            Numeric::Integer(_) | Numeric::Decimal(_) => false,
            Numeric::Float(value) => value.is_nan(),
            Numeric::Double(value) => value.is_nan(),
        }
    }

    /// [op:numeric-add](https://www.w3.org/TR/xpath-functions-31/#func-numeric-add)
    pub fn checked_add(self, rhs: Numeric) -> ThinResult<Numeric> {
        match NumericPair::with_casts_from(self, rhs) {
            NumericPair::Integer(lhs, rhs) => lhs.checked_add(rhs).map(Numeric::Integer),
            NumericPair::Decimal(lhs, rhs) => lhs.checked_add(rhs).map(Numeric::Decimal),
            NumericPair::Float(lhs, rhs) => Some(Numeric::Float(lhs + rhs)),
            NumericPair::Double(lhs, rhs) => Some(Numeric::Double(lhs + rhs)),
        }
        .ok_or(ThinError::default())
    }

    /// [op:numeric-subtract](https://www.w3.org/TR/xpath-functions-31/#func-numeric-subtract)
    pub fn checked_sub(self, rhs: Numeric) -> ThinResult<Numeric> {
        match NumericPair::with_casts_from(self, rhs) {
            NumericPair::Integer(lhs, rhs) => lhs.checked_sub(rhs).map(Numeric::Integer),
            NumericPair::Decimal(lhs, rhs) => lhs.checked_sub(rhs).map(Numeric::Decimal),
            NumericPair::Float(lhs, rhs) => Some(Numeric::Float(lhs - rhs)),
            NumericPair::Double(lhs, rhs) => Some(Numeric::Double(lhs - rhs)),
        }
        .ok_or(ThinError::default())
    }

    /// [op:numeric-multiply](https://www.w3.org/TR/xpath-functions-31/#func-numeric-multiply)
    pub fn checked_mul(self, rhs: Numeric) -> ThinResult<Numeric> {
        match NumericPair::with_casts_from(self, rhs) {
            NumericPair::Integer(lhs, rhs) => lhs.checked_mul(rhs).map(Numeric::Integer),
            NumericPair::Decimal(lhs, rhs) => lhs.checked_mul(rhs).map(Numeric::Decimal),
            NumericPair::Float(lhs, rhs) => Some(Numeric::Float(lhs * rhs)),
            NumericPair::Double(lhs, rhs) => Some(Numeric::Double(lhs * rhs)),
        }
        .ok_or(ThinError::default())
    }

    /// [op:numeric-divide](https://www.w3.org/TR/xpath-functions-31/#func-numeric-divide)
    ///
    /// The division of two integers is a decimal.
    pub fn checked_div(self, rhs: Numeric) -> ThinResult<Numeric> {
        match NumericPair::with_casts_from(self, rhs) {
            NumericPair::Integer(lhs, rhs) => Decimal::from(lhs)
                .checked_div(Decimal::from(rhs))
                .map(Numeric::Decimal),
            NumericPair::Decimal(lhs, rhs) => lhs.checked_div(rhs).map(Numeric::Decimal),
            NumericPair::Float(lhs, rhs) => Some(Numeric::Float(lhs / rhs)),
            NumericPair::Double(lhs, rhs) => Some(Numeric::Double(lhs / rhs)),
        }
        .ok_or(ThinError::default())
    }

    pub fn checked_neg(self) -> ThinResult<Numeric> {
        match self {
            Numeric::Integer(value) => value.checked_neg().map(Numeric::Integer),
            Numeric::Decimal(value) => value.checked_neg().map(Numeric::Decimal),
            Numeric::Float(value) => Some(Numeric::Float(-value)),
            Numeric::Double(value) => Some(Numeric::Double(-value)),
        }
        .ok_or(ThinError::default())
    }

    pub fn checked_abs(self) -> ThinResult<Numeric> {
        match self {
            Numeric::Integer(value) => value.checked_abs().map(Numeric::Integer),
            Numeric::Decimal(value) => value.checked_abs().map(Numeric::Decimal),
            Numeric::Float(value) => Some(Numeric::Float(value.abs())),
            Numeric::Double(value) => Some(Numeric::Double(value.abs())),
        }
        .ok_or(ThinError::default())
    }

    pub fn checked_ceil(self) -> ThinResult<Numeric> {
        match self {
            Numeric::Integer(value) => Some(Numeric::Integer(value)),
            Numeric::Decimal(value) => value.checked_ceil().map(Numeric::Decimal),
            Numeric::Float(value) => Some(Numeric::Float(value.ceil())),
            Numeric::Double(value) => Some(Numeric::Double(value.ceil())),
        }
        .ok_or(ThinError::default())
    }

    pub fn checked_floor(self) -> ThinResult<Numeric> {
        match self {
            Numeric::Integer(value) => Some(Numeric::Integer(value)),
            Numeric::Decimal(value) => value.checked_floor().map(Numeric::Decimal),
            Numeric::Float(value) => Some(Numeric::Float(value.floor())),
            Numeric::Double(value) => Some(Numeric::Double(value.floor())),
        }
        .ok_or(ThinError::default())
    }

    pub fn checked_round(self) -> ThinResult<Numeric> {
        match self {
            Numeric::Integer(value) => Some(Numeric::Integer(value)),
            Numeric::Decimal(value) => value.checked_round().map(Numeric::Decimal),
            Numeric::Float(value) => Some(Numeric::Float(value.round())),
            Numeric::Double(value) => Some(Numeric::Double(value.round())),
        }
        .ok_or(ThinError::default())
    }

    /// Compares two numerics after promoting them to a common type.
    pub fn partial_cmp_numeric(self, rhs: Numeric) -> Option<Ordering> {
        match NumericPair::with_casts_from(self, rhs) {
            NumericPair::Integer(lhs, rhs) => Some(lhs.cmp(&rhs)),
            NumericPair::Decimal(lhs, rhs) => Some(lhs.cmp(&rhs)),
            NumericPair::Float(lhs, rhs) => lhs.partial_cmp(&rhs),
            NumericPair::Double(lhs, rhs) => lhs.partial_cmp(&rhs),
        }
    }

    pub fn into_literal(self) -> Literal {
        match self {
            Numeric::Integer(value) => Literal::new_typed_literal(value.to_string(), xsd::INTEGER),
            Numeric::Decimal(value) => Literal::new_typed_literal(value.to_string(), xsd::DECIMAL),
            Numeric::Float(value) => Literal::new_typed_literal(value.to_string(), xsd::FLOAT),
            Numeric::Double(value) => Literal::new_typed_literal(value.to_string(), xsd::DOUBLE),
        }
    }
}

impl From<Integer> for Numeric {
    fn from(value: Integer) -> Self {
        Numeric::Integer(value)
    }
}

/// Two numerics promoted to their common type (integer < decimal < float < double).
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NumericPair {
    Integer(Integer, Integer),
    Decimal(Decimal, Decimal),
    Float(Float, Float),
    Double(Double, Double),
}

impl NumericPair {
    pub fn with_casts_from(lhs: Numeric, rhs: Numeric) -> NumericPair {
        match (lhs, rhs) {
            (Numeric::Integer(lhs), Numeric::Integer(rhs)) => NumericPair::Integer(lhs, rhs),
            (Numeric::Integer(lhs), Numeric::Decimal(rhs)) => {
                NumericPair::Decimal(Decimal::from(lhs), rhs)
            }
            (Numeric::Integer(lhs), Numeric::Float(rhs)) => NumericPair::Float(Float::from(lhs), rhs),
            (Numeric::Integer(lhs), Numeric::Double(rhs)) => {
                NumericPair::Double(Double::from(lhs), rhs)
            }
            (Numeric::Decimal(lhs), Numeric::Integer(rhs)) => {
                NumericPair::Decimal(lhs, Decimal::from(rhs))
            }
            (Numeric::Decimal(lhs), Numeric::Decimal(rhs)) => NumericPair::Decimal(lhs, rhs),
            (Numeric::Decimal(lhs), Numeric::Float(rhs)) => NumericPair::Float(Float::from(lhs), rhs),
            (Numeric::Decimal(lhs), Numeric::Double(rhs)) => {
                NumericPair::Double(Double::from(lhs), rhs)
            }
            (Numeric::Float(lhs), Numeric::Integer(rhs)) => NumericPair::Float(lhs, Float::from(rhs)),
            (Numeric::Float(lhs), Numeric::Decimal(rhs)) => NumericPair::Float(lhs, Float::from(rhs)),
            (Numeric::Float(lhs), Numeric::Float(rhs)) => NumericPair::Float(lhs, rhs),
            (Numeric::Float(lhs), Numeric::Double(rhs)) => NumericPair::Double(Double::from(lhs), rhs),
            (Numeric::Double(lhs), Numeric::Integer(rhs)) => {
                NumericPair::Double(lhs, Double::from(rhs))
            }
            (Numeric::Double(lhs), Numeric::Decimal(rhs)) => {
                NumericPair::Double(lhs, Double::from(rhs))
            }
            (Numeric::Double(lhs), Numeric::Float(rhs)) => NumericPair::Double(lhs, Double::from(rhs)),
            (Numeric::Double(lhs), Numeric::Double(rhs)) => NumericPair::Double(lhs, rhs),
        }
    }
}
