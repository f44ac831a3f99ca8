use oxsdatatypes::{ParseDateTimeError, ParseDecimalError, TooLargeForDecimalError};
use std::num::{ParseFloatError, ParseIntError, TryFromIntError};
use std::str::ParseBoolError;
use thiserror::Error;

/// The outcome of a value computation that may have no value.
pub type ThinResult<T> = Result<T, ThinError>;

/// A value computation produced no value.
///
/// Type mismatches, failed casts, overflows and invalid lexical forms all end here. The
/// interpreter turns it into an unbound result, so the cause is not kept.
#[derive(Clone, Copy, Debug, Default, Error, PartialEq, Eq)]
#[error("the expression has no value")]
pub struct ThinError;

impl ThinError {
    /// A result without value.
    pub fn expected<T>() -> ThinResult<T> {
        Err(ThinError)
    }
}

/// Parse and conversion failures of lexical forms have no value.
macro_rules! no_value_on {
    ($($error:ty),* $(,)?) => {
        $(
            impl From<$error> for ThinError {
                fn from(_: $error) -> Self {
                    ThinError
                }
            }
        )*
    };
}

no_value_on!(
    ParseBoolError,
    ParseIntError,
    ParseFloatError,
    ParseDecimalError,
    ParseDateTimeError,
    TooLargeForDecimalError,
    TryFromIntError,
);
