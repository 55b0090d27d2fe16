//! Conversion of raw step output into the declared output type.

use crate::error::{ChainError, Result};
use crate::value::Value;

/// Coerce `raw` into the type named by `declared` (`"string"` or `"number"`).
///
/// Numbers with no fractional part come back as [`Value::Integer`] when they
/// fit in an `i64`; everything else numeric is a [`Value::Float`].
///
/// # Example
///
/// ```
/// use chainrunner::coerce::coerce;
/// use chainrunner::value::Value;
///
/// assert_eq!(coerce("42", "number").unwrap(), Value::Integer(42));
/// assert_eq!(coerce("42", "string").unwrap(), Value::Text("42".into()));
/// ```
pub fn coerce(raw: &str, declared: &str) -> Result<Value> {
    match declared {
        "string" => Ok(Value::Text(raw.to_string())),
        "number" => parse_number(raw),
        other => Err(ChainError::UnsupportedOutputType(other.to_string())),
    }
}

fn parse_number(raw: &str) -> Result<Value> {
    let num: f64 = raw
        .trim()
        .parse()
        .map_err(|_| ChainError::NotANumber(raw.to_string()))?;

    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive.
    if num.is_finite() && num.fract() == 0.0 && num >= i64::MIN as f64 && num < i64::MAX as f64 {
        Ok(Value::Integer(num as i64))
    } else {
        Ok(Value::Float(num))
    }
}
