//! Raw request records.
//!
//! The presentation layer sends biomarker values as loosely typed key/value
//! pairs. Values may be numbers, numeric strings, junk strings or null;
//! coercion to `f64` never fails and maps anything unusable to NaN so the
//! imputer can fill it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A raw request: feature name → user-supplied value.
pub type Record = BTreeMap<String, RawValue>;

/// A single user-supplied value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    /// Numeric input.
    Number(f64),
    /// Textual input (may or may not parse as a number).
    Text(String),
    /// Boolean input; never numeric.
    Flag(bool),
    /// Explicit null / absent value.
    Missing,
}

impl RawValue {
    /// Coerce to a number; anything that isn't numeric becomes NaN.
    pub fn to_numeric(&self) -> f64 {
        match self {
            Self::Number(v) => *v,
            Self::Text(s) => s.trim().parse::<f64>().unwrap_or(f64::NAN),
            Self::Flag(_) | Self::Missing => f64::NAN,
        }
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<i64> for RawValue {
    fn from(v: i64) -> Self {
        Self::Number(v as f64)
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for RawValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Missing, Into::into)
    }
}

/// Build a [`Record`] from `(name, value)` pairs.
///
/// ```
/// use clarity::record::record;
///
/// let r = record([("age", 45.0.into()), ("bmi", "24.5".into())]);
/// assert_eq!(r["bmi"].to_numeric(), 24.5);
/// ```
pub fn record<I, K>(pairs: I) -> Record
where
    I: IntoIterator<Item = (K, RawValue)>,
    K: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_strings_parse() {
        assert_eq!(RawValue::from(" 12.5 ").to_numeric(), 12.5);
        assert_eq!(RawValue::from("7").to_numeric(), 7.0);
    }

    #[test]
    fn junk_becomes_nan() {
        assert!(RawValue::from("abc").to_numeric().is_nan());
        assert!(RawValue::Missing.to_numeric().is_nan());
        assert!(RawValue::Flag(true).to_numeric().is_nan());
    }

    #[test]
    fn deserialize_mixed_json() {
        let r: Record =
            serde_json::from_str(r#"{"age": 45, "bmi": "24.5", "hdl": null, "ldl": "n/a"}"#)
                .unwrap();
        assert_eq!(r["age"], RawValue::Number(45.0));
        assert_eq!(r["bmi"], RawValue::Text("24.5".into()));
        assert_eq!(r["hdl"], RawValue::Missing);
        assert!(r["ldl"].to_numeric().is_nan());
    }

    #[test]
    fn option_conversion() {
        assert_eq!(RawValue::from(None::<f64>), RawValue::Missing);
        assert_eq!(RawValue::from(Some(3.0)), RawValue::Number(3.0));
    }
}
