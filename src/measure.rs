//! A numeric value that may not be observable.
//!
//! On the wire a known value is the bare number and an unknown value is the
//! string `"unknown"`.

use std::fmt;

use serde::de::{self, Deserialize, DeserializeOwned, Deserializer};
use serde::ser::{Serialize, Serializer};

const UNKNOWN: &str = "unknown";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Measure<T> {
    Known(T),
    Unknown,
}

impl<T> Default for Measure<T> {
    fn default() -> Self {
        Measure::Unknown
    }
}

impl<T> Measure<T> {
    pub fn is_known(&self) -> bool {
        matches!(self, Measure::Known(_))
    }

    pub fn known(self) -> Option<T> {
        match self {
            Measure::Known(v) => Some(v),
            Measure::Unknown => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Measure<U> {
        match self {
            Measure::Known(v) => Measure::Known(f(v)),
            Measure::Unknown => Measure::Unknown,
        }
    }

    /// Combine two measures; unknown on either side wins.
    pub fn zip_with<U, R>(self, other: Measure<U>, f: impl FnOnce(T, U) -> R) -> Measure<R> {
        match (self, other) {
            (Measure::Known(a), Measure::Known(b)) => Measure::Known(f(a, b)),
            _ => Measure::Unknown,
        }
    }

    pub fn unwrap_or(self, fallback: T) -> T {
        self.known().unwrap_or(fallback)
    }
}

/// Signed change from `before` to `after`.
///
/// Saturates at the `i64` range; byte and microsecond counters never get
/// close in practice.
pub fn delta(before: Measure<u64>, after: Measure<u64>) -> Measure<i64> {
    before.zip_with(after, |b, a| {
        let d = i128::from(a) - i128::from(b);
        i64::try_from(d).unwrap_or(if d < 0 { i64::MIN } else { i64::MAX })
    })
}

impl<T> From<Option<T>> for Measure<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Measure::Known(v),
            None => Measure::Unknown,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Measure<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Measure::Known(v) => v.fmt(f),
            Measure::Unknown => f.write_str(UNKNOWN),
        }
    }
}

impl<T: Serialize> Serialize for Measure<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Measure::Known(v) => v.serialize(serializer),
            Measure::Unknown => serializer.serialize_str(UNKNOWN),
        }
    }
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum Repr<T> {
    Value(T),
    Text(String),
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Measure<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Option::<Repr<T>>::deserialize(deserializer)? {
            None => Ok(Measure::Unknown),
            Some(Repr::Value(v)) => Ok(Measure::Known(v)),
            Some(Repr::Text(s)) if s == UNKNOWN => Ok(Measure::Unknown),
            Some(Repr::Text(s)) => Err(de::Error::custom(format!(
                "expected a number or \"{UNKNOWN}\", found \"{s}\""
            ))),
        }
    }
}
