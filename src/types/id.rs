//! Integers that clients may send as JSON numbers or numeric strings

use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;

/// An integer accepted as `7` or `"7"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct LooseInt(pub i64);

impl LooseInt {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for LooseInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i64> for LooseInt {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl<'de> Deserialize<'de> for LooseInt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct Visitor;

        impl de::Visitor<'_> for Visitor {
            type Value = LooseInt;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an integer or a numeric string")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<LooseInt, E> {
                Ok(LooseInt(v))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<LooseInt, E> {
                i64::try_from(v)
                    .map(LooseInt)
                    .map_err(|_| E::custom("integer out of range"))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<LooseInt, E> {
                if v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
                    Ok(LooseInt(v as i64))
                } else {
                    Err(E::custom("expected a whole number"))
                }
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<LooseInt, E> {
                v.trim()
                    .parse::<i64>()
                    .map(LooseInt)
                    .map_err(|_| E::custom(format!("'{v}' is not a number")))
            }
        }

        deserializer.deserialize_any(Visitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Body {
        id: Option<LooseInt>,
    }

    fn parse(json: &str) -> Option<i64> {
        serde_json::from_str::<Body>(json).unwrap().id.map(LooseInt::get)
    }

    #[test]
    fn test_accepts_numbers_and_strings() {
        assert_eq!(parse(r#"{"id": 4}"#), Some(4));
        assert_eq!(parse(r#"{"id": "4"}"#), Some(4));
        assert_eq!(parse(r#"{"id": " 12 "}"#), Some(12));
        assert_eq!(parse(r#"{"id": 3.0}"#), Some(3));
        assert_eq!(parse(r#"{}"#), None);
        assert_eq!(parse(r#"{"id": null}"#), None);
    }

    #[test]
    fn test_rejects_non_numeric() {
        assert!(serde_json::from_str::<Body>(r#"{"id": "abc"}"#).is_err());
        assert!(serde_json::from_str::<Body>(r#"{"id": 1.5}"#).is_err());
        assert!(serde_json::from_str::<Body>(r#"{"id": true}"#).is_err());
    }
}
