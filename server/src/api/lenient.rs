//! Integer fields that also accept numeric strings.
//!
//! Form submissions carry every value as text, and some JSON clients quote
//! numbers too. Use with `#[serde(default, deserialize_with = "...")]`.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};

const INVALID_INTEGER: &str = "A valid integer is required.";

struct IntegerVisitor;

impl<'de> Visitor<'de> for IntegerVisitor {
    type Value = Option<i64>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an integer")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Some(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        i64::try_from(v)
            .map(Some)
            .map_err(|_| E::custom(INVALID_INTEGER))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
            Ok(Some(v as i64))
        } else {
            Err(E::custom(INVALID_INTEGER))
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| E::custom(INVALID_INTEGER))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }
}

/// An optional integer; `null` and an absent key are both `None`.
pub fn optional_integer<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
{
    match deserializer.deserialize_any(IntegerVisitor)? {
        Some(n) => T::try_from(n)
            .map(Some)
            .map_err(|_| de::Error::custom(INVALID_INTEGER)),
        None => Ok(None),
    }
}

pub fn integer<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
{
    optional_integer(deserializer)?
        .ok_or_else(|| de::Error::custom(foodgram_core::error::REQUIRED))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "optional_integer")]
        minutes: Option<i64>,
        #[serde(deserialize_with = "integer")]
        id: i32,
    }

    fn parse(value: serde_json::Value) -> Result<Sample, String> {
        serde_json::from_value(value).map_err(|e| e.to_string())
    }

    #[test]
    fn test_numbers_and_numeric_strings() {
        let sample = parse(json!({"minutes": 20, "id": 3})).unwrap();
        assert_eq!((sample.minutes, sample.id), (Some(20), 3));

        let sample = parse(json!({"minutes": " 20 ", "id": "3"})).unwrap();
        assert_eq!((sample.minutes, sample.id), (Some(20), 3));

        let sample = parse(json!({"minutes": 20.0, "id": 3})).unwrap();
        assert_eq!(sample.minutes, Some(20));
    }

    #[test]
    fn test_absent_and_null() {
        let sample = parse(json!({"id": 1})).unwrap();
        assert_eq!(sample.minutes, None);
        let sample = parse(json!({"minutes": null, "id": 1})).unwrap();
        assert_eq!(sample.minutes, None);

        assert!(parse(json!({"id": null})).is_err());
    }

    #[test]
    fn test_rejects_non_integers() {
        for bad in [json!("abc"), json!(2.5), json!(true), json!([1])] {
            let err = parse(json!({"minutes": bad, "id": 1})).unwrap_err();
            assert!(err.contains("integer"), "{err}");
        }
        let err = parse(json!({"minutes": 1, "id": 3_000_000_000i64})).unwrap_err();
        assert_eq!(err, INVALID_INTEGER);
    }
}
