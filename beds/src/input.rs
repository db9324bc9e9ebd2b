//! Lenient request field parsing.
//!
//! Browser forms submit numbers as strings and leave optional fields as
//! empty strings. These helpers normalise both before validation.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, de::Error as _};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(i64),
    Float(f64),
    Text(String),
}

fn number<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Number(n)) => Ok(Some(n)),
        #[allow(clippy::cast_possible_truncation)]
        Some(NumberOrText::Float(f)) if f.fract() == 0.0 => Ok(Some(f as i64)),
        Some(NumberOrText::Float(f)) => Err(D::Error::custom(format!("expected an integer, got {f}"))),
        Some(NumberOrText::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            text.parse()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("expected an integer, got \"{text}\"")))
        }
    }
}

/// Integer given as a JSON number or numeric string; `""` and `null` are
/// absent.
///
/// # Errors
///
/// Fails on non-numeric text.
pub fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    number(deserializer)
}

/// 32-bit variant of [`lenient_i64`].
///
/// # Errors
///
/// Fails on non-numeric text or values out of range.
pub fn lenient_i32<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    number(deserializer)?
        .map(|n| i32::try_from(n).map_err(|_| D::Error::custom(format!("{n} is out of range"))))
        .transpose()
}

/// Trimmed string; blank strings are absent.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Parse a `YYYY-MM-DD` date. A trailing time part (`2025-03-01T10:00:00`)
/// is ignored.
pub(crate) fn parse_date(field: &str, value: &str) -> Result<NaiveDate, String> {
    let date_part = value.split(['T', ' ']).next().unwrap_or(value);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|_| format!("Invalid {field}: expected YYYY-MM-DD"))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "lenient_i64")]
        id: Option<i64>,
        #[serde(default, deserialize_with = "lenient_i32")]
        age: Option<i32>,
    }

    #[test]
    fn test_numbers_and_numeric_strings() {
        let p: Probe = serde_json::from_str(r#"{"id": "12", "age": 40}"#).unwrap();
        assert_eq!((p.id, p.age), (Some(12), Some(40)));
    }

    #[test]
    fn test_blank_and_missing_are_absent() {
        let p: Probe = serde_json::from_str(r#"{"id": "", "age": null}"#).unwrap();
        assert_eq!((p.id, p.age), (None, None));
        let p: Probe = serde_json::from_str("{}").unwrap();
        assert_eq!(p.id, None);
    }

    #[test]
    fn test_non_numeric_text_is_rejected() {
        assert!(serde_json::from_str::<Probe>(r#"{"id": "abc"}"#).is_err());
    }

    #[test]
    fn test_parse_date_accepts_datetime_suffix() {
        let date = parse_date("admission_date", "2025-03-01T10:00:00").unwrap();
        assert_eq!(date.to_string(), "2025-03-01");
        assert!(parse_date("admission_date", "03/01/2025").is_err());
    }

    #[test]
    fn test_non_empty_trims() {
        assert_eq!(non_empty(Some("  ".into())), None);
        assert_eq!(non_empty(Some(" Ana ".into())).as_deref(), Some("Ana"));
    }
}
