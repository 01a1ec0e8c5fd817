//! Small helpers shared by the models and the engine

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Today's date as an ISO calendar date string (YYYY-MM-DD)
pub fn today_iso() -> String {
    chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string()
}

/// Parse a record date.
///
/// Accepts a plain calendar date (`2024-03-15`) or anything that starts
/// with one, such as an RFC 3339 timestamp (`2024-03-15T10:00:00Z`).
pub fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let head = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// Lenient numeric decoding for records written by other clients.
///
/// Absent, null, non-numeric or non-finite values decode as zero; numeric
/// strings are parsed.
pub mod lenient {
    use super::*;
    use serde::de::DeserializeOwned;

    fn as_f64(value: &Value) -> f64 {
        let n = match value {
            Value::Number(n) => n.as_f64().unwrap_or_default(),
            Value::String(s) => s.trim().parse::<f64>().unwrap_or_default(),
            _ => 0.0,
        };
        if n.is_finite() { n } else { 0.0 }
    }

    pub fn f64_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().map(as_f64).unwrap_or_default())
    }

    pub fn i64_or_zero<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.as_ref().map(|v| as_f64(v).trunc() as i64).unwrap_or_default())
    }

    pub fn string_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        })
    }

    /// Decodes each element on its own; elements that fail are dropped and
    /// a non-array value decodes as empty
    pub fn vec_or_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::Array(elements)) => elements
                .into_iter()
                .filter_map(|element| serde_json::from_value(element).ok())
                .collect(),
            _ => Vec::new(),
        })
    }

    pub fn bool_or_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(matches!(value, Some(Value::Bool(true))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Counts {
        #[serde(default, deserialize_with = "lenient::f64_or_zero")]
        amount: f64,
        #[serde(default, deserialize_with = "lenient::i64_or_zero")]
        stock: i64,
    }

    #[test]
    fn test_parse_iso_date() {
        assert_eq!(
            parse_iso_date("2024-03-15"),
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
        assert_eq!(
            parse_iso_date("2024-03-15T23:59:00Z"),
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
        assert_eq!(parse_iso_date("15/03/2024"), None);
        assert_eq!(parse_iso_date(""), None);
    }

    #[test]
    fn test_lenient_numbers() {
        let p: Counts = serde_json::from_str(r#"{"amount": "12.5", "stock": 3}"#).unwrap();
        assert_eq!(p.amount, 12.5);
        assert_eq!(p.stock, 3);

        let p: Counts = serde_json::from_str(r#"{"amount": null, "stock": "abc"}"#).unwrap();
        assert_eq!(p.amount, 0.0);
        assert_eq!(p.stock, 0);

        let p: Counts = serde_json::from_str("{}").unwrap();
        assert_eq!(p.amount, 0.0);
        assert_eq!(p.stock, 0);
    }

    #[derive(Deserialize)]
    struct Line {
        #[serde(default, deserialize_with = "lenient::f64_or_zero")]
        price: f64,
    }

    #[derive(Deserialize)]
    struct Lines {
        #[serde(default, deserialize_with = "lenient::vec_or_empty")]
        lines: Vec<Line>,
    }

    #[test]
    fn test_lenient_vec_drops_bad_elements_only() {
        let l: Lines =
            serde_json::from_str(r#"{"lines": [{"price": 5}, "junk", 3, {"price": "x"}]}"#).unwrap();
        assert_eq!(l.lines.len(), 2);
        assert_eq!(l.lines[0].price, 5.0);
        assert_eq!(l.lines[1].price, 0.0);

        let l: Lines = serde_json::from_str(r#"{"lines": "junk"}"#).unwrap();
        assert!(l.lines.is_empty());
        let l: Lines = serde_json::from_str(r#"{"lines": null}"#).unwrap();
        assert!(l.lines.is_empty());
    }

    #[test]
    fn test_today_is_parseable() {
        assert!(parse_iso_date(&today_iso()).is_some());
    }
}
