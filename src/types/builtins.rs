//! Built-in irreducible types. Component resolution keys off these names.
use chrono::{DateTime, NaiveDate, NaiveTime};
use serde_json::Value;

use super::Type;

pub const STRING: &str = "String";
pub const NUMBER: &str = "Number";
pub const INTEGER: &str = "Integer";
pub const BOOLEAN: &str = "Boolean";
pub const DATE: &str = "Date";
pub const ANY: &str = "Any";
pub const NIL: &str = "Nil";

pub fn string() -> Type { Type::irreducible(STRING, Value::is_string) }

pub fn number() -> Type { Type::irreducible(NUMBER, Value::is_number) }

pub fn integer() -> Type {
    Type::irreducible(INTEGER, |v| v.is_i64() || v.is_u64())
}

pub fn boolean() -> Type { Type::irreducible(BOOLEAN, Value::is_boolean) }

/// Dates travel as ISO-8601 text (`2024-02-29`, `13:05:00`, or RFC 3339).
pub fn date() -> Type {
    Type::irreducible(DATE, |v| v.as_str().is_some_and(|s| parse_temporal(s).is_some()))
}

pub fn any() -> Type { Type::irreducible(ANY, |_| true) }

pub fn nil() -> Type { Type::irreducible(NIL, Value::is_null) }

/// Canonical text of a date, time or datetime, or `None` if unparseable.
pub fn parse_temporal(s: &str) -> Option<String> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d.format("%Y-%m-%d").to_string());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.to_rfc3339());
    }
    for fmt in ["%H:%M:%S", "%H:%M"] {
        if let Ok(t) = NaiveTime::parse_from_str(s, fmt) {
            return Some(t.format("%H:%M:%S").to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integer_rejects_fractions() {
        assert!(integer().is(&json!(3)));
        assert!(!integer().is(&json!(3.5)));
        assert!(number().is(&json!(3.5)));
    }

    #[test]
    fn dates_are_canonicalised() {
        assert_eq!(parse_temporal("2024-02-29").as_deref(), Some("2024-02-29"));
        assert_eq!(parse_temporal("2023-02-29"), None);
        assert_eq!(parse_temporal("9:05").as_deref(), Some("09:05:00"));
        assert!(parse_temporal("2024-01-01T10:00:00Z").is_some());
        assert!(date().is(&json!("2024-01-31")));
        assert!(!date().is(&json!(20240131)));
    }
}
