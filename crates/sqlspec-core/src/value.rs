//! Tagged scalar values that flow through the parameter registry.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use uuid::Uuid;

/// A bound parameter value. Mirrors the wire-level scalar tags a driver
/// would recognize; the pipeline never inspects `Json` payloads beyond
/// passing them through.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    String(String),
    Bytes(Vec<u8>),
    DateTime(NaiveDateTime),
    Date(NaiveDate),
    Time(NaiveTime),
    Uuid(Uuid),
    Json(serde_json::Value),
}

impl Value {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Renders the value as a SQL literal for `PlaceholderStyle::Static`.
    /// Quoting follows the conservative ANSI rules (doubled single quotes);
    /// dialect-specific escaping is left to the AST facade's own literal
    /// nodes wherever a full re-render is available.
    #[must_use]
    pub fn to_sql_literal(&self) -> String {
        match self {
            Self::Null => "NULL".to_string(),
            Self::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Decimal(d) => d.to_string(),
            Self::String(s) => format!("'{}'", s.replace('\'', "''")),
            Self::Bytes(b) => format!("X'{}'", hex_encode(b)),
            Self::DateTime(dt) => format!("'{}'", dt.format("%Y-%m-%d %H:%M:%S%.f")),
            Self::Date(d) => format!("'{}'", d.format("%Y-%m-%d")),
            Self::Time(t) => format!("'{}'", t.format("%H:%M:%S%.f")),
            Self::Uuid(u) => format!("'{u}'"),
            Self::Json(j) => format!("'{}'", j.to_string().replace('\'', "''")),
        }
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Bytes(b) => write!(f, "{}", hex_encode(b)),
            Self::DateTime(dt) => write!(f, "{dt}"),
            Self::Date(d) => write!(f, "{d}"),
            Self::Time(t) => write!(f, "{t}"),
            Self::Uuid(u) => write!(f, "{u}"),
            Self::Json(j) => write!(f, "{j}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_literal_escapes_quotes() {
        let v = Value::String("O'Brien".to_string());
        assert_eq!(v.to_sql_literal(), "'O''Brien'");
    }

    #[test]
    fn null_is_distinct_from_missing() {
        assert!(Value::Null.is_null());
        assert!(!Value::Int(0).is_null());
    }
}
