//! `DialectTag` → `sqlparser` dialect mapping.

use serde::{Deserialize, Serialize};
use sqlparser::dialect::{
    BigQueryDialect, Dialect, DuckDbDialect, GenericDialect, MsSqlDialect, MySqlDialect,
    PostgreSqlDialect, SQLiteDialect,
};

/// The SQL dialect a statement targets. Controls both parsing rules and
/// rendering rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DialectTag {
    Postgres,
    MySql,
    Sqlite,
    /// `sqlparser` ships no Oracle dialect; routed through `GenericDialect`.
    /// See `DialectTag::has_native_support`.
    Oracle,
    BigQuery,
    DuckDb,
    /// `sqlparser` ships no Cloud Spanner dialect; routed through
    /// `GenericDialect`, same caveat as `Oracle`.
    Spanner,
    MsSql,
    Generic,
}

impl DialectTag {
    /// Whether `sqlparser` has a dedicated dialect for this tag. When
    /// `false`, cross-dialect rendering (invariant 7, style round-trip) is
    /// not guaranteed and callers should not rely on it.
    #[must_use]
    pub const fn has_native_support(self) -> bool {
        !matches!(self, Self::Oracle | Self::Spanner)
    }

    #[must_use]
    pub fn parser_dialect(self) -> Box<dyn Dialect> {
        match self {
            Self::Postgres => Box::new(PostgreSqlDialect {}),
            Self::MySql => Box::new(MySqlDialect {}),
            Self::Sqlite => Box::new(SQLiteDialect {}),
            Self::BigQuery => Box::new(BigQueryDialect {}),
            Self::DuckDb => Box::new(DuckDbDialect {}),
            Self::MsSql => Box::new(MsSqlDialect {}),
            Self::Oracle | Self::Spanner | Self::Generic => Box::new(GenericDialect {}),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_dialects_are_flagged() {
        assert!(!DialectTag::Oracle.has_native_support());
        assert!(!DialectTag::Spanner.has_native_support());
        assert!(DialectTag::Postgres.has_native_support());
    }
}
