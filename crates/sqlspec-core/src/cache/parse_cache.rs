//! Parse cache: `(sql_text, dialect) -> AstNode`. Invalidated only by
//! process shutdown — a parsed `AstNode` is immutable and dialect-pure, so
//! nothing about a later pipeline run can make a cached parse stale.

use crate::ast::{AstNode, DialectTag};
use crate::error::SqlSpecResult;

use super::{CacheRegistry, Fingerprint};

fn key(sql: &str, dialect: DialectTag) -> Fingerprint {
    Fingerprint::combine(&[sql.as_bytes(), format!("{dialect:?}").as_bytes()])
}

pub fn get(
    registry: &CacheRegistry,
    sql: &str,
    dialect: DialectTag,
    required: bool,
) -> SqlSpecResult<Option<AstNode>> {
    registry.parse().get(&key(sql, dialect), required)
}

pub fn put(
    registry: &CacheRegistry,
    sql: &str,
    dialect: DialectTag,
    ast: AstNode,
    required: bool,
) -> SqlSpecResult<()> {
    registry.parse().put(key(sql, dialect), ast, required)
}
