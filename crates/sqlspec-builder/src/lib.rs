//! Fluent query builder and filter facade: constructs AST
//! fragments directly, without re-parsing, and hands them to the pipeline
//! through the same [`Statement`](sqlspec_core::Statement) entry point a
//! raw SQL string would use.

mod builder;

pub use builder::QueryBuilder;
pub use sqlspec_core::filter::{Filter, OrderClause};
