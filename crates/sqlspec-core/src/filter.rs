//! Composable, deferred AST rewrites appended to a [`Statement`](crate::statement::Statement)'s
//! `extras`. A filter is just a `Transformer` run at the start of the next
//! pipeline pass, same as any built-in transformer.

use std::sync::Arc;

use crate::context::ProcessingContext;
use crate::params::{ParamOrigin, ParamSlot};
use crate::processor::{ProcessorOutcome, Transformer};
use crate::value::Value;

#[derive(Debug, Clone)]
pub struct OrderClause {
    pub column: String,
    pub descending: bool,
}

/// A deferred AST rewrite applied at the start of the next pipeline pass.
/// `LimitOffset` collapses on repeated application (last write wins);
/// `Search` and `OrderBy` accumulate — the Open Question 4 resolution.
#[derive(Clone)]
pub enum Filter {
    Search {
        column: String,
        value: String,
        case_insensitive: bool,
    },
    LimitOffset {
        limit: Option<i64>,
        offset: Option<i64>,
    },
    OrderBy(Vec<OrderClause>),
    Custom(Arc<dyn Fn(&mut ProcessingContext) -> ProcessorOutcome + Send + Sync>),
}

impl std::fmt::Debug for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Search {
                column,
                value,
                case_insensitive,
            } => f
                .debug_struct("Search")
                .field("column", column)
                .field("value", value)
                .field("case_insensitive", case_insensitive)
                .finish(),
            Self::LimitOffset { limit, offset } => f
                .debug_struct("LimitOffset")
                .field("limit", limit)
                .field("offset", offset)
                .finish(),
            Self::OrderBy(clauses) => f.debug_tuple("OrderBy").field(clauses).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl Filter {
    #[must_use]
    pub fn search(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Search {
            column: column.into(),
            value: value.into(),
            case_insensitive: true,
        }
    }

    #[must_use]
    pub fn limit(n: i64) -> Self {
        Self::LimitOffset {
            limit: Some(n),
            offset: None,
        }
    }

    #[must_use]
    pub fn order_by(column: impl Into<String>, descending: bool) -> Self {
        Self::OrderBy(vec![OrderClause {
            column: column.into(),
            descending,
        }])
    }

    /// Stable textual fingerprint input for the filter cache: two filters
    /// that would rewrite an AST identically produce the same descriptor.
    /// `Custom` filters are never cache-safe (a closure has no stable
    /// identity to hash), so they get a fresh descriptor every call,
    /// which in practice disables caching for that one `extras` entry.
    #[must_use]
    pub fn descriptor(&self) -> String {
        match self {
            Self::Search {
                column,
                value,
                case_insensitive,
            } => format!("search:{column}:{value}:{case_insensitive}"),
            Self::LimitOffset { limit, offset } => format!("limit_offset:{limit:?}:{offset:?}"),
            Self::OrderBy(clauses) => {
                let mut s = "order_by".to_string();
                for c in clauses {
                    s.push_str(&format!(":{}:{}", c.column, c.descending));
                }
                s
            }
            Self::Custom(f) => format!("custom:{:p}", Arc::as_ptr(f)),
        }
    }
}

impl Transformer for Filter {
    fn name(&self) -> &'static str {
        match self {
            Self::Search { .. } => "Filter::Search",
            Self::LimitOffset { .. } => "Filter::LimitOffset",
            Self::OrderBy(_) => "Filter::OrderBy",
            Self::Custom(_) => "Filter::Custom",
        }
    }

    fn process(&self, ctx: &mut ProcessingContext) -> ProcessorOutcome {
        match self {
            Self::Search {
                column,
                value,
                case_insensitive,
            } => {
                let Some(ast) = ctx.current_ast.as_mut() else {
                    return ProcessorOutcome::Skipped("no AST");
                };
                let position = ctx.extracted_params.len() + 1;
                let name = format!("filter_search_{position}");
                if !ast.add_search_predicate(column, &name, *case_insensitive) {
                    return ProcessorOutcome::Skipped("statement is not a query");
                }
                ctx.extracted_params.push(ParamSlot::new(
                    Some(name),
                    position,
                    Value::String(format!("%{value}%")),
                    ParamOrigin::Filter,
                ));
                ProcessorOutcome::Ok
            }
            Self::LimitOffset { limit, offset } => {
                let Some(ast) = ctx.current_ast.as_mut() else {
                    return ProcessorOutcome::Skipped("no AST");
                };
                ast.set_limit_offset(*limit, *offset);
                ProcessorOutcome::Ok
            }
            Self::OrderBy(clauses) => {
                let Some(ast) = ctx.current_ast.as_mut() else {
                    return ProcessorOutcome::Skipped("no AST");
                };
                for clause in clauses {
                    ast.add_order_by(&clause.column, clause.descending);
                }
                ProcessorOutcome::Ok
            }
            Self::Custom(f) => f(ctx),
        }
    }
}
