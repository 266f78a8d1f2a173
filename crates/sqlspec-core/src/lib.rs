//! Core SQL statement processing: parse, transform, validate, and analyze
//! a statement through a configurable pipeline, caching results by
//! content fingerprint. See `Statement` for the public entry point.

pub mod analysis;
pub mod ast;
pub mod cache;
pub mod config;
pub mod context;
pub mod error;
pub mod filter;
pub mod params;
pub mod pipeline;
pub mod processor;
pub mod statement;
pub mod validation;
pub mod value;

pub use ast::{AstNode, DialectTag, StatementKind};
pub use cache::{global as global_cache, init_global as init_global_cache, shutdown_global as shutdown_global_cache, CacheRegistry};
pub use config::{CachePolicy, ConfigError, ProcessedCallback, StatementConfig, StatementConfigToml};
pub use error::{SqlSpecError, SqlSpecResult};
pub use filter::{Filter, OrderClause};
pub use params::{ParamBag, ParamOrigin, ParamSlot, PlaceholderStyle};
pub use pipeline::CancellationToken;
pub use statement::{ProcessedState, Statement};
pub use validation::{Issue, IssueKind, Risk, ValidationResult, Verdict};
pub use value::Value;
