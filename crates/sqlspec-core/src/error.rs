//! Boundary error taxonomy. Every error that can cross out of the pipeline
//! is a variant of [`SqlSpecError`]; no other error type escapes the crate.

use crate::validation::ValidationResult;

#[derive(Debug, Clone, thiserror::Error)]
pub enum SqlSpecError {
    #[error("failed to parse SQL: {reason}")]
    ParseError { reason: String },

    #[error("placeholder styles are mixed in the statement and allow_mixed_styles is false")]
    ParamStyleMismatch,

    #[error("expected {expected} parameter(s), received {actual}")]
    ParamArityMismatch { expected: usize, actual: usize },

    #[error("parameter slot `{slot}` has no bound value")]
    ParamMissing { slot: String },

    #[error("parameter `{name}` was bound to two different values")]
    ParamConflict { name: String },

    #[error("validation failed with verdict Unsafe ({issue_count} issue(s))")]
    ValidationFailure {
        result: Box<ValidationResult>,
        issue_count: usize,
    },

    #[error("pipeline run was cancelled")]
    Cancelled,

    #[error("cache `{cache}` is unavailable and is marked required")]
    CacheUnavailable { cache: &'static str },
}

pub type SqlSpecResult<T> = Result<T, SqlSpecError>;
