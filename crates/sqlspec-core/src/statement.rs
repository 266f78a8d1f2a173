//! The public handle: an immutable statement plus a lazily-computed,
//! once-only pipeline result, scoped to one statement instance via an
//! `OnceLock`-backed exactly-once initialization.

use std::sync::{Arc, OnceLock};

use crate::analysis::AnalysisRecord;
use crate::ast::{AstNode, DialectTag, StatementKind};
use crate::cache::Fingerprint;
use crate::config::StatementConfig;
use crate::context::ProcessingContext;
use crate::error::{SqlSpecError, SqlSpecResult};
use crate::filter::Filter;
use crate::params::{DetectedStyle, ParamBag, PlaceholderStyle, detect_style};
use crate::pipeline::{self, CancellationToken};
use crate::validation::ValidationResult;

/// Outcome of one pipeline run, owned by the [`Statement`] that produced
/// it. Everything here is immutable once observable.
#[derive(Clone)]
pub struct ProcessedState {
    pub final_ast: Option<AstNode>,
    pub final_params: ParamBag,
    pub validation: ValidationResult,
    pub analysis: Option<AnalysisRecord>,
    pub fingerprint: Fingerprint,
    pub trailing_comment: Option<String>,
}

/// An immutable SQL statement plus configuration. Every modifier method
/// returns a new `Statement` with a cleared lazy cell; nothing here is
/// ever mutated in place.
#[derive(Clone)]
pub struct Statement {
    raw_sql: Option<String>,
    ast_seed: Option<AstNode>,
    initial_params: ParamBag,
    dialect: DialectTag,
    config: Arc<StatementConfig>,
    extras: Vec<Filter>,
    input_had_placeholders: bool,
    is_many: bool,
    is_script: bool,
    cancellation: Option<CancellationToken>,
    processed: Arc<OnceLock<SqlSpecResult<ProcessedState>>>,
}

impl Statement {
    #[must_use]
    pub fn new(
        sql: impl Into<String>,
        params: ParamBag,
        config: Arc<StatementConfig>,
        dialect: DialectTag,
    ) -> Self {
        let sql = sql.into();
        let input_had_placeholders = !matches!(detect_style(&sql), DetectedStyle::None);
        Self {
            raw_sql: Some(sql),
            ast_seed: None,
            initial_params: params,
            dialect,
            config,
            extras: Vec::new(),
            input_had_placeholders,
            is_many: false,
            is_script: false,
            cancellation: None,
            processed: Arc::new(OnceLock::new()),
        }
    }

    /// Constructs a statement directly from a builder-produced AST rather
    /// than source text. `input_had_placeholders` is always `true`: a
    /// builder only ever produces placeholder expressions, never inline
    /// literals.
    #[must_use]
    pub fn from_ast(
        ast: AstNode,
        params: ParamBag,
        config: Arc<StatementConfig>,
        dialect: DialectTag,
    ) -> Self {
        Self {
            raw_sql: None,
            ast_seed: Some(ast),
            initial_params: params,
            dialect,
            config,
            extras: Vec::new(),
            input_had_placeholders: true,
            is_many: false,
            is_script: false,
            cancellation: None,
            processed: Arc::new(OnceLock::new()),
        }
    }

    fn derived(&self, extras: Vec<Filter>) -> Self {
        Self {
            raw_sql: self.raw_sql.clone(),
            ast_seed: self.ast_seed.clone(),
            initial_params: self.initial_params.clone(),
            dialect: self.dialect,
            config: Arc::clone(&self.config),
            extras,
            input_had_placeholders: self.input_had_placeholders,
            is_many: self.is_many,
            is_script: self.is_script,
            cancellation: self.cancellation.clone(),
            processed: Arc::new(OnceLock::new()),
        }
    }

    #[must_use]
    pub fn with_filter(&self, filter: Filter) -> Self {
        let mut extras = self.extras.clone();
        extras.push(filter);
        self.derived(extras)
    }

    #[must_use]
    pub fn where_(&self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_filter(Filter::search(column, value))
    }

    #[must_use]
    pub fn limit(&self, n: i64) -> Self {
        self.with_filter(Filter::limit(n))
    }

    #[must_use]
    pub fn order_by(&self, column: impl Into<String>, descending: bool) -> Self {
        self.with_filter(Filter::order_by(column, descending))
    }

    #[must_use]
    pub fn with_config(&self, config: Arc<StatementConfig>) -> Self {
        let mut next = self.derived(self.extras.clone());
        next.config = config;
        next
    }

    #[must_use]
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        let mut next = self.derived(self.extras.clone());
        next.cancellation = Some(token);
        next
    }

    #[must_use]
    pub fn as_many(&self) -> Self {
        let mut next = self.derived(self.extras.clone());
        next.is_many = true;
        next
    }

    #[must_use]
    pub fn as_script(&self) -> Self {
        let mut next = self.derived(self.extras.clone());
        next.is_script = true;
        next
    }

    fn ensure_processed(&self) -> &SqlSpecResult<ProcessedState> {
        self.processed.get_or_init(|| {
            let mut ctx = ProcessingContext::new(
                self.raw_sql.clone(),
                self.initial_params.clone(),
                self.dialect,
                Arc::clone(&self.config),
                self.input_had_placeholders,
                self.is_many,
                self.is_script,
            );
            ctx.current_ast = self.ast_seed.clone();
            pipeline::run(&mut ctx, &self.extras, self.cancellation.as_ref())
        })
    }

    /// Renders the final SQL under `style`, appending the
    /// `TracingComment` trailer if one was set. Triggers the pipeline on
    /// first access.
    pub fn sql_for(&self, style: PlaceholderStyle) -> SqlSpecResult<String> {
        match self.ensure_processed() {
            Ok(state) => {
                let Some(ast) = &state.final_ast else {
                    return Ok(String::new());
                };
                let rendered = ast.render(style, Some(&state.final_params));
                Ok(match &state.trailing_comment {
                    Some(comment) => format!("{rendered}\n{comment}"),
                    None => rendered,
                })
            }
            Err(e) => Err(e.clone()),
        }
    }

    pub fn parameters(&self) -> SqlSpecResult<&ParamBag> {
        self.ensure_processed()
            .as_ref()
            .map(|s| &s.final_params)
            .map_err(Clone::clone)
    }

    pub fn validation(&self) -> SqlSpecResult<&ValidationResult> {
        self.ensure_processed()
            .as_ref()
            .map(|s| &s.validation)
            .map_err(Clone::clone)
    }

    pub fn analysis(&self) -> SqlSpecResult<Option<&AnalysisRecord>> {
        self.ensure_processed()
            .as_ref()
            .map(|s| s.analysis.as_ref())
            .map_err(Clone::clone)
    }

    pub fn kind(&self) -> SqlSpecResult<StatementKind> {
        match self.ensure_processed() {
            Ok(state) => Ok(state
                .final_ast
                .as_ref()
                .map_or(StatementKind::Other, AstNode::kind)),
            Err(e) => Err(e.clone()),
        }
    }

    pub fn fingerprint(&self) -> SqlSpecResult<Fingerprint> {
        self.ensure_processed()
            .as_ref()
            .map(|s| s.fingerprint)
            .map_err(Clone::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::validators::{InjectionDetector, TautologyDetector};
    use crate::validation::Verdict;

    #[test]
    fn simple_select_runs_once_and_is_safe() {
        let config = Arc::new(StatementConfig::default());
        let stmt = Statement::new("SELECT 1", ParamBag::new(), config, DialectTag::Postgres);
        assert_eq!(stmt.validation().unwrap().verdict, crate::validation::Verdict::Safe);
        assert_eq!(stmt.kind().unwrap(), StatementKind::Select);
    }

    #[test]
    fn modifiers_return_new_statement_with_fresh_cache() {
        let config = Arc::new(StatementConfig::default());
        let base = Statement::new("SELECT * FROM t", ParamBag::new(), config, DialectTag::Postgres);
        let _ = base.validation();
        let limited = base.limit(10);
        assert!(limited.sql_for(PlaceholderStyle::NumericDollar).unwrap().contains("LIMIT 10"));
    }

    #[test]
    fn strict_mode_tautology_raises_validation_failure() {
        let mut cfg = StatementConfig::default();
        cfg.validators.push(Arc::new(TautologyDetector));
        cfg.strict_mode = true;
        let stmt = Statement::new(
            "SELECT * FROM t WHERE 1=1",
            ParamBag::new(),
            Arc::new(cfg),
            DialectTag::Postgres,
        );
        assert!(matches!(
            stmt.validation(),
            Err(SqlSpecError::ValidationFailure { .. })
        ));
    }

    #[test]
    fn undeclared_stacked_statements_are_flagged_but_as_script_waives_it() {
        // Pipeline caching disabled: `is_script` is deliberately not part of
        // the pipeline cache key (spec §4.6 enumerates the key fields and
        // omits it), so the declared/undeclared variants below share SQL,
        // dialect and config and would otherwise collide on one cache entry.
        let mut cfg = StatementConfig::default();
        cfg.validators.push(Arc::new(InjectionDetector));
        cfg.cache_policy.pipeline_cache_enabled = false;
        let config = Arc::new(cfg);

        let undeclared = Statement::new(
            "SELECT 1; SELECT 2",
            ParamBag::new(),
            Arc::clone(&config),
            DialectTag::Postgres,
        );
        assert_eq!(undeclared.validation().unwrap().verdict, Verdict::Unsafe);

        let declared = Statement::new("SELECT 1; SELECT 2", ParamBag::new(), config, DialectTag::Postgres).as_script();
        assert_eq!(declared.validation().unwrap().verdict, Verdict::Safe);
    }
}
