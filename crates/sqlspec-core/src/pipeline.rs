//! Drives a [`ProcessingContext`] through parse → transform → validate →
//! analyze, exactly once, producing a [`ProcessedState`]. Orchestration is
//! kept in one small, linear function rather than spread across trait
//! default methods.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use logging::{debug, warn};

use crate::ast::AstNode;
use crate::cache::filter_cache::CachedFilterApplication;
use crate::cache::pipeline_cache::{CachedPipelineOutcome, PipelineCacheKey, SlotShape};
use crate::cache::{filter_cache, parse_cache, pipeline_cache, CacheRegistry, Fingerprint};
use crate::context::{ProcessingContext, StatementPhase};
use crate::error::{SqlSpecError, SqlSpecResult};
use crate::filter::Filter;
use crate::params::{self, DetectedStyle, ParamOrigin, PlaceholderStyle, detect_style};
use crate::processor::{Analyzer, ProcessorOutcome, Transformer, Validator};
use crate::statement::ProcessedState;
use crate::validation::{Issue, IssueKind, Risk, Verdict};

/// Cooperative cancellation flag, checked between processor invocations.
#[derive(Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

fn check_cancellation(token: Option<&CancellationToken>) -> SqlSpecResult<()> {
    if token.is_some_and(CancellationToken::is_cancelled) {
        return Err(SqlSpecError::Cancelled);
    }
    Ok(())
}

fn run_transformer(t: &dyn Transformer, ctx: &mut ProcessingContext) {
    match t.process(ctx) {
        ProcessorOutcome::Ok => {}
        ProcessorOutcome::Skipped(reason) => debug!("{}: skipped ({reason})", t.name()),
        ProcessorOutcome::Err(msg) => {
            ctx.validation.push(Issue::new(
                IssueKind::ProcessorFailure,
                Verdict::Warning,
                Risk::Low,
                t.name(),
                msg,
            ));
        }
    }
}

/// Fingerprints the current AST for the filter cache key. Renders with
/// `NumericDollar`, which never needs bound values, so this is cheap and
/// side-effect-free regardless of what's actually bound yet.
fn ast_fingerprint(ast: &AstNode) -> Fingerprint {
    Fingerprint::of(ast.render(PlaceholderStyle::NumericDollar, None).as_bytes())
}

/// Applies one `extras` filter, consulting the filter cache first. On a
/// hit, replays the cached AST and replays the slots the filter extracted
/// last time, renumbered to land after whatever is already in
/// `ctx.extracted_params` on this run. On a miss, runs the filter
/// normally and stores the delta (new AST, newly extracted slots) it
/// produced.
fn apply_filter(filter: &Filter, ctx: &mut ProcessingContext, registry: &CacheRegistry) -> SqlSpecResult<()> {
    if !ctx.config.cache_policy.filter_cache_enabled {
        run_transformer(filter, ctx);
        return Ok(());
    }
    let Some(before) = ctx.current_ast.as_ref() else {
        run_transformer(filter, ctx);
        return Ok(());
    };
    let fp = ast_fingerprint(before);
    let descriptor = filter.descriptor();
    let required = ctx.config.cache_policy.required;
    if let Some(cached) = filter_cache::get(registry, fp, &descriptor, required)? {
        debug!("filter cache hit for {}", filter.name());
        ctx.current_ast = Some(cached.ast);
        let base = ctx.extracted_params.len();
        for (i, mut slot) in cached.extracted.into_iter().enumerate() {
            slot.position = base + i + 1;
            ctx.extracted_params.push(slot);
        }
    } else {
        let extracted_before = ctx.extracted_params.len();
        run_transformer(filter, ctx);
        if let Some(after) = ctx.current_ast.clone() {
            let extracted = ctx.extracted_params.slots()[extracted_before..].to_vec();
            filter_cache::put(
                registry,
                fp,
                &descriptor,
                CachedFilterApplication { ast: after, extracted },
                required,
            )?;
        }
    }
    Ok(())
}

fn run_validator(v: &dyn Validator, ctx: &mut ProcessingContext) {
    match v.process(ctx) {
        ProcessorOutcome::Ok => {}
        ProcessorOutcome::Skipped(reason) => debug!("{}: skipped ({reason})", v.name()),
        ProcessorOutcome::Err(msg) => {
            ctx.validation.push(Issue::new(
                IssueKind::ProcessorFailure,
                Verdict::Warning,
                Risk::Low,
                v.name(),
                msg,
            ));
        }
    }
}

fn run_analyzer(a: &dyn Analyzer, ctx: &mut ProcessingContext) {
    match a.process(ctx) {
        ProcessorOutcome::Ok => {}
        ProcessorOutcome::Skipped(reason) => debug!("{}: skipped ({reason})", a.name()),
        ProcessorOutcome::Err(msg) => {
            ctx.validation.push(Issue::new(
                IssueKind::ProcessorFailure,
                Verdict::Warning,
                Risk::Low,
                a.name(),
                msg,
            ));
        }
    }
}

/// Computes the pipeline-cache key for the current run, or `None` if
/// pipeline caching is disabled or there is no AST to key on yet (parsing
/// failed, or parsing is disabled with no builder-seeded AST supplied).
/// `parse_key` covers source identity (raw SQL + dialect, or the rendered
/// builder-seeded AST when there is no source text); everything else
/// covers what the configured pipeline run does to it.
fn cache_key(ctx: &ProcessingContext, extras: &[Filter]) -> Option<(Fingerprint, Vec<SlotShape>)> {
    if !ctx.config.cache_policy.pipeline_cache_enabled {
        return None;
    }
    let ast = ctx.current_ast.as_ref()?;
    let parse_key = match &ctx.raw_sql {
        Some(sql) => Fingerprint::combine(&[sql.as_bytes(), format!("{:?}", ctx.dialect).as_bytes()]),
        None => Fingerprint::of(ast.render(PlaceholderStyle::Static, Some(&ctx.initial_params)).as_bytes()),
    };
    let config_fingerprint = ctx.config.fingerprint();
    let descriptors: Vec<Vec<u8>> = extras.iter().map(|f| f.descriptor().into_bytes()).collect();
    let extras_fingerprint = Fingerprint::combine(
        &descriptors.iter().map(Vec::as_slice).collect::<Vec<_>>(),
    );
    let shape: Vec<SlotShape> = ctx
        .initial_params
        .slots()
        .iter()
        .map(|s| SlotShape {
            name: s.name.clone(),
            position: s.position,
        })
        .collect();
    let key = PipelineCacheKey {
        parse_key,
        config_fingerprint,
        extras_fingerprint,
        input_had_placeholders: ctx.input_had_placeholders,
        param_shape: &shape,
    };
    Some((pipeline_cache::key_fingerprint(&key), shape))
}

/// Re-binds `User`-origin slot values in a cached param bag from the
/// live caller's `initial_params`, leaving `ExtractedLiteral`/`Filter`
/// slots as cached (they are derived from the SQL text itself, which the
/// cache key already fingerprints).
fn rebind_params(mut cached: crate::params::ParamBag, initial: &crate::params::ParamBag) -> crate::params::ParamBag {
    for slot in cached.slots_mut() {
        if slot.origin != ParamOrigin::User {
            continue;
        }
        let live = slot
            .name
            .as_deref()
            .and_then(|n| initial.by_name(n))
            .or_else(|| initial.by_position(slot.position));
        if let Some(live) = live {
            slot.value = live.value.clone();
        }
    }
    cached
}

/// Runs the eight-step pipeline algorithm once over `ctx`, after first
/// rejecting a mixed placeholder style in the raw source. `extras` (the
/// statement's filters) run as transformers ahead of the configured
/// transformer chain: applying a filter is equivalent to running it as a
/// transformer at the start of the next pass. Consults the process-wide
/// parse and pipeline caches before doing any of that work, and populates
/// them on a miss.
pub fn run(
    ctx: &mut ProcessingContext,
    extras: &[Filter],
    cancellation: Option<&CancellationToken>,
) -> SqlSpecResult<ProcessedState> {
    let registry = crate::cache::global();

    // Step 0: reject mixed placeholder styles up front, per spec §4.1/§8,
    // unless the config explicitly opts into tolerating them.
    if !ctx.config.allow_mixed_styles {
        if let Some(sql) = ctx.raw_sql.as_deref() {
            if detect_style(sql) == DetectedStyle::Mixed {
                return Err(SqlSpecError::ParamStyleMismatch);
            }
        }
    }

    // Step 1: parse if needed, consulting the parse cache first.
    if ctx.current_ast.is_none() && ctx.config.parse_enabled {
        if let Some(sql) = ctx.raw_sql.clone() {
            let parse_cache_on = ctx.config.cache_policy.parse_cache_enabled;
            let required = ctx.config.cache_policy.required;
            let cached = if parse_cache_on {
                parse_cache::get(&registry, &sql, ctx.dialect, required)?
            } else {
                None
            };
            if let Some(ast) = cached {
                debug!("parse cache hit for dialect {:?}", ctx.dialect);
                ctx.current_ast = Some(ast);
                ctx.advance(StatementPhase::Parsed);
            } else {
                match AstNode::parse(&sql, ctx.dialect) {
                    Ok(ast) => {
                        if parse_cache_on {
                            parse_cache::put(&registry, &sql, ctx.dialect, ast.clone(), required)?;
                        }
                        ctx.current_ast = Some(ast);
                        ctx.advance(StatementPhase::Parsed);
                    }
                    Err(e) => {
                        let mut issues = crate::validation::ValidationAccumulator::new();
                        issues.push(Issue::new(
                            IssueKind::UnparsableStatement,
                            Verdict::Unsafe,
                            Risk::Critical,
                            "AstFacade",
                            e.to_string(),
                        ));
                        let result = issues.reduce();
                        if ctx.config.strict_mode {
                            let issue_count = result.issues.len();
                            return Err(SqlSpecError::ValidationFailure {
                                result: Box::new(result),
                                issue_count,
                            });
                        }
                        return Ok(ProcessedState {
                            final_ast: None,
                            final_params: ctx.initial_params.clone(),
                            validation: result,
                            analysis: None,
                            fingerprint: Fingerprint::of(sql.as_bytes()),
                            trailing_comment: None,
                        });
                    }
                }
            }
        }
    }
    check_cancellation(cancellation)?;

    // Pipeline cache: a hit skips transform/validate/analyze entirely,
    // re-binding only the live caller's `User`-origin parameter values
    // onto the cached shape.
    let cache_key = cache_key(ctx, extras);
    if let Some((key, _)) = &cache_key {
        if let Some(cached) =
            pipeline_cache::get_by_fingerprint(&registry, *key, ctx.config.cache_policy.required)?
        {
            debug!("pipeline cache hit");
            let final_params = rebind_params(cached.cached_params, &ctx.initial_params);
            let rendered = cached
                .final_ast
                .render(PlaceholderStyle::NumericDollar, Some(&final_params));
            let outcome = ProcessedState {
                final_ast: Some(cached.final_ast),
                final_params,
                validation: cached.validation,
                analysis: cached.analysis,
                fingerprint: Fingerprint::of(rendered.as_bytes()),
                trailing_comment: cached.trailing_comment,
            };
            if let Some(cb) = ctx.config.on_processed.clone() {
                let outcome_ref = &outcome;
                if std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| cb(outcome_ref))).is_err() {
                    warn!("on_processed callback panicked; swallowed per observability contract");
                }
            }
            return Ok(outcome);
        }
    }

    // Step 2: transformers — extras first, then the configured chain.
    for filter in extras {
        apply_filter(filter, ctx, &registry)?;
        check_cancellation(cancellation)?;
    }
    if ctx.config.transform_enabled {
        let transformers = ctx.config.transformers.clone();
        for t in &transformers {
            run_transformer(t.as_ref(), ctx);
            check_cancellation(cancellation)?;
        }
    }
    ctx.advance(StatementPhase::Transformed);

    // Step 3: finalize merged parameters.
    ctx.merged_params = Some(params::merge(&ctx.initial_params, &ctx.extracted_params)?);

    // Step 4: validators.
    if ctx.config.validate_enabled {
        let validators = ctx.config.validators.clone();
        for v in &validators {
            run_validator(v.as_ref(), ctx);
            check_cancellation(cancellation)?;
        }
    }
    ctx.advance(StatementPhase::Validated);

    // Step 5: reduce.
    let validation = std::mem::take(&mut ctx.validation).reduce();

    // Step 6: strict-mode short-circuit.
    if ctx.config.strict_mode && validation.verdict == Verdict::Unsafe {
        let issue_count = validation.issues.len();
        return Err(SqlSpecError::ValidationFailure {
            result: Box::new(validation),
            issue_count,
        });
    }

    // Step 7: analyzers.
    if ctx.config.analyze_enabled {
        let analyzers = ctx.config.analyzers.clone();
        for a in &analyzers {
            run_analyzer(a.as_ref(), ctx);
            check_cancellation(cancellation)?;
        }
    }
    ctx.advance(StatementPhase::Analyzed);

    // Step 8: package.
    let final_ast = ctx.current_ast.clone();
    let rendered = final_ast
        .as_ref()
        .map(|a| a.render(PlaceholderStyle::NumericDollar, ctx.merged_params.as_ref()))
        .unwrap_or_default();
    let outcome = ProcessedState {
        final_ast,
        final_params: ctx.merged_params.clone().unwrap_or_default(),
        validation,
        analysis: ctx.analysis.clone(),
        fingerprint: Fingerprint::of(rendered.as_bytes()),
        trailing_comment: ctx.trailing_comment.clone(),
    };

    if let (Some((key, _)), Some(final_ast)) = (&cache_key, &outcome.final_ast) {
        pipeline_cache::put_by_fingerprint(
            &registry,
            *key,
            CachedPipelineOutcome {
                final_ast: final_ast.clone(),
                cached_params: outcome.final_params.clone(),
                validation: outcome.validation.clone(),
                analysis: outcome.analysis.clone(),
                trailing_comment: outcome.trailing_comment.clone(),
            },
            ctx.config.cache_policy.required,
        )?;
    }

    if let Some(cb) = ctx.config.on_processed.clone() {
        let outcome_ref = &outcome;
        if std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| cb(outcome_ref))).is_err() {
            warn!("on_processed callback panicked; swallowed per observability contract");
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::DialectTag;
    use crate::cache;
    use crate::config::{CachePolicy, StatementConfig};
    use crate::params::ParamBag;
    use crate::validation::ValidationAccumulator;

    #[test]
    fn mixed_placeholder_styles_are_rejected_by_default() {
        let config = Arc::new(StatementConfig::default());
        let mut ctx = ProcessingContext::new(
            Some("SELECT * FROM t WHERE id = ? AND name = :name".to_string()),
            ParamBag::new(),
            DialectTag::Postgres,
            config,
            true,
            false,
            false,
        );
        assert!(matches!(run(&mut ctx, &[], None), Err(SqlSpecError::ParamStyleMismatch)));
    }

    #[test]
    fn mixed_placeholder_styles_pass_when_explicitly_allowed() {
        let mut cfg = StatementConfig::default();
        cfg.allow_mixed_styles = true;
        cfg.cache_policy.pipeline_cache_enabled = false;
        let mut ctx = ProcessingContext::new(
            Some("SELECT * FROM t WHERE id = ? AND name = :name".to_string()),
            ParamBag::new(),
            DialectTag::Postgres,
            Arc::new(cfg),
            true,
            false,
            false,
        );
        assert!(run(&mut ctx, &[], None).is_ok());
    }

    #[test]
    fn pipeline_cache_hit_returns_stored_outcome_without_recomputing() {
        let registry = cache::init_global(&CachePolicy::default());
        let config = Arc::new(StatementConfig::default());
        let mut ctx = ProcessingContext::new(
            Some("SELECT 1".to_string()),
            ParamBag::new(),
            DialectTag::Postgres,
            Arc::clone(&config),
            false,
            false,
            false,
        );
        ctx.current_ast = Some(AstNode::parse("SELECT 1", DialectTag::Postgres).unwrap());
        let (key, _) = cache_key(&ctx, &[]).expect("pipeline cache enabled by default");

        let mut sentinel = ValidationAccumulator::new();
        sentinel.push(Issue::new(
            IssueKind::ProcessorFailure,
            Verdict::Unsafe,
            Risk::Critical,
            "sentinel",
            "from cache",
        ));
        pipeline_cache::put_by_fingerprint(
            &registry,
            key,
            CachedPipelineOutcome {
                final_ast: ctx.current_ast.clone().unwrap(),
                cached_params: ParamBag::new(),
                validation: sentinel.reduce(),
                analysis: None,
                trailing_comment: None,
            },
            false,
        )
        .unwrap();

        let mut fresh_ctx = ProcessingContext::new(
            Some("SELECT 1".to_string()),
            ParamBag::new(),
            DialectTag::Postgres,
            config,
            false,
            false,
            false,
        );
        let outcome = run(&mut fresh_ctx, &[], None).unwrap();
        assert_eq!(outcome.validation.verdict, Verdict::Unsafe);
        assert_eq!(outcome.validation.issues[0].message, "from cache");
    }

    #[test]
    fn search_filter_application_populates_and_reuses_filter_cache() {
        let registry = cache::init_global(&CachePolicy::default());
        let config = Arc::new(StatementConfig::default());
        let base_ast = AstNode::parse("SELECT * FROM users", DialectTag::Postgres).unwrap();
        let filter = Filter::search("name", "alice");

        let mut ctx1 = ProcessingContext::new(None, ParamBag::new(), DialectTag::Postgres, Arc::clone(&config), true, false, false);
        ctx1.current_ast = Some(base_ast.clone());
        apply_filter(&filter, &mut ctx1, &registry).unwrap();
        assert_eq!(ctx1.extracted_params.len(), 1);

        let fp = ast_fingerprint(&base_ast);
        assert!(filter_cache::get(&registry, fp, &filter.descriptor(), false).unwrap().is_some());

        let mut ctx2 = ProcessingContext::new(None, ParamBag::new(), DialectTag::Postgres, Arc::clone(&config), true, false, false);
        ctx2.current_ast = Some(base_ast);
        apply_filter(&filter, &mut ctx2, &registry).unwrap();
        assert_eq!(ctx2.extracted_params.len(), 1);
        assert_eq!(
            ctx1.current_ast.as_ref().unwrap().render(PlaceholderStyle::NumericDollar, None),
            ctx2.current_ast.as_ref().unwrap().render(PlaceholderStyle::NumericDollar, None),
        );
        assert_eq!(
            ctx1.extracted_params.slots()[0].value,
            ctx2.extracted_params.slots()[0].value
        );
    }

    #[test]
    fn parse_cache_hit_returns_cached_ast_instead_of_reparsing() {
        let registry = cache::init_global(&CachePolicy::default());
        let sql = "SELECT * FROM orders";
        let marker_ast = AstNode::parse("SELECT 1 AS cache_marker", DialectTag::Postgres).unwrap();
        parse_cache::put(&registry, sql, DialectTag::Postgres, marker_ast, false).unwrap();

        let mut config = StatementConfig::all_stages_disabled();
        config.parse_enabled = true;
        config.cache_policy.pipeline_cache_enabled = false;
        let config = Arc::new(config);
        let mut ctx = ProcessingContext::new(Some(sql.to_string()), ParamBag::new(), DialectTag::Postgres, config, true, false, false);
        let outcome = run(&mut ctx, &[], None).unwrap();
        let rendered = outcome.final_ast.unwrap().render(PlaceholderStyle::NumericDollar, None);
        assert!(rendered.contains("cache_marker"));
    }
}
