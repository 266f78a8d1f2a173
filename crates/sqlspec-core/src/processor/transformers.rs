//! Built-in transformers. Each rewrites `ctx.current_ast` and/or appends to
//! `ctx.extracted_params`; none touch `ctx.validation` except
//! `ForceWhereClause`, documented below as the one deliberate exception.

use logging::debug;

use crate::ast::AstNode;
use crate::context::ProcessingContext;
use crate::params::{ParamOrigin, ParamSlot};
use crate::validation::{Issue, IssueKind, Risk, Verdict};

use super::{ProcessorOutcome, Transformer};

/// Strips SQL comments from `ctx.raw_sql`. A no-op at the AST level —
/// `sqlparser` discards comment trivia during tokenization, so
/// `ctx.current_ast` never carries comments to begin with — but
/// `ctx.raw_sql` still holds the original source text, and `InjectionDetector`
/// scans that text directly (unbalanced quotes, concatenation markers).
/// Stripping comments here before that scan runs is the actual
/// attack-surface reduction: a comment hiding unbalanced quoting or a
/// concatenation marker no longer reaches the raw-text heuristics.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommentRemover;

impl Transformer for CommentRemover {
    fn name(&self) -> &'static str {
        "CommentRemover"
    }

    fn process(&self, ctx: &mut ProcessingContext) -> ProcessorOutcome {
        if ctx.current_ast.is_none() {
            return ProcessorOutcome::Skipped("no AST");
        }
        let Some(raw) = ctx.raw_sql.as_deref() else {
            return ProcessorOutcome::Skipped("no raw SQL to strip");
        };
        ctx.raw_sql = Some(AstNode::strip_comments(raw));
        ProcessorOutcome::Ok
    }
}

/// Strips dialect-specific optimizer hints (`/*+ ... */`). Same
/// confirmatory no-op as `CommentRemover`: hints are lexed as block
/// comments by `sqlparser` and are gone before the AST exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct HintRemover;

impl Transformer for HintRemover {
    fn name(&self) -> &'static str {
        "HintRemover"
    }

    fn process(&self, ctx: &mut ProcessingContext) -> ProcessorOutcome {
        if ctx.current_ast.is_none() {
            return ProcessorOutcome::Skipped("no AST");
        }
        ProcessorOutcome::Ok
    }
}

/// Walks the AST replacing literal scalars in expression positions with
/// fresh named placeholders, appending each replaced value to
/// `ctx.extracted_params`. Runs unconditionally, including in batch mode
/// with no input placeholders, so every row in a batch renders to the same
/// parameter shape — the Open Question 1 resolution.
#[derive(Debug, Clone)]
pub struct ParameterizeLiterals {
    pub name_prefix: String,
}

impl Default for ParameterizeLiterals {
    fn default() -> Self {
        Self {
            name_prefix: "lit".to_string(),
        }
    }
}

impl Transformer for ParameterizeLiterals {
    fn name(&self) -> &'static str {
        "ParameterizeLiterals"
    }

    fn process(&self, ctx: &mut ProcessingContext) -> ProcessorOutcome {
        let Some(ast) = ctx.current_ast.as_mut() else {
            return ProcessorOutcome::Skipped("no AST");
        };
        let extracted = ast.replace_literals_with_placeholders(&self.name_prefix);
        if extracted.is_empty() {
            return ProcessorOutcome::Ok;
        }
        for (name, value) in extracted {
            let position = ctx.extracted_params.len() + 1;
            ctx.extracted_params.push(ParamSlot::new(
                Some(name),
                position,
                value,
                ParamOrigin::ExtractedLiteral,
            ));
        }
        ProcessorOutcome::Ok
    }
}

/// Appends a structured, single-line trace comment to the rendered SQL.
/// Stashed on `ctx.trailing_comment` rather than written into the AST,
/// since `sqlparser` retains no comment trivia for a normal render to
/// carry forward — the pipeline splices it onto the final rendered text.
#[derive(Debug, Clone)]
pub struct TracingComment {
    pub origin: String,
}

impl TracingComment {
    #[must_use]
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
        }
    }
}

impl Transformer for TracingComment {
    fn name(&self) -> &'static str {
        "TracingComment"
    }

    fn process(&self, ctx: &mut ProcessingContext) -> ProcessorOutcome {
        ctx.trailing_comment = Some(format!("-- origin={}", self.origin));
        ProcessorOutcome::Ok
    }
}

/// If the AST is `Update`/`Delete` and lacks a `WHERE` clause, raises a
/// validation issue directly rather than mutating the statement — the one
/// documented exception to "transformers don't touch validation", because
/// inserting a synthetic `WHERE` would change the statement's meaning in a
/// way silent rewriting should never do.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForceWhereClause;

impl Transformer for ForceWhereClause {
    fn name(&self) -> &'static str {
        "ForceWhereClause"
    }

    fn process(&self, ctx: &mut ProcessingContext) -> ProcessorOutcome {
        let Some(ast) = ctx.current_ast.as_ref() else {
            return ProcessorOutcome::Skipped("no AST");
        };
        if ast.dml_missing_where() {
            debug!("ForceWhereClause: statement is missing a WHERE clause");
            ctx.validation.push(Issue::new(
                IssueKind::MissingWhere,
                Verdict::Warning,
                Risk::Medium,
                "ForceWhereClause",
                "UPDATE/DELETE statement has no WHERE clause",
            ));
        }
        ProcessorOutcome::Ok
    }
}
