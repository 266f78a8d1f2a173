//! The single built-in analyzer: a one-pass structural summary of the
//! final AST into `ctx.analysis`.

use crate::analysis::{AnalysisRecord, QualifiedName};
use crate::ast::JoinKind;
use crate::context::ProcessingContext;

use super::{Analyzer, ProcessorOutcome};

const AGGREGATE_NAMES: &[&str] = &[
    "COUNT", "SUM", "AVG", "MIN", "MAX", "ARRAY_AGG", "STRING_AGG", "GROUP_CONCAT", "BOOL_AND",
    "BOOL_OR", "VARIANCE", "STDDEV",
];

fn join_kind_label(kind: JoinKind) -> &'static str {
    match kind {
        JoinKind::Inner => "inner",
        JoinKind::Left => "left",
        JoinKind::Right => "right",
        JoinKind::Full => "full",
        JoinKind::Cross => "cross",
        JoinKind::Other => "other",
    }
}

/// Single-pass traversal computing every field of [`AnalysisRecord`].
/// Only the first analyzer in a config sets the record; contributing
/// analyzers that run afterward must not overwrite an existing one (the
/// pipeline enforces this, not this type — `StatementAnalyzer` is simply
/// the designated primary).
#[derive(Debug, Clone, Copy, Default)]
pub struct StatementAnalyzer;

impl Analyzer for StatementAnalyzer {
    fn name(&self) -> &'static str {
        "StatementAnalyzer"
    }

    fn process(&self, ctx: &mut ProcessingContext) -> ProcessorOutcome {
        if ctx.analysis.is_some() {
            return ProcessorOutcome::Skipped("analysis already set by an earlier analyzer");
        }
        let Some(ast) = ctx.current_ast.as_ref() else {
            return ProcessorOutcome::Skipped("no AST");
        };

        let tables = ast.tables();

        let mut join_kinds = std::collections::HashMap::new();
        let joins = ast.joins();
        for j in &joins {
            *join_kinds.entry(join_kind_label(j.kind).to_string()).or_insert(0u32) += 1;
        }

        let subqueries = ast.subqueries();
        let subquery_count = u32::try_from(subqueries.len()).unwrap_or(u32::MAX);
        let max_subquery_depth = subqueries.iter().map(|s| s.depth).max().unwrap_or(0);
        let correlated_subqueries =
            u32::try_from(subqueries.iter().filter(|s| s.correlated).count()).unwrap_or(u32::MAX);

        let function_names = ast.function_names();
        let function_count = u32::try_from(function_names.len()).unwrap_or(u32::MAX);
        let aggregate_functions = u32::try_from(
            function_names
                .iter()
                .filter(|n| AGGREGATE_NAMES.contains(&n.as_str()))
                .count(),
        )
        .unwrap_or(u32::MAX);

        let columns = ast
            .column_refs()
            .into_iter()
            .map(|(qualifier, name)| QualifiedName { qualifier, name })
            .collect();

        let join_count = u32::try_from(joins.len()).unwrap_or(u32::MAX);
        let complexity_score = AnalysisRecord::complexity(
            join_count,
            subquery_count,
            aggregate_functions,
            correlated_subqueries,
            function_count,
            max_subquery_depth,
        );

        ctx.analysis = Some(AnalysisRecord {
            statement_kind: ast.kind(),
            tables,
            columns,
            join_count,
            join_kinds,
            subquery_count,
            max_subquery_depth,
            correlated_subqueries,
            function_count,
            aggregate_functions,
            has_returning: ast.has_returning(),
            cartesian_risk: ast.cartesian_risk(3),
            complexity_score,
        });

        ProcessorOutcome::Ok
    }
}
