//! Structural metadata extracted from the final, post-transform AST.

use std::collections::{HashMap, HashSet};

use crate::ast::StatementKind;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    pub qualifier: Option<String>,
    pub name: String,
}

/// Deterministic structural summary of one pipeline run's final AST. No
/// field here depends on wall-clock time or randomness.
#[derive(Debug, Clone)]
pub struct AnalysisRecord {
    pub statement_kind: StatementKind,
    pub tables: HashSet<String>,
    pub columns: HashSet<QualifiedName>,
    pub join_count: u32,
    pub join_kinds: HashMap<String, u32>,
    pub subquery_count: u32,
    pub max_subquery_depth: u32,
    pub correlated_subqueries: u32,
    pub function_count: u32,
    pub aggregate_functions: u32,
    pub has_returning: bool,
    pub cartesian_risk: bool,
    pub complexity_score: u32,
}

impl AnalysisRecord {
    /// Weights: joins×2, subqueries×3, aggregates×1, correlated
    /// subqueries×5, functions×1, depth×2 — clamped to `u32` so a
    /// pathological query can never overflow the score into wraparound.
    #[must_use]
    pub fn complexity(
        join_count: u32,
        subquery_count: u32,
        aggregate_functions: u32,
        correlated_subqueries: u32,
        function_count: u32,
        max_subquery_depth: u32,
    ) -> u32 {
        let terms: [u64; 6] = [
            u64::from(join_count) * 2,
            u64::from(subquery_count) * 3,
            u64::from(aggregate_functions),
            u64::from(correlated_subqueries) * 5,
            u64::from(function_count),
            u64::from(max_subquery_depth) * 2,
        ];
        let total: u64 = terms.iter().sum();
        u32::try_from(total).unwrap_or(u32::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complexity_matches_documented_weights() {
        let score = AnalysisRecord::complexity(2, 1, 3, 1, 4, 2);
        // joins 2*2=4, subqueries 1*3=3, agg 3*1=3, correlated 1*5=5, funcs 4*1=4, depth 2*2=4
        assert_eq!(score, 4 + 3 + 3 + 5 + 4 + 4);
    }

    #[test]
    fn complexity_clamps_to_u32_max() {
        let score = AnalysisRecord::complexity(u32::MAX, u32::MAX, u32::MAX, u32::MAX, u32::MAX, u32::MAX);
        assert_eq!(score, u32::MAX);
    }
}
