//! The mutable scratchpad threaded through one pipeline run. Never shared
//! across threads and never outlives the run that created it.

use std::sync::Arc;

use crate::analysis::AnalysisRecord;
use crate::ast::{AstNode, DialectTag};
use crate::config::StatementConfig;
use crate::params::ParamBag;
use crate::validation::ValidationAccumulator;

/// Any stage may be skipped if disabled in configuration, but skipping
/// never regresses the phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StatementPhase {
    Fresh,
    Parsed,
    Transformed,
    Validated,
    Analyzed,
}

pub struct ProcessingContext {
    pub current_ast: Option<AstNode>,
    /// The statement's original source text, kept only for validators that
    /// need to reason about raw SQL (e.g. detecting a stacked-statement
    /// script); never mutated and never the source of the final rendered
    /// SQL, which is always synthesized from `current_ast`.
    pub raw_sql: Option<String>,
    pub initial_params: ParamBag,
    pub extracted_params: ParamBag,
    pub merged_params: Option<ParamBag>,
    pub validation: ValidationAccumulator,
    pub analysis: Option<AnalysisRecord>,
    pub dialect: DialectTag,
    pub config: Arc<StatementConfig>,
    pub input_had_placeholders: bool,
    pub is_many: bool,
    /// Mirrors `Statement::as_script`: the caller's declared intent to run
    /// a multi-statement script. Lets `InjectionDetector` tell a
    /// deliberately-declared script apart from an undeclared stacked
    /// statement, which is the injection signal it actually cares about.
    pub is_script: bool,
    pub phase: StatementPhase,
    /// Set by `TracingComment`; appended to the rendered SQL by the
    /// pipeline since `sqlparser`'s AST retains no comment trivia to carry
    /// it through a normal render.
    pub trailing_comment: Option<String>,
}

impl ProcessingContext {
    #[must_use]
    pub fn new(
        raw_sql: Option<String>,
        initial_params: ParamBag,
        dialect: DialectTag,
        config: Arc<StatementConfig>,
        input_had_placeholders: bool,
        is_many: bool,
        is_script: bool,
    ) -> Self {
        Self {
            current_ast: None,
            raw_sql,
            initial_params,
            extracted_params: ParamBag::new(),
            merged_params: None,
            validation: ValidationAccumulator::new(),
            analysis: None,
            dialect,
            config,
            input_had_placeholders,
            is_many,
            is_script,
            phase: StatementPhase::Fresh,
            trailing_comment: None,
        }
    }

    pub fn advance(&mut self, phase: StatementPhase) {
        if phase > self.phase {
            self.phase = phase;
        }
    }
}
