//! Processor protocol: the uniform contract implemented by transformers,
//! validators, and the analyzer. Three distinct traits make stage ordering
//! a type invariant rather than a runtime convention.

pub mod analyzers;
pub mod transformers;
pub mod validators;

use crate::context::ProcessingContext;

/// Outcome of one processor invocation.
#[derive(Debug)]
pub enum ProcessorOutcome {
    Ok,
    Skipped(&'static str),
    Err(String),
}

impl ProcessorOutcome {
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// A processor that rewrites `ctx.current_ast` and/or appends to
/// `ctx.extracted_params`.
pub trait Transformer: Send + Sync {
    fn name(&self) -> &'static str;
    fn process(&self, ctx: &mut ProcessingContext) -> ProcessorOutcome;
}

/// A processor that inspects the (fully-transformed) AST and appends
/// issues to `ctx.validation`.
pub trait Validator: Send + Sync {
    fn name(&self) -> &'static str;
    fn process(&self, ctx: &mut ProcessingContext) -> ProcessorOutcome;
}

/// A processor that summarizes the final AST into `ctx.analysis`. Only the
/// designated primary analyzer sets the record; additional analyzers may
/// contribute fields but must never overwrite ones already set.
pub trait Analyzer: Send + Sync {
    fn name(&self) -> &'static str;
    fn process(&self, ctx: &mut ProcessingContext) -> ProcessorOutcome;
}
