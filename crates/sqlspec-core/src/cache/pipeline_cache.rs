//! Pipeline cache: keyed by `(parse_key, config_fingerprint,
//! extras_fingerprint, input_had_placeholders, param_shape_fingerprint)`.
//! The cached value omits parameter *values* — only slot shape
//! (name/position, no bound value) contributes, so the same cached entry
//! serves many requests that share SQL/config/extras but differ in the
//! actual bound values.

use crate::analysis::AnalysisRecord;
use crate::ast::AstNode;
use crate::params::ParamBag;
use crate::validation::ValidationResult;

use super::{CacheRegistry, Fingerprint};
use crate::error::SqlSpecResult;

#[derive(Debug, Clone)]
pub struct SlotShape {
    pub name: Option<String>,
    pub position: usize,
}

/// Cached pipeline output. `cached_params` holds the full `ParamBag` from
/// the run that populated this entry, including resolved
/// `ExtractedLiteral` values (deterministic for a given SQL text, so safe
/// to reuse verbatim) and whatever `User`-origin values happened to be
/// bound on that run (re-bound from the live caller's bag before use —
/// see `pipeline::run`, which is why only the slot *shape*, never values,
/// contributes to the cache key).
#[derive(Clone)]
pub struct CachedPipelineOutcome {
    pub final_ast: AstNode,
    pub cached_params: ParamBag,
    pub validation: ValidationResult,
    pub analysis: Option<AnalysisRecord>,
    pub trailing_comment: Option<String>,
}

pub struct PipelineCacheKey<'a> {
    pub parse_key: Fingerprint,
    pub config_fingerprint: Fingerprint,
    pub extras_fingerprint: Fingerprint,
    pub input_had_placeholders: bool,
    pub param_shape: &'a [SlotShape],
}

#[must_use]
pub fn key_fingerprint(k: &PipelineCacheKey<'_>) -> Fingerprint {
    let shape_bytes: Vec<u8> = k
        .param_shape
        .iter()
        .flat_map(|s| {
            let mut b = s.position.to_le_bytes().to_vec();
            if let Some(name) = &s.name {
                b.extend_from_slice(name.as_bytes());
            }
            b
        })
        .collect();
    Fingerprint::combine(&[
        &k.parse_key.0,
        &k.config_fingerprint.0,
        &k.extras_fingerprint.0,
        &[u8::from(k.input_had_placeholders)],
        &shape_bytes,
    ])
}

pub fn get(
    registry: &CacheRegistry,
    k: &PipelineCacheKey<'_>,
    required: bool,
) -> SqlSpecResult<Option<CachedPipelineOutcome>> {
    registry.pipeline().get(&key_fingerprint(k), required)
}

pub fn put(
    registry: &CacheRegistry,
    k: &PipelineCacheKey<'_>,
    value: CachedPipelineOutcome,
    required: bool,
) -> SqlSpecResult<()> {
    registry.pipeline().put(key_fingerprint(k), value, required)
}

pub fn get_by_fingerprint(
    registry: &CacheRegistry,
    fingerprint: Fingerprint,
    required: bool,
) -> SqlSpecResult<Option<CachedPipelineOutcome>> {
    registry.pipeline().get(&fingerprint, required)
}

pub fn put_by_fingerprint(
    registry: &CacheRegistry,
    fingerprint: Fingerprint,
    value: CachedPipelineOutcome,
    required: bool,
) -> SqlSpecResult<()> {
    registry.pipeline().put(fingerprint, value, required)
}
