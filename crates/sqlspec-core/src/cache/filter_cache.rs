//! Filter cache: `(ast_fingerprint, filter_descriptor) -> rewritten AST
//! fragment` plus whatever parameter slots that rewrite extracted. Lets
//! repeated application of the same filter to structurally-identical ASTs
//! skip re-walking the tree; the extracted slots are replayed with their
//! positions renumbered against the live run's parameter count, since a
//! cached application may have happened after a different number of prior
//! extractions than the current one.

use crate::ast::AstNode;
use crate::error::SqlSpecResult;
use crate::params::ParamSlot;

use super::{CacheRegistry, Fingerprint};

fn key(ast_fingerprint: Fingerprint, filter_descriptor: &str) -> Fingerprint {
    Fingerprint::combine(&[&ast_fingerprint.0, filter_descriptor.as_bytes()])
}

#[derive(Clone)]
pub struct CachedFilterApplication {
    pub ast: AstNode,
    pub extracted: Vec<ParamSlot>,
}

pub fn get(
    registry: &CacheRegistry,
    ast_fingerprint: Fingerprint,
    filter_descriptor: &str,
    required: bool,
) -> SqlSpecResult<Option<CachedFilterApplication>> {
    registry
        .filter()
        .get(&key(ast_fingerprint, filter_descriptor), required)
}

pub fn put(
    registry: &CacheRegistry,
    ast_fingerprint: Fingerprint,
    filter_descriptor: &str,
    value: CachedFilterApplication,
    required: bool,
) -> SqlSpecResult<()> {
    registry
        .filter()
        .put(key(ast_fingerprint, filter_descriptor), value, required)
}
