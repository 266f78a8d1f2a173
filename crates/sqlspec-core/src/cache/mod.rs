//! Process-wide, size-bounded caches keyed by fingerprint. Each cache is an
//! `lru::LruCache` guarded by a `std::sync::Mutex`; concurrent readers and
//! writers race on first insertion — first write wins, with no
//! invalidation beyond process shutdown.
//!
//! Fingerprints hash the *canonical re-rendered form* of whatever they
//! key, never raw input text — an AST that parses from two differently
//! formatted but equivalent SQL strings fingerprints identically, and two
//! textually-identical-but-semantically-different inputs never collide in
//! practice thanks to `blake3`'s 256-bit output.

pub mod filter_cache;
pub mod parse_cache;
pub mod pipeline_cache;

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use lru::LruCache;

use crate::error::{SqlSpecError, SqlSpecResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(pub [u8; 32]);

impl Fingerprint {
    #[must_use]
    pub fn of(bytes: &[u8]) -> Self {
        Self(*blake3::hash(bytes).as_bytes())
    }

    #[must_use]
    pub fn combine(parts: &[&[u8]]) -> Self {
        let mut hasher = blake3::Hasher::new();
        for p in parts {
            hasher.update(&(p.len() as u64).to_le_bytes());
            hasher.update(p);
        }
        Self(*hasher.finalize().as_bytes())
    }
}

/// Hashes any `Hash` value into a stable byte sequence suitable for
/// `Fingerprint::combine`, without requiring every caller to hand-roll a
/// byte encoding for ad-hoc key components (e.g. an ordered processor
/// name list).
#[must_use]
pub fn hash_bytes(value: &impl Hash) -> [u8; 8] {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish().to_le_bytes()
}

pub(crate) struct BoundedCache<V> {
    inner: Mutex<LruCache<Fingerprint, V>>,
    name: &'static str,
}

impl<V: Clone> BoundedCache<V> {
    fn new(name: &'static str, capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity.max(1)).unwrap_or_else(|| NonZeroUsize::new(1).unwrap());
        Self {
            inner: Mutex::new(LruCache::new(cap)),
            name,
        }
    }

    pub(crate) fn get(&self, key: &Fingerprint, required: bool) -> SqlSpecResult<Option<V>> {
        match self.inner.lock() {
            Ok(mut guard) => Ok(guard.get(key).cloned()),
            Err(_) if required => Err(SqlSpecError::CacheUnavailable { cache: self.name }),
            Err(_) => Ok(None),
        }
    }

    pub(crate) fn put(&self, key: Fingerprint, value: V, required: bool) -> SqlSpecResult<()> {
        match self.inner.lock() {
            Ok(mut guard) => {
                guard.put(key, value);
                Ok(())
            }
            Err(_) if required => Err(SqlSpecError::CacheUnavailable { cache: self.name }),
            Err(_) => Ok(()),
        }
    }

    fn clear(&self) {
        if let Ok(mut guard) = self.inner.lock() {
            guard.clear();
        }
    }
}

/// Process-wide registry bundling the three caches. Explicit `init`/
/// `shutdown` rather than implicit first-use lazy construction, so a host
/// process controls exactly when cache memory is allocated and released.
pub struct CacheRegistry {
    parse: BoundedCache<crate::ast::AstNode>,
    pipeline: BoundedCache<pipeline_cache::CachedPipelineOutcome>,
    filter: BoundedCache<filter_cache::CachedFilterApplication>,
}

impl CacheRegistry {
    #[must_use]
    pub fn init(policy: &crate::config::CachePolicy) -> Self {
        Self {
            parse: BoundedCache::new("parse", policy.parse_cache_size),
            pipeline: BoundedCache::new("pipeline", policy.pipeline_cache_size),
            filter: BoundedCache::new("filter", policy.filter_cache_size),
        }
    }

    pub fn shutdown(self) {
        self.parse.clear();
        self.pipeline.clear();
        self.filter.clear();
    }

    #[must_use]
    pub(crate) fn parse(&self) -> &BoundedCache<crate::ast::AstNode> {
        &self.parse
    }

    #[must_use]
    pub(crate) fn pipeline(&self) -> &BoundedCache<pipeline_cache::CachedPipelineOutcome> {
        &self.pipeline
    }

    #[must_use]
    pub(crate) fn filter(&self) -> &BoundedCache<filter_cache::CachedFilterApplication> {
        &self.filter
    }
}

static GLOBAL: Mutex<Option<Arc<CacheRegistry>>> = Mutex::new(None);

/// Explicitly (re-)initializes the process-wide cache registry from
/// `policy`, replacing whatever was installed before. An embedding
/// application calls this once at startup with its own sizing; tests call
/// it to get a clean registry between cases.
pub fn init_global(policy: &crate::config::CachePolicy) -> Arc<CacheRegistry> {
    let registry = Arc::new(CacheRegistry::init(policy));
    let mut guard = GLOBAL.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    *guard = Some(Arc::clone(&registry));
    registry
}

/// Returns the process-wide registry, lazily installing one built from
/// `CachePolicy::default()` on first call if nothing was explicitly
/// initialized yet.
#[must_use]
pub fn global() -> Arc<CacheRegistry> {
    let mut guard = GLOBAL.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    if let Some(registry) = guard.as_ref() {
        return Arc::clone(registry);
    }
    let registry = Arc::new(CacheRegistry::init(&crate::config::CachePolicy::default()));
    *guard = Some(Arc::clone(&registry));
    registry
}

/// Tears down the process-wide registry, clearing every cache. A later
/// call to [`global`] installs a fresh, empty one.
pub fn shutdown_global() {
    let mut guard = GLOBAL.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    if let Some(registry) = guard.take() {
        if let Ok(registry) = Arc::try_unwrap(registry) {
            registry.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_deterministic() {
        let a = Fingerprint::of(b"SELECT 1");
        let b = Fingerprint::of(b"SELECT 1");
        assert_eq!(a, b);
    }

    #[test]
    fn fingerprint_differs_on_different_input() {
        let a = Fingerprint::of(b"SELECT 1");
        let b = Fingerprint::of(b"SELECT 2");
        assert_ne!(a, b);
    }

    #[test]
    fn combine_is_sensitive_to_part_boundaries() {
        let a = Fingerprint::combine(&[b"ab", b"c"]);
        let b = Fingerprint::combine(&[b"a", b"bc"]);
        assert_ne!(a, b);
    }
}
