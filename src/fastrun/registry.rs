//! Pool of engines keyed by configuration.
//!
//! Repeated requests for the same base filter and comparison flags return
//! the same warm engine instead of re-querying the store. The pool is owned
//! by the caller; nothing is process-global.

use std::sync::{Arc, Mutex};

use super::filter::BaseFilter;
use super::{FastrunEngine, FastrunFlags, SharedEngine};
use crate::config::FastrunConfig;
use crate::datatype::codec::CodecRegistry;
use crate::error::FastrunResult;
use crate::query::QueryInterface;

/// Identity of a pooled engine. `use_cache` is deliberately not part of it.
#[derive(Debug, Clone, PartialEq)]
struct EngineKey {
    base_filter: BaseFilter,
    use_qualifiers: bool,
    use_references: bool,
    case_insensitive: bool,
    endpoint: String,
}

impl EngineKey {
    fn new(base_filter: &BaseFilter, flags: &FastrunFlags, endpoint: &str) -> Self {
        Self {
            base_filter: base_filter.clone(),
            use_qualifiers: flags.use_qualifiers,
            use_references: flags.use_references,
            case_insensitive: flags.case_insensitive,
            endpoint: endpoint.to_string(),
        }
    }
}

/// Append-only pool of [`SharedEngine`]s.
pub struct FastrunRegistry {
    engines: Mutex<Vec<(EngineKey, SharedEngine)>>,
    query: Arc<dyn QueryInterface>,
    codecs: Arc<CodecRegistry>,
    defaults: FastrunConfig,
}

impl FastrunRegistry {
    /// New engines take every setting except filter and flags from `defaults`.
    pub fn new(defaults: FastrunConfig, query: Arc<dyn QueryInterface>) -> Self {
        Self {
            engines: Mutex::new(Vec::new()),
            query,
            codecs: Arc::new(CodecRegistry::with_defaults()),
            defaults,
        }
    }

    pub fn with_codecs(mut self, codecs: Arc<CodecRegistry>) -> Self {
        self.codecs = codecs;
        self
    }

    pub fn defaults(&self) -> &FastrunConfig {
        &self.defaults
    }

    /// Return the engine for `base_filter` and `flags`, creating it on first
    /// use. A reused engine takes over `flags.use_cache`.
    ///
    /// Do not call this while holding the lock of an engine from this pool
    /// with a matching key.
    pub fn acquire(&self, base_filter: &BaseFilter, flags: FastrunFlags) -> FastrunResult<SharedEngine> {
        self.acquire_from(&self.defaults, base_filter, flags)
    }

    /// Engine for a full configuration. The endpoint is part of the pool
    /// key; a new engine takes every other setting from `config`, while a
    /// reused one keeps the settings it was created with.
    pub fn acquire_for(&self, config: &FastrunConfig) -> FastrunResult<SharedEngine> {
        self.acquire_from(config, &config.base_filter, config.flags())
    }

    fn acquire_from(
        &self,
        settings: &FastrunConfig,
        base_filter: &BaseFilter,
        flags: FastrunFlags,
    ) -> FastrunResult<SharedEngine> {
        let key = EngineKey::new(base_filter, &flags, &settings.sparql_endpoint_url);
        let mut engines = self.engines.lock().expect("fastrun registry lock poisoned");

        if let Some((_, shared)) = engines.iter().find(|(k, _)| *k == key) {
            shared
                .lock()
                .expect("fastrun engine lock poisoned")
                .set_use_cache(flags.use_cache);
            return Ok(Arc::clone(shared));
        }

        let config = FastrunConfig {
            base_filter: base_filter.clone(),
            ..settings.clone()
        }
        .with_flags(flags);
        let engine = FastrunEngine::new(config, Arc::clone(&self.query), Arc::clone(&self.codecs))?;
        tracing::info!(
            constraints = base_filter.constraints().len(),
            use_qualifiers = flags.use_qualifiers,
            use_references = flags.use_references,
            endpoint = %settings.sparql_endpoint_url,
            "created new fastrun engine"
        );

        let shared = Arc::new(Mutex::new(engine));
        engines.push((key, Arc::clone(&shared)));
        Ok(shared)
    }

    /// Drop every pooled engine. Handles already given out keep working.
    pub fn reset(&self) {
        self.engines
            .lock()
            .expect("fastrun registry lock poisoned")
            .clear();
    }

    pub fn len(&self) -> usize {
        self.engines.lock().expect("fastrun registry lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for FastrunRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastrunRegistry")
            .field("engines", &self.len())
            .field("defaults", &self.defaults)
            .finish()
    }
}
