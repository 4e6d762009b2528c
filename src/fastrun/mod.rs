//! Fastrun reconciliation engine.
//!
//! A [`FastrunEngine`] mirrors the statements of every remote entity that
//! matches its [`BaseFilter`], one property at a time, and answers the
//! question "would writing these claims change anything?" without writing.
//!
//! The check is a conjunctive, early-exit search:
//!
//! 1. every in-scope property is loaded into the [`StatementCache`]
//! 2. each claim's value identity is looked up; a value nobody has means a
//!    write is required
//! 3. the remote entities carrying *every* claimed value are intersected
//! 4. only statements on surviving entities get their qualifiers and
//!    references loaded and compared
//!
//! # Concurrency
//!
//! An engine is single-threaded: loads replace a property's cache entry
//! wholesale and two concurrent loads of the same property would race.
//! Share engines as [`SharedEngine`] and hold the lock for the whole of a
//! `load_statements` or `write_required` call, or give each thread its own
//! engine.

pub mod cache;
pub mod filter;
pub mod loader;
pub mod registry;
pub mod sparql;

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use crate::config::FastrunConfig;
use crate::datatype::codec::CodecRegistry;
use crate::error::{FastrunResult, InputError};
use crate::model::{Claim, ClaimBearing};
use crate::property::PropertyId;
use crate::query::QueryInterface;

use self::cache::StatementCache;
use self::filter::BaseFilter;

/// An engine behind the lock its callers must hold.
pub type SharedEngine = Arc<Mutex<FastrunEngine>>;

/// Comparison and caching switches of an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FastrunFlags {
    pub use_qualifiers: bool,
    pub use_references: bool,
    pub use_cache: bool,
    pub case_insensitive: bool,
}

impl Default for FastrunFlags {
    fn default() -> Self {
        Self {
            use_qualifiers: true,
            use_references: false,
            use_cache: true,
            case_insensitive: false,
        }
    }
}

/// Statement cache plus the reconciliation logic on top of it.
pub struct FastrunEngine {
    config: FastrunConfig,
    cache: StatementCache,
    query: Arc<dyn QueryInterface>,
    codecs: Arc<CodecRegistry>,
}

impl FastrunEngine {
    /// Create an engine. The configuration is validated and the base filter
    /// must render with the given codecs.
    pub fn new(
        config: FastrunConfig,
        query: Arc<dyn QueryInterface>,
        codecs: Arc<CodecRegistry>,
    ) -> FastrunResult<Self> {
        config.validate()?;
        config.base_filter.render(&codecs, &config.wikibase_url)?;
        Ok(Self {
            config,
            cache: StatementCache::new(),
            query,
            codecs,
        })
    }

    /// Engine with the built-in codecs.
    pub fn with_query(config: FastrunConfig, query: Arc<dyn QueryInterface>) -> FastrunResult<Self> {
        Self::new(config, query, Arc::new(CodecRegistry::with_defaults()))
    }

    pub fn config(&self) -> &FastrunConfig {
        &self.config
    }

    pub fn base_filter(&self) -> &BaseFilter {
        &self.config.base_filter
    }

    pub fn flags(&self) -> FastrunFlags {
        self.config.flags()
    }

    /// The only setting that may change on a live engine.
    pub fn set_use_cache(&mut self, use_cache: bool) {
        self.config.use_cache = use_cache;
    }

    pub fn cache(&self) -> &StatementCache {
        &self.cache
    }

    /// Properties loaded so far, in canonical order.
    pub fn cached_properties(&self) -> Vec<PropertyId> {
        self.cache.properties()
    }

    /// Remote type tag recorded for `property`, if any query has seen it.
    pub fn property_type(&self, property: PropertyId) -> Option<&str> {
        self.cache.property_type(property)
    }

    /// Forget every loaded property.
    pub fn clear_cache(&mut self) {
        tracing::debug!(properties = self.cache.len(), "clearing fastrun cache");
        self.cache.clear();
    }

    /// Remote entity ids (short form, e.g. `Q42`) holding any value of the
    /// claims' properties.
    pub fn entities_matching(
        &mut self,
        claims: &[Claim],
        use_cache: Option<bool>,
    ) -> FastrunResult<Vec<String>> {
        self.load_statements(claims, use_cache, None, None)?;
        let mut entities = BTreeSet::new();
        for claim in claims {
            for iri in self.cache.entities(claim.property()) {
                entities.insert(cache::short_id(iri).to_string());
            }
        }
        Ok(entities.into_iter().collect())
    }

    /// Decide whether writing `entity`'s claims would change the remote store.
    ///
    /// `property_filter` narrows the claims considered (default: all). The
    /// `use_*` arguments override the engine's flags for this call only.
    pub fn write_required<E>(
        &mut self,
        entity: &E,
        property_filter: Option<&[PropertyId]>,
        use_qualifiers: Option<bool>,
        use_references: Option<bool>,
        use_cache: Option<bool>,
    ) -> FastrunResult<bool>
    where
        E: ClaimBearing + ?Sized,
    {
        let claims = entity.claims();
        if claims.is_empty() {
            return Err(InputError::NoClaims.into());
        }
        let use_qualifiers = use_qualifiers.unwrap_or(self.config.use_qualifiers);
        let use_references = use_references.unwrap_or(self.config.use_references);

        let in_scope: Vec<&Claim> = claims
            .iter()
            .filter(|c| property_filter.is_none_or(|f| f.contains(&c.property())))
            .collect();
        if in_scope.is_empty() {
            tracing::debug!("no claim is in scope of the property filter");
            return Ok(true);
        }

        let wikibase_url = self.config.wikibase_url.clone();
        let mut identities = Vec::with_capacity(in_scope.len());
        let mut common: Option<BTreeSet<String>> = None;

        for claim in &in_scope {
            let property = claim.property();
            self.load_statements(std::slice::from_ref(*claim), use_cache, None, None)?;

            if self.cache.is_empty_for(property) {
                tracing::debug!(%property, "no statements cached for property");
                return Ok(true);
            }
            let Some(identity) = self.claim_identity(claim, &wikibase_url)? else {
                tracing::debug!(%property, "claim has no concrete value");
                return Ok(true);
            };
            let statements = self.cache.statements(property, &identity);
            if statements.is_empty() {
                tracing::debug!(%property, value = %identity, "value does not exist for property");
                return Ok(true);
            }
            // Every claimed value must sit on the same entity, including
            // several values of one property.
            let holders: BTreeSet<String> = statements.iter().map(|s| s.entity.clone()).collect();
            common = Some(match common.take() {
                Some(mut entities) => {
                    entities.retain(|entity| holders.contains(entity));
                    entities
                }
                None => holders,
            });
            identities.push(identity);
        }

        let common = common.unwrap_or_default();
        if common.is_empty() {
            tracing::debug!("no single entity carries every claimed value");
            return Ok(true);
        }

        if !use_qualifiers && !use_references {
            return Ok(false);
        }

        let deep_limit = self.config.deep_page_limit;
        for (claim, identity) in in_scope.iter().zip(&identities) {
            let candidates: Vec<String> = self
                .cache
                .statements(claim.property(), identity)
                .iter()
                .filter(|s| common.contains(&s.entity))
                .map(|s| s.statement.clone())
                .collect();

            for sid in candidates {
                if use_qualifiers {
                    let remote = self.load_qualifiers(&sid, Some(deep_limit))?;
                    if remote.len() != claim.qualifiers.len() {
                        tracing::debug!(
                            statement = %sid,
                            remote = remote.len(),
                            local = claim.qualifiers.len(),
                            "difference in number of qualifiers"
                        );
                        return Ok(true);
                    }
                    if !claim.qualifiers.same_members(&remote) {
                        tracing::debug!(statement = %sid, "difference between qualifiers");
                        return Ok(true);
                    }
                }

                if use_references {
                    let remote = self.load_references(&sid, Some(deep_limit))?;
                    if remote.len() != claim.references.len() {
                        tracing::debug!(
                            statement = %sid,
                            remote = remote.len(),
                            local = claim.references.len(),
                            "difference in number of references"
                        );
                        return Ok(true);
                    }
                    if !claim.references.same_members(&remote) {
                        tracing::debug!(statement = %sid, "difference between references");
                        return Ok(true);
                    }
                }
            }
        }

        Ok(false)
    }

    /// Identity of a claim's main value; `None` for unknown/no value.
    fn claim_identity(&self, claim: &Claim, wikibase_url: &str) -> FastrunResult<Option<String>> {
        match claim.value() {
            Some(value) => match self.codecs.identity(value, wikibase_url)? {
                Some(identity) => Ok(Some(identity)),
                None => Err(InputError::UnrenderableValue {
                    property: claim.property().to_string(),
                }
                .into()),
            },
            None => Ok(None),
        }
    }
}

impl std::fmt::Debug for FastrunEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastrunEngine")
            .field("config", &self.config)
            .field("cached_properties", &self.cache.len())
            .finish()
    }
}
