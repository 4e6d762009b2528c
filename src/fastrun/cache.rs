//! Statement cache: property → value identity → cached statements.
//!
//! A property's sub-map is always replaced wholesale. Loaders build a fresh
//! [`PropertyStatements`] off to the side and swap it in with
//! [`StatementCache::replace`], so a failed reload leaves the previous data
//! for that property untouched.

use std::collections::{BTreeSet, HashMap};

use crate::property::PropertyId;

/// One concrete statement instance on a remote entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CachedStatement {
    /// Entity IRI as returned by the store.
    pub entity: String,
    /// Statement IRI as returned by the store.
    pub statement: String,
}

impl CachedStatement {
    pub fn new(entity: impl Into<String>, statement: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            statement: statement.into(),
        }
    }

    /// Short entity id, i.e. the last path segment of the entity IRI.
    pub fn entity_id(&self) -> &str {
        short_id(&self.entity)
    }
}

pub(crate) fn short_id(iri: &str) -> &str {
    iri.rsplit('/').next().unwrap_or(iri)
}

/// Statements of one property, grouped by value identity.
pub type PropertyStatements = HashMap<String, Vec<CachedStatement>>;

/// The engine's in-memory index of remote statements.
#[derive(Debug, Default)]
pub struct StatementCache {
    data: HashMap<PropertyId, PropertyStatements>,
    property_types: HashMap<PropertyId, String>,
}

impl StatementCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `property` has been loaded, even if it loaded nothing.
    pub fn is_loaded(&self, property: PropertyId) -> bool {
        self.data.contains_key(&property)
    }

    /// Swap in a freshly built sub-map for `property`.
    pub fn replace(&mut self, property: PropertyId, statements: PropertyStatements) {
        self.data.insert(property, statements);
    }

    pub fn property(&self, property: PropertyId) -> Option<&PropertyStatements> {
        self.data.get(&property)
    }

    /// Cached statements of `property` carrying the value `identity`.
    pub fn statements(&self, property: PropertyId, identity: &str) -> &[CachedStatement] {
        self.data
            .get(&property)
            .and_then(|m| m.get(identity))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// True when `property` is loaded but has no statements at all.
    pub fn is_empty_for(&self, property: PropertyId) -> bool {
        self.data.get(&property).is_none_or(|m| m.is_empty())
    }

    /// Every entity IRI holding any value of `property`.
    pub fn entities(&self, property: PropertyId) -> BTreeSet<&str> {
        self.data
            .get(&property)
            .into_iter()
            .flat_map(|m| m.values())
            .flatten()
            .map(|s| s.entity.as_str())
            .collect()
    }

    /// Properties currently held, in canonical order.
    pub fn properties(&self) -> Vec<PropertyId> {
        let mut props: Vec<PropertyId> = self.data.keys().copied().collect();
        props.sort();
        props
    }

    /// Record the remote type of a property the first time it is seen.
    pub fn observe_type(&mut self, property: PropertyId, type_tag: &str) {
        self.property_types
            .entry(property)
            .or_insert_with(|| type_tag.to_string());
    }

    pub fn property_type(&self, property: PropertyId) -> Option<&str> {
        self.property_types.get(&property).map(String::as_str)
    }

    /// Drop every loaded property. The property-type table is kept.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
