//! Property identifiers.
//!
//! A [`PropertyId`] names the predicate of a statement. The canonical form is
//! `P` followed by digits; every accepted input is normalized to it, and
//! anything else is rejected before a query is ever built.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

static RE_PROPERTY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^P?([0-9]+)$").unwrap());
static RE_PROPERTY_IRI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://[^\s/]+(?:/[^\s/]+)*?/(?:entity|prop(?:/[a-z\-]+)?)/(P[0-9]+)$")
        .unwrap()
});

/// Canonical property identifier such as `P31`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PropertyId(u64);

impl PropertyId {
    /// Parse a property identifier.
    ///
    /// Accepts `"P31"`, `"31"`, and entity or predicate IRIs ending in
    /// `/entity/P31` or `/prop/.../P31`.
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let trimmed = input.trim();
        let candidate = if trimmed.contains('/') {
            RE_PROPERTY_IRI
                .captures(trimmed)
                .and_then(|caps| caps.get(1))
                .map_or("", |m| m.as_str())
        } else {
            trimmed
        };
        RE_PROPERTY
            .captures(candidate)
            .and_then(|caps| caps[1].parse::<u64>().ok())
            .map(PropertyId)
            .ok_or_else(|| ConfigError::InvalidProperty {
                input: input.to_string(),
            })
    }

    /// Build from a bare property number.
    pub fn from_number(number: u64) -> Self {
        PropertyId(number)
    }

    /// The numeric part of the identifier.
    pub fn number(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for PropertyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "P{}", self.0)
    }
}

impl std::str::FromStr for PropertyId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PropertyId::parse(s)
    }
}

impl TryFrom<String> for PropertyId {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        PropertyId::parse(&value)
    }
}

impl TryFrom<&str> for PropertyId {
    type Error = ConfigError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        PropertyId::parse(value)
    }
}

impl From<PropertyId> for String {
    fn from(value: PropertyId) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_and_bare_forms_normalize() {
        assert_eq!(PropertyId::parse("P31").unwrap().to_string(), "P31");
        assert_eq!(PropertyId::parse("31").unwrap().to_string(), "P31");
        assert_eq!(PropertyId::parse(" P007 ").unwrap().to_string(), "P7");
    }

    #[test]
    fn iri_form_is_accepted() {
        let p = PropertyId::parse("http://www.wikidata.org/entity/P279").unwrap();
        assert_eq!(p, PropertyId::from_number(279));
    }

    #[test]
    fn predicate_iris_are_accepted() {
        for iri in [
            "http://www.wikidata.org/prop/P580",
            "http://www.wikidata.org/prop/direct/P31",
            "https://wikibase.example.org/prop/qualifier/P580",
        ] {
            assert!(PropertyId::parse(iri).is_ok(), "{iri}");
        }
    }

    #[test]
    fn paths_outside_entity_namespaces_are_rejected() {
        for bad in [
            "Q5/P31",
            "foo/P31",
            "/P31",
            "http://www.wikidata.org/wiki/P31",
            "http://www.wikidata.org/entity/Q5/P31",
        ] {
            let err = PropertyId::parse(bad).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidProperty { .. }), "{bad}");
        }
    }

    #[test]
    fn malformed_identifiers_are_rejected() {
        for bad in ["", "Q5", "P", "P12a", "p12", "P-1", "P 1"] {
            let err = PropertyId::parse(bad).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidProperty { .. }), "{bad}");
        }
    }

    #[test]
    fn serde_uses_canonical_string() {
        let p: PropertyId = serde_json::from_str("\"P21\"").unwrap();
        assert_eq!(p.number(), 21);
        assert_eq!(serde_json::to_string(&p).unwrap(), "\"P21\"");
        assert!(serde_json::from_str::<PropertyId>("\"Q21\"").is_err());
    }
}
