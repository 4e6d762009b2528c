//! Base filter: the constraints that narrow which remote entities are
//! candidates at all.
//!
//! The rendered filter is the prefix of every statement load query. Two
//! engines with equal filters (and equal flags) are interchangeable.

use serde::{Deserialize, Serialize};

use super::sparql::direct_predicate;
use crate::datatype::codec::CodecRegistry;
use crate::datatype::Value;
use crate::error::{ConfigError, FastrunResult};
use crate::property::PropertyId;

/// One base filter constraint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FilterConstraint {
    /// Entity has `property` = `value`, or any value when `value` is `None`.
    Value {
        property: PropertyId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Value>,
    },
    /// Entity reaches `value` through one `property` edge followed by zero or
    /// more `via` edges (e.g. instance of / subclass of*).
    Path {
        property: PropertyId,
        via: PropertyId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Value>,
    },
}

impl FilterConstraint {
    /// The property of the first hop.
    pub fn property(&self) -> PropertyId {
        match self {
            FilterConstraint::Value { property, .. } | FilterConstraint::Path { property, .. } => {
                *property
            }
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            FilterConstraint::Value { value, .. } | FilterConstraint::Path { value, .. } => {
                value.as_ref()
            }
        }
    }
}

/// Ordered conjunction of constraints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BaseFilter {
    constraints: Vec<FilterConstraint>,
}

impl BaseFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `property` = `value`.
    pub fn has(mut self, property: PropertyId, value: Value) -> Self {
        self.constraints.push(FilterConstraint::Value {
            property,
            value: Some(value),
        });
        self
    }

    /// Require some value for `property`.
    pub fn has_any(mut self, property: PropertyId) -> Self {
        self.constraints.push(FilterConstraint::Value {
            property,
            value: None,
        });
        self
    }

    /// Require a `property`/`via`* path, ending at `value` if given.
    pub fn path(mut self, property: PropertyId, via: PropertyId, value: Option<Value>) -> Self {
        self.constraints
            .push(FilterConstraint::Path { property, via, value });
        self
    }

    pub fn push(&mut self, constraint: FilterConstraint) {
        self.constraints.push(constraint);
    }

    pub fn constraints(&self) -> &[FilterConstraint] {
        &self.constraints
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Check every constraint value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for c in &self.constraints {
            if let Some(v) = c.value() {
                v.validate()?;
            }
        }
        Ok(())
    }

    fn mentions(&self, property: PropertyId) -> usize {
        self.constraints
            .iter()
            .filter(|c| c.property() == property)
            .count()
    }

    /// Render the filter as triple patterns on `?entity`, one per line.
    ///
    /// A valueless single-hop constraint is only emitted when no other
    /// constraint names the same property, so the synthesized `?zzP..`
    /// variable is never bound twice.
    pub fn render(&self, codecs: &CodecRegistry, wikibase_url: &str) -> FastrunResult<String> {
        let mut out = String::new();
        for constraint in &self.constraints {
            match constraint {
                FilterConstraint::Value { property, value } => {
                    let predicate = direct_predicate(wikibase_url, *property);
                    match value {
                        Some(v) => {
                            let term = render_value(codecs, wikibase_url, *property, v)?;
                            out.push_str(&format!("  ?entity {predicate} {term} .\n"));
                        }
                        None if self.mentions(*property) == 1 => {
                            out.push_str(&format!("  ?entity {predicate} ?zz{property} .\n"));
                        }
                        None => {}
                    }
                }
                FilterConstraint::Path {
                    property,
                    via,
                    value,
                } => {
                    let first = direct_predicate(wikibase_url, *property);
                    let then = direct_predicate(wikibase_url, *via);
                    let term = match value {
                        Some(v) => render_value(codecs, wikibase_url, *property, v)?,
                        None => format!("?zz{property}{via}"),
                    };
                    out.push_str(&format!("  ?entity {first}/{then}* {term} .\n"));
                }
            }
        }
        Ok(out)
    }
}

impl FromIterator<FilterConstraint> for BaseFilter {
    fn from_iter<I: IntoIterator<Item = FilterConstraint>>(iter: I) -> Self {
        Self {
            constraints: iter.into_iter().collect(),
        }
    }
}

fn render_value(
    codecs: &CodecRegistry,
    wikibase_url: &str,
    property: PropertyId,
    value: &Value,
) -> FastrunResult<String> {
    codecs.identity(value, wikibase_url)?.ok_or_else(|| {
        ConfigError::UnsupportedFilter {
            property: property.to_string(),
            reason: format!("value of type <{}> has no SPARQL rendering", value.type_tag()),
        }
        .into()
    })
}
