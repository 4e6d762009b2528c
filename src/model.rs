//! Claims, qualifiers and references.
//!
//! The engine only needs three things from these: a claim's property, its
//! value (for the identity lookup), and size/membership comparisons between
//! a local qualifier or reference collection and a remote one.

use serde::{Deserialize, Serialize};

use crate::datatype::{Snak, SnakValue, Value};
use crate::error::ConfigError;
use crate::property::PropertyId;

/// A statement: main snak plus qualifiers and references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub mainsnak: Snak,
    #[serde(default)]
    pub qualifiers: Qualifiers,
    #[serde(default)]
    pub references: References,
    /// Remote statement id, when the claim came from the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl Claim {
    pub fn new(property: PropertyId, value: impl Into<SnakValue>) -> Self {
        Self {
            mainsnak: Snak::new(property, value),
            qualifiers: Qualifiers::default(),
            references: References::default(),
            id: None,
        }
    }

    pub fn with_qualifier(mut self, qualifier: Snak) -> Self {
        self.qualifiers.add(qualifier);
        self
    }

    pub fn with_reference(mut self, reference: Reference) -> Self {
        self.references.add(reference);
        self
    }

    pub fn property(&self) -> PropertyId {
        self.mainsnak.property
    }

    pub fn value(&self) -> Option<&Value> {
        self.mainsnak.value.as_value()
    }

    /// Validate every value carried by the claim.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let snaks = std::iter::once(&self.mainsnak)
            .chain(self.qualifiers.iter())
            .chain(self.references.iter().flat_map(|r| r.iter()));
        for snak in snaks {
            if let SnakValue::Value(v) = &snak.value {
                v.validate()?;
            }
        }
        Ok(())
    }
}

/// Qualifier snaks of one statement. The count is the number of snaks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Qualifiers {
    snaks: Vec<Snak>,
}

impl Qualifiers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, snak: Snak) -> &mut Self {
        self.snaks.push(snak);
        self
    }

    pub fn contains(&self, snak: &Snak) -> bool {
        self.snaks.contains(snak)
    }

    /// Same snaks with the same multiplicity, in any order.
    pub fn same_members(&self, other: &Qualifiers) -> bool {
        same_members(&self.snaks, &other.snaks)
    }

    pub fn len(&self) -> usize {
        self.snaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snaks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Snak> {
        self.snaks.iter()
    }
}

impl FromIterator<Snak> for Qualifiers {
    fn from_iter<I: IntoIterator<Item = Snak>>(iter: I) -> Self {
        Self {
            snaks: iter.into_iter().collect(),
        }
    }
}

/// One provenance record: a group of snaks. Snak order does not matter for
/// equality.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reference {
    snaks: Vec<Snak>,
}

impl Reference {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snak(mut self, snak: Snak) -> Self {
        self.snaks.push(snak);
        self
    }

    pub fn add(&mut self, snak: Snak) -> &mut Self {
        self.snaks.push(snak);
        self
    }

    pub fn len(&self) -> usize {
        self.snaks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snaks.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Snak> {
        self.snaks.iter()
    }
}

impl PartialEq for Reference {
    fn eq(&self, other: &Self) -> bool {
        same_members(&self.snaks, &other.snaks)
    }
}

impl FromIterator<Snak> for Reference {
    fn from_iter<I: IntoIterator<Item = Snak>>(iter: I) -> Self {
        Self {
            snaks: iter.into_iter().collect(),
        }
    }
}

/// References of one statement. Adding a reference equal to one already
/// present is a no-op.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct References {
    references: Vec<Reference>,
}

impl References {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, reference: Reference) -> &mut Self {
        if !self.references.contains(&reference) {
            self.references.push(reference);
        }
        self
    }

    pub fn contains(&self, reference: &Reference) -> bool {
        self.references.contains(reference)
    }

    /// Same reference groups, in any order.
    pub fn same_members(&self, other: &References) -> bool {
        same_members(&self.references, &other.references)
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Reference> {
        self.references.iter()
    }
}

/// Multiset equality: every element of `a` pairs with a distinct equal
/// element of `b`.
fn same_members<T: PartialEq>(a: &[T], b: &[T]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut used = vec![false; b.len()];
    a.iter().all(|x| {
        match b
            .iter()
            .enumerate()
            .position(|(i, y)| !used[i] && x == y)
        {
            Some(i) => {
                used[i] = true;
                true
            }
            None => false,
        }
    })
}

/// Anything that carries a set of claims destined for one remote entity.
pub trait ClaimBearing {
    fn claims(&self) -> &[Claim];

    /// Remote id of the entity, if it is already known.
    fn entity_id(&self) -> Option<&str> {
        None
    }
}

/// A local entity being prepared for a write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub claims: Vec<Claim>,
}

impl Item {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            claims: Vec::new(),
        }
    }

    pub fn with_claim(mut self, claim: Claim) -> Self {
        self.claims.push(claim);
        self
    }

    pub fn add_claim(&mut self, claim: Claim) -> &mut Self {
        self.claims.push(claim);
        self
    }
}

impl ClaimBearing for Item {
    fn claims(&self) -> &[Claim] {
        &self.claims
    }

    fn entity_id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

impl ClaimBearing for [Claim] {
    fn claims(&self) -> &[Claim] {
        self
    }
}

impl ClaimBearing for Vec<Claim> {
    fn claims(&self) -> &[Claim] {
        self
    }
}
