//! Typed statement values.
//!
//! A [`Value`] is the object of a statement, a qualifier or a reference snak.
//! Values are plain data: how a value is decoded from a SPARQL row and how it
//! is rendered to its identity string is the job of a
//! [`codec::ValueCodec`], looked up by the value's remote type tag.

pub mod codec;
pub mod literal;
pub mod time;

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::property::PropertyId;

pub use time::{Precision, Time};

/// Remote property type tags, as reported by `wikibase:propertyType`.
pub mod tag {
    pub const WIKIBASE_ITEM: &str = "http://wikiba.se/ontology#WikibaseItem";
    pub const WIKIBASE_PROPERTY: &str = "http://wikiba.se/ontology#WikibaseProperty";
    pub const WIKIBASE_LEXEME: &str = "http://wikiba.se/ontology#WikibaseLexeme";
    pub const WIKIBASE_FORM: &str = "http://wikiba.se/ontology#WikibaseForm";
    pub const WIKIBASE_SENSE: &str = "http://wikiba.se/ontology#WikibaseSense";
    pub const STRING: &str = "http://wikiba.se/ontology#String";
    pub const EXTERNAL_ID: &str = "http://wikiba.se/ontology#ExternalId";
    pub const URL: &str = "http://wikiba.se/ontology#Url";
    pub const TIME: &str = "http://wikiba.se/ontology#Time";
    pub const QUANTITY: &str = "http://wikiba.se/ontology#Quantity";
    pub const MONOLINGUAL_TEXT: &str = "http://wikiba.se/ontology#Monolingualtext";
    pub const GLOBE_COORDINATE: &str = "http://wikiba.se/ontology#GlobeCoordinate";
    pub const COMMONS_MEDIA: &str = "http://wikiba.se/ontology#CommonsMedia";
    pub const GEO_SHAPE: &str = "http://wikiba.se/ontology#GeoShape";
    pub const TABULAR_DATA: &str = "http://wikiba.se/ontology#TabularData";
    pub const MATH: &str = "http://wikiba.se/ontology#Math";
    pub const MUSICAL_NOTATION: &str = "http://wikiba.se/ontology#MusicalNotation";
    pub const ENTITY_SCHEMA: &str = "http://wikiba.se/ontology#EntitySchema";
}

/// Earth, the default globe for coordinates.
pub const EARTH: &str = "http://www.wikidata.org/entity/Q2";

static RE_ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^Q[0-9]+$").unwrap());
static RE_PROPERTY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^P[0-9]+$").unwrap());
static RE_LEXEME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^L[0-9]+$").unwrap());
static RE_FORM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^L[0-9]+-F[0-9]+$").unwrap());
static RE_SENSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^L[0-9]+-S[0-9]+$").unwrap());
static RE_ENTITY_SCHEMA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^E[0-9]+$").unwrap());
static RE_FILE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^#<>\[\]|{}/:\n]+\.[A-Za-z0-9]+$").unwrap());
static RE_GEO_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Data:[^#<>\[\]|{}\n]+\.map$").unwrap());
static RE_TABULAR_DATA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Data:[^#<>\[\]|{}\n]+\.tab$").unwrap());
static RE_DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?$").unwrap());

/// A typed statement value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "kebab-case")]
pub enum Value {
    WikibaseItem(String),
    WikibaseProperty(String),
    WikibaseLexeme(String),
    WikibaseForm(String),
    WikibaseSense(String),
    String(String),
    ExternalId(String),
    Url(String),
    Time(Time),
    Quantity(Quantity),
    #[serde(rename = "monolingualtext")]
    MonolingualText(MonolingualText),
    GlobeCoordinate(GlobeCoordinate),
    /// File name on Wikimedia Commons, e.g. `"Douglas adams portrait.jpg"`.
    #[serde(rename = "commonsMedia")]
    CommonsMedia(String),
    /// Commons data page title, e.g. `"Data:Berlin.map"`.
    GeoShape(String),
    /// Commons data page title, e.g. `"Data:Population.tab"`.
    TabularData(String),
    /// TeX source.
    Math(String),
    /// LilyPond source.
    MusicalNotation(String),
    EntitySchema(String),
}

/// Decimal amount with a unit (`"1"` for unitless).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quantity {
    pub amount: String,
    #[serde(default = "unitless")]
    pub unit: String,
}

fn unitless() -> String {
    "1".into()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MonolingualText {
    pub text: String,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobeCoordinate {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub precision: Option<f64>,
    #[serde(default = "earth")]
    pub globe: String,
}

fn earth() -> String {
    EARTH.into()
}

impl Value {
    pub fn item(id: &str) -> Result<Self, ConfigError> {
        Self::checked(Value::WikibaseItem(id.to_string()))
    }

    pub fn property(id: &str) -> Result<Self, ConfigError> {
        Self::checked(Value::WikibaseProperty(id.to_string()))
    }

    pub fn lexeme(id: &str) -> Result<Self, ConfigError> {
        Self::checked(Value::WikibaseLexeme(id.to_string()))
    }

    pub fn form(id: &str) -> Result<Self, ConfigError> {
        Self::checked(Value::WikibaseForm(id.to_string()))
    }

    pub fn sense(id: &str) -> Result<Self, ConfigError> {
        Self::checked(Value::WikibaseSense(id.to_string()))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Value::String(value.into())
    }

    pub fn external_id(value: impl Into<String>) -> Self {
        Value::ExternalId(value.into())
    }

    pub fn url(value: impl Into<String>) -> Self {
        Value::Url(value.into())
    }

    pub fn time(time: &str) -> Result<Self, ConfigError> {
        Ok(Value::Time(Time::new(time)?))
    }

    /// Unitless quantity. A leading `+` on the amount is dropped.
    pub fn quantity(amount: &str) -> Result<Self, ConfigError> {
        Self::quantity_with_unit(amount, "1")
    }

    pub fn quantity_with_unit(amount: &str, unit: &str) -> Result<Self, ConfigError> {
        Self::checked(Value::Quantity(Quantity {
            amount: normalize_amount(amount),
            unit: unit.to_string(),
        }))
    }

    pub fn monolingual_text(text: impl Into<String>, language: impl Into<String>) -> Self {
        Value::MonolingualText(MonolingualText {
            text: text.into(),
            language: language.into(),
        })
    }

    pub fn globe_coordinate(latitude: f64, longitude: f64) -> Result<Self, ConfigError> {
        Self::checked(Value::GlobeCoordinate(GlobeCoordinate {
            latitude,
            longitude,
            precision: None,
            globe: EARTH.into(),
        }))
    }

    pub fn commons_media(file: &str) -> Result<Self, ConfigError> {
        Self::checked(Value::CommonsMedia(file.to_string()))
    }

    pub fn geo_shape(page: &str) -> Result<Self, ConfigError> {
        Self::checked(Value::GeoShape(page.to_string()))
    }

    pub fn tabular_data(page: &str) -> Result<Self, ConfigError> {
        Self::checked(Value::TabularData(page.to_string()))
    }

    pub fn math(tex: impl Into<String>) -> Self {
        Value::Math(tex.into())
    }

    pub fn musical_notation(notation: impl Into<String>) -> Self {
        Value::MusicalNotation(notation.into())
    }

    pub fn entity_schema(id: &str) -> Result<Self, ConfigError> {
        Self::checked(Value::EntitySchema(id.to_string()))
    }

    fn checked(value: Value) -> Result<Self, ConfigError> {
        value.validate()?;
        Ok(value)
    }

    /// Remote type tag of the codec that handles this value.
    pub fn type_tag(&self) -> &'static str {
        match self {
            Value::WikibaseItem(_) => tag::WIKIBASE_ITEM,
            Value::WikibaseProperty(_) => tag::WIKIBASE_PROPERTY,
            Value::WikibaseLexeme(_) => tag::WIKIBASE_LEXEME,
            Value::WikibaseForm(_) => tag::WIKIBASE_FORM,
            Value::WikibaseSense(_) => tag::WIKIBASE_SENSE,
            Value::String(_) => tag::STRING,
            Value::ExternalId(_) => tag::EXTERNAL_ID,
            Value::Url(_) => tag::URL,
            Value::Time(_) => tag::TIME,
            Value::Quantity(_) => tag::QUANTITY,
            Value::MonolingualText(_) => tag::MONOLINGUAL_TEXT,
            Value::GlobeCoordinate(_) => tag::GLOBE_COORDINATE,
            Value::CommonsMedia(_) => tag::COMMONS_MEDIA,
            Value::GeoShape(_) => tag::GEO_SHAPE,
            Value::TabularData(_) => tag::TABULAR_DATA,
            Value::Math(_) => tag::MATH,
            Value::MusicalNotation(_) => tag::MUSICAL_NOTATION,
            Value::EntitySchema(_) => tag::ENTITY_SCHEMA,
        }
    }

    /// Check the value's shape. Values built through the constructors are
    /// always valid; deserialized values should be checked before use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (re, datatype, expected, raw): (&Regex, &'static str, &'static str, &str) = match self {
            Value::WikibaseItem(id) => (&*RE_ITEM, "item", "Item ids look like \"Q42\".", id.as_str()),
            Value::WikibaseProperty(id) => (
                &*RE_PROPERTY,
                "property",
                "Property ids look like \"P31\".",
                id.as_str(),
            ),
            Value::WikibaseLexeme(id) => {
                (&*RE_LEXEME, "lexeme", "Lexeme ids look like \"L7\".", id.as_str())
            }
            Value::WikibaseForm(id) => (&*RE_FORM, "form", "Form ids look like \"L7-F1\".", id.as_str()),
            Value::WikibaseSense(id) => {
                (&*RE_SENSE, "sense", "Sense ids look like \"L7-S1\".", id.as_str())
            }
            Value::EntitySchema(id) => (
                &*RE_ENTITY_SCHEMA,
                "entity schema",
                "Entity schema ids look like \"E10\".",
                id.as_str(),
            ),
            Value::CommonsMedia(file) => (
                &*RE_FILE_NAME,
                "commons media",
                "Commons media values are file names such as \"Portrait.jpg\", without the \"File:\" prefix.",
                file.as_str(),
            ),
            Value::GeoShape(page) => (
                &*RE_GEO_SHAPE,
                "geo shape",
                "Geo shapes are Commons data pages such as \"Data:Berlin.map\".",
                page.as_str(),
            ),
            Value::TabularData(page) => (
                &*RE_TABULAR_DATA,
                "tabular data",
                "Tabular data values are Commons data pages such as \"Data:Population.tab\".",
                page.as_str(),
            ),
            Value::Quantity(q) => (
                &*RE_DECIMAL,
                "quantity",
                "Quantity amounts are decimal numbers such as \"-1.5\".",
                q.amount.as_str(),
            ),
            Value::Time(t) => return t.validate(),
            Value::GlobeCoordinate(c) => {
                let in_range = (-90.0..=90.0).contains(&c.latitude)
                    && (-360.0..=360.0).contains(&c.longitude);
                if in_range {
                    return Ok(());
                }
                return Err(ConfigError::InvalidValue {
                    datatype: "globe coordinate",
                    value: format!("{} {}", c.latitude, c.longitude),
                    expected: "Latitude must be within [-90, 90] and longitude within [-360, 360].",
                });
            }
            Value::String(_)
            | Value::ExternalId(_)
            | Value::Url(_)
            | Value::MonolingualText(_)
            | Value::Math(_)
            | Value::MusicalNotation(_) => return Ok(()),
        };
        if re.is_match(raw) {
            Ok(())
        } else {
            Err(ConfigError::InvalidValue {
                datatype,
                value: raw.to_string(),
                expected,
            })
        }
    }
}

pub(crate) fn normalize_amount(amount: &str) -> String {
    let trimmed = amount.trim();
    trimmed.strip_prefix('+').unwrap_or(trimmed).to_string()
}

/// The object of a snak: a concrete value, an unknown value, or no value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SnakValue {
    Value(Value),
    SomeValue,
    NoValue,
}

impl SnakValue {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            SnakValue::Value(v) => Some(v),
            _ => None,
        }
    }
}

impl From<Value> for SnakValue {
    fn from(value: Value) -> Self {
        SnakValue::Value(value)
    }
}

/// A property/value pair: the main part of a claim, a qualifier, or one
/// entry of a reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snak {
    pub property: PropertyId,
    pub value: SnakValue,
}

impl Snak {
    pub fn new(property: PropertyId, value: impl Into<SnakValue>) -> Self {
        Self {
            property,
            value: value.into(),
        }
    }

    pub fn some_value(property: PropertyId) -> Self {
        Self {
            property,
            value: SnakValue::SomeValue,
        }
    }

    pub fn no_value(property: PropertyId) -> Self {
        Self {
            property,
            value: SnakValue::NoValue,
        }
    }
}
