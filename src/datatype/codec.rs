//! Value codecs: the bridge between SPARQL rows and typed values.
//!
//! A [`CodecRegistry`] maps a remote property type tag to a [`ValueCodec`].
//! Dispatch is a hash lookup on the exact tag; an unknown tag is a
//! configuration error, never a silent skip.

use std::collections::HashMap;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use super::literal::{iri, lang_tagged, quoted, typed};
use super::time::normalize_timestamp;
use super::{normalize_amount, tag, GlobeCoordinate, SnakValue, Time, Value, EARTH};
use crate::error::{ConfigError, FastrunResult, QueryError};
use crate::query::{Binding, TermKind};

const XSD_DATETIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";
const GEO_WKT_LITERAL: &str = "http://www.opengis.net/ont/geosparql#wktLiteral";
const MATHML: &str = "http://www.w3.org/1998/Math/MathML";

const COMMONS_FILE_PATH: &str = "http://commons.wikimedia.org/wiki/Special:FilePath/";
const COMMONS_DATA: &str = "http://commons.wikimedia.org/data/main/";

/// Bytes escaped in Commons file names (PHP `rawurlencode`).
const FILE_NAME: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');
/// Data page titles keep their namespace separator.
const PAGE_TITLE: &AsciiSet = &FILE_NAME.remove(b':').remove(b'/');

/// Marker path of skolemized "unknown value" nodes in Wikibase RDF dumps.
const UNKNOWN_VALUE_MARKER: &str = "/.well-known/genid/";

/// Decode/render capability pair for one remote property type.
pub trait ValueCodec: Send + Sync {
    /// The `wikibase:propertyType` IRI this codec handles.
    fn type_tag(&self) -> &str;

    /// Turn a bound `?value` term into a snak value.
    fn decode(&self, binding: &Binding, wikibase_url: &str) -> FastrunResult<SnakValue>;

    /// Render a value to its identity string, which is also a valid SPARQL
    /// term. Returns `None` if the value is not of this codec's type.
    fn identity(&self, value: &Value, wikibase_url: &str) -> Option<String>;
}

/// Registry of codecs keyed by type tag.
pub struct CodecRegistry {
    codecs: HashMap<String, Box<dyn ValueCodec>>,
}

impl CodecRegistry {
    /// A registry with no codecs at all.
    pub fn empty() -> Self {
        Self {
            codecs: HashMap::new(),
        }
    }

    /// A registry with every built-in Wikibase datatype.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(EntityCodec {
            tag: tag::WIKIBASE_ITEM,
            make: Value::item,
        }));
        registry.register(Box::new(EntityCodec {
            tag: tag::WIKIBASE_PROPERTY,
            make: Value::property,
        }));
        registry.register(Box::new(EntityCodec {
            tag: tag::WIKIBASE_LEXEME,
            make: Value::lexeme,
        }));
        registry.register(Box::new(EntityCodec {
            tag: tag::WIKIBASE_FORM,
            make: Value::form,
        }));
        registry.register(Box::new(EntityCodec {
            tag: tag::WIKIBASE_SENSE,
            make: Value::sense,
        }));
        registry.register(Box::new(StringCodec {
            tag: tag::STRING,
            make: Value::String,
        }));
        registry.register(Box::new(StringCodec {
            tag: tag::EXTERNAL_ID,
            make: Value::ExternalId,
        }));
        registry.register(Box::new(StringCodec {
            tag: tag::MUSICAL_NOTATION,
            make: Value::MusicalNotation,
        }));
        registry.register(Box::new(EntityCodec {
            tag: tag::ENTITY_SCHEMA,
            make: Value::entity_schema,
        }));
        registry.register(Box::new(CommonsPageCodec {
            tag: tag::COMMONS_MEDIA,
            base: COMMONS_FILE_PATH,
            encode_set: FILE_NAME,
            make: Value::commons_media,
        }));
        registry.register(Box::new(CommonsPageCodec {
            tag: tag::GEO_SHAPE,
            base: COMMONS_DATA,
            encode_set: PAGE_TITLE,
            make: Value::geo_shape,
        }));
        registry.register(Box::new(CommonsPageCodec {
            tag: tag::TABULAR_DATA,
            base: COMMONS_DATA,
            encode_set: PAGE_TITLE,
            make: Value::tabular_data,
        }));
        registry.register(Box::new(MathCodec));
        registry.register(Box::new(UrlCodec));
        registry.register(Box::new(TimeCodec));
        registry.register(Box::new(QuantityCodec));
        registry.register(Box::new(MonolingualTextCodec));
        registry.register(Box::new(GlobeCoordinateCodec));
        registry
    }

    /// Add or replace the codec for its type tag.
    pub fn register(&mut self, codec: Box<dyn ValueCodec>) {
        self.codecs.insert(codec.type_tag().to_string(), codec);
    }

    pub fn get(&self, type_tag: &str) -> Result<&dyn ValueCodec, ConfigError> {
        self.codecs
            .get(type_tag)
            .map(|c| &**c)
            .ok_or_else(|| ConfigError::UnknownTypeTag {
                tag: type_tag.to_string(),
            })
    }

    pub fn contains(&self, type_tag: &str) -> bool {
        self.codecs.contains_key(type_tag)
    }

    /// Decode a bound value with the codec registered for `type_tag`.
    pub fn decode(
        &self,
        type_tag: &str,
        binding: &Binding,
        wikibase_url: &str,
    ) -> FastrunResult<SnakValue> {
        self.get(type_tag)?.decode(binding, wikibase_url)
    }

    /// Identity string of a concrete value.
    pub fn identity(&self, value: &Value, wikibase_url: &str) -> FastrunResult<Option<String>> {
        Ok(self.get(value.type_tag())?.identity(value, wikibase_url))
    }

    /// Identity string of a snak value; unknown and no-value snaks have none.
    pub fn snak_identity(
        &self,
        value: &SnakValue,
        wikibase_url: &str,
    ) -> FastrunResult<Option<String>> {
        match value {
            SnakValue::Value(v) => self.identity(v, wikibase_url),
            SnakValue::SomeValue | SnakValue::NoValue => Ok(None),
        }
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut tags: Vec<&String> = self.codecs.keys().collect();
        tags.sort();
        f.debug_struct("CodecRegistry").field("tags", &tags).finish()
    }
}

fn is_unknown_value(binding: &Binding) -> bool {
    match binding.kind {
        TermKind::Bnode => true,
        TermKind::Uri => binding.value.contains(UNKNOWN_VALUE_MARKER),
        TermKind::Literal => false,
    }
}

fn unexpected(binding: &Binding, message: impl Into<String>) -> QueryError {
    QueryError::UnexpectedBinding {
        term: binding.value.clone(),
        message: message.into(),
    }
}

fn expect_kind(binding: &Binding, kind: TermKind) -> Result<(), QueryError> {
    if binding.kind == kind {
        Ok(())
    } else {
        Err(unexpected(binding, format!("expected {kind:?}, found {:?}", binding.kind)))
    }
}

// ---------------------------------------------------------------------------
// Built-in codecs
// ---------------------------------------------------------------------------

/// Items, properties, lexemes, forms, senses and entity schemas:
/// `<{wikibase}/entity/{id}>`.
struct EntityCodec {
    tag: &'static str,
    make: fn(&str) -> Result<Value, ConfigError>,
}

impl ValueCodec for EntityCodec {
    fn type_tag(&self) -> &str {
        self.tag
    }

    fn decode(&self, binding: &Binding, _wikibase_url: &str) -> FastrunResult<SnakValue> {
        if is_unknown_value(binding) {
            return Ok(SnakValue::SomeValue);
        }
        expect_kind(binding, TermKind::Uri)?;
        let id = binding.value.rsplit('/').next().unwrap_or_default();
        let value = (self.make)(id).map_err(|e| unexpected(binding, e.to_string()))?;
        Ok(SnakValue::Value(value))
    }

    fn identity(&self, value: &Value, wikibase_url: &str) -> Option<String> {
        let id = match value {
            Value::WikibaseItem(id)
            | Value::WikibaseProperty(id)
            | Value::WikibaseLexeme(id)
            | Value::WikibaseForm(id)
            | Value::WikibaseSense(id)
            | Value::EntitySchema(id) => id,
            _ => return None,
        };
        (value.type_tag() == self.tag).then(|| iri(&format!("{wikibase_url}/entity/{id}")))
    }
}

/// Plain string literals: strings, external identifiers and musical notation.
struct StringCodec {
    tag: &'static str,
    make: fn(String) -> Value,
}

impl ValueCodec for StringCodec {
    fn type_tag(&self) -> &str {
        self.tag
    }

    fn decode(&self, binding: &Binding, _wikibase_url: &str) -> FastrunResult<SnakValue> {
        if is_unknown_value(binding) {
            return Ok(SnakValue::SomeValue);
        }
        expect_kind(binding, TermKind::Literal)?;
        Ok(SnakValue::Value((self.make)(binding.value.clone())))
    }

    fn identity(&self, value: &Value, _wikibase_url: &str) -> Option<String> {
        match value {
            Value::String(s) | Value::ExternalId(s) | Value::MusicalNotation(s)
                if value.type_tag() == self.tag =>
            {
                Some(quoted(s))
            }
            _ => None,
        }
    }
}

struct UrlCodec;

impl ValueCodec for UrlCodec {
    fn type_tag(&self) -> &str {
        tag::URL
    }

    fn decode(&self, binding: &Binding, _wikibase_url: &str) -> FastrunResult<SnakValue> {
        if is_unknown_value(binding) {
            return Ok(SnakValue::SomeValue);
        }
        expect_kind(binding, TermKind::Uri)?;
        Ok(SnakValue::Value(Value::Url(binding.value.clone())))
    }

    fn identity(&self, value: &Value, _wikibase_url: &str) -> Option<String> {
        match value {
            Value::Url(url) => Some(iri(url)),
            _ => None,
        }
    }
}

/// Pages on Wikimedia Commons, rendered as IRIs under a fixed base:
/// media files, geo shapes and tabular data.
struct CommonsPageCodec {
    tag: &'static str,
    base: &'static str,
    encode_set: &'static AsciiSet,
    make: fn(&str) -> Result<Value, ConfigError>,
}

impl ValueCodec for CommonsPageCodec {
    fn type_tag(&self) -> &str {
        self.tag
    }

    fn decode(&self, binding: &Binding, _wikibase_url: &str) -> FastrunResult<SnakValue> {
        if is_unknown_value(binding) {
            return Ok(SnakValue::SomeValue);
        }
        expect_kind(binding, TermKind::Uri)?;
        // Commons IRIs show up with either scheme.
        let raw = binding.value.replacen("https://", "http://", 1);
        let encoded = raw
            .strip_prefix(self.base)
            .ok_or_else(|| unexpected(binding, format!("expected an IRI under {}", self.base)))?;
        let page = percent_decode_str(encoded)
            .decode_utf8()
            .map_err(|e| unexpected(binding, e.to_string()))?;
        let value = (self.make)(&page).map_err(|e| unexpected(binding, e.to_string()))?;
        Ok(SnakValue::Value(value))
    }

    fn identity(&self, value: &Value, _wikibase_url: &str) -> Option<String> {
        let page = match value {
            Value::CommonsMedia(page) | Value::GeoShape(page) | Value::TabularData(page) => page,
            _ => return None,
        };
        (value.type_tag() == self.tag).then(|| {
            iri(&format!(
                "{}{}",
                self.base,
                utf8_percent_encode(page, self.encode_set)
            ))
        })
    }
}

struct MathCodec;

impl ValueCodec for MathCodec {
    fn type_tag(&self) -> &str {
        tag::MATH
    }

    fn decode(&self, binding: &Binding, _wikibase_url: &str) -> FastrunResult<SnakValue> {
        if is_unknown_value(binding) {
            return Ok(SnakValue::SomeValue);
        }
        expect_kind(binding, TermKind::Literal)?;
        Ok(SnakValue::Value(Value::Math(binding.value.clone())))
    }

    fn identity(&self, value: &Value, _wikibase_url: &str) -> Option<String> {
        match value {
            Value::Math(tex) => Some(typed(tex, &format!("<{MATHML}>"))),
            _ => None,
        }
    }
}

struct TimeCodec;

impl ValueCodec for TimeCodec {
    fn type_tag(&self) -> &str {
        tag::TIME
    }

    fn decode(&self, binding: &Binding, _wikibase_url: &str) -> FastrunResult<SnakValue> {
        if is_unknown_value(binding) {
            return Ok(SnakValue::SomeValue);
        }
        expect_kind(binding, TermKind::Literal)?;
        if binding.datatype.as_deref() != Some(XSD_DATETIME) {
            return Err(unexpected(binding, "expected an xsd:dateTime literal").into());
        }
        let time = Time::new(&binding.value).map_err(|e| unexpected(binding, e.to_string()))?;
        Ok(SnakValue::Value(Value::Time(time)))
    }

    fn identity(&self, value: &Value, _wikibase_url: &str) -> Option<String> {
        match value {
            Value::Time(t) => {
                let time = normalize_timestamp(&t.time).unwrap_or_else(|_| t.time.clone());
                Some(typed(&time, "xsd:dateTime"))
            }
            _ => None,
        }
    }
}

struct QuantityCodec;

impl ValueCodec for QuantityCodec {
    fn type_tag(&self) -> &str {
        tag::QUANTITY
    }

    fn decode(&self, binding: &Binding, _wikibase_url: &str) -> FastrunResult<SnakValue> {
        if is_unknown_value(binding) {
            return Ok(SnakValue::SomeValue);
        }
        expect_kind(binding, TermKind::Literal)?;
        let value =
            Value::quantity(&binding.value).map_err(|e| unexpected(binding, e.to_string()))?;
        Ok(SnakValue::Value(value))
    }

    fn identity(&self, value: &Value, _wikibase_url: &str) -> Option<String> {
        match value {
            Value::Quantity(q) => Some(typed(&normalize_amount(&q.amount), "xsd:decimal")),
            _ => None,
        }
    }
}

struct MonolingualTextCodec;

impl ValueCodec for MonolingualTextCodec {
    fn type_tag(&self) -> &str {
        tag::MONOLINGUAL_TEXT
    }

    fn decode(&self, binding: &Binding, _wikibase_url: &str) -> FastrunResult<SnakValue> {
        if is_unknown_value(binding) {
            return Ok(SnakValue::SomeValue);
        }
        expect_kind(binding, TermKind::Literal)?;
        let language = binding
            .lang
            .as_deref()
            .ok_or_else(|| unexpected(binding, "monolingual text without a language tag"))?;
        Ok(SnakValue::Value(Value::monolingual_text(
            binding.value.clone(),
            language,
        )))
    }

    fn identity(&self, value: &Value, _wikibase_url: &str) -> Option<String> {
        match value {
            Value::MonolingualText(m) => Some(lang_tagged(&m.text, &m.language)),
            _ => None,
        }
    }
}

struct GlobeCoordinateCodec;

impl GlobeCoordinateCodec {
    /// Parse `Point(lon lat)`, optionally prefixed by `<globe> `.
    fn parse_wkt(raw: &str) -> Option<GlobeCoordinate> {
        let raw = raw.trim();
        let (globe, point) = match raw.strip_prefix('<') {
            Some(rest) => {
                let (globe, point) = rest.split_once('>')?;
                (globe.to_string(), point.trim())
            }
            None => (EARTH.to_string(), raw),
        };
        let inner = point.strip_prefix("Point(")?.strip_suffix(')')?;
        let mut parts = inner.split_whitespace();
        let longitude: f64 = parts.next()?.parse().ok()?;
        let latitude: f64 = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(GlobeCoordinate {
            latitude,
            longitude,
            precision: None,
            globe,
        })
    }
}

impl ValueCodec for GlobeCoordinateCodec {
    fn type_tag(&self) -> &str {
        tag::GLOBE_COORDINATE
    }

    fn decode(&self, binding: &Binding, _wikibase_url: &str) -> FastrunResult<SnakValue> {
        if is_unknown_value(binding) {
            return Ok(SnakValue::SomeValue);
        }
        expect_kind(binding, TermKind::Literal)?;
        if let Some(dt) = binding.datatype.as_deref() {
            if dt != GEO_WKT_LITERAL {
                return Err(unexpected(binding, "expected a geo:wktLiteral").into());
            }
        }
        let coordinate = Self::parse_wkt(&binding.value)
            .ok_or_else(|| unexpected(binding, "expected \"Point(longitude latitude)\""))?;
        Ok(SnakValue::Value(Value::GlobeCoordinate(coordinate)))
    }

    fn identity(&self, value: &Value, _wikibase_url: &str) -> Option<String> {
        match value {
            Value::GlobeCoordinate(c) => {
                let point = format!("Point({} {})", c.longitude, c.latitude);
                let wkt = if c.globe == EARTH {
                    point
                } else {
                    format!("<{}> {point}", c.globe)
                };
                Some(typed(&wkt, "geo:wktLiteral"))
            }
            _ => None,
        }
    }
}
