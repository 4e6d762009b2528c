//! Statement, qualifier and reference loaders.
//!
//! All loaders page through the Query Interface until a short page comes
//! back and record every property type they see.

use std::collections::{BTreeMap, HashSet};

use super::cache::{CachedStatement, PropertyStatements};
use super::{sparql, FastrunEngine};
use crate::datatype::{Snak, SnakValue};
use crate::error::{FastrunResult, InputError, QueryError};
use crate::model::{Claim, Qualifiers, Reference, References};
use crate::property::PropertyId;
use crate::query::{binding, paginate, Row};

impl FastrunEngine {
    /// Load the statements of every property used by `claims`.
    ///
    /// Properties already cached are skipped unless `use_cache` (default:
    /// the engine's flag) is false. A reload replaces the property's cache
    /// entry only once every page has been fetched and decoded; on error the
    /// previous entry stays as it was.
    ///
    /// When qualifier comparison is on, the first claim of each property
    /// narrows the load to statements carrying all of its qualifiers.
    pub fn load_statements(
        &mut self,
        claims: &[Claim],
        use_cache: Option<bool>,
        wikibase_url: Option<&str>,
        limit: Option<usize>,
    ) -> FastrunResult<()> {
        let use_cache = use_cache.unwrap_or(self.config.use_cache);
        let wikibase_url = wikibase_url.unwrap_or(&self.config.wikibase_url).to_string();
        let limit = limit.unwrap_or(self.config.page_limit);

        let mut seen = HashSet::new();
        for claim in claims {
            let property = claim.property();
            if !seen.insert(property) {
                continue;
            }
            if use_cache && self.cache.is_loaded(property) {
                tracing::trace!(%property, "property already cached");
                continue;
            }

            let (statements, property_type) = self.fetch_statements(claim, &wikibase_url, limit)?;
            tracing::debug!(
                %property,
                values = statements.len(),
                "loaded statements"
            );
            if let Some(property_type) = property_type {
                self.cache.observe_type(property, &property_type);
            }
            self.cache.replace(property, statements);
        }
        Ok(())
    }

    fn fetch_statements(
        &self,
        claim: &Claim,
        wikibase_url: &str,
        limit: usize,
    ) -> FastrunResult<(PropertyStatements, Option<String>)> {
        let property = claim.property();
        let filter = self.config.base_filter.render(&self.codecs, wikibase_url)?;
        let qualifier_filter = if self.config.use_qualifiers {
            self.qualifier_filter(claim, wikibase_url)?
        } else {
            Vec::new()
        };

        let rows = paginate(
            self.query.as_ref(),
            &self.config.sparql_endpoint_url,
            limit,
            |offset| {
                sparql::statements_query(
                    &filter,
                    property,
                    &qualifier_filter,
                    wikibase_url,
                    offset,
                    limit,
                )
            },
        )?;

        let mut statements = PropertyStatements::new();
        let mut property_type: Option<String> = None;
        let mut sids = HashSet::new();
        for row in &rows {
            let entity = binding(row, "entity")?;
            let sid = binding(row, "sid")?;
            let type_tag = &binding(row, "property_type")?.value;
            let value = self.codecs.decode(type_tag, binding(row, "value")?, wikibase_url)?;
            property_type.get_or_insert_with(|| type_tag.clone());

            if !sids.insert(sid.value.as_str()) {
                continue;
            }
            match self.codecs.snak_identity(&value, wikibase_url)? {
                Some(identity) => statements
                    .entry(identity)
                    .or_default()
                    .push(CachedStatement::new(entity.value.as_str(), sid.value.as_str())),
                None => tracing::trace!(statement = %sid.value, "dropping value without identity"),
            }
        }
        Ok((statements, property_type))
    }

    /// `(qualifier property, identity)` pairs for the load query. Unknown and
    /// no-value qualifiers cannot be matched by value and are left out.
    fn qualifier_filter(
        &self,
        claim: &Claim,
        wikibase_url: &str,
    ) -> FastrunResult<Vec<(PropertyId, String)>> {
        let mut filter = Vec::new();
        for snak in claim.qualifiers.iter() {
            let SnakValue::Value(value) = &snak.value else {
                continue;
            };
            let identity = self.codecs.identity(value, wikibase_url)?.ok_or_else(|| {
                InputError::UnrenderableValue {
                    property: snak.property.to_string(),
                }
            })?;
            filter.push((snak.property, identity));
        }
        Ok(filter)
    }

    /// Qualifiers of one remote statement.
    pub fn load_qualifiers(&mut self, sid: &str, limit: Option<usize>) -> FastrunResult<Qualifiers> {
        let statement = sparql::statement_term(sid)?;
        let limit = limit.unwrap_or(self.config.page_limit);
        let rows = paginate(
            self.query.as_ref(),
            &self.config.sparql_endpoint_url,
            limit,
            |offset| sparql::qualifiers_query(&statement, offset, limit),
        )?;

        let mut qualifiers = Qualifiers::new();
        for row in &rows {
            qualifiers.add(self.decode_snak(row, "property", "value")?);
        }
        Ok(qualifiers)
    }

    /// References of one remote statement, one [`Reference`] per reference
    /// node.
    pub fn load_references(&mut self, sid: &str, limit: Option<usize>) -> FastrunResult<References> {
        let statement = sparql::statement_term(sid)?;
        let limit = limit.unwrap_or(self.config.page_limit);
        let rows = paginate(
            self.query.as_ref(),
            &self.config.sparql_endpoint_url,
            limit,
            |offset| sparql::references_query(&statement, offset, limit),
        )?;

        let mut groups: BTreeMap<String, Reference> = BTreeMap::new();
        for row in &rows {
            let srid = binding(row, "srid")?.value.clone();
            let snak = self.decode_snak(row, "ref_property", "ref_value")?;
            groups.entry(srid).or_default().add(snak);
        }

        let mut references = References::new();
        for reference in groups.into_values() {
            references.add(reference);
        }
        Ok(references)
    }

    /// Ask the store for the type of `property` and record it.
    pub fn fetch_property_type(&mut self, property: PropertyId) -> FastrunResult<String> {
        let query = sparql::property_type_query(property, &self.config.wikibase_url);
        let rows = self.query.execute(&query, &self.config.sparql_endpoint_url)?;
        let row = rows.first().ok_or_else(|| QueryError::MissingBinding {
            variable: "property_type".into(),
        })?;
        let property_type = binding(row, "property_type")?.value.clone();
        self.cache.observe_type(property, &property_type);
        Ok(property_type)
    }

    fn decode_snak(&mut self, row: &Row, property_var: &str, value_var: &str) -> FastrunResult<Snak> {
        let property = PropertyId::parse(&binding(row, property_var)?.value)?;
        let type_tag = &binding(row, "property_type")?.value;
        self.cache.observe_type(property, type_tag);
        let value = self
            .codecs
            .decode(type_tag, binding(row, value_var)?, &self.config.wikibase_url)?;
        Ok(Snak::new(property, value))
    }
}
