//! SPARQL text for the fastrun loaders.
//!
//! Every template uses full Wikibase IRIs built from the configured
//! `wikibase_url` and declares the few prefixes it needs, so the same text
//! runs against the Wikidata Query Service and an embedded store.

use std::sync::LazyLock;

use regex::Regex;

use crate::datatype::literal::iri;
use crate::error::InputError;
use crate::property::PropertyId;

/// Prefix declarations shared by every query.
pub const PREFIXES: &str = "\
PREFIX wikibase: <http://wikiba.se/ontology#>
PREFIX prov: <http://www.w3.org/ns/prov#>
PREFIX xsd: <http://www.w3.org/2001/XMLSchema#>
PREFIX geo: <http://www.opengis.net/ont/geosparql#>
";

static RE_STATEMENT_IRI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^[A-Za-z][A-Za-z0-9+.\-]*:[^\s<>"{}|^`\\]+$"#).unwrap());

pub(crate) fn direct_predicate(wikibase_url: &str, property: PropertyId) -> String {
    iri(&format!("{wikibase_url}/prop/direct/{property}"))
}

fn claim_predicate(wikibase_url: &str, property: PropertyId) -> String {
    iri(&format!("{wikibase_url}/prop/{property}"))
}

fn statement_predicate(wikibase_url: &str, property: PropertyId) -> String {
    iri(&format!("{wikibase_url}/prop/statement/{property}"))
}

fn qualifier_predicate(wikibase_url: &str, property: PropertyId) -> String {
    iri(&format!("{wikibase_url}/prop/qualifier/{property}"))
}

fn entity(wikibase_url: &str, property: PropertyId) -> String {
    iri(&format!("{wikibase_url}/entity/{property}"))
}

/// Validate a statement id and render it as an IRI term.
pub fn statement_term(sid: &str) -> Result<String, InputError> {
    if RE_STATEMENT_IRI.is_match(sid) {
        Ok(iri(sid))
    } else {
        Err(InputError::InvalidStatementId {
            sid: sid.to_string(),
        })
    }
}

/// One page of statements of `property` on entities matching the rendered
/// base filter, optionally narrowed to statements carrying every
/// `(qualifier property, identity)` pair.
pub fn statements_query(
    base_filter: &str,
    property: PropertyId,
    qualifier_filter: &[(PropertyId, String)],
    wikibase_url: &str,
    offset: usize,
    limit: usize,
) -> String {
    let mut qualifiers = String::new();
    for (qualifier, identity) in qualifier_filter {
        qualifiers.push_str(&format!(
            "  ?sid {} {identity} .\n",
            qualifier_predicate(wikibase_url, *qualifier)
        ));
    }
    format!(
        "{PREFIXES}SELECT ?entity ?sid ?value ?property_type WHERE {{\n\
         {base_filter}\
         \x20 ?entity {claim} ?sid .\n\
         \x20 {entity} wikibase:propertyType ?property_type .\n\
         \x20 ?sid {statement} ?value .\n\
         {qualifiers}\
         }}\n\
         ORDER BY ?sid\n\
         OFFSET {offset}\n\
         LIMIT {limit}\n",
        claim = claim_predicate(wikibase_url, property),
        entity = entity(wikibase_url, property),
        statement = statement_predicate(wikibase_url, property),
    )
}

/// One page of the qualifiers of a single statement.
pub fn qualifiers_query(statement: &str, offset: usize, limit: usize) -> String {
    format!(
        "{PREFIXES}SELECT ?property ?value ?property_type WHERE {{\n\
         \x20 VALUES ?sid {{ {statement} }}\n\
         \x20 ?sid ?predicate ?value .\n\
         \x20 ?property wikibase:qualifier ?predicate .\n\
         \x20 ?property wikibase:propertyType ?property_type .\n\
         }}\n\
         ORDER BY ?property ?value\n\
         OFFSET {offset}\n\
         LIMIT {limit}\n"
    )
}

/// One page of the reference snaks of a single statement, grouped by
/// reference node.
pub fn references_query(statement: &str, offset: usize, limit: usize) -> String {
    format!(
        "{PREFIXES}SELECT ?srid ?ref_property ?ref_value ?property_type WHERE {{\n\
         \x20 VALUES ?sid {{ {statement} }}\n\
         \x20 ?sid prov:wasDerivedFrom ?srid .\n\
         \x20 ?srid ?ref_predicate ?ref_value .\n\
         \x20 ?ref_property wikibase:reference ?ref_predicate .\n\
         \x20 ?ref_property wikibase:propertyType ?property_type .\n\
         }}\n\
         ORDER BY ?srid ?ref_property ?ref_value\n\
         OFFSET {offset}\n\
         LIMIT {limit}\n"
    )
}

/// The remote type of one property.
pub fn property_type_query(property: PropertyId, wikibase_url: &str) -> String {
    format!(
        "{PREFIXES}SELECT ?property_type WHERE {{ {} wikibase:propertyType ?property_type . }}\n",
        entity(wikibase_url, property)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const WB: &str = "http://www.wikidata.org";

    fn p(n: u64) -> PropertyId {
        PropertyId::from_number(n)
    }

    #[test]
    fn statements_query_combines_all_parts() {
        let q = statements_query(
            "  ?entity <http://www.wikidata.org/prop/direct/P31> <http://www.wikidata.org/entity/Q5> .\n",
            p(21),
            &[(p(580), "\"+2001-01-01T00:00:00Z\"^^xsd:dateTime".into())],
            WB,
            20,
            10,
        );
        assert!(q.starts_with("PREFIX wikibase:"));
        assert!(q.contains("/prop/direct/P31> <http://www.wikidata.org/entity/Q5> ."));
        assert!(q.contains("?entity <http://www.wikidata.org/prop/P21> ?sid ."));
        assert!(q.contains(
            "<http://www.wikidata.org/entity/P21> wikibase:propertyType ?property_type ."
        ));
        assert!(q.contains("?sid <http://www.wikidata.org/prop/statement/P21> ?value ."));
        assert!(q.contains(
            "?sid <http://www.wikidata.org/prop/qualifier/P580> \"+2001-01-01T00:00:00Z\"^^xsd:dateTime ."
        ));
        assert!(q.contains("ORDER BY ?sid\nOFFSET 20\nLIMIT 10\n"));
    }

    #[test]
    fn statement_ids_must_be_iris() {
        let sid = "http://www.wikidata.org/entity/statement/Q42-F078E5B3-F9A8-480E-B7AC-D97778CBBEF9";
        assert_eq!(statement_term(sid).unwrap(), format!("<{sid}>"));
        assert!(statement_term("Q42$abc").is_err());
        assert!(statement_term("http://x> } DROP ALL {").is_err());
        assert!(statement_term("").is_err());
    }

    #[test]
    fn deep_queries_bind_the_statement() {
        let q = qualifiers_query("<http://wb/s1>", 0, 100);
        assert!(q.contains("VALUES ?sid { <http://wb/s1> }"));
        assert!(q.contains("wikibase:qualifier ?predicate"));
        assert!(q.contains("LIMIT 100"));

        let r = references_query("<http://wb/s1>", 100, 100);
        assert!(r.contains("prov:wasDerivedFrom ?srid"));
        assert!(r.contains("OFFSET 100"));
    }

    #[test]
    fn property_type_query_uses_entity_iri() {
        let q = property_type_query(p(31), WB);
        assert!(q.contains("<http://www.wikidata.org/entity/P31> wikibase:propertyType"));
    }
}
