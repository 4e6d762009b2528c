//! End-to-end tests for the fastrun engine.
//!
//! Every test runs the real query templates against an embedded oxigraph
//! store seeded with a small dataset in the Wikibase RDF layout, so the
//! generated SPARQL, the codecs, the cache and the write check are all
//! exercised together.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use wikibase_fastrun::config::FastrunConfig;
use wikibase_fastrun::datatype::{tag, Snak, Value};
use wikibase_fastrun::error::FastrunResult;
use wikibase_fastrun::fastrun::filter::BaseFilter;
use wikibase_fastrun::fastrun::registry::FastrunRegistry;
use wikibase_fastrun::fastrun::{FastrunEngine, FastrunFlags};
use wikibase_fastrun::model::{Claim, Item, Reference};
use wikibase_fastrun::property::PropertyId;
use wikibase_fastrun::query::local::LocalStore;
use wikibase_fastrun::query::{QueryInterface, Row};

const DATA: &str = r#"
@prefix wd: <http://www.wikidata.org/entity/> .
@prefix wdt: <http://www.wikidata.org/prop/direct/> .
@prefix p: <http://www.wikidata.org/prop/> .
@prefix ps: <http://www.wikidata.org/prop/statement/> .
@prefix pq: <http://www.wikidata.org/prop/qualifier/> .
@prefix pr: <http://www.wikidata.org/prop/reference/> .
@prefix wds: <http://www.wikidata.org/entity/statement/> .
@prefix wdref: <http://www.wikidata.org/reference/> .
@prefix wikibase: <http://wikiba.se/ontology#> .
@prefix prov: <http://www.w3.org/ns/prov#> .
@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .

wd:P21 wikibase:propertyType wikibase:WikibaseItem ;
    wikibase:qualifier pq:P21 ; wikibase:reference pr:P21 .
wd:P27 wikibase:propertyType wikibase:WikibaseItem ;
    wikibase:qualifier pq:P27 ; wikibase:reference pr:P27 .
wd:P31 wikibase:propertyType wikibase:WikibaseItem ;
    wikibase:qualifier pq:P31 ; wikibase:reference pr:P31 .
wd:P214 wikibase:propertyType wikibase:ExternalId ;
    wikibase:qualifier pq:P214 ; wikibase:reference pr:P214 .
wd:P248 wikibase:propertyType wikibase:WikibaseItem ;
    wikibase:qualifier pq:P248 ; wikibase:reference pr:P248 .
wd:P813 wikibase:propertyType wikibase:Time ;
    wikibase:qualifier pq:P813 ; wikibase:reference pr:P813 .
wd:P1480 wikibase:propertyType wikibase:WikibaseItem ;
    wikibase:qualifier pq:P1480 ; wikibase:reference pr:P1480 .
wd:P18 wikibase:propertyType wikibase:CommonsMedia ;
    wikibase:qualifier pq:P18 ; wikibase:reference pr:P18 .

wdref:r1 pr:P248 wd:Q36578 ;
    pr:P813 "2020-05-01T00:00:00Z"^^xsd:dateTime .

wd:Q1 wdt:P31 wd:Q5 ;
    p:P21 wds:Q1-sex ; p:P27 wds:Q1-cit ; p:P214 wds:Q1-viaf .
wds:Q1-sex ps:P21 wd:Q6581097 ; prov:wasDerivedFrom wdref:r1 .
wds:Q1-cit ps:P27 wd:Q142 ; pq:P1480 wd:Q5727902 .
wds:Q1-viaf ps:P214 "113230702" .

wd:Q2 wdt:P31 wd:Q5 ;
    p:P21 wds:Q2-sex ; p:P27 wds:Q2-cit ; p:P18 wds:Q2-img .
wds:Q2-sex ps:P21 wd:Q6581097 ; prov:wasDerivedFrom wdref:r1 .
wds:Q2-cit ps:P27 wd:Q30 .
wds:Q2-img ps:P18 <http://commons.wikimedia.org/wiki/Special:FilePath/Douglas%20adams%20portrait.jpg> .

wd:Q3 wdt:P31 wd:Q5 ;
    p:P21 wds:Q3-sex ; p:P27 wds:Q3-cit, wds:Q3-cit2 .
wds:Q3-sex ps:P21 <http://www.wikidata.org/.well-known/genid/5d1f0e> .
wds:Q3-cit ps:P27 wd:Q142 .
wds:Q3-cit2 ps:P27 wd:Q183 .

wd:Q15632617 wdt:P279 wd:Q5 .
wd:Q4 wdt:P31 wd:Q15632617 ;
    p:P21 wds:Q4-sex .
wds:Q4-sex ps:P21 wd:Q6581097 .

wd:Q100 wdt:P31 wd:Q515 ;
    p:P27 wds:Q100-cit ; p:P21 wds:Q100-sex .
wds:Q100-cit ps:P27 wd:Q183 .
wds:Q100-sex ps:P21 wd:Q6581072 .
"#;

const MALE: &str = "Q6581097";
const FEMALE: &str = "Q6581072";

/// Local store that counts the queries it answers.
struct Counting {
    store: LocalStore,
    calls: AtomicUsize,
}

impl Counting {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl QueryInterface for Counting {
    fn execute(&self, query: &str, endpoint: &str) -> FastrunResult<Vec<Row>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.store.execute(query, endpoint)
    }
}

fn store() -> Arc<Counting> {
    let store = LocalStore::in_memory().unwrap();
    store.load_turtle(DATA).unwrap();
    Arc::new(Counting {
        store,
        calls: AtomicUsize::new(0),
    })
}

fn p(n: u64) -> PropertyId {
    PropertyId::from_number(n)
}

fn item(id: &str) -> Value {
    Value::item(id).unwrap()
}

fn humans() -> BaseFilter {
    BaseFilter::new().has(p(31), item("Q5"))
}

fn engine(store: &Arc<Counting>, filter: BaseFilter) -> FastrunEngine {
    FastrunEngine::with_query(FastrunConfig::with_filter(filter), store.clone()).unwrap()
}

#[test]
fn known_value_is_not_written_and_novel_value_is() {
    let store = store();
    let mut engine = engine(&store, humans());

    let male = Item::new().with_claim(Claim::new(p(21), item(MALE)));
    assert!(!engine.write_required(&male, None, None, None, None).unwrap());

    // Q100 is female but not human, so the base filter hides it.
    let female = Item::new().with_claim(Claim::new(p(21), item(FEMALE)));
    assert!(engine.write_required(&female, None, None, None, None).unwrap());
}

#[test]
fn unknown_values_are_not_indexed() {
    let store = store();
    let mut engine = engine(&store, humans());
    engine
        .load_statements(&[Claim::new(p(21), item(MALE))], None, None, None)
        .unwrap();
    let by_value = engine.cache().property(p(21)).unwrap();
    assert_eq!(by_value.len(), 1);
    let holders: Vec<&str> = engine.cache().entities(p(21)).into_iter().collect();
    assert_eq!(
        holders,
        vec!["http://www.wikidata.org/entity/Q1", "http://www.wikidata.org/entity/Q2"]
    );
}

#[test]
fn conjunctive_match_checks_qualifiers_of_surviving_entity() {
    let store = store();
    let mut engine = engine(&store, humans());

    // P21=male on {Q1, Q2}, P27=France on {Q1, Q3}: only Q1 survives, and
    // its citizenship statement carries one qualifier.
    let matching = Item::new()
        .with_claim(Claim::new(p(21), item(MALE)))
        .with_claim(
            Claim::new(p(27), item("Q142"))
                .with_qualifier(Snak::new(p(1480), item("Q5727902"))),
        );
    assert!(!engine.write_required(&matching, None, None, None, None).unwrap());

    let other_qualifier = Item::new()
        .with_claim(Claim::new(p(21), item(MALE)))
        .with_claim(
            Claim::new(p(27), item("Q142"))
                .with_qualifier(Snak::new(p(1480), item("Q18122778"))),
        );
    assert!(engine
        .write_required(&other_qualifier, None, None, None, None)
        .unwrap());
}

#[test]
fn missing_qualifier_needs_write() {
    let store = store();
    let mut engine = engine(&store, humans());
    let bare = Item::new()
        .with_claim(Claim::new(p(21), item(MALE)))
        .with_claim(Claim::new(p(27), item("Q142")));
    assert!(engine.write_required(&bare, None, None, None, None).unwrap());
    assert!(!engine
        .write_required(&bare, None, Some(false), None, None)
        .unwrap());
}

#[test]
fn empty_intersection_needs_write() {
    let store = store();
    let mut engine = engine(&store, humans());
    // Males are Q1 and Q2; the only human German is Q3.
    let local = Item::new()
        .with_claim(Claim::new(p(21), item(MALE)))
        .with_claim(Claim::new(p(27), item("Q183")));
    assert!(engine.write_required(&local, None, None, None, None).unwrap());
}

#[test]
fn several_values_of_one_property_must_share_an_entity() {
    let store = store();
    let mut engine = engine(&store, humans());
    // Q3 holds both citizenships.
    let together = Item::new()
        .with_claim(Claim::new(p(27), item("Q142")))
        .with_claim(Claim::new(p(27), item("Q183")));
    assert!(!engine.write_required(&together, None, None, None, None).unwrap());

    // Q30 is only on Q2 and Q183 only on Q3.
    let split = Item::new()
        .with_claim(Claim::new(p(27), item("Q30")))
        .with_claim(Claim::new(p(27), item("Q183")));
    assert!(engine.write_required(&split, None, None, None, None).unwrap());
}

#[test]
fn commons_media_values_are_matched() {
    let store = store();
    let mut engine = engine(&store, humans());
    let portrait = Item::new().with_claim(Claim::new(
        p(18),
        Value::commons_media("Douglas adams portrait.jpg").unwrap(),
    ));
    assert!(!engine.write_required(&portrait, None, None, None, None).unwrap());
    assert_eq!(engine.property_type(p(18)), Some(tag::COMMONS_MEDIA));

    let other = Item::new().with_claim(Claim::new(
        p(18),
        Value::commons_media("Other portrait.jpg").unwrap(),
    ));
    assert!(engine.write_required(&other, None, None, None, None).unwrap());
}

#[test]
fn cache_is_reused_until_bypassed() {
    let store = store();
    let mut engine = engine(&store, humans());
    let claims = [Claim::new(p(21), item(MALE))];

    engine.load_statements(&claims, None, None, None).unwrap();
    let after_first = store.calls();
    engine.load_statements(&claims, Some(true), None, None).unwrap();
    assert_eq!(store.calls(), after_first);

    engine.load_statements(&claims, Some(false), None, None).unwrap();
    assert!(store.calls() > after_first);
    assert_eq!(engine.cache().entities(p(21)).len(), 2);
}

#[test]
fn absent_property_short_circuits() {
    let store = store();
    let mut engine = engine(&store, humans());
    let local = Item::new().with_claim(Claim::new(p(1082), Value::quantity("42").unwrap()));
    assert!(engine
        .write_required(&local, None, Some(true), Some(true), None)
        .unwrap());
    assert_eq!(store.calls(), 1);
}

#[test]
fn references_are_compared_as_groups() {
    let store = store();
    let mut engine = engine(&store, humans());
    let reference = Reference::new()
        .with_snak(Snak::new(p(813), Value::time("2020-05-01T00:00:00Z").unwrap()))
        .with_snak(Snak::new(p(248), item("Q36578")));

    let referenced =
        Item::new().with_claim(Claim::new(p(21), item(MALE)).with_reference(reference));
    assert!(!engine
        .write_required(&referenced, None, Some(false), Some(true), None)
        .unwrap());

    let unreferenced = Item::new().with_claim(Claim::new(p(21), item(MALE)));
    assert!(engine
        .write_required(&unreferenced, None, Some(false), Some(true), None)
        .unwrap());
}

#[test]
fn external_ids_match_as_plain_strings() {
    let store = store();
    let mut engine = engine(&store, humans());
    let local = Item::new().with_claim(Claim::new(p(214), Value::external_id("113230702")));
    assert!(!engine.write_required(&local, None, None, None, None).unwrap());
    assert_eq!(engine.property_type(p(214)), Some(tag::EXTERNAL_ID));
}

#[test]
fn path_filter_follows_subclasses() {
    let store = store();
    let direct = engine(&store, humans())
        .entities_matching(&[Claim::new(p(21), item(MALE))], None)
        .unwrap();
    assert_eq!(direct, vec!["Q1", "Q2"]);

    let mut via_subclass = engine(&store, BaseFilter::new().path(p(31), p(279), Some(item("Q5"))));
    let entities = via_subclass
        .entities_matching(&[Claim::new(p(21), item(MALE))], None)
        .unwrap();
    assert_eq!(entities, vec!["Q1", "Q2", "Q4"]);
}

#[test]
fn property_type_is_looked_up() {
    let store = store();
    let mut engine = engine(&store, humans());
    assert_eq!(engine.property_type(p(813)), None);
    assert_eq!(engine.fetch_property_type(p(813)).unwrap(), tag::TIME);
    assert_eq!(engine.property_type(p(813)), Some(tag::TIME));
}

#[test]
fn registry_hands_out_warm_engines() {
    let store = store();
    let registry = FastrunRegistry::new(FastrunConfig::default(), store.clone());
    let local = Item::new().with_claim(Claim::new(p(21), item(MALE)));
    let flags = FastrunFlags {
        use_qualifiers: false,
        ..Default::default()
    };

    let first = registry.acquire(&humans(), flags).unwrap();
    assert!(!first
        .lock()
        .unwrap()
        .write_required(&local, None, None, None, None)
        .unwrap());
    let calls = store.calls();

    let second = registry.acquire(&humans(), flags).unwrap();
    assert!(!second
        .lock()
        .unwrap()
        .write_required(&local, None, None, None, None)
        .unwrap());
    assert_eq!(store.calls(), calls);
    assert_eq!(registry.len(), 1);
}
