//! Benchmarks for the fastrun write check and value identities.

use std::fmt::Write;
use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use wikibase_fastrun::config::FastrunConfig;
use wikibase_fastrun::datatype::codec::CodecRegistry;
use wikibase_fastrun::datatype::Value;
use wikibase_fastrun::fastrun::filter::BaseFilter;
use wikibase_fastrun::fastrun::FastrunEngine;
use wikibase_fastrun::model::{Claim, Item};
use wikibase_fastrun::property::PropertyId;
use wikibase_fastrun::query::local::LocalStore;

const ENTITIES: usize = 2_000;

fn dataset() -> String {
    let mut ttl = String::from(
        "@prefix wd: <http://www.wikidata.org/entity/> .\n\
         @prefix wdt: <http://www.wikidata.org/prop/direct/> .\n\
         @prefix p: <http://www.wikidata.org/prop/> .\n\
         @prefix ps: <http://www.wikidata.org/prop/statement/> .\n\
         @prefix wds: <http://www.wikidata.org/entity/statement/> .\n\
         @prefix wikibase: <http://wikiba.se/ontology#> .\n\
         wd:P214 wikibase:propertyType wikibase:ExternalId .\n\
         wd:P27 wikibase:propertyType wikibase:WikibaseItem .\n",
    );
    for i in 0..ENTITIES {
        let country = if i % 2 == 0 { "Q142" } else { "Q183" };
        writeln!(
            ttl,
            "wd:Q{i} wdt:P31 wd:Q5 ; p:P214 wds:Q{i}-viaf ; p:P27 wds:Q{i}-cit .\n\
             wds:Q{i}-viaf ps:P214 \"{i:09}\" .\n\
             wds:Q{i}-cit ps:P27 wd:{country} ."
        )
        .unwrap();
    }
    ttl
}

fn warm_engine() -> FastrunEngine {
    let store = LocalStore::in_memory().unwrap();
    store.load_turtle(&dataset()).unwrap();
    let config = FastrunConfig {
        use_qualifiers: false,
        ..FastrunConfig::with_filter(
            BaseFilter::new().has(PropertyId::from_number(31), Value::item("Q5").unwrap()),
        )
    };
    let mut engine = FastrunEngine::with_query(config, Arc::new(store)).unwrap();
    let warmup = [
        Claim::new(PropertyId::from_number(214), Value::external_id("000000000")),
        Claim::new(PropertyId::from_number(27), Value::item("Q142").unwrap()),
    ];
    engine.load_statements(&warmup, None, None, None).unwrap();
    engine
}

fn bench_write_required_warm(c: &mut Criterion) {
    let mut engine = warm_engine();
    let local = Item::new()
        .with_claim(Claim::new(
            PropertyId::from_number(214),
            Value::external_id("000001234"),
        ))
        .with_claim(Claim::new(
            PropertyId::from_number(27),
            Value::item("Q142").unwrap(),
        ));

    c.bench_function("write_required_warm_2k", |bench| {
        bench.iter(|| black_box(engine.write_required(&local, None, None, None, None).unwrap()))
    });
}

fn bench_identity(c: &mut Criterion) {
    let codecs = CodecRegistry::with_defaults();
    let values = [
        Value::item("Q42").unwrap(),
        Value::time("2001-01-15T00:00:00Z").unwrap(),
        Value::monolingual_text("Douglas Adams", "en"),
        Value::quantity("+42.5").unwrap(),
    ];

    c.bench_function("identity_mixed", |bench| {
        bench.iter(|| {
            for v in &values {
                black_box(codecs.identity(v, "http://www.wikidata.org").unwrap());
            }
        })
    });
}

criterion_group!(benches, bench_write_required_warm, bench_identity);
criterion_main!(benches);
