// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # wikibase-fastrun
//!
//! Decide whether a write to a Wikibase instance would change anything,
//! using statement data mirrored from its SPARQL endpoint.
//!
//! ## Architecture
//!
//! - **Values** (`datatype`): typed Wikibase values and the codec registry
//!   that turns SPARQL bindings into values and values into identity strings
//! - **Model** (`model`): claims with qualifiers and references
//! - **Query Interface** (`query`): blocking SPARQL over HTTP (`ureq`) or an
//!   embedded `oxigraph` store
//! - **Fastrun** (`fastrun`): statement cache, loaders, the write check and
//!   the engine pool
//!
//! ## Library usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use wikibase_fastrun::config::FastrunConfig;
//! use wikibase_fastrun::datatype::Value;
//! use wikibase_fastrun::fastrun::filter::BaseFilter;
//! use wikibase_fastrun::fastrun::registry::FastrunRegistry;
//! use wikibase_fastrun::fastrun::FastrunFlags;
//! use wikibase_fastrun::model::{Claim, Item};
//! use wikibase_fastrun::property::PropertyId;
//!
//! let defaults = FastrunConfig::default();
//! let registry = FastrunRegistry::new(defaults.clone(), Arc::new(defaults.http_query()));
//!
//! let humans = BaseFilter::new().has(PropertyId::parse("P31").unwrap(), Value::item("Q5").unwrap());
//! let engine = registry.acquire(&humans, FastrunFlags::default()).unwrap();
//!
//! let local = Item::with_id("Q42").with_claim(Claim::new(
//!     PropertyId::parse("P21").unwrap(),
//!     Value::item("Q6581097").unwrap(),
//! ));
//! let required = engine
//!     .lock()
//!     .unwrap()
//!     .write_required(&local, None, None, None, None)
//!     .unwrap();
//! println!("write required: {required}");
//! ```

pub mod config;
pub mod datatype;
pub mod error;
pub mod fastrun;
pub mod model;
pub mod property;
pub mod query;
