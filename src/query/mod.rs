//! Query Interface: the read-only SPARQL boundary.
//!
//! The fastrun engine is the only producer of query text and treats the store
//! as a pure function from query text to rows. Two implementations ship:
//!
//! - [`http::HttpQuery`]: a blocking HTTP client for a remote endpoint
//! - [`local::LocalStore`]: an embedded `oxigraph` store

pub mod http;
pub mod local;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, FastrunResult, QueryError};

/// Kind of an RDF term in a result binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TermKind {
    Uri,
    #[serde(alias = "typed-literal")]
    Literal,
    Bnode,
}

/// One bound term, shaped like the W3C SPARQL JSON results format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    #[serde(rename = "type")]
    pub kind: TermKind,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datatype: Option<String>,
    #[serde(rename = "xml:lang", default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
}

impl Binding {
    pub fn uri(value: impl Into<String>) -> Self {
        Self {
            kind: TermKind::Uri,
            value: value.into(),
            datatype: None,
            lang: None,
        }
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Self {
            kind: TermKind::Literal,
            value: value.into(),
            datatype: None,
            lang: None,
        }
    }

    pub fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            datatype: Some(datatype.into()),
            ..Self::literal(value)
        }
    }

    pub fn lang_literal(value: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            lang: Some(lang.into()),
            ..Self::literal(value)
        }
    }

    pub fn bnode(value: impl Into<String>) -> Self {
        Self {
            kind: TermKind::Bnode,
            value: value.into(),
            datatype: None,
            lang: None,
        }
    }
}

/// A result row: variable name (without `?`) → bound term.
pub type Row = HashMap<String, Binding>;

/// Fetch a required binding from a row.
pub fn binding<'a>(row: &'a Row, variable: &str) -> Result<&'a Binding, QueryError> {
    row.get(variable).ok_or_else(|| QueryError::MissingBinding {
        variable: variable.to_string(),
    })
}

/// Read-optimized store that answers SELECT queries.
///
/// Implementations block until the whole page is available. Timeouts and
/// retries belong here, not in the engine.
pub trait QueryInterface: Send + Sync {
    fn execute(&self, query: &str, endpoint: &str) -> FastrunResult<Vec<Row>>;
}

/// Run a paged query until a short page comes back.
///
/// `render` receives the offset of the page to build. Every page holds at
/// most `limit` rows; a page with fewer rows (including none) is the last.
/// A store that always fills the page exactly will keep this looping.
pub fn paginate<F>(
    query: &dyn QueryInterface,
    endpoint: &str,
    limit: usize,
    mut render: F,
) -> FastrunResult<Vec<Row>>
where
    F: FnMut(usize) -> String,
{
    if limit == 0 {
        return Err(ConfigError::InvalidPageLimit.into());
    }

    let mut rows = Vec::new();
    let mut offset = 0;
    loop {
        let text = render(offset);
        let page = query.execute(&text, endpoint)?;
        let count = page.len();
        tracing::debug!(offset, limit, rows = count, "fetched query page");
        rows.extend(page);
        if count < limit {
            break;
        }
        offset += limit;
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Returns pages of the given sizes in order, recording every query.
    struct Pages {
        sizes: Mutex<Vec<usize>>,
        seen: Mutex<Vec<String>>,
    }

    impl QueryInterface for Pages {
        fn execute(&self, query: &str, _endpoint: &str) -> FastrunResult<Vec<Row>> {
            self.seen.lock().unwrap().push(query.to_string());
            let mut sizes = self.sizes.lock().unwrap();
            let n = if sizes.is_empty() { 0 } else { sizes.remove(0) };
            Ok((0..n)
                .map(|i| Row::from([("x".to_string(), Binding::literal(i.to_string()))]))
                .collect())
        }
    }

    #[test]
    fn paging_stops_on_short_page() {
        let pages = Pages {
            sizes: Mutex::new(vec![2, 2, 1]),
            seen: Mutex::new(Vec::new()),
        };
        let rows = paginate(&pages, "mem", 2, |offset| format!("OFFSET {offset}")).unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(
            *pages.seen.lock().unwrap(),
            vec!["OFFSET 0", "OFFSET 2", "OFFSET 4"]
        );
    }

    #[test]
    fn paging_stops_on_empty_page() {
        let pages = Pages {
            sizes: Mutex::new(vec![3, 0]),
            seen: Mutex::new(Vec::new()),
        };
        let rows = paginate(&pages, "mem", 3, |offset| offset.to_string()).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(pages.seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn zero_limit_is_rejected() {
        let pages = Pages {
            sizes: Mutex::new(vec![]),
            seen: Mutex::new(Vec::new()),
        };
        let err = paginate(&pages, "mem", 0, |_| String::new()).unwrap_err();
        assert!(matches!(
            err,
            crate::error::FastrunError::Config(ConfigError::InvalidPageLimit)
        ));
    }

    #[test]
    fn bindings_parse_sparql_json() {
        let b: Binding = serde_json::from_str(
            r#"{"type":"literal","value":"chat","xml:lang":"fr"}"#,
        )
        .unwrap();
        assert_eq!(b, Binding::lang_literal("chat", "fr"));

        let b: Binding = serde_json::from_str(
            r#"{"type":"typed-literal","value":"5","datatype":"http://www.w3.org/2001/XMLSchema#decimal"}"#,
        )
        .unwrap();
        assert_eq!(b.kind, TermKind::Literal);
    }
}
