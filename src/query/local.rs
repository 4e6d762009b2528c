//! Embedded SPARQL store backed by oxigraph.
//!
//! Answers the same queries as a remote endpoint from data loaded into
//! memory, which makes it usable for offline reconciliation and tests.

use oxigraph::io::RdfFormat;
use oxigraph::model::Term;
use oxigraph::sparql::QueryResults;
use oxigraph::store::Store;

use super::{Binding, QueryInterface, Row};
use crate::error::{FastrunResult, QueryError};

const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
const RDF_LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";

/// In-memory SPARQL store. The `endpoint` argument of
/// [`QueryInterface::execute`] is ignored.
pub struct LocalStore {
    store: Store,
}

impl LocalStore {
    pub fn in_memory() -> FastrunResult<Self> {
        let store = Store::new().map_err(|e| QueryError::Store {
            message: format!("failed to create oxigraph store: {e}"),
        })?;
        Ok(Self { store })
    }

    /// Load Turtle data into the default graph.
    pub fn load_turtle(&self, data: &str) -> FastrunResult<()> {
        self.load(RdfFormat::Turtle, data)
    }

    /// Load N-Triples data into the default graph.
    pub fn load_ntriples(&self, data: &str) -> FastrunResult<()> {
        self.load(RdfFormat::NTriples, data)
    }

    fn load(&self, format: RdfFormat, data: &str) -> FastrunResult<()> {
        self.store
            .load_from_reader(format, data.as_bytes())
            .map_err(|e| {
                QueryError::Store {
                    message: format!("failed to load data: {e}"),
                }
                .into()
            })
    }

    /// Number of quads in the store.
    pub fn len(&self) -> FastrunResult<usize> {
        self.store.len().map_err(|e| {
            QueryError::Store {
                message: e.to_string(),
            }
            .into()
        })
    }

    pub fn is_empty(&self) -> FastrunResult<bool> {
        self.len().map(|n| n == 0)
    }
}

fn to_binding(term: &Term) -> Binding {
    #[allow(unreachable_patterns)]
    match term {
        Term::NamedNode(node) => Binding::uri(node.as_str()),
        Term::BlankNode(node) => Binding::bnode(node.as_str()),
        Term::Literal(literal) => {
            if let Some(lang) = literal.language() {
                Binding::lang_literal(literal.value(), lang)
            } else {
                let datatype = literal.datatype().as_str();
                if datatype == XSD_STRING || datatype == RDF_LANG_STRING {
                    Binding::literal(literal.value())
                } else {
                    Binding::typed_literal(literal.value(), datatype)
                }
            }
        }
        other => Binding::literal(other.to_string()),
    }
}

impl QueryInterface for LocalStore {
    fn execute(&self, query: &str, _endpoint: &str) -> FastrunResult<Vec<Row>> {
        #[allow(deprecated)]
        let results = self.store.query(query).map_err(|e| QueryError::Store {
            message: format!("SPARQL query failed: {e}"),
        })?;

        match results {
            QueryResults::Solutions(solutions) => {
                let mut rows = Vec::new();
                for solution in solutions {
                    let solution = solution.map_err(|e| QueryError::Store {
                        message: format!("solution error: {e}"),
                    })?;
                    let row: Row = solution
                        .iter()
                        .map(|(var, term)| (var.as_str().to_string(), to_binding(term)))
                        .collect();
                    rows.push(row);
                }
                Ok(rows)
            }
            _ => Err(QueryError::Store {
                message: "only SELECT queries are supported".into(),
            }
            .into()),
        }
    }
}

impl std::fmt::Debug for LocalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStore").finish()
    }
}
