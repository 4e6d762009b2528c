//! Remote SPARQL endpoint client.
//!
//! Uses `ureq` for synchronous HTTP requests. Queries are POSTed form-encoded
//! and answered as `application/sparql-results+json`.

use std::time::Duration;

use serde::Deserialize;

use super::{QueryInterface, Row};
use crate::error::{FastrunResult, QueryError};

/// Default user agent sent with every request.
pub const DEFAULT_USER_AGENT: &str =
    concat!("wikibase-fastrun/", env!("CARGO_PKG_VERSION"));

/// Maximum length of an error body echoed back in [`QueryError::Status`].
const MAX_ERROR_BODY: usize = 500;

#[derive(Debug, Deserialize)]
struct SparqlResults {
    results: SparqlBindings,
}

#[derive(Debug, Deserialize)]
struct SparqlBindings {
    bindings: Vec<Row>,
}

/// Blocking SPARQL-over-HTTP client.
pub struct HttpQuery {
    agent: ureq::Agent,
}

impl HttpQuery {
    pub fn new(user_agent: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(user_agent)
            .build();
        Self { agent }
    }
}

impl Default for HttpQuery {
    fn default() -> Self {
        Self::new(DEFAULT_USER_AGENT, Duration::from_secs(60))
    }
}

impl QueryInterface for HttpQuery {
    fn execute(&self, query: &str, endpoint: &str) -> FastrunResult<Vec<Row>> {
        let response = self
            .agent
            .post(endpoint)
            .set("Accept", "application/sparql-results+json")
            .send_form(&[("query", query)]);

        match response {
            Ok(response) => {
                let parsed: SparqlResults =
                    response.into_json().map_err(|e| QueryError::Decode {
                        message: e.to_string(),
                    })?;
                Ok(parsed.results.bindings)
            }
            Err(ureq::Error::Status(code, response)) => {
                let mut body = response.into_string().unwrap_or_default();
                if body.len() > MAX_ERROR_BODY {
                    let cut = (0..=MAX_ERROR_BODY)
                        .rev()
                        .find(|i| body.is_char_boundary(*i))
                        .unwrap_or(0);
                    body.truncate(cut);
                    body.push_str("...");
                }
                Err(QueryError::Status { status: code, body }.into())
            }
            Err(ureq::Error::Transport(transport)) => Err(QueryError::Transport {
                endpoint: endpoint.to_string(),
                message: transport.to_string(),
            }
            .into()),
        }
    }
}

impl std::fmt::Debug for HttpQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpQuery").finish()
    }
}
