//! Engine configuration, persisted as TOML.
//!
//! ```toml
//! sparql_endpoint_url = "https://query.wikidata.org/sparql"
//! wikibase_url = "http://www.wikidata.org"
//! use_references = true
//!
//! [[base_filter]]
//! kind = "value"
//! property = "P31"
//! value = { type = "wikibase-item", value = "Q5" }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::fastrun::filter::BaseFilter;
use crate::fastrun::FastrunFlags;
use crate::query::http::{HttpQuery, DEFAULT_USER_AGENT};

/// Everything a fastrun engine needs besides its query backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FastrunConfig {
    /// SPARQL endpoint every load query goes to.
    #[serde(default = "default_sparql_endpoint_url")]
    pub sparql_endpoint_url: String,
    /// Concept URI base of the Wikibase instance.
    #[serde(default = "default_wikibase_url")]
    pub wikibase_url: String,
    /// Page size of statement loads.
    #[serde(default = "default_page_limit")]
    pub page_limit: usize,
    /// Page size of the qualifier/reference loads done by the write check.
    #[serde(default = "default_deep_page_limit")]
    pub deep_page_limit: usize,
    #[serde(default = "default_true")]
    pub use_qualifiers: bool,
    #[serde(default)]
    pub use_references: bool,
    #[serde(default = "default_true")]
    pub use_cache: bool,
    /// Must stay `false`.
    #[serde(default)]
    pub case_insensitive: bool,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub base_filter: BaseFilter,
}

fn default_sparql_endpoint_url() -> String {
    "https://query.wikidata.org/sparql".into()
}
fn default_wikibase_url() -> String {
    "http://www.wikidata.org".into()
}
fn default_page_limit() -> usize {
    10_000
}
fn default_deep_page_limit() -> usize {
    100
}
fn default_true() -> bool {
    true
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.into()
}
fn default_timeout_secs() -> u64 {
    60
}

impl Default for FastrunConfig {
    fn default() -> Self {
        Self {
            sparql_endpoint_url: default_sparql_endpoint_url(),
            wikibase_url: default_wikibase_url(),
            page_limit: default_page_limit(),
            deep_page_limit: default_deep_page_limit(),
            use_qualifiers: true,
            use_references: false,
            use_cache: true,
            case_insensitive: false,
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            base_filter: BaseFilter::default(),
        }
    }
}

impl FastrunConfig {
    /// Default settings for the given base filter.
    pub fn with_filter(base_filter: BaseFilter) -> Self {
        Self {
            base_filter,
            ..Default::default()
        }
    }

    pub fn flags(&self) -> FastrunFlags {
        FastrunFlags {
            use_qualifiers: self.use_qualifiers,
            use_references: self.use_references,
            use_cache: self.use_cache,
            case_insensitive: self.case_insensitive,
        }
    }

    pub fn with_flags(mut self, flags: FastrunFlags) -> Self {
        self.use_qualifiers = flags.use_qualifiers;
        self.use_references = flags.use_references;
        self.use_cache = flags.use_cache;
        self.case_insensitive = flags.case_insensitive;
        self
    }

    /// Reject settings no engine can run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.case_insensitive {
            return Err(ConfigError::CaseInsensitiveUnsupported);
        }
        if self.page_limit == 0 || self.deep_page_limit == 0 {
            return Err(ConfigError::InvalidPageLimit);
        }
        self.base_filter.validate()
    }

    /// HTTP client configured with this user agent and timeout.
    pub fn http_query(&self) -> HttpQuery {
        HttpQuery::new(&self.user_agent, Duration::from_secs(self.timeout_secs))
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ConfigRead {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::ConfigParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Save to a TOML file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::ConfigParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::ConfigWrite {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::ConfigWrite {
            path: path.display().to_string(),
            source: e,
        })
    }
}
