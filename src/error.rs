//! Rich diagnostic error types for the fastrun engine.
//!
//! Errors fall into three families: configuration mistakes (fatal, never
//! retried), caller input mistakes, and upstream query failures which are
//! passed through untouched so the transport layer can own retry policy.

use miette::Diagnostic;
use thiserror::Error;

/// Top-level error type for the fastrun engine.
#[derive(Debug, Error, Diagnostic)]
pub enum FastrunError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Query(#[from] QueryError),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("invalid property identifier: \"{input}\"")]
    #[diagnostic(
        code(fastrun::config::invalid_property),
        help("Property identifiers must look like \"P123\" (a bare \"123\" is also accepted).")
    )]
    InvalidProperty { input: String },

    #[error("no value codec registered for property type <{tag}>")]
    #[diagnostic(
        code(fastrun::config::unknown_type_tag),
        help(
            "The SPARQL endpoint reported a property type this engine cannot decode. \
             Register a codec for it with `CodecRegistry::register`."
        )
    )]
    UnknownTypeTag { tag: String },

    #[error("unsupported base filter constraint on {property}: {reason}")]
    #[diagnostic(
        code(fastrun::config::unsupported_filter),
        help(
            "Base filter constraints must carry either no value or a value that renders \
             to a concrete SPARQL term."
        )
    )]
    UnsupportedFilter { property: String, reason: String },

    #[error("case-insensitive comparison is not supported")]
    #[diagnostic(
        code(fastrun::config::case_insensitive),
        help("Set `case_insensitive = false`; no case folding rule is defined for fastrun.")
    )]
    CaseInsensitiveUnsupported,

    #[error("page limit must be greater than zero")]
    #[diagnostic(
        code(fastrun::config::page_limit),
        help("A zero page limit would never produce a short page and paging would not stop.")
    )]
    InvalidPageLimit,

    #[error("invalid {datatype} value: \"{value}\"")]
    #[diagnostic(
        code(fastrun::config::invalid_value),
        help("{expected}")
    )]
    InvalidValue {
        datatype: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(fastrun::config::read),
        help("Ensure the config file exists and is readable.")
    )]
    ConfigRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {path}: {message}")]
    #[diagnostic(
        code(fastrun::config::parse),
        help("Check the TOML syntax and field names in the config file.")
    )]
    ConfigParse { path: String, message: String },

    #[error("failed to write config: {path}")]
    #[diagnostic(
        code(fastrun::config::write),
        help("Ensure you have write permissions to the target directory.")
    )]
    ConfigWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Input errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum InputError {
    #[error("entity must have at least one claim")]
    #[diagnostic(
        code(fastrun::input::no_claims),
        help("Add the claims you intend to write before asking whether a write is required.")
    )]
    NoClaims,

    #[error("invalid statement id: \"{sid}\"")]
    #[diagnostic(
        code(fastrun::input::statement_id),
        help("Statement ids are the full statement IRIs returned by the SPARQL endpoint.")
    )]
    InvalidStatementId { sid: String },

    #[error("claim value for {property} cannot be rendered as a SPARQL term")]
    #[diagnostic(
        code(fastrun::input::unrenderable),
        help("Unknown-value and no-value snaks have no identity and cannot be looked up.")
    )]
    UnrenderableValue { property: String },
}

// ---------------------------------------------------------------------------
// Upstream query errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum QueryError {
    #[error("transport error querying {endpoint}: {message}")]
    #[diagnostic(
        code(fastrun::query::transport),
        help("The SPARQL endpoint could not be reached. Check the URL and your network.")
    )]
    Transport { endpoint: String, message: String },

    #[error("SPARQL endpoint returned HTTP {status}: {body}")]
    #[diagnostic(
        code(fastrun::query::status),
        help(
            "The endpoint rejected the query. HTTP 429 means you are rate limited; \
             HTTP 400 usually means the generated query is not valid for this store."
        )
    )]
    Status { status: u16, body: String },

    #[error("failed to decode SPARQL results: {message}")]
    #[diagnostic(
        code(fastrun::query::decode),
        help("The endpoint must answer with application/sparql-results+json.")
    )]
    Decode { message: String },

    #[error("result row is missing the ?{variable} binding")]
    #[diagnostic(
        code(fastrun::query::missing_binding),
        help("The store returned a row without a variable every fastrun query selects.")
    )]
    MissingBinding { variable: String },

    #[error("unexpected binding \"{term}\": {message}")]
    #[diagnostic(
        code(fastrun::query::unexpected_binding),
        help("The bound term does not have the shape expected for this property type.")
    )]
    UnexpectedBinding { term: String, message: String },

    #[error("local SPARQL store error: {message}")]
    #[diagnostic(
        code(fastrun::query::store),
        help("The embedded oxigraph store failed to load data or evaluate the query.")
    )]
    Store { message: String },
}

/// Convenience alias for functions returning fastrun results.
pub type FastrunResult<T> = std::result::Result<T, FastrunError>;
