//! SPARQL term rendering.
//!
//! Every string that ends up inside generated query text goes through these
//! helpers, so identities double as safe query terms.

/// Escape a string for use inside a double-quoted SPARQL literal.
pub fn escape_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0C}' => out.push_str("\\f"),
            _ => out.push(c),
        }
    }
    out
}

/// `"text"` with escaping applied.
pub fn quoted(raw: &str) -> String {
    format!("\"{}\"", escape_string(raw))
}

/// `"text"^^prefix:type` with escaping applied.
pub fn typed(raw: &str, datatype: &str) -> String {
    format!("\"{}\"^^{datatype}", escape_string(raw))
}

/// `"text"@lang` with escaping applied. The language tag is lowercased and
/// stripped of anything outside `[a-z0-9-]`.
pub fn lang_tagged(raw: &str, language: &str) -> String {
    let tag: String = language
        .to_ascii_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();
    format!("\"{}\"@{tag}", escape_string(raw))
}

/// `<iri>` with characters that are illegal in an IRIREF percent-encoded.
pub fn iri(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('<');
    for c in raw.chars() {
        match c {
            '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\' => {
                out.push_str(&format!("%{:02X}", c as u32));
            }
            c if (c as u32) <= 0x20 => out.push_str(&format!("%{:02X}", c as u32)),
            _ => out.push(c),
        }
    }
    out.push('>');
    out
}
