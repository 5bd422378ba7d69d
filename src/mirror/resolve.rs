// src/mirror/resolve.rs
// =============================================================================
// This module turns the references we find in HTML into absolute URLs.
//
// What it decides:
// - Which references can never be downloaded (mailto:, tel:, data:, #anchors)
// - Which references are malformed and must be skipped
// - Whether two URLs live on the same host
//
// Every function here fails closed: a bad reference becomes an Err value,
// never a panic, so one broken link can't stop a page from being mirrored.
//
// Rust concepts:
// - Result<T, E>: For operations that can fail
// - thiserror: To derive Display/Error for our own error enum
// - Url::join: Standard relative-reference resolution (like a browser does)
// =============================================================================

use std::fmt;
use thiserror::Error;
use url::Url;

// Why a reference was not turned into a fetchable URL
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The reference is valid but points at something we never download
    #[error("excluded reference ({0})")]
    Excluded(&'static str),

    /// The reference could not be parsed as a URL at all
    #[error("malformed reference: {0}")]
    Malformed(String),
}

// Schemes we recognize and deliberately skip.
// Anything else that isn't http/https is reported as "unsupported scheme".
const EXCLUDED_PREFIXES: [(&str, &str); 4] = [
    ("mailto:", "mailto"),
    ("tel:", "tel"),
    ("data:", "data"),
    ("javascript:", "javascript"),
];

// Resolves a possibly-relative reference against the page it was found on
//
// Parameters:
//   base: the URL of the page containing the reference
//   reference: the raw attribute value (href/src)
//
// Returns: an absolute http(s) URL without a fragment, or why it was skipped
//
// Examples (base = "https://example.com/blog/post"):
//   "/docs"              -> https://example.com/docs
//   "../about"           -> https://example.com/about
//   "//cdn.example.com/a" -> https://cdn.example.com/a
//   "#top"               -> Err(Excluded("fragment"))
//   "not a url::::"      -> Err(Malformed(..))
pub fn resolve(base: &Url, reference: &str) -> Result<Url, ResolveError> {
    // Browsers ignore leading/trailing whitespace in attribute URLs
    let reference = reference.trim();

    if reference.is_empty() {
        return Err(ResolveError::Excluded("empty"));
    }

    if let Some(kind) = excluded_kind(reference) {
        return Err(ResolveError::Excluded(kind));
    }

    // A relative reference can't have ':' in its first path segment
    // (RFC 3986 section 4.2), otherwise it would look like a scheme.
    if !has_scheme(reference) && first_segment_has_colon(reference) {
        return Err(ResolveError::Malformed(format!(
            "colon in first path segment of relative reference '{}'",
            reference
        )));
    }

    let mut resolved = base
        .join(reference)
        .map_err(|e| ResolveError::Malformed(format!("{}: {}", reference, e)))?;

    match resolved.scheme() {
        "http" | "https" => {}
        _ => return Err(ResolveError::Excluded("unsupported scheme")),
    }

    // The fragment is never sent to the server, so /page#a and /page#b
    // are the same document
    resolved.set_fragment(None);

    Ok(resolved)
}

// The "host[:port]" part of the seed URL, which defines the crawl scope
//
// Url drops a port that is the scheme's default, so http://site:80/ and
// http://site/ have the same authority while http://site:8443/ does not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteAuthority {
    host: String,
    port: Option<u16>,
}

impl SiteAuthority {
    // None if the URL has no host (mailto:, data:, ...)
    pub fn of(url: &Url) -> Option<Self> {
        Some(Self {
            host: url.host_str()?.to_string(),
            port: url.port(),
        })
    }
}

impl fmt::Display for SiteAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}:{}", self.host, port),
            None => f.write_str(&self.host),
        }
    }
}

// Exact "host[:port]" comparison against the seed's authority
//
// "docs.example.com" is NOT the same host as "example.com" - there is no
// suffix matching here - and example.com:8443 is not example.com.
pub fn same_host(url: &Url, site: &SiteAuthority) -> bool {
    url.host_str() == Some(site.host.as_str()) && url.port() == site.port
}

// The string the visited registry uses to identify a page
pub fn canonical_key(url: &Url) -> String {
    let mut key = url.clone();
    key.set_fragment(None);
    key.into()
}

// Returns which excluded kind a raw reference is, if any
fn excluded_kind(reference: &str) -> Option<&'static str> {
    if reference.starts_with('#') {
        return Some("fragment");
    }

    // Schemes are case-insensitive: "MAILTO:" is still mailto
    let lowered = reference
        .get(..11)
        .unwrap_or(reference)
        .to_ascii_lowercase();

    EXCLUDED_PREFIXES
        .iter()
        .find(|(prefix, _)| lowered.starts_with(prefix))
        .map(|(_, kind)| *kind)
}

// True if the reference starts with a syntactically valid scheme
// (ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ) ":")
fn has_scheme(reference: &str) -> bool {
    let Some((scheme, _)) = reference.split_once(':') else {
        return false;
    };

    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {}
        _ => return false,
    }

    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn first_segment_has_colon(reference: &str) -> bool {
    let end = reference
        .find(|c| matches!(c, '/' | '?' | '#'))
        .unwrap_or(reference.len());

    reference[..end].contains(':')
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What is `let ... else`?
//    - `let Some(x) = value else { return ...; };`
//    - Binds x if the pattern matches, otherwise runs the else block
//    - The else block must leave the function (return, continue, panic...)
//
// 2. Why does resolve() take &Url instead of &str for the base?
//    - The page URL was already parsed once when we fetched it
//    - Passing the parsed value avoids re-parsing for every reference
//
// 3. What does .into() do on a Url?
//    - Url implements From<Url> for String
//    - So `let s: String = url.into();` gives the serialized URL
// -----------------------------------------------------------------------------
