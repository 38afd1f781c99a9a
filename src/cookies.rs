//! Cookie-store capability and per-request execution context
//!
//! Token lookup goes through the [`CookieStore`] trait so the same factory
//! code serves both the request-scoped server store and the ambient
//! document-level store, and tests can swap in a map-backed store.

use std::collections::HashMap;
use std::sync::Arc;

/// Read capability over a cookie store
pub trait CookieStore: Send + Sync {
    /// Look up a cookie value by name
    fn get(&self, name: &str) -> Option<String>;
}

/// Map-backed cookie store
///
/// Stands in for the document-level store in the client environment and is
/// the store of choice in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryCookies {
    values: HashMap<String, String>,
}

impl MemoryCookies {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a cookie value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }
}

impl CookieStore for MemoryCookies {
    fn get(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}

impl FromIterator<(String, String)> for MemoryCookies {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Cookie store parsed from a `Cookie:` request header
#[derive(Debug, Clone, Default)]
pub struct HeaderCookies {
    values: HashMap<String, String>,
}

impl HeaderCookies {
    /// Parse a `Cookie:` header value
    ///
    /// Malformed pairs are skipped rather than failing the whole header.
    pub fn parse(header: &str) -> Self {
        let values = cookie::Cookie::split_parse(header)
            .filter_map(|parsed| parsed.ok())
            .map(|c| (c.name().to_string(), c.value().to_string()))
            .collect();
        Self { values }
    }
}

impl CookieStore for HeaderCookies {
    fn get(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}

/// Per-request execution context
///
/// Present only when a client is created on the server; exposes the
/// request-scoped cookie-read capability. Created per incoming request and
/// discarded with the response.
#[derive(Clone)]
pub struct RequestContext {
    cookies: Arc<dyn CookieStore>,
}

impl RequestContext {
    /// Create a context over an arbitrary cookie store
    pub fn new(cookies: Arc<dyn CookieStore>) -> Self {
        Self { cookies }
    }

    /// Create a context from a raw `Cookie:` request header
    pub fn from_cookie_header(header: &str) -> Self {
        Self::new(Arc::new(HeaderCookies::parse(header)))
    }

    /// Read a cookie from the request
    pub fn cookie(&self, name: &str) -> Option<String> {
        self.cookies.get(name)
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_returns_set_values() {
        let cookies = MemoryCookies::new().with("token", "sesame");

        assert_eq!(cookies.get("token"), Some("sesame".to_string()));
        assert_eq!(cookies.get("session"), None);
    }

    #[test]
    fn header_store_parses_multiple_pairs() {
        let cookies = HeaderCookies::parse("token=sesame; theme=dark");

        assert_eq!(cookies.get("token"), Some("sesame".to_string()));
        assert_eq!(cookies.get("theme"), Some("dark".to_string()));
    }

    #[test]
    fn header_store_skips_malformed_pairs() {
        let cookies = HeaderCookies::parse("garbage; token=sesame");

        assert_eq!(cookies.get("token"), Some("sesame".to_string()));
        assert_eq!(cookies.get("garbage"), None);
    }

    #[test]
    fn request_context_reads_through() {
        let ctx = RequestContext::from_cookie_header("token=sesame");

        assert_eq!(ctx.cookie("token"), Some("sesame".to_string()));
        assert_eq!(ctx.cookie("missing"), None);
    }
}
