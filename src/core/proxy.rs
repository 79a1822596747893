use crate::config::RelayConfig;
use reqwest::{Method, Url};
use serde_json::Value;
use thiserror::Error;

/// Errors the relay turns into its fixed 500 response
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Invalid JSON body: {0}")]
    BadRequest(#[source] serde_json::Error),

    #[error("Upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid upstream URL: {0}")]
    InvalidUpstreamUrl(String),

    #[error("Invalid upstream response: {0}")]
    InvalidUpstreamResponse(#[source] serde_json::Error),
}

/// Headers attached to every relay response
pub const CORS_HEADERS: [(&str, &str); 3] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Headers", "Content-Type"),
    ("Access-Control-Allow-Methods", "GET, POST, PATCH, DELETE, OPTIONS"),
];

#[inline]
pub fn is_preflight(method: &Method) -> bool {
    method == Method::OPTIONS
}

/// Only create and update calls forward a body
#[inline]
pub fn method_carries_body(method: &Method) -> bool {
    method == Method::POST || method == Method::PATCH
}

/// Upstream resource path: whatever follows the routing prefix
///
/// Paths that do not start with the prefix are forwarded unchanged.
pub fn strip_route_prefix<'a>(path: &'a str, prefix: &str) -> &'a str {
    path.strip_prefix(prefix).unwrap_or(path)
}

/// `<api_url>/<base_id><path>?<query>`
///
/// The query is re-serialized with form-urlencoded rules and left off when empty.
pub fn build_upstream_url(
    config: &RelayConfig,
    path: &str,
    query: &[(String, String)],
) -> Result<Url, RelayError> {
    let raw = format!("{}{}", config.base_url(), path);
    let mut url = Url::parse(&raw).map_err(|e| RelayError::InvalidUpstreamUrl(format!("{}: {}", raw, e)))?;

    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query.iter());
    }

    Ok(url)
}

/// Parse the inbound body; empty or whitespace-only bodies count as absent
pub fn parse_body(body: &[u8]) -> Result<Option<Value>, RelayError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body).map(Some).map_err(RelayError::BadRequest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RelayConfig {
        RelayConfig::new("https://api.airtable.com/v0", "appBase", "secret", "/.netlify/functions/airtable")
    }

    #[test]
    fn test_strip_route_prefix() {
        assert_eq!(strip_route_prefix("/.netlify/functions/airtable/Bookings", "/.netlify/functions/airtable"), "/Bookings");
        assert_eq!(strip_route_prefix("/.netlify/functions/airtable", "/.netlify/functions/airtable"), "");
        assert_eq!(strip_route_prefix("/other/Dogs", "/.netlify/functions/airtable"), "/other/Dogs");
    }

    #[test]
    fn test_build_url_without_query() {
        let url = build_upstream_url(&config(), "/Dogs/rec9", &[]).unwrap();
        assert_eq!(url.as_str(), "https://api.airtable.com/v0/appBase/Dogs/rec9");
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_build_url_encodes_query() {
        let query = vec![("filterByFormula".to_string(), "{Date} = '2024-05-01'".to_string())];
        let url = build_upstream_url(&config(), "/Bookings", &query).unwrap();

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs, query);
        assert!(!url.query().unwrap().contains(' '));
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(b"").unwrap(), None);
        assert_eq!(parse_body(b"  \n").unwrap(), None);
        assert_eq!(parse_body(br#"{"fields":{}}"#).unwrap(), Some(serde_json::json!({ "fields": {} })));
        assert!(matches!(parse_body(b"{not json"), Err(RelayError::BadRequest(_))));
    }

    #[test]
    fn test_method_helpers() {
        assert!(is_preflight(&Method::OPTIONS));
        assert!(!is_preflight(&Method::GET));
        assert!(method_carries_body(&Method::POST));
        assert!(method_carries_body(&Method::PATCH));
        assert!(!method_carries_body(&Method::DELETE));
        assert!(!method_carries_body(&Method::GET));
    }
}
