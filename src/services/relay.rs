use crate::config::RelayConfig;
use crate::core::proxy::{
    build_upstream_url, is_preflight, method_carries_body, parse_body, strip_route_prefix, RelayError,
};
use crate::models::{RelayedRequest, RelayedResponse};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde_json::Value;
use tracing::Instrument;

/// Airtable relay
///
/// Forwards frontend calls to the upstream API with the bearer token attached:
/// - OPTIONS is answered locally (preflight)
/// - everything else is proxied once, no retries
/// - upstream status and JSON body come back unchanged
pub struct AirtableRelay {
    config: RelayConfig,
    client: Client,
}

impl AirtableRelay {
    /// Create a new relay around an immutable configuration
    pub fn new(config: RelayConfig) -> Result<Self, RelayError> {
        // Transport defaults apply; no timeout override.
        let client = Client::builder().build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Answer one inbound call; never fails
    ///
    /// Any error from [`AirtableRelay::forward`] becomes `500 {"error": msg}`.
    pub async fn handle(&self, request: RelayedRequest) -> RelayedResponse {
        if is_preflight(&request.method) {
            return RelayedResponse::preflight();
        }

        let span = tracing::info_span!(
            "relay",
            request_id = %uuid::Uuid::new_v4(),
            method = %request.method,
        );

        async {
            match self.forward(&request).await {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!("Airtable relay error on {}: {}", request.path, e);
                    RelayedResponse::failure(e.to_string())
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Proxy a non-preflight call upstream
    pub async fn forward(&self, request: &RelayedRequest) -> Result<RelayedResponse, RelayError> {
        let path = strip_route_prefix(&request.path, &self.config.route_prefix);

        // Reject bad bodies before anything goes out.
        let body = parse_body(&request.body)?;

        let url = build_upstream_url(&self.config, path, &request.query)?;

        tracing::debug!("Forwarding {} {}", request.method, path);

        let mut builder = self
            .client
            .request(request.method.clone(), url)
            .bearer_auth(&self.config.token)
            .header(CONTENT_TYPE, "application/json");

        if let Some(body) = body {
            if method_carries_body(&request.method) {
                builder = builder.json(&body);
            }
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;

        let data: Value = serde_json::from_slice(&bytes).map_err(RelayError::InvalidUpstreamResponse)?;

        tracing::info!("{} {} -> {}", request.method, path, status);

        Ok(RelayedResponse::json(status, data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::Method;

    fn relay() -> AirtableRelay {
        AirtableRelay::new(RelayConfig::new(
            "https://airtable.test/v0",
            "appTest",
            "test_token",
            "/.netlify/functions/airtable",
        ))
        .unwrap()
    }

    #[test]
    fn test_relay_creation() {
        let relay = relay();
        assert_eq!(relay.config().base_url(), "https://airtable.test/v0/appTest");
        assert_eq!(relay.config().token, "test_token");
    }

    #[test]
    fn test_preflight_short_circuits() {
        let request = RelayedRequest::new(Method::OPTIONS, "/.netlify/functions/airtable/Bookings")
            .with_query(vec![("a".to_string(), "b".to_string())])
            .with_body("not json");

        let response = tokio_test::block_on(relay().handle(request));
        assert_eq!(response, RelayedResponse::preflight());
    }

    #[test]
    fn test_bad_body_fails_before_sending() {
        let request = RelayedRequest::new(Method::POST, "/.netlify/functions/airtable/Services")
            .with_body("{oops");

        let response = tokio_test::block_on(relay().handle(request));
        assert_eq!(response.status, 500);

        let message = response.body.unwrap()["error"].as_str().unwrap().to_string();
        assert!(message.starts_with("Invalid JSON body"));
    }
}
