use actix_web::{http::{Method, StatusCode}, web, HttpRequest, HttpResponse, Responder};
use crate::core::CORS_HEADERS;
use crate::models::{HealthResponse, RelayedRequest, RelayedResponse};
use crate::services::AirtableRelay;
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<AirtableRelay>,
}

/// Configure the health probe and the relay scope
pub fn configure(cfg: &mut web::ServiceConfig, route_prefix: &str) {
    cfg
        .route("/health", web::get().to(health_check))
        .service(web::scope(route_prefix).default_service(web::to(relay)));
}

/// Health check endpoint; does not touch the upstream
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Relay endpoint
///
/// ANY <route_prefix>/<table>[/<record id>][?query]
///
/// Method, remaining path, query and body go upstream as-is; the upstream
/// status and JSON body come back with CORS headers attached. The body is
/// read here, up to `max_body_bytes`, so oversized or broken payloads still
/// get the relay's CORS-tagged failure response. Preflight never reads it.
async fn relay(
    state: web::Data<AppState>,
    req: HttpRequest,
    payload: web::Payload,
) -> HttpResponse {
    if *req.method() == Method::OPTIONS {
        return to_http_response(RelayedResponse::preflight());
    }

    let limit = state.relay.config().max_body_bytes;
    let body = match payload.to_bytes_limited(limit).await {
        Ok(Ok(body)) => body,
        Ok(Err(e)) => return reject(&req, format!("Failed to read request body: {}", e)),
        Err(_) => return reject(&req, format!("Request body exceeds {} bytes", limit)),
    };

    match to_relayed_request(&req, body) {
        Ok(relayed) => to_http_response(state.relay.handle(relayed).await),
        Err(message) => reject(&req, message),
    }
}

fn reject(req: &HttpRequest, message: String) -> HttpResponse {
    tracing::error!("Rejected relay call on {}: {}", req.path(), message);
    to_http_response(RelayedResponse::failure(message))
}

fn to_relayed_request(req: &HttpRequest, body: web::Bytes) -> Result<RelayedRequest, String> {
    // actix and reqwest sit on different `http` majors
    let method = reqwest::Method::from_bytes(req.method().as_str().as_bytes())
        .map_err(|e| format!("Unsupported method {}: {}", req.method(), e))?;

    let query = web::Query::<Vec<(String, String)>>::from_query(req.query_string())
        .map_err(|e| format!("Invalid query: {}", e))?
        .into_inner();

    Ok(RelayedRequest::new(method, req.path())
        .with_query(query)
        .with_body(body.to_vec()))
}

/// Attach CORS headers, plus `Content-Type` whenever there is a JSON body
pub fn to_http_response(response: RelayedResponse) -> HttpResponse {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut builder = HttpResponse::build(status);

    for header in CORS_HEADERS {
        builder.insert_header(header);
    }

    match response.body {
        Some(body) => builder.content_type("application/json").body(body.to_string()),
        None => builder.finish(),
    }
}
