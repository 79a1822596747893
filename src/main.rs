mod config;
mod core;
mod models;
mod routes;
mod services;

use actix_web::{middleware, web, App, HttpServer};
use crate::config::Settings;
use routes::relay::AppState;
use services::AirtableRelay;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Load configuration
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    // Initialize logging; RUST_LOG wins over logging.level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if settings.logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }

    info!("Starting Groom relay...");

    let relay_config = settings.relay_config().map_err(|e| {
        error!("Failed to load relay configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    info!("Configuration loaded: {:?}", relay_config);

    let relay = AirtableRelay::new(relay_config.clone()).map_err(|e| {
        error!("Failed to build HTTP client: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;

    let app_state = AppState {
        relay: Arc::new(relay),
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);
    let route_prefix = relay_config.route_prefix.clone();

    info!("Starting HTTP server on {}:{} (relay at {})", host, port, route_prefix);

    HttpServer::new(move || {
        let route_prefix = route_prefix.clone();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(move |cfg| routes::configure_routes(cfg, &route_prefix))
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
