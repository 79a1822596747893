// Route exports
pub mod relay;

use actix_web::web;

/// Mount the health probe and the relay scope under `route_prefix`
pub fn configure_routes(cfg: &mut web::ServiceConfig, route_prefix: &str) {
    relay::configure(cfg, route_prefix);
}
