// Core relay and formula exports
pub mod formula;
pub mod proxy;

pub use formula::{Formula, FormulaError};
pub use proxy::{build_upstream_url, is_preflight, method_carries_body, parse_body, strip_route_prefix, RelayError, CORS_HEADERS};
