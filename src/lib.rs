//! Groom Relay - Airtable relay and query client for the grooming app
//!
//! The relay keeps the Airtable access token server-side and forwards frontend
//! calls verbatim. The query client wraps it in booking, client, dog and service
//! lookups.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::config::{RelayConfig, Settings};
pub use crate::core::{Formula, FormulaError, RelayError};
pub use models::{ListParams, Record, RelayedRequest, RelayedResponse, Sort, Table};
pub use services::{AirtableRelay, ClientError, QueryClient};
