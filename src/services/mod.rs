// Service exports
pub mod query_client;
pub mod relay;

pub use query_client::{ClientError, QueryClient};
pub use relay::AirtableRelay;
