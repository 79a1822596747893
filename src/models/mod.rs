// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{ListParams, Record, RecordList, RelayedRequest, RelayedResponse, Sort, SortDirection, Table};
pub use requests::RecordPayload;
pub use responses::{ErrorResponse, HealthResponse};
