use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body sent upstream when creating or updating a record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordPayload {
    pub fields: Map<String, Value>,
}

impl RecordPayload {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}
