use crate::core::Formula;
use crate::models::responses::ErrorResponse;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Inbound call as seen by the relay, before any upstream work
#[derive(Debug, Clone)]
pub struct RelayedRequest {
    pub method: Method,
    /// Full inbound path, route prefix included
    pub path: String,
    pub query: Vec<(String, String)>,
    /// Raw body; empty means no body was sent
    pub body: Vec<u8>,
}

impl RelayedRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }
}

/// What the relay hands back to the caller
#[derive(Debug, Clone, PartialEq)]
pub struct RelayedResponse {
    pub status: u16,
    /// `None` only for preflight answers, which carry an empty body
    pub body: Option<Value>,
}

impl RelayedResponse {
    pub fn preflight() -> Self {
        Self { status: 200, body: None }
    }

    pub fn json(status: u16, body: Value) -> Self {
        Self { status, body: Some(body) }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        let body = ErrorResponse { error: message.into() };
        Self::json(500, serde_json::json!(body))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Upstream record envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(rename = "createdTime", default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Helper to read a string field, if present
    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|v| v.as_str())
    }
}

/// One page of a list call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordList {
    pub records: Vec<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<String>,
}

/// Tables the grooming app works with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Bookings,
    Clients,
    Dogs,
    Services,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Bookings => "Bookings",
            Table::Clients => "Clients",
            Table::Dogs => "Dogs",
            Table::Services => "Services",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for Table {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn asc(field: impl Into<String>) -> Self {
        Self { field: field.into(), direction: SortDirection::Asc }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self { field: field.into(), direction: SortDirection::Desc }
    }
}

/// Query parameters for a list call
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    pub filter_by_formula: Option<Formula>,
    pub sort: Vec<Sort>,
    pub max_records: Option<u32>,
    pub page_size: Option<u32>,
    pub view: Option<String>,
    pub offset: Option<String>,
    /// Passed through untouched, after the typed parameters
    pub extra: Vec<(String, String)>,
}

impl ListParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, formula: Formula) -> Self {
        self.filter_by_formula = Some(formula);
        self
    }

    pub fn sort_by(mut self, sort: Sort) -> Self {
        self.sort.push(sort);
        self
    }

    pub fn max_records(mut self, max: u32) -> Self {
        self.max_records = Some(max);
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((key.into(), value.into()));
        self
    }

    /// Flatten into query pairs using the upstream's query-string conventions
    ///
    /// Sort entries become `sort[i][field]` / `sort[i][direction]`.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();

        if let Some(formula) = &self.filter_by_formula {
            pairs.push(("filterByFormula".to_string(), formula.to_string()));
        }

        for (i, sort) in self.sort.iter().enumerate() {
            pairs.push((format!("sort[{}][field]", i), sort.field.clone()));
            pairs.push((format!("sort[{}][direction]", i), sort.direction.as_str().to_string()));
        }

        if let Some(max) = self.max_records {
            pairs.push(("maxRecords".to_string(), max.to_string()));
        }
        if let Some(size) = self.page_size {
            pairs.push(("pageSize".to_string(), size.to_string()));
        }
        if let Some(view) = &self.view {
            pairs.push(("view".to_string(), view.clone()));
        }
        if let Some(offset) = &self.offset {
            pairs.push(("offset".to_string(), offset.clone()));
        }

        pairs.extend(self.extra.iter().cloned());
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_params_have_no_pairs() {
        assert!(ListParams::new().to_query_pairs().is_empty());
    }

    #[test]
    fn test_sort_encoding() {
        let pairs = ListParams::new()
            .sort_by(Sort::desc("Date"))
            .sort_by(Sort::asc("Time"))
            .to_query_pairs();

        assert_eq!(
            pairs,
            vec![
                ("sort[0][field]".to_string(), "Date".to_string()),
                ("sort[0][direction]".to_string(), "desc".to_string()),
                ("sort[1][field]".to_string(), "Time".to_string()),
                ("sort[1][direction]".to_string(), "asc".to_string()),
            ]
        );
    }

    #[test]
    fn test_filter_comes_first() {
        let formula = Formula::field_equals("Date", "2024-05-01").unwrap();
        let pairs = ListParams::new()
            .param("view", "Grid view")
            .filter(formula)
            .to_query_pairs();

        assert_eq!(pairs[0], ("filterByFormula".to_string(), "{Date} = '2024-05-01'".to_string()));
        assert_eq!(pairs[1], ("view".to_string(), "Grid view".to_string()));
    }

    #[test]
    fn test_record_deserializes_without_fields() {
        let record: Record = serde_json::from_value(serde_json::json!({ "id": "r1" })).unwrap();
        assert_eq!(record.id, "r1");
        assert!(record.fields.is_empty());
        assert_eq!(serde_json::to_value(&record).unwrap(), serde_json::json!({ "id": "r1", "fields": {} }));
    }

    #[test]
    fn test_failure_response_shape() {
        let response = RelayedResponse::failure("boom");
        assert_eq!(response.status, 500);
        assert_eq!(response.body, Some(serde_json::json!({ "error": "boom" })));
        assert!(!response.is_success());

        let parsed: ErrorResponse = serde_json::from_value(response.body.unwrap()).unwrap();
        assert_eq!(parsed.error, "boom");
    }
}
