use crate::core::{Formula, FormulaError};
use crate::models::{ListParams, Record, RecordList, RecordPayload, Sort, Table};
use reqwest::{Client, StatusCode};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors surfaced by the query client
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Formula(#[from] FormulaError),
}

impl ClientError {
    /// Upstream status, when the failure came from a non-success response
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Table-oriented client for the grooming app
///
/// Every call is a single round trip through the relay. Failures are
/// logged and handed back to the caller untouched.
#[derive(Debug, Clone)]
pub struct QueryClient {
    base_url: String,
    client: Client,
}

impl QueryClient {
    /// `base_url` is the relay's route, e.g. `https://app.test/.netlify/functions/airtable`
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let client = Client::builder().build()?;
        Ok(Self::with_client(base_url, client))
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), urlencoding::encode(table))
    }

    fn record_url(&self, table: &str, record_id: &str) -> String {
        format!("{}/{}", self.table_url(table), urlencoding::encode(record_id))
    }

    /// Fetch one page of a table, offset included
    pub async fn list_records(&self, table: &str, params: &ListParams) -> Result<RecordList, ClientError> {
        self.fetch_page(table, params).await.map_err(|e| {
            tracing::error!("Error fetching records from {}: {}", table, e);
            e
        })
    }

    async fn fetch_page(&self, table: &str, params: &ListParams) -> Result<RecordList, ClientError> {
        let response = self
            .client
            .get(self.table_url(table))
            .query(&params.to_query_pairs())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: format!("API error: {}", status.as_u16()),
            });
        }

        let json: Value = response.json().await?;

        serde_json::from_value(json)
            .map_err(|e| ClientError::InvalidResponse(format!("Failed to parse records: {}", e)))
    }

    /// Fetch the records of a table; only the `records` array is returned
    pub async fn get_records(&self, table: &str, params: &ListParams) -> Result<Vec<Record>, ClientError> {
        Ok(self.list_records(table, params).await?.records)
    }

    /// Create a record from `fields`
    pub async fn create_record(&self, table: &str, fields: Map<String, Value>) -> Result<Record, ClientError> {
        self.send_create(table, fields).await.map_err(|e| {
            tracing::error!("Error creating record in {}: {}", table, e);
            e
        })
    }

    async fn send_create(&self, table: &str, fields: Map<String, Value>) -> Result<Record, ClientError> {
        let response = self
            .client
            .post(self.table_url(table))
            .json(&RecordPayload::new(fields))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // Prefer the upstream's own explanation when it sends one.
            let body: Value = response.json().await.unwrap_or(Value::Null);
            let message = body["error"]["message"]
                .as_str()
                .unwrap_or("Failed to create record")
                .to_string();
            return Err(ClientError::Api { status: status.as_u16(), message });
        }

        parse_record(response.json().await?)
    }

    /// Overwrite the given `fields` of one record
    pub async fn update_record(
        &self,
        table: &str,
        record_id: &str,
        fields: Map<String, Value>,
    ) -> Result<Record, ClientError> {
        self.send_update(table, record_id, fields).await.map_err(|e| {
            tracing::error!("Error updating record {} in {}: {}", record_id, table, e);
            e
        })
    }

    async fn send_update(
        &self,
        table: &str,
        record_id: &str,
        fields: Map<String, Value>,
    ) -> Result<Record, ClientError> {
        let response = self
            .client
            .patch(self.record_url(table, record_id))
            .json(&RecordPayload::new(fields))
            .send()
            .await?;

        check_status(response.status(), "Failed to update record")?;

        parse_record(response.json().await?)
    }

    /// Delete one record; `Ok(true)` once the upstream accepted it
    pub async fn delete_record(&self, table: &str, record_id: &str) -> Result<bool, ClientError> {
        self.send_delete(table, record_id).await.map_err(|e| {
            tracing::error!("Error deleting record {} in {}: {}", record_id, table, e);
            e
        })
    }

    async fn send_delete(&self, table: &str, record_id: &str) -> Result<bool, ClientError> {
        let response = self
            .client
            .delete(self.record_url(table, record_id))
            .send()
            .await?;

        check_status(response.status(), "Failed to delete record")?;

        Ok(true)
    }

    /// Bookings whose `Date` equals `date`
    pub async fn get_bookings_for_date(&self, date: &str) -> Result<Vec<Record>, ClientError> {
        let params = ListParams::new().filter(Formula::field_equals("Date", date)?);
        self.get_records(Table::Bookings.as_str(), &params).await
    }

    pub async fn get_services(&self) -> Result<Vec<Record>, ClientError> {
        self.get_records(Table::Services.as_str(), &ListParams::new()).await
    }

    /// First client with this email, `None` when there is no match
    pub async fn find_client_by_email(&self, email: &str) -> Result<Option<Record>, ClientError> {
        let params = ListParams::new().filter(Formula::field_equals("Email", email)?);
        let records = self.get_records(Table::Clients.as_str(), &params).await?;
        Ok(records.into_iter().next())
    }

    /// Dogs whose `Owner` link contains the client record id
    pub async fn get_dogs_for_client(&self, owner_id: &str) -> Result<Vec<Record>, ClientError> {
        let params = ListParams::new().filter(Formula::find_in_field(owner_id, "Owner")?);
        self.get_records(Table::Dogs.as_str(), &params).await
    }

    /// A client's bookings, newest first
    pub async fn get_bookings_for_client(&self, client_id: &str) -> Result<Vec<Record>, ClientError> {
        let params = ListParams::new()
            .filter(Formula::find_in_field(client_id, "Client")?)
            .sort_by(Sort::desc("Date"));
        self.get_records(Table::Bookings.as_str(), &params).await
    }
}

fn check_status(status: StatusCode, message: &str) -> Result<(), ClientError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(ClientError::Api {
            status: status.as_u16(),
            message: message.to_string(),
        })
    }
}

fn parse_record(json: Value) -> Result<Record, ClientError> {
    serde_json::from_value(json)
        .map_err(|e| ClientError::InvalidResponse(format!("Failed to parse record: {}", e)))
}
