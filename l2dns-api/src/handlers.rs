//! API request handlers

use hyper::StatusCode;
use l2dns_core::{DnsEntry, DnsManager, Error};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Body of `POST /entries`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddEntryRequest {
    pub pod_name: String,
    pub network: String,
    pub scope: String,
    pub ip_address: String,
}

/// Body of `DELETE /entries`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveEntryRequest {
    pub key: String,
    pub ip_address: String,
}

/// Body of `POST /servers`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddServerRequest {
    pub domain_name: String,
    pub server_domain: String,
    pub server_port: String,
}

/// Failed request, rendered as `{"error": ...}`
#[derive(Debug)]
pub(crate) struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn body(&self) -> Value {
        json!({ "error": self.message })
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

pub(crate) type HandlerResult = std::result::Result<Value, ApiError>;

fn parse_body<'a, T: Deserialize<'a>>(body: &'a [u8]) -> std::result::Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::bad_request(format!("invalid request body: {}", e)))
}

/// Handle GET /health
pub(crate) fn health_check() -> Value {
    json!({ "status": "healthy" })
}

/// Handle GET /entries
pub(crate) async fn list_entries(manager: &DnsManager) -> HandlerResult {
    let entries = manager.list_records().await?;
    serde_json::to_value(&entries).map_err(|e| ApiError::from(Error::Internal(e.to_string())))
}

/// Handle POST /entries
pub(crate) async fn add_entry(manager: &DnsManager, body: &[u8]) -> HandlerResult {
    let request: AddEntryRequest = parse_body(body)?;
    let key = DnsEntry::new(request.pod_name, request.network, request.scope).generate_key()?;
    manager.add_dns_entry(&key, &request.ip_address).await?;
    Ok(json!({ "key": key }))
}

/// Handle DELETE /entries
pub(crate) async fn remove_entry(manager: &DnsManager, body: &[u8]) -> HandlerResult {
    let request: RemoveEntryRequest = parse_body(body)?;
    if request.key.is_empty() {
        return Err(ApiError::bad_request("key must not be empty"));
    }
    manager.remove_dns_entry(&request.key, &request.ip_address).await?;
    Ok(json!({ "status": "removed" }))
}

/// Handle POST /servers
pub(crate) async fn add_server(manager: &DnsManager, body: &[u8]) -> HandlerResult {
    let request: AddServerRequest = parse_body(body)?;
    manager
        .add_server(&request.domain_name, &request.server_domain, &request.server_port)
        .await?;
    Ok(json!({ "status": "added" }))
}
