pub mod execute;
pub mod query;
pub mod sync;

use serde::Serialize;

use crate::errors::ErrorCode;

/// A device state as reported to Google, e.g. `{"on": true}`
pub type State = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    request_id: String,
    pub payload: ResponsePayload,
}

impl Response {
    pub fn new(request_id: &str, payload: ResponsePayload) -> Self {
        Self {
            request_id: request_id.into(),
            payload,
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ResponsePayload {
    Sync(sync::Payload),
    Query(query::Payload),
    Execute(execute::Payload),
    Disconnect(Empty),
    Error(Error),
}

/// Serializes as `{}`
#[derive(Debug, Default, Serialize)]
pub struct Empty {}

/// Payload used when the whole request fails, instead of individual devices
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Error {
    pub error_code: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_string: Option<String>,
}

impl Error {
    pub fn new(error_code: ErrorCode) -> Self {
        Self {
            error_code,
            debug_string: None,
        }
    }
}
