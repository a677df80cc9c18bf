pub mod execute;
pub mod query;

use serde::Deserialize;

const SYNC: &str = "action.devices.SYNC";
const QUERY: &str = "action.devices.QUERY";
const EXECUTE: &str = "action.devices.EXECUTE";
const DISCONNECT: &str = "action.devices.DISCONNECT";

#[derive(Debug, Deserialize)]
#[serde(try_from = "RawIntent")]
pub enum Intent {
    Sync,
    Query(query::Payload),
    Execute(execute::Payload),
    Disconnect,
    /// Any intent name we do not handle, kept so it can be answered with `notSupported`
    Unsupported(String),
}

#[derive(Debug, Deserialize)]
struct RawIntent {
    intent: String,
    #[serde(default)]
    payload: serde_json::Value,
}

impl TryFrom<RawIntent> for Intent {
    type Error = serde_json::Error;

    fn try_from(raw: RawIntent) -> Result<Self, Self::Error> {
        Ok(match raw.intent.as_str() {
            SYNC => Intent::Sync,
            QUERY => Intent::Query(serde_json::from_value(raw.payload)?),
            EXECUTE => Intent::Execute(serde_json::from_value(raw.payload)?),
            DISCONNECT => Intent::Disconnect,
            _ => Intent::Unsupported(raw.intent),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub request_id: String,
    pub inputs: Vec<Intent>,
}
