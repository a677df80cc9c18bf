use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::ErrorCode;

const ON_OFF_COMMAND: &str = "action.devices.commands.OnOff";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trait {
    #[serde(rename = "action.devices.traits.OnOff")]
    OnOff,
}

#[async_trait]
pub trait OnOff: Send + Sync {
    fn command_only_on_off(&self) -> Option<bool> {
        None
    }
    fn query_only_on_off(&self) -> Option<bool> {
        None
    }

    async fn on(&self) -> Result<bool, ErrorCode>;
    async fn set_on(&self, on: bool) -> Result<(), ErrorCode>;
}

/// A single execution step from an EXECUTE intent.
///
/// Commands this crate does not know about still deserialize, as
/// [`Command::Unsupported`], and known commands with bad params as
/// [`Command::Invalid`], so that one bad command only fails the devices it
/// targets instead of the whole request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawCommand")]
pub enum Command {
    OnOff { on: bool },
    Invalid { command: String, reason: String },
    Unsupported(String),
}

#[derive(Debug, Deserialize)]
struct RawCommand {
    command: String,
    #[serde(default)]
    params: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct OnOffParams {
    on: bool,
}

impl From<RawCommand> for Command {
    fn from(raw: RawCommand) -> Self {
        match raw.command.as_str() {
            ON_OFF_COMMAND => match serde_json::from_value::<OnOffParams>(raw.params) {
                Ok(params) => Command::OnOff { on: params.on },
                Err(err) => Command::Invalid {
                    command: raw.command,
                    reason: err.to_string(),
                },
            },
            _ => Command::Unsupported(raw.command),
        }
    }
}
