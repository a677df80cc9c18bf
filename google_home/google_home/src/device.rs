use std::fmt::Debug;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use tracing::warn;

use crate::errors::{DeviceError, ErrorCode};
use crate::response::{self, State};
use crate::traits::{Command, OnOff, Trait};
use crate::types::Type;

#[async_trait]
pub trait Device: Debug + Send + Sync {
    fn get_device_type(&self) -> Type;
    fn get_device_name(&self) -> Name;
    fn get_id(&self) -> String;
    async fn is_online(&self) -> bool;

    // Default values that can optionally be overridden
    fn will_report_state(&self) -> bool {
        false
    }
    fn get_room_hint(&self) -> Option<&str> {
        None
    }
    fn get_device_info(&self) -> Option<Info> {
        None
    }

    // Devices opt in to traits by returning themselves here
    fn as_on_off(&self) -> Option<&dyn OnOff> {
        None
    }

    fn traits(&self) -> Vec<Trait> {
        let mut traits = Vec::new();
        if self.as_on_off().is_some() {
            traits.push(Trait::OnOff);
        }

        traits
    }

    fn attributes(&self) -> State {
        let mut attributes = State::new();
        if let Some(on_off) = self.as_on_off() {
            if let Some(command_only) = on_off.command_only_on_off() {
                attributes.insert("commandOnlyOnOff".into(), json!(command_only));
            }
            if let Some(query_only) = on_off.query_only_on_off() {
                attributes.insert("queryOnlyOnOff".into(), json!(query_only));
            }
        }

        attributes
    }

    /// Current state of all the traits this device implements
    async fn state(&self) -> Result<State, ErrorCode> {
        let mut state = State::new();
        if let Some(on_off) = self.as_on_off() {
            state.insert("on".into(), json!(on_off.on().await?));
        }

        Ok(state)
    }

    async fn sync(&self) -> response::sync::Device {
        let name = self.get_device_name();
        let mut device =
            response::sync::Device::new(&self.get_id(), &name.name, self.get_device_type());

        device.name = name;
        device.will_report_state = self.will_report_state();
        if let Some(room) = self.get_room_hint() {
            device.room_hint = Some(room.into());
        }
        device.device_info = self.get_device_info();
        device.traits = self.traits();
        device.attributes = self.attributes();

        device
    }

    async fn query(&self) -> response::query::Device {
        let mut device = response::query::Device::new();
        if !self.is_online().await {
            device.set_offline();
        }

        match self.state().await {
            Ok(state) => device.state = state,
            Err(err) => {
                warn!(id = self.get_id(), "Failed to get device state: {err}");
                device.set_error(err);
            }
        }

        device
    }

    async fn execute(&self, command: Command) -> Result<(), ErrorCode> {
        match command {
            Command::OnOff { on } => {
                let Some(on_off) = self.as_on_off() else {
                    return Err(DeviceError::ActionNotAvailable.into());
                };

                on_off.set_on(on).await
            }
            Command::Invalid { command, reason } => {
                warn!(id = self.get_id(), %command, reason, "Received command with invalid params");
                Err(DeviceError::ProtocolError.into())
            }
            Command::Unsupported(command) => {
                warn!(id = self.get_id(), %command, "Received unsupported command");
                Err(DeviceError::FunctionNotSupported.into())
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Name {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    default_names: Vec<String>,
    name: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    nicknames: Vec<String>,
}

impl Name {
    pub fn new(name: &str) -> Self {
        Self {
            default_names: Vec::new(),
            name: name.into(),
            nicknames: Vec::new(),
        }
    }

    pub fn add_default_name(&mut self, name: &str) {
        self.default_names.push(name.into());
    }

    pub fn add_nickname(&mut self, name: &str) {
        self.nicknames.push(name.into());
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Info {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hw_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sw_version: Option<String>,
    // attributes
    // customData
    // otherDeviceIds
}
