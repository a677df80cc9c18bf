use serde::Serialize;

use crate::device;
use crate::errors::ErrorCode;
use crate::response::State;
use crate::traits::Trait;
use crate::types::Type;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payload {
    agent_user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_string: Option<String>,
    pub devices: Vec<Device>,
}

impl Payload {
    pub fn new(agent_user_id: &str) -> Self {
        Self {
            agent_user_id: agent_user_id.into(),
            error_code: None,
            debug_string: None,
            devices: Vec::new(),
        }
    }

    pub fn add_device(&mut self, device: Device) {
        self.devices.push(device);
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    id: String,
    #[serde(rename = "type")]
    device_type: Type,
    pub traits: Vec<Trait>,
    pub name: device::Name,
    pub will_report_state: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_supported_by_agent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_info: Option<device::Info>,
    #[serde(skip_serializing_if = "State::is_empty")]
    pub attributes: State,
}

impl Device {
    pub fn new(id: &str, name: &str, device_type: Type) -> Self {
        Self {
            id: id.into(),
            device_type,
            traits: Vec::new(),
            name: device::Name::new(name),
            will_report_state: false,
            notification_supported_by_agent: None,
            room_hint: None,
            device_info: None,
            attributes: State::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn device_type(&self) -> Type {
        self.device_type
    }
}
