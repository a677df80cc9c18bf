use std::collections::HashMap;

use serde::Serialize;

use crate::errors::ErrorCode;
use crate::response::State;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_string: Option<String>,
    pub devices: HashMap<String, Device>,
}

impl Payload {
    pub fn new() -> Self {
        Self {
            error_code: None,
            debug_string: None,
            devices: HashMap::new(),
        }
    }

    pub fn add_device(&mut self, id: &str, device: Device) {
        self.devices.insert(id.into(), device);
    }
}

impl Default for Payload {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Success,
    Offline,
    Exceptions,
    Error,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    online: bool,
    status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<ErrorCode>,

    #[serde(flatten)]
    pub state: State,
}

impl Device {
    pub fn new() -> Self {
        Self {
            online: true,
            status: Status::Success,
            error_code: None,
            state: State::new(),
        }
    }

    pub fn set_offline(&mut self) {
        self.online = false;
        self.status = Status::Offline;
    }

    pub fn set_error(&mut self, err: ErrorCode) {
        self.status = match err {
            ErrorCode::DeviceError(_) => Status::Error,
            ErrorCode::DeviceException(_) => Status::Exceptions,
        };
        self.error_code = Some(err);
    }

    pub fn online(&self) -> bool {
        self.online
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        self.error_code
    }
}

impl Default for Device {
    fn default() -> Self {
        Self::new()
    }
}
