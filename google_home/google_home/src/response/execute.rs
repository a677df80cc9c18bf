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
    pub commands: Vec<Command>,
}

impl Payload {
    pub fn new() -> Self {
        Self {
            error_code: None,
            debug_string: None,
            commands: Vec::new(),
        }
    }

    pub fn add_command(&mut self, command: Command) {
        if !command.is_empty() {
            self.commands.push(command);
        }
    }
}

impl Default for Payload {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,

    pub ids: Vec<String>,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub states: Option<States>,
}

impl Command {
    pub fn new(status: Status) -> Self {
        Self {
            error_code: None,
            ids: Vec::new(),
            status,
            states: None,
        }
    }

    /// Ids are only listed once per group
    pub fn add_id(&mut self, id: &str) {
        if !self.ids.iter().any(|known| known == id) {
            self.ids.push(id.into());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct States {
    pub online: bool,

    #[serde(flatten)]
    pub state: State,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Success,
    Pending,
    Offline,
    Exceptions,
    Error,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::errors::DeviceError;
    use crate::response::{Response, ResponsePayload};

    #[test]
    fn serialize() {
        let mut execute_resp = Payload::new();

        let mut state = State::new();
        state.insert("on".into(), json!(true));
        let mut command = Command::new(Status::Success);
        command.states = Some(States {
            online: true,
            state,
        });
        command.add_id("123");
        execute_resp.add_command(command);

        let mut command = Command::new(Status::Error);
        command.error_code = Some(DeviceError::DeviceNotFound.into());
        command.add_id("456");
        execute_resp.add_command(command);

        // Commands without any ids are dropped
        execute_resp.add_command(Command::new(Status::Offline));

        let resp = Response::new(
            "ff36a3cc-ec34-11e6-b1a0-64510650abcf",
            ResponsePayload::Execute(execute_resp),
        );

        let resp = serde_json::to_value(resp).unwrap();

        let resp_expected = json!({
            "requestId": "ff36a3cc-ec34-11e6-b1a0-64510650abcf",
            "payload": {
                "commands": [
                    {
                        "ids": ["123"],
                        "status": "SUCCESS",
                        "states": {
                            "online": true,
                            "on": true
                        }
                    },
                    {
                        "errorCode": "deviceNotFound",
                        "ids": ["456"],
                        "status": "ERROR"
                    }
                ]
            }
        });

        assert_eq!(resp, resp_expected);
    }

    #[test]
    fn ids_are_unique() {
        let mut command = Command::new(Status::Success);
        command.add_id("light");
        command.add_id("hallway");
        command.add_id("light");

        assert_eq!(command.ids, vec!["light", "hallway"]);
    }
}
