use serde::Deserialize;

use crate::traits;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payload {
    pub commands: Vec<Command>,
}

impl Payload {
    /// Flattens the command groups into the list of executions for every targeted device
    pub fn into_device_executions(self) -> impl Iterator<Item = (String, Vec<traits::Command>)> {
        self.commands.into_iter().flat_map(|command| {
            let execution = command.execution;
            command
                .devices
                .into_iter()
                .map(move |device| (device.id, execution.clone()))
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    pub devices: Vec<Device>,
    pub execution: Vec<traits::Command>,
}

#[derive(Debug, Deserialize)]
pub struct Device {
    pub id: String,
}
