use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Type {
    #[serde(rename = "action.devices.types.LIGHT")]
    Light,
}
