pub mod device;
mod fulfillment;
pub mod home_graph;

pub mod request;
pub mod response;

pub mod errors;
pub mod traits;
pub mod types;

pub use device::Device;
pub use fulfillment::{DeviceMap, FulfillmentError, GoogleHome};
pub use request::Request;
pub use response::Response;
