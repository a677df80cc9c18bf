use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::Device;
use crate::errors::{DeviceError, ErrorCode};
use crate::request::{self, Intent, Request};
use crate::response::{self, Response, ResponsePayload, State, execute, query, sync};
use crate::traits::Command;

pub type DeviceMap = HashMap<String, Box<dyn Device>>;

const DEFAULT_DEVICE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug)]
pub struct GoogleHome {
    user_id: String,
    device_timeout: Duration,
}

#[derive(Debug, Error)]
pub enum FulfillmentError {
    #[error("Expected at least one ResponsePayload")]
    ExpectedOnePayload,
}

enum Outcome {
    Success(State),
    Offline,
}

impl GoogleHome {
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.into(),
            device_timeout: DEFAULT_DEVICE_TIMEOUT,
        }
    }

    /// Upper bound for a single device operation during QUERY and EXECUTE
    pub fn with_device_timeout(mut self, device_timeout: Duration) -> Self {
        self.device_timeout = device_timeout;
        self
    }

    #[instrument(skip_all, fields(request_id = %request.request_id))]
    pub async fn handle_request(
        &self,
        request: Request,
        devices: &DeviceMap,
    ) -> Result<Response, FulfillmentError> {
        if request.inputs.len() > 1 {
            debug!(
                count = request.inputs.len(),
                "Only the first input will be handled"
            );
        }

        let intent = request
            .inputs
            .into_iter()
            .next()
            .ok_or(FulfillmentError::ExpectedOnePayload)?;

        let payload = match intent {
            Intent::Sync => ResponsePayload::Sync(self.sync(devices).await),
            Intent::Query(payload) => ResponsePayload::Query(self.query(payload, devices).await),
            Intent::Execute(payload) => {
                ResponsePayload::Execute(self.execute(payload, devices).await)
            }
            Intent::Disconnect => {
                debug!(user_id = self.user_id, "Account unlinked");
                ResponsePayload::Disconnect(response::Empty::default())
            }
            Intent::Unsupported(intent) => {
                warn!(intent, "Received unsupported intent");
                let mut error = response::Error::new(DeviceError::NotSupported.into());
                error.debug_string = Some(format!("Intent '{intent}' is not supported"));
                ResponsePayload::Error(error)
            }
        };

        Ok(Response::new(&request.request_id, payload))
    }

    async fn with_timeout<T>(
        &self,
        f: impl Future<Output = Result<T, ErrorCode>>,
    ) -> Result<T, ErrorCode> {
        tokio::time::timeout(self.device_timeout, f)
            .await
            .unwrap_or_else(|_| Err(DeviceError::TransientError.into()))
    }

    async fn sync(&self, devices: &DeviceMap) -> sync::Payload {
        let mut resp_payload = sync::Payload::new(&self.user_id);
        let f = devices.values().map(|device| device.sync());

        resp_payload.devices = join_all(f).await;
        resp_payload
    }

    async fn query(&self, payload: request::query::Payload, devices: &DeviceMap) -> query::Payload {
        let mut resp_payload = query::Payload::new();
        let f = payload
            .devices
            .into_iter()
            .map(|device| device.id)
            .map(|id| async move {
                let device = if let Some(device) = devices.get(id.as_str()) {
                    match tokio::time::timeout(self.device_timeout, device.query()).await {
                        Ok(device) => device,
                        Err(_) => {
                            warn!(id, "Timed out while querying device");
                            let mut device = query::Device::new();
                            device.set_error(DeviceError::TransientError.into());
                            device
                        }
                    }
                } else {
                    let mut device = query::Device::new();
                    device.set_offline();
                    device.set_error(DeviceError::DeviceNotFound.into());

                    device
                };

                (id, device)
            });

        // Await all the futures and then convert the resulting vector into a hashmap
        resp_payload.devices = join_all(f).await.into_iter().collect();
        resp_payload
    }

    async fn execute(
        &self,
        payload: request::execute::Payload,
        devices: &DeviceMap,
    ) -> execute::Payload {
        let f = payload
            .into_device_executions()
            .map(|(id, execution)| async move {
                let result = if let Some(device) = devices.get(id.as_str()) {
                    self.with_timeout(execute_device(device.as_ref(), execution))
                        .await
                } else {
                    Err(DeviceError::DeviceNotFound.into())
                };

                (id, result)
            });

        let mut success = execute::Command::new(execute::Status::Success);
        let mut success_state = State::new();
        let mut offline = execute::Command::new(execute::Status::Offline);
        offline.states = Some(execute::States {
            online: false,
            state: State::new(),
        });
        let mut errors: HashMap<ErrorCode, execute::Command> = HashMap::new();

        for (id, result) in join_all(f).await {
            match result {
                Ok(Outcome::Success(state)) => {
                    success_state.extend(state);
                    success.add_id(&id);
                }
                Ok(Outcome::Offline) => offline.add_id(&id),
                Err(err) => {
                    warn!(id, "Unable to update device: {err}");
                    errors
                        .entry(err)
                        .or_insert_with(|| match &err {
                            ErrorCode::DeviceError(_) => {
                                execute::Command::new(execute::Status::Error)
                            }
                            ErrorCode::DeviceException(_) => {
                                execute::Command::new(execute::Status::Exceptions)
                            }
                        })
                        .add_id(&id)
                }
            }
        }

        // A device that failed in any of the command groups did not succeed
        success.ids.retain(|id| {
            !offline.ids.contains(id) && !errors.values().any(|cmd| cmd.ids.contains(id))
        });
        success.states = Some(execute::States {
            online: true,
            state: success_state,
        });

        let mut resp_payload = execute::Payload::new();
        resp_payload.add_command(success);
        resp_payload.add_command(offline);
        for (error, mut cmd) in errors {
            cmd.error_code = Some(error);
            resp_payload.add_command(cmd);
        }

        resp_payload
    }
}

async fn execute_device(device: &dyn Device, execution: Vec<Command>) -> Result<Outcome, ErrorCode> {
    if !device.is_online().await {
        return Ok(Outcome::Offline);
    }

    for command in execution {
        device.execute(command).await?;
    }

    device.state().await.map(Outcome::Success)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use serde_json::json;
    use tokio::sync::RwLock;

    use super::*;
    use crate::device::Name;
    use crate::traits::OnOff;
    use crate::types::Type;

    #[derive(Debug)]
    struct TestLight {
        id: String,
        online: bool,
        delay: Option<Duration>,
        on: Arc<RwLock<bool>>,
    }

    impl TestLight {
        fn new(id: &str) -> Self {
            Self {
                id: id.into(),
                online: true,
                delay: None,
                on: Default::default(),
            }
        }
    }

    #[async_trait]
    impl Device for TestLight {
        fn get_device_type(&self) -> Type {
            Type::Light
        }

        fn get_device_name(&self) -> Name {
            let mut name = Name::new("Nightstand");
            name.add_nickname("Nightlight");

            name
        }

        fn get_id(&self) -> String {
            self.id.clone()
        }

        async fn is_online(&self) -> bool {
            self.online
        }

        fn as_on_off(&self) -> Option<&dyn OnOff> {
            Some(self)
        }
    }

    #[async_trait]
    impl OnOff for TestLight {
        async fn on(&self) -> Result<bool, ErrorCode> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            Ok(*self.on.read().await)
        }

        async fn set_on(&self, on: bool) -> Result<(), ErrorCode> {
            *self.on.write().await = on;
            Ok(())
        }
    }

    fn devices(lights: Vec<TestLight>) -> DeviceMap {
        lights
            .into_iter()
            .map(|light| (light.get_id(), Box::new(light) as Box<dyn Device>))
            .collect()
    }

    fn request(value: serde_json::Value) -> Request {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn handle_sync() {
        let gh = GoogleHome::new("Dreaded_X");
        let devices = devices(vec![TestLight::new("bedroom/nightstand")]);

        let req = request(json!({
            "requestId": "ff36a3cc-ec34-11e6-b1a0-64510650abcf",
            "inputs": [{ "intent": "action.devices.SYNC" }]
        }));

        let resp = gh.handle_request(req, &devices).await.unwrap();

        assert_eq!(
            serde_json::to_value(resp).unwrap(),
            json!({
                "requestId": "ff36a3cc-ec34-11e6-b1a0-64510650abcf",
                "payload": {
                    "agentUserId": "Dreaded_X",
                    "devices": [{
                        "id": "bedroom/nightstand",
                        "type": "action.devices.types.LIGHT",
                        "traits": ["action.devices.traits.OnOff"],
                        "name": {
                            "name": "Nightstand",
                            "nicknames": ["Nightlight"]
                        },
                        "willReportState": false
                    }]
                }
            })
        );
    }

    #[tokio::test]
    async fn handle_query() {
        let gh = GoogleHome::new("Dreaded_X");
        let lamp = TestLight::new("living/lamp");
        *lamp.on.write().await = true;
        let devices = devices(vec![TestLight::new("bedroom/nightstand"), lamp]);

        let req = request(json!({
            "requestId": "ff36a3cc-ec34-11e6-b1a0-64510650abcf",
            "inputs": [{
                "intent": "action.devices.QUERY",
                "payload": {
                    "devices": [
                        { "id": "bedroom/nightstand" },
                        { "id": "living/lamp" },
                        { "id": "living/party_mode" }
                    ]
                }
            }]
        }));

        let resp = gh.handle_request(req, &devices).await.unwrap();

        assert_eq!(
            serde_json::to_value(resp).unwrap(),
            json!({
                "requestId": "ff36a3cc-ec34-11e6-b1a0-64510650abcf",
                "payload": {
                    "devices": {
                        "bedroom/nightstand": { "online": true, "status": "SUCCESS", "on": false },
                        "living/lamp": { "online": true, "status": "SUCCESS", "on": true },
                        "living/party_mode": {
                            "online": false,
                            "status": "ERROR",
                            "errorCode": "deviceNotFound"
                        }
                    }
                }
            })
        );
    }

    #[tokio::test]
    async fn handle_query_slow_device() {
        let gh = GoogleHome::new("Dreaded_X").with_device_timeout(Duration::from_millis(20));
        let mut slow = TestLight::new("slow");
        slow.delay = Some(Duration::from_secs(5));
        let devices = devices(vec![slow, TestLight::new("fast")]);

        let req = request(json!({
            "requestId": "1",
            "inputs": [{
                "intent": "action.devices.QUERY",
                "payload": { "devices": [{ "id": "slow" }, { "id": "fast" }] }
            }]
        }));

        let resp = gh.handle_request(req, &devices).await.unwrap();
        let ResponsePayload::Query(payload) = resp.payload else {
            panic!("Expected Query payload");
        };

        assert_eq!(payload.devices["slow"].status(), query::Status::Error);
        assert_eq!(
            payload.devices["slow"].error_code(),
            Some(DeviceError::TransientError.into())
        );
        assert_eq!(payload.devices["fast"].status(), query::Status::Success);
    }

    #[tokio::test]
    async fn handle_execute() {
        let gh = GoogleHome::new("Dreaded_X");
        let mut offline = TestLight::new("garage/light");
        offline.online = false;
        let devices = devices(vec![
            TestLight::new("bedroom/nightstand"),
            TestLight::new("living/lamp"),
            offline,
        ]);

        let req = request(json!({
            "requestId": "ff36a3cc-ec34-11e6-b1a0-64510650abcf",
            "inputs": [{
                "intent": "action.devices.EXECUTE",
                "payload": {
                    "commands": [{
                        "devices": [
                            { "id": "bedroom/nightstand" },
                            { "id": "garage/light" },
                            { "id": "living/party_mode" }
                        ],
                        "execution": [{
                            "command": "action.devices.commands.OnOff",
                            "params": { "on": true }
                        }]
                    }, {
                        "devices": [{ "id": "living/lamp" }],
                        "execution": [{
                            "command": "action.devices.commands.BrightnessAbsolute",
                            "params": { "brightness": 10 }
                        }]
                    }]
                }
            }]
        }));

        let resp = gh.handle_request(req, &devices).await.unwrap();
        let resp = serde_json::to_value(resp).unwrap();
        let commands = resp["payload"]["commands"].as_array().unwrap();

        assert_eq!(commands.len(), 4);
        assert_eq!(
            commands[0],
            json!({
                "ids": ["bedroom/nightstand"],
                "status": "SUCCESS",
                "states": { "online": true, "on": true }
            })
        );
        assert_eq!(
            commands[1],
            json!({
                "ids": ["garage/light"],
                "status": "OFFLINE",
                "states": { "online": false }
            })
        );

        let mut errors: Vec<_> = commands[2..].to_vec();
        errors.sort_by_key(|cmd| cmd["errorCode"].as_str().unwrap().to_owned());
        assert_eq!(
            errors,
            vec![
                json!({
                    "errorCode": "deviceNotFound",
                    "ids": ["living/party_mode"],
                    "status": "ERROR"
                }),
                json!({
                    "errorCode": "functionNotSupported",
                    "ids": ["living/lamp"],
                    "status": "ERROR"
                }),
            ]
        );

        assert_eq!(
            devices["bedroom/nightstand"].state().await.unwrap()["on"],
            json!(true)
        );
        assert_eq!(
            devices["living/lamp"].state().await.unwrap()["on"],
            json!(false)
        );
    }

    #[tokio::test]
    async fn handle_execute_invalid_params() {
        let gh = GoogleHome::new("Dreaded_X");
        let devices = devices(vec![
            TestLight::new("bedroom/nightstand"),
            TestLight::new("living/lamp"),
        ]);

        let req = request(json!({
            "requestId": "1",
            "inputs": [{
                "intent": "action.devices.EXECUTE",
                "payload": {
                    "commands": [{
                        "devices": [{ "id": "living/lamp" }],
                        "execution": [{
                            "command": "action.devices.commands.OnOff",
                            "params": { "on": "yes" }
                        }]
                    }, {
                        "devices": [{ "id": "bedroom/nightstand" }],
                        "execution": [{
                            "command": "action.devices.commands.OnOff",
                            "params": { "on": true }
                        }]
                    }]
                }
            }]
        }));

        let resp = gh.handle_request(req, &devices).await.unwrap();

        assert_eq!(
            serde_json::to_value(resp).unwrap(),
            json!({
                "requestId": "1",
                "payload": {
                    "commands": [{
                        "ids": ["bedroom/nightstand"],
                        "status": "SUCCESS",
                        "states": { "online": true, "on": true }
                    }, {
                        "errorCode": "protocolError",
                        "ids": ["living/lamp"],
                        "status": "ERROR"
                    }]
                }
            })
        );
        assert_eq!(
            devices["living/lamp"].state().await.unwrap()["on"],
            json!(false)
        );
    }

    #[tokio::test]
    async fn handle_execute_repeated_device() {
        let gh = GoogleHome::new("Dreaded_X");
        let devices = devices(vec![
            TestLight::new("bedroom/nightstand"),
            TestLight::new("living/lamp"),
        ]);

        let on = json!({
            "command": "action.devices.commands.OnOff",
            "params": { "on": true }
        });
        let req = request(json!({
            "requestId": "1",
            "inputs": [{
                "intent": "action.devices.EXECUTE",
                "payload": {
                    "commands": [{
                        "devices": [{ "id": "bedroom/nightstand" }, { "id": "living/lamp" }],
                        "execution": [on.clone()]
                    }, {
                        "devices": [{ "id": "bedroom/nightstand" }],
                        "execution": [on]
                    }, {
                        "devices": [{ "id": "living/lamp" }],
                        "execution": [{
                            "command": "action.devices.commands.BrightnessAbsolute",
                            "params": { "brightness": 10 }
                        }]
                    }]
                }
            }]
        }));

        let resp = gh.handle_request(req, &devices).await.unwrap();
        let resp = serde_json::to_value(resp).unwrap();

        // The lamp failed in one of the groups, so it is only reported as an error
        assert_eq!(
            resp["payload"]["commands"],
            json!([{
                "ids": ["bedroom/nightstand"],
                "status": "SUCCESS",
                "states": { "online": true, "on": true }
            }, {
                "errorCode": "functionNotSupported",
                "ids": ["living/lamp"],
                "status": "ERROR"
            }])
        );
    }

    #[tokio::test]
    async fn handle_disconnect() {
        let gh = GoogleHome::new("Dreaded_X");
        let devices = devices(vec![]);

        let req = request(json!({
            "requestId": "ff36a3cc-ec34-11e6-b1a0-64510650abcf",
            "inputs": [{ "intent": "action.devices.DISCONNECT" }]
        }));

        let resp = gh.handle_request(req, &devices).await.unwrap();

        assert_eq!(
            serde_json::to_value(resp).unwrap(),
            json!({
                "requestId": "ff36a3cc-ec34-11e6-b1a0-64510650abcf",
                "payload": {}
            })
        );
    }

    #[tokio::test]
    async fn handle_unsupported_intent() {
        let gh = GoogleHome::new("Dreaded_X");
        let devices = devices(vec![]);

        let req = request(json!({
            "requestId": "ff36a3cc-ec34-11e6-b1a0-64510650abcf",
            "inputs": [{ "intent": "action.devices.IDENTIFY", "payload": {} }]
        }));

        let resp = gh.handle_request(req, &devices).await.unwrap();
        let resp = serde_json::to_value(resp).unwrap();

        assert_eq!(resp["payload"]["errorCode"], json!("notSupported"));
    }

    #[tokio::test]
    async fn handle_empty_request() {
        let gh = GoogleHome::new("Dreaded_X");
        let devices = devices(vec![]);

        let req = request(json!({
            "requestId": "ff36a3cc-ec34-11e6-b1a0-64510650abcf",
            "inputs": []
        }));

        assert!(matches!(
            gh.handle_request(req, &devices).await,
            Err(FulfillmentError::ExpectedOnePayload)
        ));
    }
}
