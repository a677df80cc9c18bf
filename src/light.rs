use std::sync::Arc;

use async_trait::async_trait;
use google_home::Device;
use google_home::device::Name;
use google_home::errors::ErrorCode;
use google_home::home_graph::DeviceGraph;
use google_home::response::State;
use google_home::traits::OnOff;
use google_home::types::Type;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::LightConfig;
use crate::error::Error;

#[derive(Debug, Default)]
struct LightState {
    on: bool,
}

/// Simulated light, clones share the same state
#[derive(Debug, Clone)]
pub struct Light {
    config: LightConfig,
    state: Arc<RwLock<LightState>>,
    home_graph: Option<Arc<dyn DeviceGraph>>,
}

impl Light {
    pub fn new(config: LightConfig, home_graph: Option<Arc<dyn DeviceGraph>>) -> Self {
        Self {
            config,
            state: Default::default(),
            home_graph,
        }
    }

    /// Returns true if the state changed
    pub async fn update(&self, on: bool) -> bool {
        let mut state = self.state.write().await;
        let changed = state.on != on;
        state.on = on;

        debug!(id = self.config.id, on, changed, "Updated light");

        changed
    }

    pub async fn report_state(&self) -> Result<(), Error> {
        let home_graph = self
            .home_graph
            .as_ref()
            .ok_or(Error::HomeGraphNotConfigured)?;

        let mut state = State::new();
        state.insert("on".into(), json!(self.state.read().await.on));
        state.insert("online".into(), json!(true));

        home_graph
            .report_state(&self.config.id, state)
            .await
            .map_err(Error::UpstreamReportFailure)
    }
}

#[async_trait]
impl Device for Light {
    fn get_device_type(&self) -> Type {
        Type::Light
    }

    fn get_device_name(&self) -> Name {
        let mut name = Name::new(&self.config.name);
        for default_name in &self.config.default_names {
            name.add_default_name(default_name);
        }
        for nickname in &self.config.nicknames {
            name.add_nickname(nickname);
        }

        name
    }

    fn get_id(&self) -> String {
        self.config.id.clone()
    }

    async fn is_online(&self) -> bool {
        true
    }

    fn will_report_state(&self) -> bool {
        true
    }

    fn get_room_hint(&self) -> Option<&str> {
        self.config.room_hint.as_deref()
    }

    fn as_on_off(&self) -> Option<&dyn OnOff> {
        Some(self)
    }
}

#[async_trait]
impl OnOff for Light {
    async fn on(&self) -> Result<bool, ErrorCode> {
        Ok(self.state.read().await.on)
    }

    async fn set_on(&self, on: bool) -> Result<(), ErrorCode> {
        if !self.update(on).await || self.home_graph.is_none() {
            return Ok(());
        }

        // Reporting should not hold up the response
        let light = self.clone();
        tokio::spawn(async move {
            if let Err(err) = light.report_state().await {
                warn!(id = light.config.id, "Failed to report state: {err}");
            }
        });

        Ok(())
    }
}
