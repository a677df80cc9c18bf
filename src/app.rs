use std::sync::Arc;

use axum::extract::{FromRef, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use google_home::home_graph::DeviceGraph;
use google_home::{Device, DeviceMap, GoogleHome, Request, Response};
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::config::{Config, OAuthConfig};
use crate::error::Error;
use crate::light::Light;
use crate::oauth;
use crate::web::{ApiError, Authorized};

#[derive(Clone)]
pub struct AppState {
    oauth: Arc<OAuthConfig>,
    google_home: Arc<GoogleHome>,
    devices: Arc<DeviceMap>,
    light: Light,
    home_graph: Option<Arc<dyn DeviceGraph>>,
}

impl FromRef<AppState> for Arc<OAuthConfig> {
    fn from_ref(input: &AppState) -> Self {
        input.oauth.clone()
    }
}

impl AppState {
    pub fn new(config: &Config, home_graph: Option<Arc<dyn DeviceGraph>>) -> Self {
        let light = Light::new(config.light.clone(), home_graph.clone());

        let mut devices = DeviceMap::new();
        devices.insert(light.get_id(), Box::new(light.clone()));

        Self {
            oauth: Arc::new(config.oauth.clone()),
            google_home: Arc::new(GoogleHome::new(&config.agent_user_id)),
            devices: Arc::new(devices),
            light,
            home_graph,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/fakeauth", get(oauth::authorize))
        .route("/faketoken", post(oauth::token))
        .route("/smarthome", post(fulfillment))
        .route("/requestsync", get(request_sync))
        .route("/test", get(test))
        .with_state(state)
}

async fn fulfillment(
    State(state): State<AppState>,
    _: Authorized,
    Json(payload): Json<Request>,
) -> Result<Json<Response>, ApiError> {
    debug!("{payload:#?}");
    let result = state
        .google_home
        .handle_request(payload, &state.devices)
        .await
        .map_err(Error::from)?;

    debug!("{result:#?}");

    Ok(Json(result))
}

async fn request_sync(State(state): State<AppState>) -> impl IntoResponse {
    let result = match &state.home_graph {
        Some(home_graph) => home_graph
            .request_sync()
            .await
            .map_err(Error::UpstreamSyncFailure),
        None => Err(Error::HomeGraphNotConfigured),
    };

    match &result {
        Ok(()) => info!("Requested sync"),
        Err(err) => error!("{err}"),
    }

    (
        [(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")],
        result.map_err(ApiError::from),
    )
}

#[derive(Debug, Deserialize)]
struct TestParams {
    on: Option<String>,
}

/// Manually set the light and report the new state
async fn test(
    State(state): State<AppState>,
    Query(params): Query<TestParams>,
) -> Result<(), ApiError> {
    let on = params.on.as_deref() == Some("true");

    state.light.update(on).await;
    state.light.report_state().await.inspect_err(|err| error!("{err}"))?;

    Ok(())
}
