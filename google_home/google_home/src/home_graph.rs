//! Client for the Home Graph API, used to tell Google about state changes
//! and to ask it to sync the device list again.
//!
//! Authentication uses a service account key, the same `key.json` that can be
//! downloaded from the Google Cloud console. The key is exchanged for a short
//! lived access token which is cached until shortly before it expires.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::response::State;

pub const SCOPE: &str = "https://www.googleapis.com/auth/homegraph";
pub const DEFAULT_ENDPOINT: &str = "https://homegraph.googleapis.com/v1";

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME: Duration = Duration::from_secs(60 * 60);
// Refresh the access token a bit before it actually expires
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to read service account key '{path}'")]
    ReadKey {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse service account key")]
    ParseKey(#[from] serde_json::Error),
    #[error("Failed to sign access token request")]
    Sign(#[from] jsonwebtoken::errors::Error),
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error("Home Graph responded with {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// The external device graph that tracks device state for the assistant
#[async_trait]
pub trait DeviceGraph: fmt::Debug + Send + Sync {
    async fn report_state(&self, device_id: &str, state: State) -> Result<(), Error>;
    async fn request_sync(&self) -> Result<(), Error>;
}

#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".into()
}

impl ServiceAccountKey {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| Error::ReadKey {
            path: path.display().to_string(),
            source,
        })?;

        Ok(serde_json::from_str(&content)?)
    }
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct AccessToken {
    token: String,
    expires_at: Instant,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportStateRequest<'a> {
    request_id: String,
    agent_user_id: &'a str,
    payload: ReportStatePayload<'a>,
}

#[derive(Debug, Serialize)]
struct ReportStatePayload<'a> {
    devices: ReportStateDevices<'a>,
}

#[derive(Debug, Serialize)]
struct ReportStateDevices<'a> {
    states: HashMap<&'a str, State>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestSyncRequest<'a> {
    agent_user_id: &'a str,
}

pub struct HomeGraph {
    agent_user_id: String,
    endpoint: String,
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    client: reqwest::Client,
    token: Mutex<Option<AccessToken>>,
}

impl fmt::Debug for HomeGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HomeGraph")
            .field("agent_user_id", &self.agent_user_id)
            .field("endpoint", &self.endpoint)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl HomeGraph {
    pub fn new(agent_user_id: &str, key: ServiceAccountKey) -> Result<Self, Error> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            agent_user_id: agent_user_id.into(),
            endpoint: DEFAULT_ENDPOINT.into(),
            key,
            encoding_key,
            client,
            token: Mutex::new(None),
        })
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').into();
        self
    }

    async fn access_token(&self) -> Result<String, Error> {
        let mut token = self.token.lock().await;
        if let Some(token) = token.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(token.token.clone());
            }
        }

        trace!(client_email = self.key.client_email, "Requesting new access token");

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let claims = Claims {
            iss: &self.key.client_email,
            scope: SCOPE,
            aud: &self.key.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME.as_secs(),
        };
        let assertion = jsonwebtoken::encode(
            &Header::new(Algorithm::RS256),
            &claims,
            &self.encoding_key,
        )?;

        let res = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;
        let res: TokenResponse = check_status(res).await?.json().await?;

        *token = Some(AccessToken {
            token: res.access_token.clone(),
            expires_at: Instant::now()
                + Duration::from_secs(res.expires_in).saturating_sub(EXPIRY_MARGIN),
        });

        Ok(res.access_token)
    }

    async fn post<T: Serialize + ?Sized>(&self, method: &str, body: &T) -> Result<(), Error> {
        let token = self.access_token().await?;

        let res = self
            .client
            .post(format!("{}/devices:{method}", self.endpoint))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        check_status(res).await?;

        Ok(())
    }
}

async fn check_status(res: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = res.status();
    if status.is_success() {
        Ok(res)
    } else {
        let body = res.text().await.unwrap_or_default();
        Err(Error::Status { status, body })
    }
}

#[async_trait]
impl DeviceGraph for HomeGraph {
    async fn report_state(&self, device_id: &str, state: State) -> Result<(), Error> {
        let request = ReportStateRequest {
            request_id: Uuid::new_v4().to_string(),
            agent_user_id: &self.agent_user_id,
            payload: ReportStatePayload {
                devices: ReportStateDevices {
                    states: HashMap::from([(device_id, state)]),
                },
            },
        };

        debug!(id = device_id, request_id = request.request_id, "Reporting state");
        self.post("reportStateAndNotification", &request).await
    }

    async fn request_sync(&self) -> Result<(), Error> {
        debug!(agent_user_id = self.agent_user_id, "Requesting sync");
        self.post(
            "requestSync",
            &RequestSyncRequest {
                agent_user_id: &self.agent_user_id,
            },
        )
        .await
    }
}
