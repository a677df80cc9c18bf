use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use ::config::{ConfigError, Environment, File};
use serde::Deserialize;

use crate::secret::EnvironmentSecretFile;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fulfillment: FulfillmentConfig,
    pub agent_user_id: String,
    pub oauth: OAuthConfig,
    #[serde(default)]
    pub light: LightConfig,
    pub home_graph: Option<HomeGraphConfig>,
}

impl Config {
    /// Combines the (optional) config file at `path`, environment variables prefixed with
    /// `SMARTHOME__` and secrets from files named in `SMARTHOME__*__FILE` variables
    pub fn build(path: &str) -> Result<Self, ConfigError> {
        ::config::Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::default()
                    .prefix(std::env!("CARGO_PKG_NAME"))
                    .separator("__"),
            )
            .add_source(EnvironmentSecretFile::default())
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FulfillmentConfig {
    #[serde(default = "default_fulfillment_ip")]
    pub ip: Ipv4Addr,
    #[serde(default = "default_fulfillment_port")]
    pub port: u16,
}

impl Default for FulfillmentConfig {
    fn default() -> Self {
        Self {
            ip: default_fulfillment_ip(),
            port: default_fulfillment_port(),
        }
    }
}

impl From<FulfillmentConfig> for SocketAddr {
    fn from(fulfillment: FulfillmentConfig) -> Self {
        (fulfillment.ip, fulfillment.port).into()
    }
}

fn default_fulfillment_ip() -> Ipv4Addr {
    [0, 0, 0, 0].into()
}

fn default_fulfillment_port() -> u16 {
    8080
}

/// Static credentials handed out by the mock OAuth endpoints
#[derive(Clone, Deserialize)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub authorization_code: String,
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
    #[serde(default = "default_redirect_hosts")]
    pub redirect_hosts: Vec<String>,
}

impl fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("expires_in", &self.expires_in)
            .field("redirect_hosts", &self.redirect_hosts)
            .finish_non_exhaustive()
    }
}

fn default_expires_in() -> u64 {
    // 24 hours
    60 * 60 * 24
}

fn default_redirect_hosts() -> Vec<String> {
    vec![
        "oauth-redirect.googleusercontent.com".into(),
        "oauth-redirect-sandbox.googleusercontent.com".into(),
    ]
}

#[derive(Debug, Clone, Deserialize)]
pub struct LightConfig {
    #[serde(default = "default_light_id")]
    pub id: String,
    #[serde(default = "default_light_name")]
    pub name: String,
    #[serde(default = "default_light_default_names")]
    pub default_names: Vec<String>,
    #[serde(default = "default_light_nicknames")]
    pub nicknames: Vec<String>,
    pub room_hint: Option<String>,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            id: default_light_id(),
            name: default_light_name(),
            default_names: default_light_default_names(),
            nicknames: default_light_nicknames(),
            room_hint: None,
        }
    }
}

fn default_light_id() -> String {
    "light".into()
}

fn default_light_name() -> String {
    "kitchen light".into()
}

fn default_light_default_names() -> Vec<String> {
    vec!["Kitchen light".into()]
}

fn default_light_nicknames() -> Vec<String> {
    vec!["light".into()]
}

#[derive(Debug, Clone, Deserialize)]
pub struct HomeGraphConfig {
    /// Path to the service account key
    #[serde(default = "default_credentials")]
    pub credentials: PathBuf,
    pub endpoint: Option<String>,
}

fn default_credentials() -> PathBuf {
    "./key.json".into()
}
