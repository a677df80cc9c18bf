use axum::http::StatusCode;
use google_home::{FulfillmentError, home_graph};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Client credentials or code do not match")]
    AuthorizationMismatch,
    #[error("Missing or invalid bearer token")]
    UnauthorizedRequest,
    #[error("Malformed redirect uri")]
    MalformedRedirect(#[source] Option<url::ParseError>),
    #[error("Redirect host '{0}' is not trusted")]
    UntrustedRedirect(String),
    #[error("Unsupported grant type '{}'", .0.as_deref().unwrap_or_default())]
    UnsupportedGrantType(Option<String>),
    #[error("Request does not contain any inputs")]
    EmptyRequest(#[from] FulfillmentError),
    #[error("Home Graph is not configured")]
    HomeGraphNotConfigured,
    #[error("Error requesting sync: {0}")]
    UpstreamSyncFailure(home_graph::Error),
    #[error("Error reporting state: {0}")]
    UpstreamReportFailure(home_graph::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::AuthorizationMismatch
            | Error::UnauthorizedRequest
            | Error::MalformedRedirect(_)
            | Error::UntrustedRedirect(_) => StatusCode::UNAUTHORIZED,
            Error::UnsupportedGrantType(_) | Error::EmptyRequest(_) => StatusCode::BAD_REQUEST,
            Error::HomeGraphNotConfigured
            | Error::UpstreamSyncFailure(_)
            | Error::UpstreamReportFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
