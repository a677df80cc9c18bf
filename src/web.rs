use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::response::IntoResponse;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::config::OAuthConfig;
use crate::error::Error;

#[derive(Debug, Error)]
#[error("{source}")]
pub struct ApiError {
    status_code: StatusCode,
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl ApiError {
    pub fn new(status_code: StatusCode, source: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self {
            status_code,
            source,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self::new(err.status_code(), err.into())
    }
}

impl From<ApiError> for ApiErrorJson {
    fn from(value: ApiError) -> Self {
        let error = ApiErrorJsonError {
            code: value.status_code.as_u16(),
            status: value.status_code.to_string(),
            reason: value.source.to_string(),
        };

        Self { error }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        // Authorization failures do not get any details
        if self.status_code == StatusCode::UNAUTHORIZED {
            return self.status_code.into_response();
        }

        (
            self.status_code,
            axum::Json::<ApiErrorJson>(self.into()),
        )
            .into_response()
    }
}

#[derive(Debug, Serialize)]
struct ApiErrorJsonError {
    code: u16,
    status: String,
    reason: String,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorJson {
    error: ApiErrorJsonError,
}

/// Extractor that only succeeds if the request carries the configured access token as
/// `Authorization: Bearer <token>`
#[derive(Debug)]
pub struct Authorized;

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;

    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim())
}

impl<S> FromRequestParts<S> for Authorized
where
    Arc<OAuthConfig>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let oauth = Arc::<OAuthConfig>::from_ref(state);

        match bearer_token(parts) {
            Some(token) if token == oauth.access_token => Ok(Authorized),
            Some(_) => {
                warn!("Rejected request with invalid bearer token");
                Err(Error::UnauthorizedRequest.into())
            }
            None => {
                warn!("Rejected request without bearer token");
                Err(Error::UnauthorizedRequest.into())
            }
        }
    }
}
