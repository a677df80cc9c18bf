//! Mock OAuth endpoints used for account linking
//!
//! Every client that presents the configured credentials gets the same static tokens.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use axum::{Form, Json};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::config::OAuthConfig;
use crate::error::Error;
use crate::web::ApiError;

const GRANT_AUTHORIZATION_CODE: &str = "authorization_code";
const GRANT_REFRESH_TOKEN: &str = "refresh_token";

#[derive(Debug, Default, Deserialize)]
pub struct AuthorizeParams {
    pub redirect_uri: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TokenQuery {
    pub grant_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TokenForm {
    pub grant_type: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub authorization_code: Option<String>,
    pub code: Option<String>,
    pub refresh_token: Option<String>,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct TokenResponse {
    pub token_type: &'static str,
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub expires_in: u64,
}

impl TokenResponse {
    fn bearer(oauth: &OAuthConfig, refresh_token: Option<String>) -> Self {
        Self {
            token_type: "bearer",
            access_token: oauth.access_token.clone(),
            refresh_token,
            expires_in: oauth.expires_in,
        }
    }
}

/// Builds the redirect back to the assistant platform, only for trusted hosts
pub fn redirect_location(
    oauth: &OAuthConfig,
    redirect_uri: Option<&str>,
    state: Option<&str>,
) -> Result<Url, Error> {
    let redirect_uri = redirect_uri.ok_or(Error::MalformedRedirect(None))?;
    let mut url = Url::parse(redirect_uri).map_err(|err| Error::MalformedRedirect(Some(err)))?;

    let host = url.host_str().ok_or(Error::MalformedRedirect(None))?;
    if !oauth.redirect_hosts.iter().any(|trusted| trusted == host) {
        return Err(Error::UntrustedRedirect(host.to_owned()));
    }

    {
        let mut query = url.query_pairs_mut();
        query.append_pair("code", &oauth.authorization_code);
        if let Some(state) = state {
            query.append_pair("state", state);
        }
    }

    Ok(url)
}

fn matches(presented: Option<&str>, expected: &str) -> bool {
    presented == Some(expected)
}

pub fn issue_token(
    oauth: &OAuthConfig,
    grant_type: Option<&str>,
    form: &TokenForm,
) -> Result<TokenResponse, Error> {
    if !matches(form.client_id.as_deref(), &oauth.client_id)
        || !matches(form.client_secret.as_deref(), &oauth.client_secret)
    {
        return Err(Error::AuthorizationMismatch);
    }

    match grant_type {
        Some(GRANT_AUTHORIZATION_CODE) => {
            let code = form.authorization_code.as_deref().or(form.code.as_deref());
            if !matches(code, &oauth.authorization_code) {
                return Err(Error::AuthorizationMismatch);
            }

            Ok(TokenResponse::bearer(
                oauth,
                Some(oauth.refresh_token.clone()),
            ))
        }
        Some(GRANT_REFRESH_TOKEN) => {
            let token = form
                .refresh_token
                .as_deref()
                .or(form.authorization_code.as_deref());
            if !matches(token, &oauth.refresh_token) {
                return Err(Error::AuthorizationMismatch);
            }

            Ok(TokenResponse::bearer(oauth, None))
        }
        other => Err(Error::UnsupportedGrantType(other.map(str::to_owned))),
    }
}

pub async fn authorize(
    State(oauth): State<Arc<OAuthConfig>>,
    Query(params): Query<AuthorizeParams>,
) -> Result<impl IntoResponse, ApiError> {
    let location = redirect_location(
        &oauth,
        params.redirect_uri.as_deref(),
        params.state.as_deref(),
    )
    .inspect_err(|err| warn!(redirect_uri = params.redirect_uri, "Refusing to redirect: {err}"))?;

    debug!(%location, "Redirecting");

    Ok((StatusCode::FOUND, [(header::LOCATION, location.to_string())]))
}

pub async fn token(
    State(oauth): State<Arc<OAuthConfig>>,
    Query(query): Query<TokenQuery>,
    Form(form): Form<TokenForm>,
) -> Result<Json<TokenResponse>, ApiError> {
    let grant_type = query.grant_type.as_deref().or(form.grant_type.as_deref());

    let response = issue_token(&oauth, grant_type, &form)
        .inspect_err(|err| warn!(grant_type, "Token request rejected: {err}"))?;

    debug!(grant_type, "Issued token");

    Ok(Json(response))
}
