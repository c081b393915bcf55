//! `GET /` and `GET /auth/callback`

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};

use crate::auth::{pkce, OAuth2Token, OidcClient, SessionStore, UserInfo, SESSION_COOKIE};
use crate::server::error::ApiError;

/// State shared by the login routes.
#[derive(Debug, Clone)]
pub struct LoginState {
    /// Client for the discovered provider
    pub oidc: Arc<OidcClient>,
    /// Logins awaiting their callback
    pub sessions: Arc<SessionStore>,
}

impl LoginState {
    /// Bundles a client and a session store.
    pub fn new(oidc: OidcClient, sessions: SessionStore) -> Self {
        Self {
            oidc: Arc::new(oidc),
            sessions: Arc::new(sessions),
        }
    }
}

/// Routes of the login flow.
pub fn routes(state: LoginState) -> Router {
    Router::new()
        .route("/", get(login))
        .route("/auth/callback", get(callback))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    state: Option<String>,
    code: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Body of a successful callback.
#[derive(Debug, Serialize)]
struct CallbackResponse {
    #[serde(rename = "OAuth2Token")]
    oauth2_token: OAuth2Token,
    #[serde(rename = "UserInfo")]
    user_info: UserInfo,
    id_token: String,
}

fn session_cookie(value: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

async fn login(State(state): State<LoginState>, jar: CookieJar) -> Result<Response, ApiError> {
    let challenge = state.oidc.uses_pkce().then(pkce::generate);
    let (session_id, pending) = state
        .sessions
        .begin(challenge.as_ref().map(|c| c.verifier.clone()))
        .await;

    let url = state
        .oidc
        .authorization_url(&pending.state, challenge.as_ref().map(|c| c.challenge.as_str()))?;

    tracing::info!(
        authorization_endpoint = %state.oidc.provider().authorization_endpoint,
        pkce = challenge.is_some(),
        "Redirecting to provider"
    );

    let jar = jar.add(session_cookie(session_id));
    Ok((StatusCode::FOUND, jar, [(header::LOCATION, url.to_string())]).into_response())
}

async fn callback(
    State(state): State<LoginState>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<Response, ApiError> {
    let pending = match jar.get(SESSION_COOKIE) {
        Some(cookie) => state.sessions.take(cookie.value()).await,
        None => None,
    };
    let jar = jar.remove(session_cookie(String::new()));

    let pending = match (pending, params.state.as_deref()) {
        (Some(pending), Some(returned)) if pending.state == returned => pending,
        _ => {
            tracing::warn!("Callback state did not match a pending login");
            return Ok((jar, ApiError::bad_request("state did not match")).into_response());
        }
    };

    let outcome = complete_login(&state.oidc, &params, pending.pkce_verifier.as_deref()).await;
    Ok(match outcome {
        Ok(body) => (jar, body).into_response(),
        Err(err) => (jar, err).into_response(),
    })
}

async fn complete_login(
    oidc: &OidcClient,
    params: &CallbackParams,
    pkce_verifier: Option<&str>,
) -> Result<Response, ApiError> {
    if let Some(error) = params.error.as_deref() {
        let description = params.error_description.as_deref().unwrap_or_default();
        tracing::warn!(error, description, "Provider rejected the authorization request");
        return Err(ApiError::bad_request(format!(
            "authorization failed: {error}: {description}"
        )));
    }

    let code = params
        .code
        .as_deref()
        .ok_or_else(|| ApiError::bad_request("missing authorization code"))?;

    let token = oidc.exchange_code(code, pkce_verifier).await.map_err(|e| {
        tracing::error!(error = %e, "Token exchange failed");
        ApiError::internal(format!("Failed to exchange token: {e}"))
    })?;

    let id_token = token.id_token.clone().ok_or_else(|| {
        tracing::error!("Token response carried no id_token");
        ApiError::internal("No id_token field in oauth2 token.")
    })?;

    if token.refresh_token.is_none() {
        tracing::warn!("Token response carried no refresh_token");
    }

    let user_info = oidc.user_info(&token.access_token).await.map_err(|e| {
        tracing::error!(error = %e, "Userinfo request failed");
        ApiError::internal(format!("Failed to get userinfo: {e}"))
    })?;

    tracing::info!(sub = %user_info.sub, "Login completed");

    let body = CallbackResponse {
        oauth2_token: token.to_token(),
        user_info,
        id_token,
    };
    let json = serde_json::to_string_pretty(&body)
        .map_err(|e| ApiError::internal(format!("Failed to encode response: {e}")))?;

    Ok(([(header::CONTENT_TYPE, "application/json")], json).into_response())
}
