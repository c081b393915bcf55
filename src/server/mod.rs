//! HTTP server
//!
//! Each subcommand mounts a subset of the routes:
//!
//! | Command  | Routes                                   |
//! |----------|------------------------------------------|
//! | `app`    | all of the below                         |
//! | `auth`   | `GET /`, `GET /auth/callback`            |
//! | `search` | `GET /find`, `GET /search`               |
//! | `fetch`  | `GET /fetch`                             |
//!
//! `GET /healthz` is always mounted.

pub mod error;
pub mod fetch;
pub mod login;
pub mod search;

use axum::routing::get;
use axum::Router;

use crate::auth::{OidcClient, SessionStore};
use crate::cli::Commands;
use crate::config::Config;
use crate::error::{QuickstartError, Result};
use crate::platform::PlatformClient;

pub use error::ApiError;
pub use login::LoginState;

/// Backends the routes are served from.
#[derive(Debug, Clone, Default)]
pub struct Services {
    /// Login flow state, for commands that mount the login routes
    pub login: Option<LoginState>,
    /// Platform client, for commands that mount search or fetch
    pub platform: Option<PlatformClient>,
}

impl Services {
    /// Builds the backends `command` needs.
    ///
    /// Runs OpenID Connect discovery when the login routes are mounted.
    ///
    /// # Errors
    ///
    /// Returns error if an HTTP client cannot be built or discovery fails
    pub async fn from_config(command: Commands, config: &Config) -> Result<Self> {
        let login = if command.uses_auth() {
            let oidc = OidcClient::discover(config.http.api_client()?, &config.auth).await?;
            let sessions = SessionStore::new(config.auth.state_ttl());
            Some(LoginState::new(oidc, sessions))
        } else {
            None
        };

        let platform = if command.uses_platform() {
            Some(PlatformClient::from_config(
                config.platform.clone(),
                &config.http,
            )?)
        } else {
            None
        };

        Ok(Self { login, platform })
    }
}

/// Builds the router for `command` from `services`.
///
/// Routes whose backend is absent from `services` are not mounted.
pub fn router(command: Commands, services: Services) -> Router {
    let mut app = Router::new().route("/healthz", get(healthz));

    if command.uses_auth() {
        if let Some(login) = services.login {
            app = app.merge(login::routes(login));
        }
    }

    if let Some(platform) = services.platform {
        if command.uses_search() {
            app = app.merge(search::routes(platform.clone()));
        }
        if command.uses_fetch() {
            app = app.merge(fetch::routes(platform));
        }
    }

    app
}

async fn healthz() -> &'static str {
    "ok"
}

/// Binds the configured address and serves `command` until Ctrl-C.
///
/// # Errors
///
/// Returns error if the backends cannot be built or the address cannot be bound
pub async fn serve(command: Commands, config: &Config) -> Result<()> {
    let services = Services::from_config(command, config).await?;
    let app = router(command, services);

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| QuickstartError::Config(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!(command = ?command, "Listening on http://{}/", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn platform() -> PlatformClient {
        PlatformClient::new(
            reqwest::Client::new(),
            reqwest::Client::new(),
            Default::default(),
        )
    }

    async fn status(app: Router, uri: &str) -> StatusCode {
        app.oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_healthz_always_mounted() {
        let app = router(Commands::Fetch, Services::default());
        assert_eq!(status(app, "/healthz").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_search_command_mounts_only_search_routes() {
        let services = Services {
            login: None,
            platform: Some(platform()),
        };
        let app = router(Commands::Search, services);

        // missing parameter proves the route exists without calling upstream
        assert_eq!(status(app.clone(), "/find").await, StatusCode::BAD_REQUEST);
        assert_eq!(status(app.clone(), "/search").await, StatusCode::BAD_REQUEST);
        assert_eq!(status(app, "/fetch").await, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_fetch_command_mounts_only_fetch_route() {
        let services = Services {
            login: None,
            platform: Some(platform()),
        };
        let app = router(Commands::Fetch, services);

        assert_eq!(status(app.clone(), "/fetch").await, StatusCode::BAD_REQUEST);
        assert_eq!(status(app.clone(), "/find").await, StatusCode::NOT_FOUND);
        assert_eq!(status(app, "/").await, StatusCode::NOT_FOUND);
    }
}
