//! Configuration management for the quickstart servers
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::cli::Commands;
use crate::error::{QuickstartError, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Main configuration structure
///
/// Holds the listen address, the OpenID Connect client registration, the
/// platform API locations and the outbound HTTP limits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Listener settings
    #[serde(default)]
    pub server: ServerConfig,
    /// OpenID Connect client settings
    #[serde(default)]
    pub auth: AuthConfig,
    /// Search and delivery API settings
    #[serde(default)]
    pub platform: PlatformConfig,
    /// Outbound HTTP client limits
    #[serde(default)]
    pub http: HttpConfig,
}

/// Listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address the server binds to
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

/// OpenID Connect client configuration
///
/// The client is confidential: the secret is sent to the token endpoint
/// together with the authorization code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Issuer base URL used for discovery
    #[serde(default)]
    pub issuer_url: String,

    /// Client ID from app registration
    #[serde(default)]
    pub client_id: String,

    /// Client secret from app registration
    #[serde(default, skip_serializing)]
    pub client_secret: String,

    /// Redirect URI registered for this client
    #[serde(default = "default_redirect_url")]
    pub redirect_url: String,

    /// Scopes to request; must include `openid`
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,

    /// Send a PKCE S256 challenge with the authorization request
    #[serde(default = "default_use_pkce")]
    pub use_pkce: bool,

    /// How long a pending login stays valid (seconds)
    #[serde(default = "default_state_ttl")]
    pub state_ttl_seconds: u64,
}

fn default_redirect_url() -> String {
    "http://localhost:8080/auth/callback".to_string()
}

fn default_scopes() -> Vec<String> {
    // offline_access asks the provider for a refresh_token
    vec![
        "openid".to_string(),
        "email".to_string(),
        "offline_access".to_string(),
    ]
}

fn default_use_pkce() -> bool {
    true
}

fn default_state_ttl() -> u64 {
    300
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer_url: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            redirect_url: default_redirect_url(),
            scopes: default_scopes(),
            use_pkce: default_use_pkce(),
            state_ttl_seconds: default_state_ttl(),
        }
    }
}

impl AuthConfig {
    /// Pending-login lifetime as a [`Duration`]
    pub fn state_ttl(&self) -> Duration {
        Duration::from_secs(self.state_ttl_seconds)
    }
}

/// Search and delivery API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Base URL of the platform APIs (e.g. `https://osdu.example.com/api`)
    #[serde(default)]
    pub api_base_url: String,

    /// Path of the search endpoint, appended to `api_base_url`
    #[serde(default = "default_search_path")]
    pub search_path: String,

    /// Path of the delivery endpoint, appended to `api_base_url`
    #[serde(default = "default_delivery_path")]
    pub delivery_path: String,

    /// Resource types every search is filtered to
    #[serde(default = "default_resource_types")]
    pub resource_types: Vec<String>,

    /// Facets requested with every search
    #[serde(default = "default_facets")]
    pub facets: Vec<String>,

    /// Region sent as `TargetRegionID` with delivery requests
    #[serde(default)]
    pub target_region: String,
}

fn default_search_path() -> String {
    "/indexSearch".to_string()
}

fn default_delivery_path() -> String {
    "/GetResources".to_string()
}

fn default_resource_types() -> Vec<String> {
    vec![
        "master-data/Well".to_string(),
        "work-product-component/WellLog".to_string(),
        "work-product-component/WellborePath".to_string(),
    ]
}

fn default_facets() -> Vec<String> {
    vec!["resource_type".to_string()]
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            search_path: default_search_path(),
            delivery_path: default_delivery_path(),
            resource_types: default_resource_types(),
            facets: default_facets(),
            target_region: String::new(),
        }
    }
}

impl PlatformConfig {
    /// Full URL of the search endpoint
    pub fn search_url(&self) -> String {
        join_url(&self.api_base_url, &self.search_path)
    }

    /// Full URL of the delivery endpoint
    pub fn delivery_url(&self) -> String {
        join_url(&self.api_base_url, &self.delivery_path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Outbound HTTP limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Total timeout for API calls (seconds)
    #[serde(default = "default_http_timeout")]
    pub timeout_seconds: u64,

    /// Connect timeout for every outbound call (seconds)
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,

    /// Total timeout for object downloads (seconds)
    #[serde(default = "default_download_timeout")]
    pub download_timeout_seconds: u64,
}

fn default_http_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_download_timeout() -> u64 {
    600
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_http_timeout(),
            connect_timeout_seconds: default_connect_timeout(),
            download_timeout_seconds: default_download_timeout(),
        }
    }
}

impl HttpConfig {
    /// Builds the client used for API calls (discovery, token, search, delivery)
    ///
    /// # Errors
    ///
    /// Returns error if the TLS backend cannot be initialised
    pub fn api_client(&self) -> Result<reqwest::Client> {
        self.build_client(self.timeout_seconds)
    }

    /// Builds the client used to stream objects from storage
    ///
    /// # Errors
    ///
    /// Returns error if the TLS backend cannot be initialised
    pub fn download_client(&self) -> Result<reqwest::Client> {
        self.build_client(self.download_timeout_seconds)
    }

    fn build_client(&self, timeout_seconds: u64) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .connect_timeout(Duration::from_secs(self.connect_timeout_seconds))
            .build()
            .map_err(|e| {
                QuickstartError::Config(format!("Failed to build HTTP client: {}", e)).into()
            })
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| QuickstartError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| QuickstartError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(base) = std::env::var("OSDU_API_BASE_URL") {
            self.platform.api_base_url = base;
        }

        if let Ok(issuer) = std::env::var("OSDU_AUTH_BASE_URL") {
            self.auth.issuer_url = issuer;
        }

        if let Ok(client_id) = std::env::var("OSDU_CLIENT_ID") {
            self.auth.client_id = client_id;
        }

        if let Ok(secret) = std::env::var("OSDU_CLIENT_SECRET") {
            self.auth.client_secret = secret;
        }

        if let Ok(redirect) = std::env::var("OSDU_REDIRECT_URL") {
            tracing::debug!(redirect_url = %redirect, "Env override: OSDU_REDIRECT_URL");
            self.auth.redirect_url = redirect;
        }

        if let Ok(bind) = std::env::var("OSDU_BIND_ADDR") {
            tracing::debug!(bind_addr = %bind, "Env override: OSDU_BIND_ADDR");
            self.server.bind_addr = bind;
        }

        if let Ok(types) = std::env::var("OSDU_RESOURCE_TYPES") {
            let types_vec: Vec<String> = types
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            tracing::debug!(?types_vec, "Env override: OSDU_RESOURCE_TYPES");
            self.platform.resource_types = types_vec;
        }

        if let Ok(region) = std::env::var("OSDU_TARGET_REGION") {
            self.platform.target_region = region;
        }

        if let Ok(timeout) = std::env::var("OSDU_HTTP_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.http.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid OSDU_HTTP_TIMEOUT_SECONDS: {}", timeout);
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(bind) = &cli.bind {
            self.server.bind_addr = bind.clone();
        }
    }

    /// Parsed listen address
    ///
    /// # Errors
    ///
    /// Returns error if `server.bind_addr` is not a socket address
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server.bind_addr.parse().map_err(|e| {
            QuickstartError::Config(format!(
                "Invalid server.bind_addr '{}': {}",
                self.server.bind_addr, e
            ))
            .into()
        })
    }

    /// Validate the configuration for the given server
    ///
    /// Settings that only matter to routes the server does not mount are
    /// not checked, so `search` runs without any client registration.
    ///
    /// # Errors
    ///
    /// Returns error describing the first invalid setting
    pub fn validate(&self, command: Commands) -> Result<()> {
        self.bind_addr()?;

        if self.http.timeout_seconds == 0 {
            return Err(
                QuickstartError::Config("http.timeout_seconds must be greater than 0".to_string())
                    .into(),
            );
        }

        if self.http.connect_timeout_seconds == 0 {
            return Err(QuickstartError::Config(
                "http.connect_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.http.download_timeout_seconds == 0 {
            return Err(QuickstartError::Config(
                "http.download_timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if command.uses_auth() {
            self.validate_auth()?;
        }

        if command.uses_platform() {
            self.validate_platform(command)?;
        }

        Ok(())
    }

    fn validate_auth(&self) -> Result<()> {
        require_url("auth.issuer_url", &self.auth.issuer_url)?;
        require_url("auth.redirect_url", &self.auth.redirect_url)?;

        if self.auth.client_id.is_empty() {
            return Err(
                QuickstartError::Config("auth.client_id cannot be empty".to_string()).into(),
            );
        }

        if !self.auth.scopes.iter().any(|s| s == "openid") {
            return Err(QuickstartError::Config(
                "auth.scopes must include \"openid\"".to_string(),
            )
            .into());
        }

        if self.auth.state_ttl_seconds == 0 {
            return Err(QuickstartError::Config(
                "auth.state_ttl_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }

    fn validate_platform(&self, command: Commands) -> Result<()> {
        require_url("platform.api_base_url", &self.platform.api_base_url)?;

        if command.uses_search() && self.platform.resource_types.is_empty() {
            return Err(QuickstartError::Config(
                "platform.resource_types must list at least one resource type".to_string(),
            )
            .into());
        }

        Ok(())
    }
}

fn require_url(name: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(QuickstartError::Config(format!("{} cannot be empty", name)).into());
    }
    Url::parse(value).map(|_| ()).map_err(|e| {
        QuickstartError::Config(format!("Invalid {} '{}': {}", name, value, e)).into()
    })
}
