//! OpenID Connect provider discovery
//!
//! Resolves a provider's authorization, token and userinfo endpoints from
//! the discovery document published at
//! `<issuer>/.well-known/openid-configuration`.
//!
//! # References
//!
//! - OpenID Connect Discovery 1.0 <https://openid.net/specs/openid-connect-discovery-1_0.html>

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{QuickstartError, Result};

/// Path of the discovery document relative to the issuer.
const WELL_KNOWN_PATH: &str = "/.well-known/openid-configuration";

/// Metadata document describing an OpenID Connect provider.
///
/// # Examples
///
/// ```
/// use osdu_quickstart::auth::discovery::ProviderMetadata;
///
/// let json = r#"{
///     "issuer": "https://login.example.com/tenant/v2.0",
///     "authorization_endpoint": "https://login.example.com/tenant/oauth2/v2.0/authorize",
///     "token_endpoint": "https://login.example.com/tenant/oauth2/v2.0/token",
///     "userinfo_endpoint": "https://graph.example.com/oidc/userinfo"
/// }"#;
///
/// let meta: ProviderMetadata = serde_json::from_str(json).unwrap();
/// assert_eq!(meta.issuer, "https://login.example.com/tenant/v2.0");
/// assert!(meta.userinfo_endpoint.is_some());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProviderMetadata {
    /// The issuer identifier URI for this provider.
    pub issuer: String,

    /// The URL of the authorization endpoint.
    pub authorization_endpoint: String,

    /// The URL of the token endpoint.
    pub token_endpoint: String,

    /// The URL of the userinfo endpoint, when the provider offers one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userinfo_endpoint: Option<String>,

    /// The URL of the provider's JSON Web Key Set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwks_uri: Option<String>,

    /// List of scopes the provider supports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes_supported: Option<Vec<String>>,

    /// PKCE challenge methods the provider supports (e.g. `["S256"]`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_challenge_methods_supported: Option<Vec<String>>,

    /// Additional provider metadata fields not explicitly modelled above.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// Builds the discovery document URL for an issuer.
///
/// A trailing slash on the issuer is dropped before the well-known suffix is
/// appended, so `https://idp/tenant/` and `https://idp/tenant` resolve to
/// the same document.
fn discovery_url(issuer: &str) -> Result<Url> {
    let joined = format!("{}{}", issuer.trim_end_matches('/'), WELL_KNOWN_PATH);
    Url::parse(&joined).map_err(|e| {
        QuickstartError::Discovery(format!("invalid issuer URL '{}': {}", issuer, e)).into()
    })
}

/// Fetches the OpenID Connect discovery document for `issuer`.
///
/// The `issuer` field of the returned document must equal the configured
/// issuer (ignoring a trailing slash); a mismatch is rejected.
///
/// # Arguments
///
/// * `http` - Shared [`reqwest::Client`] used to issue the discovery request.
/// * `issuer` - The provider's issuer base URL.
///
/// # Errors
///
/// Returns [`QuickstartError::Discovery`] if the request fails, the status
/// is not a success, the body is not a valid document, or the issuer does
/// not match.
///
/// # Examples
///
/// ```no_run
/// use osdu_quickstart::auth::discovery::discover;
///
/// # async fn example() -> osdu_quickstart::error::Result<()> {
/// let http = reqwest::Client::new();
/// let meta = discover(&http, "https://login.example.com/tenant/v2.0").await?;
/// println!("token endpoint: {}", meta.token_endpoint);
/// # Ok(())
/// # }
/// ```
pub async fn discover(http: &reqwest::Client, issuer: &str) -> Result<ProviderMetadata> {
    let url = discovery_url(issuer)?;
    tracing::debug!(%url, "Fetching provider discovery document");

    let resp = http
        .get(url.clone())
        .send()
        .await
        .map_err(|e| QuickstartError::Discovery(format!("discovery fetch failed: {e}")))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(QuickstartError::Discovery(format!(
            "discovery endpoint {url} returned {status}: {body}"
        ))
        .into());
    }

    let meta: ProviderMetadata = resp.json().await.map_err(|e| {
        QuickstartError::Discovery(format!("failed to parse discovery document: {e}"))
    })?;

    if meta.issuer.trim_end_matches('/') != issuer.trim_end_matches('/') {
        return Err(QuickstartError::Discovery(format!(
            "issuer did not match the issuer returned by provider, expected {:?} got {:?}",
            issuer, meta.issuer
        ))
        .into());
    }

    Ok(meta)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discovery_url_appends_well_known() {
        let url = discovery_url("https://login.example.com/tenant/v2.0").unwrap();
        assert_eq!(
            url.as_str(),
            "https://login.example.com/tenant/v2.0/.well-known/openid-configuration"
        );
    }

    #[test]
    fn test_discovery_url_trims_trailing_slash() {
        let url = discovery_url("https://login.example.com/").unwrap();
        assert_eq!(
            url.as_str(),
            "https://login.example.com/.well-known/openid-configuration"
        );
    }

    #[test]
    fn test_discovery_url_rejects_garbage() {
        assert!(discovery_url("not a url").is_err());
    }

    #[test]
    fn test_provider_metadata_deserializes_minimal() {
        let json = r#"{
            "issuer": "https://idp.example.com",
            "authorization_endpoint": "https://idp.example.com/authorize",
            "token_endpoint": "https://idp.example.com/token"
        }"#;

        let meta: ProviderMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(meta.token_endpoint, "https://idp.example.com/token");
        assert!(meta.userinfo_endpoint.is_none());
        assert!(meta.code_challenge_methods_supported.is_none());
    }

    #[test]
    fn test_provider_metadata_captures_extra_fields() {
        let json = r#"{
            "issuer": "https://idp.example.com",
            "authorization_endpoint": "https://idp.example.com/authorize",
            "token_endpoint": "https://idp.example.com/token",
            "tenant_region_scope": "EU"
        }"#;

        let meta: ProviderMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(
            meta.extra["tenant_region_scope"],
            serde_json::Value::String("EU".to_string())
        );
    }

    #[test]
    fn test_provider_metadata_requires_token_endpoint() {
        let json = r#"{
            "issuer": "https://idp.example.com",
            "authorization_endpoint": "https://idp.example.com/authorize"
        }"#;

        assert!(serde_json::from_str::<ProviderMetadata>(json).is_err());
    }

    // Wiremock integration tests are in tests/discovery_test.rs
}
