//! OpenID Connect authorization code flow for a confidential client
//!
//! [`OidcClient`] builds the authorization URL, exchanges the returned code
//! at the token endpoint using the client's credentials, and reads the
//! userinfo endpoint with the resulting access token.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use url::Url;

use crate::auth::discovery::{self, ProviderMetadata};
use crate::auth::pkce;
use crate::config::AuthConfig;
use crate::error::{QuickstartError, Result};

/// Raw JSON response from the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// Access token used as the bearer credential for userinfo
    pub access_token: String,
    /// Token type, typically `"Bearer"`
    pub token_type: String,
    /// Lifetime of the access token in seconds
    #[serde(default, deserialize_with = "u64_or_string")]
    pub expires_in: Option<u64>,
    /// Refresh token; only issued when `offline_access` was granted
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Identity token (JWT)
    #[serde(default)]
    pub id_token: Option<String>,
    /// Granted scopes, space separated
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenResponse {
    /// Converts the raw response into the [`OAuth2Token`] shown to the caller.
    ///
    /// `expires_in` seconds are converted to an absolute UTC `expiry`; a
    /// lifetime too large to represent leaves `expiry` unset.
    pub fn to_token(&self) -> OAuth2Token {
        let expiry = self.expires_in.and_then(|secs| {
            let lifetime = chrono::Duration::try_seconds(i64::try_from(secs).ok()?)?;
            Utc::now().checked_add_signed(lifetime)
        });

        OAuth2Token {
            access_token: self.access_token.clone(),
            token_type: self.token_type.clone(),
            refresh_token: self.refresh_token.clone(),
            expiry,
        }
    }
}

/// Token as rendered in the callback response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuth2Token {
    /// The access token string
    pub access_token: String,
    /// The token type
    pub token_type: String,
    /// Refresh token, if issued
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Absolute expiry time (RFC 3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

/// Claims returned by the userinfo endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    /// Subject identifier
    pub sub: String,
    /// Profile page URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    /// E-mail address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Whether the provider verified the e-mail address
    #[serde(
        default,
        deserialize_with = "bool_or_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub email_verified: Option<bool>,
    /// Every other claim, keyed by the provider's claim name
    #[serde(flatten)]
    pub claims: HashMap<String, serde_json::Value>,
}

/// Some providers send `email_verified` as `"true"`/`"false"`.
fn bool_or_string<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Option::<Flag>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Flag::Bool(b)) => Ok(Some(b)),
        Some(Flag::Text(s)) => s
            .parse::<bool>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid email_verified value {s:?}"))),
    }
}

/// Some token endpoints send `expires_in` as a numeric string.
fn u64_or_string<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Seconds {
        Number(u64),
        Text(String),
    }

    match Option::<Seconds>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Seconds::Number(n)) => Ok(Some(n)),
        Some(Seconds::Text(s)) => s
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid expires_in value {s:?}"))),
    }
}

/// Authorization code client bound to one discovered provider.
///
/// # Examples
///
/// ```no_run
/// use osdu_quickstart::auth::client::OidcClient;
/// use osdu_quickstart::config::AuthConfig;
///
/// # async fn example() -> osdu_quickstart::error::Result<()> {
/// let config = AuthConfig {
///     issuer_url: "https://login.example.com/tenant/v2.0".to_string(),
///     client_id: "my-client".to_string(),
///     client_secret: "my-secret".to_string(),
///     ..Default::default()
/// };
/// let client = OidcClient::discover(reqwest::Client::new(), &config).await?;
/// let url = client.authorization_url("some-state", None)?;
/// println!("{url}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct OidcClient {
    http: reqwest::Client,
    provider: ProviderMetadata,
    client_id: String,
    client_secret: String,
    redirect_url: String,
    scopes: Vec<String>,
    use_pkce: bool,
}

impl OidcClient {
    /// Creates a client for an already discovered provider.
    ///
    /// PKCE is used when enabled in `config` and not ruled out by the
    /// provider's advertised challenge methods.
    pub fn new(http: reqwest::Client, provider: ProviderMetadata, config: &AuthConfig) -> Self {
        let use_pkce = config.use_pkce && pkce::s256_allowed(&provider);
        if config.use_pkce && !use_pkce {
            tracing::warn!("Provider does not advertise PKCE S256; continuing without PKCE");
        }

        Self {
            http,
            provider,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_url: config.redirect_url.clone(),
            scopes: config.scopes.clone(),
            use_pkce,
        }
    }

    /// Runs discovery against `config.issuer_url` and creates the client.
    ///
    /// # Errors
    ///
    /// Returns [`QuickstartError::Discovery`] if discovery fails.
    pub async fn discover(http: reqwest::Client, config: &AuthConfig) -> Result<Self> {
        let provider = discovery::discover(&http, &config.issuer_url).await?;
        tracing::info!(
            issuer = %provider.issuer,
            authorization_endpoint = %provider.authorization_endpoint,
            token_endpoint = %provider.token_endpoint,
            userinfo_endpoint = ?provider.userinfo_endpoint,
            "Provider details discovered"
        );
        Ok(Self::new(http, provider, config))
    }

    /// Discovered provider metadata
    pub fn provider(&self) -> &ProviderMetadata {
        &self.provider
    }

    /// Whether authorization requests carry a PKCE challenge
    pub fn uses_pkce(&self) -> bool {
        self.use_pkce
    }

    /// Builds the authorization URL for one login attempt.
    ///
    /// # Arguments
    ///
    /// * `state` - Anti-forgery value echoed back on the callback.
    /// * `code_challenge` - PKCE S256 challenge, when PKCE is in use.
    ///
    /// # Errors
    ///
    /// Returns [`QuickstartError::Auth`] if the provider's authorization
    /// endpoint is not a valid URL.
    pub fn authorization_url(&self, state: &str, code_challenge: Option<&str>) -> Result<Url> {
        let mut url = Url::parse(&self.provider.authorization_endpoint).map_err(|e| {
            QuickstartError::Auth(format!("invalid authorization endpoint URL: {e}"))
        })?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("response_type", "code");
            query.append_pair("client_id", &self.client_id);
            query.append_pair("redirect_uri", &self.redirect_url);
            query.append_pair("scope", &self.scopes.join(" "));
            query.append_pair("state", state);
            if let Some(challenge) = code_challenge {
                query.append_pair("code_challenge", challenge);
                query.append_pair("code_challenge_method", "S256");
            }
        }

        Ok(url)
    }

    /// Exchanges an authorization code for tokens at the token endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`QuickstartError::Auth`] if the request fails, the endpoint
    /// answers with a non-success status (its body is included, so a reused
    /// code surfaces as the provider's `invalid_grant`), or the response
    /// cannot be parsed.
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: Option<&str>,
    ) -> Result<TokenResponse> {
        let mut params: HashMap<&str, &str> = HashMap::new();
        params.insert("grant_type", "authorization_code");
        params.insert("code", code);
        params.insert("redirect_uri", &self.redirect_url);
        params.insert("client_id", &self.client_id);
        params.insert("client_secret", &self.client_secret);
        if let Some(verifier) = code_verifier {
            params.insert("code_verifier", verifier);
        }

        let resp = self
            .http
            .post(&self.provider.token_endpoint)
            .form(&params)
            .send()
            .await
            .map_err(|e| QuickstartError::Auth(format!("token exchange request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(
                QuickstartError::Auth(format!("token endpoint returned {status}: {body}")).into(),
            );
        }

        let token: TokenResponse = resp
            .json()
            .await
            .map_err(|e| QuickstartError::Auth(format!("failed to parse token response: {e}")))?;

        Ok(token)
    }

    /// Fetches the userinfo claims for `access_token`.
    ///
    /// # Errors
    ///
    /// Returns [`QuickstartError::Auth`] if the provider has no userinfo
    /// endpoint, the request fails, or the response is not valid claims.
    pub async fn user_info(&self, access_token: &str) -> Result<UserInfo> {
        let endpoint = self.provider.userinfo_endpoint.as_deref().ok_or_else(|| {
            QuickstartError::Auth("provider does not support userinfo endpoint".to_string())
        })?;

        let resp = self
            .http
            .get(endpoint)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| QuickstartError::Auth(format!("userinfo request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(QuickstartError::Auth(format!(
                "userinfo endpoint returned {status}: {body}"
            ))
            .into());
        }

        let info: UserInfo = resp
            .json()
            .await
            .map_err(|e| QuickstartError::Auth(format!("failed to parse userinfo: {e}")))?;

        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(methods: Option<Vec<String>>) -> ProviderMetadata {
        ProviderMetadata {
            issuer: "https://idp.example.com".to_string(),
            authorization_endpoint: "https://idp.example.com/authorize?p=signin".to_string(),
            token_endpoint: "https://idp.example.com/token".to_string(),
            userinfo_endpoint: None,
            jwks_uri: None,
            scopes_supported: None,
            code_challenge_methods_supported: methods,
            extra: HashMap::new(),
        }
    }

    fn auth_config() -> AuthConfig {
        AuthConfig {
            issuer_url: "https://idp.example.com".to_string(),
            client_id: "client-1".to_string(),
            client_secret: "s3cret".to_string(),
            ..Default::default()
        }
    }

    fn query_of(url: &Url) -> HashMap<String, String> {
        url.query_pairs().into_owned().collect()
    }

    #[test]
    fn test_authorization_url_carries_client_and_state() {
        let client = OidcClient::new(reqwest::Client::new(), provider(None), &auth_config());
        let url = client.authorization_url("xyz", None).unwrap();
        let query = query_of(&url);

        assert_eq!(query["response_type"], "code");
        assert_eq!(query["client_id"], "client-1");
        assert_eq!(query["redirect_uri"], "http://localhost:8080/auth/callback");
        assert_eq!(query["scope"], "openid email offline_access");
        assert_eq!(query["state"], "xyz");
        assert!(!query.contains_key("code_challenge"));
        // existing query parameters on the endpoint are preserved
        assert_eq!(query["p"], "signin");
        assert!(!url.as_str().contains("s3cret"));
    }

    #[test]
    fn test_authorization_url_with_pkce_challenge() {
        let client = OidcClient::new(reqwest::Client::new(), provider(None), &auth_config());
        let url = client.authorization_url("xyz", Some("abc")).unwrap();
        let query = query_of(&url);

        assert_eq!(query["code_challenge"], "abc");
        assert_eq!(query["code_challenge_method"], "S256");
    }

    #[test]
    fn test_pkce_disabled_when_provider_lacks_s256() {
        let client = OidcClient::new(
            reqwest::Client::new(),
            provider(Some(vec!["plain".to_string()])),
            &auth_config(),
        );
        assert!(!client.uses_pkce());
    }

    #[test]
    fn test_pkce_disabled_by_config() {
        let config = AuthConfig {
            use_pkce: false,
            ..auth_config()
        };
        let client = OidcClient::new(reqwest::Client::new(), provider(None), &config);
        assert!(!client.uses_pkce());
    }

    #[test]
    fn test_token_response_to_token_computes_expiry() {
        let raw: TokenResponse = serde_json::from_str(
            r#"{"access_token":"at","token_type":"Bearer","expires_in":3600,"id_token":"jwt"}"#,
        )
        .unwrap();
        let token = raw.to_token();

        assert_eq!(token.access_token, "at");
        assert!(token.refresh_token.is_none());
        let expiry = token.expiry.expect("expiry");
        assert!(expiry > Utc::now() + chrono::Duration::seconds(3500));
    }

    #[test]
    fn test_token_response_accepts_string_expires_in() {
        let raw: TokenResponse = serde_json::from_str(
            r#"{"access_token":"at","token_type":"Bearer","expires_in":"3599","id_token":"j"}"#,
        )
        .unwrap();
        assert_eq!(raw.expires_in, Some(3599));
        assert!(raw.to_token().expiry.is_some());

        let raw: TokenResponse =
            serde_json::from_str(r#"{"access_token":"at","token_type":"Bearer"}"#).unwrap();
        assert_eq!(raw.expires_in, None);
    }

    #[test]
    fn test_token_response_rejects_non_numeric_expires_in() {
        let result = serde_json::from_str::<TokenResponse>(
            r#"{"access_token":"at","token_type":"Bearer","expires_in":"soon"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_token_response_huge_expires_in_has_no_expiry() {
        let raw: TokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "a",
            "token_type": "Bearer",
            "expires_in": 100_000_000_000_000u64,
            "id_token": "j"
        }))
        .unwrap();
        let token = raw.to_token();
        assert_eq!(token.access_token, "a");
        assert!(token.expiry.is_none());

        let raw = TokenResponse {
            expires_in: Some(u64::MAX),
            ..raw
        };
        assert!(raw.to_token().expiry.is_none());
    }

    #[test]
    fn test_user_info_keeps_unknown_claims() {
        let info: UserInfo = serde_json::from_str(
            r#"{"sub":"u1","email":"a@b.c","email_verified":"true","name":"Ada","tid":"t-1"}"#,
        )
        .unwrap();

        assert_eq!(info.sub, "u1");
        assert_eq!(info.email_verified, Some(true));
        assert_eq!(info.claims["name"], "Ada");
        assert_eq!(info.claims["tid"], "t-1");
    }

    #[test]
    fn test_user_info_rejects_bad_email_verified() {
        let result = serde_json::from_str::<UserInfo>(r#"{"sub":"u1","email_verified":"maybe"}"#);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_user_info_without_endpoint_fails() {
        let client = OidcClient::new(reqwest::Client::new(), provider(None), &auth_config());
        let err = client.user_info("token").await.unwrap_err();
        assert!(err.to_string().contains("does not support userinfo"));
    }
}
