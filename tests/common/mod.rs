use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use osdu_quickstart::config::{AuthConfig, Config, HttpConfig, PlatformConfig};
use osdu_quickstart::platform::PlatformClient;

/// Discovery document for a provider served by `server`.
#[allow(dead_code)]
pub fn discovery_body(server: &MockServer) -> serde_json::Value {
    let base = server.uri();
    serde_json::json!({
        "issuer": base,
        "authorization_endpoint": format!("{}/authorize", base),
        "token_endpoint": format!("{}/token", base),
        "userinfo_endpoint": format!("{}/userinfo", base),
        "jwks_uri": format!("{}/keys", base),
        "scopes_supported": ["openid", "email", "profile", "offline_access"],
        "code_challenge_methods_supported": ["S256"]
    })
}

/// Serves [`discovery_body`] at the well-known path.
#[allow(dead_code)]
pub async fn mount_discovery(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/.well-known/openid-configuration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(discovery_body(server)))
        .mount(server)
        .await;
}

/// Client registration pointing at a provider served by `server`.
#[allow(dead_code)]
pub fn auth_config(server: &MockServer) -> AuthConfig {
    AuthConfig {
        issuer_url: server.uri(),
        client_id: "quickstart-client".to_string(),
        client_secret: "quickstart-secret".to_string(),
        ..Default::default()
    }
}

/// Complete configuration with both the provider and the platform served by `server`.
#[allow(dead_code)]
pub fn config_for(server: &MockServer) -> Config {
    Config {
        auth: auth_config(server),
        platform: platform_config(server),
        ..Default::default()
    }
}

/// Platform settings whose APIs live under `<server>/api`.
#[allow(dead_code)]
pub fn platform_config(server: &MockServer) -> PlatformConfig {
    PlatformConfig {
        api_base_url: format!("{}/api", server.uri()),
        ..Default::default()
    }
}

/// Platform client for `<server>/api` with default timeouts.
#[allow(dead_code)]
pub fn platform_client(server: &MockServer) -> PlatformClient {
    PlatformClient::from_config(platform_config(server), &HttpConfig::default())
        .expect("failed to build platform client")
}

/// Sends `GET uri` with an optional `Cookie` header through `app`.
#[allow(dead_code)]
pub async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response<Body> {
    let mut request = Request::get(uri);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(request.body(Body::empty()).expect("failed to build request"))
        .await
        .expect("router is infallible")
}

/// Reads the whole response body as UTF-8.
#[allow(dead_code)]
pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    String::from_utf8(bytes.to_vec()).expect("body is not UTF-8")
}

/// Reads the whole response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_str(&body_string(response).await).expect("body is not JSON")
}
