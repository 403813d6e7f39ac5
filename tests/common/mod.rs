//! Common test utilities for integration tests.

#![allow(dead_code)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response, header};
use gvms_proxy::middleware::{CookieKey, ProxyConfig, proxy_routes};
use gvms_proxy::{ApiForwarder, AuthClient, ForwarderConfig, OAuthConfig};
use tower::ServiceExt;
use url::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const REDIRECT_URI: &str = "http://localhost:8080/oauth20/callback";
pub const MOVEMENTS_PATH: &str = "/customs/goods-movement-system/movements";

/// Proxy config with both the token host and the API pointed at `server`.
pub fn proxy_config(server: &MockServer) -> ProxyConfig {
    let base: Url = server.uri().parse().unwrap();
    let oauth = OAuthConfig::new("test-client", "test-secret", REDIRECT_URI.parse().unwrap())
        .with_base_url(&base);
    let forwarder = ApiForwarder::new(ForwarderConfig::default().with_base_url(&base));

    ProxyConfig::new(AuthClient::new(oauth), forwarder).with_cookie_key(CookieKey::generate())
}

pub fn app(config: ProxyConfig) -> Router {
    proxy_routes(config)
}

/// Send a GET through the router, optionally with a `Cookie` header.
pub async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

/// `name=value` pair of the session cookie set by a response, if any.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("session="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

pub fn location(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .expect("location header")
        .to_str()
        .unwrap()
        .to_string()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

/// Token endpoint accepting `code` and issuing `access_token`.
pub async fn mount_token_endpoint(server: &MockServer, code: &str, access_token: &str) {
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains(format!("code={code}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": access_token,
            "token_type": "bearer",
            "expires_in": 14400,
            "refresh_token": "refresh-1",
            "scope": "write:goods-movement-system"
        })))
        .mount(server)
        .await;
}

/// Visit `route` unauthenticated, then complete the callback with `code`.
///
/// Returns the authenticated session cookie.
pub async fn login(app: &Router, route: &str, code: &str) -> String {
    let response = get(app, route, None).await;
    let pending = session_cookie(&response).expect("pending session cookie");

    let response = get(app, &format!("/oauth20/callback?code={code}"), Some(&pending)).await;
    assert_eq!(response.status(), 303);
    session_cookie(&response).expect("authenticated session cookie")
}
