use axum::http::StatusCode;
use gvms_proxy::middleware::{CookieKey, ProxyConfig};
use gvms_proxy::{ApiForwarder, AuthClient, ForwarderConfig, OAuthConfig};
use url::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::{
    REDIRECT_URI, app, body_bytes, get, location, login, mount_token_endpoint, proxy_config,
    session_cookie,
};

const PROTECTED_ROUTES: &[&str] = &[
    "/",
    "/get-GMR-list",
    "/create-GMR",
    "/get-gmr-by-id/GMRA00002KW2",
    "/update-gmr-by-id/GMRA00002KW2",
    "/delete-gmr-by-id/GMRA00002KW2",
    "/get-reference-data",
];

#[tokio::test]
async fn unauthenticated_routes_redirect_to_authorization() {
    let server = MockServer::start().await;
    let app = app(proxy_config(&server));
    let expected = format!("{}/oauth/authorize?", server.uri());

    for route in PROTECTED_ROUTES {
        let response = get(&app, route, None).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER, "route {route}");
        let target = location(&response);
        assert!(target.starts_with(&expected), "route {route}: {target}");
        assert!(target.contains("response_type=code"));
        assert!(target.contains("client_id=test-client"));
        assert!(session_cookie(&response).is_some(), "route {route}");
    }

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn authorization_redirect_is_stable() {
    let server = MockServer::start().await;
    let app = app(proxy_config(&server));

    let first = location(&get(&app, "/get-GMR-list", None).await);
    let second = location(&get(&app, "/create-GMR", None).await);
    assert_eq!(first, second);
}

#[tokio::test]
async fn callback_redirects_to_recorded_route() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "good-code", "abc").await;
    let app = app(proxy_config(&server));

    for route in PROTECTED_ROUTES {
        let response = get(&app, route, None).await;
        let pending = session_cookie(&response).unwrap();

        let response = get(&app, "/oauth20/callback?code=good-code", Some(&pending)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), *route);
        assert!(session_cookie(&response).is_some());
    }
}

#[tokio::test]
async fn latest_recorded_route_wins() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "good-code", "abc").await;
    let app = app(proxy_config(&server));

    let response = get(&app, "/get-GMR-list", None).await;
    let cookie = session_cookie(&response).unwrap();
    let response = get(&app, "/create-GMR", Some(&cookie)).await;
    let cookie = session_cookie(&response).unwrap();

    let response = get(&app, "/oauth20/callback?code=good-code", Some(&cookie)).await;
    assert_eq!(location(&response), "/create-GMR");
}

#[tokio::test]
async fn token_exchange_sends_client_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("client_id=test-client"))
        .and(body_string_contains("client_secret=test-secret"))
        .and(body_string_contains(format!(
            "redirect_uri={}",
            urlencoding::encode(REDIRECT_URI)
        )))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"access_token": "abc", "token_type": "bearer"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    let app = app(proxy_config(&server));

    login(&app, "/get-GMR-list", "any-code").await;
}

#[tokio::test]
async fn rejected_code_returns_authentication_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(serde_json::json!({"error": "invalid_grant"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    let app = app(proxy_config(&server));

    let response = get(&app, "/get-GMR-list", None).await;
    let pending = session_cookie(&response).unwrap();

    let response = get(&app, "/oauth20/callback?code=bad-code", Some(&pending)).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(session_cookie(&response).is_none());
    assert_eq!(body_bytes(response).await, b"\"Authentication failed\"");

    // Still no usable token: the protected route redirects again.
    let response = get(&app, "/get-GMR-list", Some(&pending)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).contains("/oauth/authorize?"));
}

#[tokio::test]
async fn unreachable_token_endpoint_returns_authentication_failure() {
    let server = MockServer::start().await;
    let base: Url = server.uri().parse().unwrap();
    let oauth = OAuthConfig::new("test-client", "test-secret", REDIRECT_URI.parse().unwrap())
        .with_base_url(&base)
        .with_token_url("http://127.0.0.1:9/oauth/token".parse().unwrap());
    let forwarder = ApiForwarder::new(ForwarderConfig::default().with_base_url(&base));
    let app = app(
        ProxyConfig::new(AuthClient::new(oauth), forwarder).with_cookie_key(CookieKey::generate()),
    );

    let response = get(&app, "/get-GMR-list", None).await;
    let pending = session_cookie(&response).unwrap();

    let response = get(&app, "/oauth20/callback?code=any-code", Some(&pending)).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(session_cookie(&response).is_none());
    assert_eq!(body_bytes(response).await, b"\"Authentication failed\"");
}

#[tokio::test]
async fn callback_without_code_fails() {
    let server = MockServer::start().await;
    let app = app(proxy_config(&server));

    let response = get(&app, "/oauth20/callback", None).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = get(&app, "/oauth20/callback?error=access_denied", None).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn callback_without_recorded_route_goes_home() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "good-code", "abc").await;
    let app = app(proxy_config(&server));

    let response = get(&app, "/oauth20/callback?code=good-code", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn index_lists_routes_when_authenticated() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "good-code", "abc").await;
    let app = app(proxy_config(&server));

    let cookie = login(&app, "/", "good-code").await;
    let response = get(&app, "/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(
        body["routes"]["GET GMR LIST"],
        "http://localhost:8080/get-GMR-list"
    );
    assert_eq!(body["accessToken"]["access_token"], "abc");
    assert_eq!(body["accessToken"]["refresh_token"], "refresh-1");
}

#[tokio::test]
async fn tampered_cookie_is_unauthenticated() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "good-code", "abc").await;
    let app = app(proxy_config(&server));

    let cookie = login(&app, "/get-GMR-list", "good-code").await;
    let tampered = format!("{cookie}x");

    let response = get(&app, "/get-GMR-list", Some(&tampered)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn cookie_from_another_key_is_unauthenticated() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "good-code", "abc").await;

    let cookie = login(&app(proxy_config(&server)), "/get-GMR-list", "good-code").await;
    let other = app(proxy_config(&server));

    let response = get(&other, "/get-GMR-list", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn expired_session_is_unauthenticated() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, "good-code", "abc").await;
    let app = app(proxy_config(&server).with_session_ttl(time::Duration::ZERO));

    let cookie = login(&app, "/get-GMR-list", "good-code").await;

    let response = get(&app, "/get-GMR-list", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).contains("/oauth/authorize?"));
}

#[tokio::test]
async fn session_cookie_lasts_five_hours() {
    let server = MockServer::start().await;
    let app = app(proxy_config(&server));

    let response = get(&app, "/get-GMR-list", None).await;
    let set_cookie = response
        .headers()
        .get(axum::http::header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();

    assert!(set_cookie.contains("Max-Age=18000"), "{set_cookie}");
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("Path=/"));
}

#[tokio::test]
async fn logout_clears_session() {
    let server = MockServer::start().await;
    let app = app(proxy_config(&server));

    let response = get(&app, "/get-GMR-list", None).await;
    let cookie = session_cookie(&response).unwrap();

    let response = get(&app, "/logout", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let cleared = response
        .headers()
        .get(axum::http::header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(cleared.starts_with("session=;"), "{cleared}");
    assert!(cleared.contains("Max-Age=0"));
}
