use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum_extra::extract::SignedCookieJar;
use serde::Deserialize;
use time::OffsetDateTime;

use super::config::ProxyConfig;
use super::cookies;
use super::error::ProxyError;
use super::session::Session;
use super::state::AppState;
use crate::error::Error;
use crate::forward::{ApiCallRequest, ApiMethod, UpstreamResponse};

/// Paths served by the proxy besides the OAuth2 callback.
pub(super) const FIXED_ROUTES: &[&str] = &[
    "/",
    "/get-GMR-list",
    "/create-GMR",
    "/get-reference-data",
    "/logout",
];

/// Prefixes of the parameterized GMR routes.
pub(super) const GMR_ROUTE_PREFIXES: &[&str] = &[
    "/get-gmr-by-id/",
    "/update-gmr-by-id/",
    "/delete-gmr-by-id/",
];

/// Create the proxy router.
///
/// # Panics
///
/// If the redirect URI path collides with another route. [`ProxyConfig::from_env`]
/// rejects such a URI up front.
pub fn proxy_routes(config: ProxyConfig) -> Router {
    let callback_path = config.client.config().redirect_uri().path().to_string();

    let state = AppState {
        client: Arc::new(config.client),
        forwarder: Arc::new(config.forwarder),
        session: config.session,
        movement_payload: Arc::new(config.movement_payload),
    };

    Router::new()
        .route("/", get(index))
        .route("/get-GMR-list", get(get_gmr_list))
        .route("/create-GMR", get(create_gmr))
        .route("/get-gmr-by-id/{gmr_id}", get(get_gmr_by_id))
        .route("/update-gmr-by-id/{gmr_id}", get(update_gmr_by_id))
        .route("/delete-gmr-by-id/{gmr_id}", get(delete_gmr_by_id))
        .route("/get-reference-data", get(get_reference_data))
        .route(&callback_path, get(callback))
        .route("/logout", get(logout))
        .with_state(state)
}

// ── Index ──────────────────────────────────────────────────────────

async fn index(State(state): State<AppState>, jar: SignedCookieJar, session: Session) -> Response {
    let Some(token) = session.current_token().cloned() else {
        return authorize(&state, jar, session, "/");
    };

    let body = serde_json::json!({
        "routes": route_listing(&state),
        "accessToken": token,
    });
    let jar = cookies::write_session(jar, &state.session, session, OffsetDateTime::now_utc());
    (jar, Json(body)).into_response()
}

fn route_listing(state: &AppState) -> serde_json::Value {
    let origin = state
        .client
        .config()
        .redirect_uri()
        .origin()
        .ascii_serialization();

    serde_json::json!({
        "GET GMR LIST": format!("{origin}/get-GMR-list"),
        "CREATE GMR": format!("{origin}/create-GMR"),
        "GET GMR BY ID": format!("{origin}/get-gmr-by-id/:gmrId"),
        "UPDATE GMR BY ID": format!("{origin}/update-gmr-by-id/:gmrId"),
        "DELETE GMR BY ID": format!("{origin}/delete-gmr-by-id/:gmrId"),
        "GET REFERENCE DATA": format!("{origin}/get-reference-data"),
    })
}

// ── GMR routes ─────────────────────────────────────────────────────

async fn get_gmr_list(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    session: Session,
    uri: Uri,
) -> Response {
    let call = ApiCallRequest::new(ApiMethod::Get, "/movements");
    forward_or_authorize(&state, jar, session, uri.path(), call).await
}

async fn create_gmr(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    session: Session,
    uri: Uri,
) -> Response {
    let call = ApiCallRequest::new(ApiMethod::Post, "/movements")
        .with_body(state.movement_payload.as_ref().clone());
    forward_or_authorize(&state, jar, session, uri.path(), call).await
}

async fn get_gmr_by_id(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    session: Session,
    uri: Uri,
    Path(gmr_id): Path<String>,
) -> Response {
    let call = ApiCallRequest::new(ApiMethod::Get, movement_endpoint(&gmr_id));
    forward_or_authorize(&state, jar, session, uri.path(), call).await
}

async fn update_gmr_by_id(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    session: Session,
    uri: Uri,
    Path(gmr_id): Path<String>,
) -> Response {
    let call = ApiCallRequest::new(ApiMethod::Put, movement_endpoint(&gmr_id))
        .with_body(state.movement_payload.as_ref().clone());
    forward_or_authorize(&state, jar, session, uri.path(), call).await
}

async fn delete_gmr_by_id(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    session: Session,
    uri: Uri,
    Path(gmr_id): Path<String>,
) -> Response {
    let call = ApiCallRequest::new(ApiMethod::Delete, movement_endpoint(&gmr_id));
    forward_or_authorize(&state, jar, session, uri.path(), call).await
}

async fn get_reference_data(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    session: Session,
    uri: Uri,
) -> Response {
    let call = ApiCallRequest::new(ApiMethod::Get, "/reference-data");
    forward_or_authorize(&state, jar, session, uri.path(), call).await
}

fn movement_endpoint(gmr_id: &str) -> String {
    format!("/movements/{}", urlencoding::encode(gmr_id))
}

// ── Callback ───────────────────────────────────────────────────────

#[derive(Deserialize)]
struct CallbackParams {
    code: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

async fn callback(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    mut session: Session,
    Query(params): Query<CallbackParams>,
) -> Result<(SignedCookieJar, Redirect), ProxyError> {
    if let Some(error) = &params.error {
        let desc = params.error_description.as_deref().unwrap_or("Unknown error");
        tracing::warn!(error = %error, description = %desc, "OAuth2 error from HMRC");
        return Err(ProxyError::AuthenticationFailure(Error::authentication(
            "authorization",
            desc,
        )));
    }

    let code = params.code.ok_or_else(|| {
        ProxyError::AuthenticationFailure(Error::authentication("callback", "missing code"))
    })?;

    let client = Arc::clone(&state.client);
    let token = tokio::spawn(async move { client.exchange_code(&code).await })
        .await?
        .map_err(|e| {
            tracing::error!(error = %e, "Token exchange failed");
            ProxyError::from(e)
        })?;

    let target = session
        .complete_authorization(token)
        .filter(|route| route.starts_with('/'))
        .unwrap_or("/")
        .to_string();

    tracing::info!(caller = %target, "GVMS OAuth2 login successful");

    let jar = cookies::write_session(jar, &state.session, session, OffsetDateTime::now_utc());
    Ok((jar, Redirect::to(&target)))
}

// ── Logout ─────────────────────────────────────────────────────────

async fn logout(State(state): State<AppState>, jar: SignedCookieJar) -> (SignedCookieJar, Redirect) {
    let clear_cookie = cookies::clear_session_cookie(&state.session.cookie_name);
    (jar.remove(clear_cookie), Redirect::to("/"))
}

// ── Helpers ────────────────────────────────────────────────────────

/// Forward `call` with the session's token, or start authorization for `route`.
async fn forward_or_authorize(
    state: &AppState,
    jar: SignedCookieJar,
    session: Session,
    route: &str,
    call: ApiCallRequest,
) -> Response {
    let Some(access_token) = session.current_token().map(|t| t.access_token.clone()) else {
        return authorize(state, jar, session, route);
    };

    let call = call.with_bearer_token(access_token);
    let forwarder = Arc::clone(&state.forwarder);
    // Detached so the upstream call completes even if the client hangs up.
    let result = match tokio::spawn(async move { forwarder.forward(call).await }).await {
        Ok(result) => result,
        Err(e) => return ProxyError::from(e).into_response(),
    };

    // Any authenticated request counts as activity.
    let jar = cookies::write_session(jar, &state.session, session, OffsetDateTime::now_utc());

    match result {
        Ok(upstream) => (jar, relay(upstream)).into_response(),
        Err(failure) => (jar, ProxyError::from(failure)).into_response(),
    }
}

/// Record `route` in the session and redirect to the authorization server.
fn authorize(state: &AppState, jar: SignedCookieJar, mut session: Session, route: &str) -> Response {
    session.begin_authorization(route);
    let jar = cookies::write_session(jar, &state.session, session, OffsetDateTime::now_utc());
    (jar, Redirect::to(state.client.authorization_url().as_str())).into_response()
}

fn relay(upstream: UpstreamResponse) -> Response {
    let status = StatusCode::from_u16(upstream.status).unwrap_or(StatusCode::OK);
    match upstream.content_type {
        Some(ct) => (status, [(header::CONTENT_TYPE, ct)], upstream.body).into_response(),
        None => (status, upstream.body).into_response(),
    }
}
