use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::SignedCookieJar;
use time::OffsetDateTime;

use super::cookies;
use super::session::Session;
use super::state::AppState;

/// The caller's session, read from the signed cookie.
///
/// Never rejects: a missing or invalid cookie is an unauthenticated session,
/// which route handlers answer with the authorization redirect.
///
/// ```rust,ignore
/// async fn handler(session: Session) -> impl IntoResponse {
///     match session.current_token() {
///         Some(token) => ...,
///         None => ...,
///     }
/// }
/// ```
impl FromRequestParts<AppState> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = SignedCookieJar::from_headers(&parts.headers, state.session.cookie_key.clone());
        Ok(cookies::read_session(
            &jar,
            &state.session.cookie_name,
            OffsetDateTime::now_utc(),
        ))
    }
}
