use axum_extra::extract::SignedCookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use time::{Duration, OffsetDateTime};

use super::config::SessionSettings;
use super::session::Session;

/// Create the session cookie.
pub(super) fn session_cookie(
    name: &str,
    value: String,
    ttl: Duration,
    secure: bool,
) -> Cookie<'static> {
    Cookie::build((name.to_string(), value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/".to_string())
        .max_age(ttl)
        .build()
}

/// Create removal cookie for the session.
pub(super) fn clear_session_cookie(name: &str) -> Cookie<'static> {
    Cookie::build((name.to_string(), ""))
        .path("/".to_string())
        .max_age(Duration::ZERO)
        .build()
}

/// Serialize a session to a cookie-safe string: base64url of its JSON form.
pub(super) fn encode_session(session: &Session) -> String {
    let json = serde_json::to_vec(session).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

pub(super) fn decode_session(value: &str) -> Option<Session> {
    let json = URL_SAFE_NO_PAD.decode(value).ok()?;
    serde_json::from_slice(&json).ok()
}

/// Read the session from a verified cookie jar.
///
/// Unsigned, undecodable and expired cookies all read as an empty session.
pub(super) fn read_session(jar: &SignedCookieJar, name: &str, now: OffsetDateTime) -> Session {
    jar.get(name)
        .and_then(|c| decode_session(c.value()))
        .filter(|s| !s.is_expired(now))
        .unwrap_or_default()
}

/// Write the session back with a fresh expiry of `now + ttl`.
pub(super) fn write_session(
    jar: SignedCookieJar,
    settings: &SessionSettings,
    mut session: Session,
    now: OffsetDateTime,
) -> SignedCookieJar {
    session.expires_at = Some(now + settings.ttl);
    let cookie = session_cookie(
        &settings.cookie_name,
        encode_session(&session),
        settings.ttl,
        settings.secure_cookies,
    );
    jar.add(cookie)
}
