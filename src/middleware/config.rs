use std::path::PathBuf;

use axum_extra::extract::cookie::Key;
use url::Url;

use super::error::ProxyError;
use super::routes::{FIXED_ROUTES, GMR_ROUTE_PREFIXES};
use crate::error::Error;
use crate::forward::{ApiForwarder, ForwarderConfig};
use crate::oauth::{AuthClient, DEFAULT_BASE_URL, OAuthConfig};
use crate::payload;

/// Default port when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 8080;

/// Default callback registered with the HMRC developer hub.
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8080/oauth20/callback";

/// Session settings shared by config and runtime state.
#[derive(Clone)]
pub(crate) struct SessionSettings {
    pub(crate) cookie_key: Key,
    pub(crate) cookie_name: String,
    pub(crate) ttl: time::Duration,
    pub(crate) secure_cookies: bool,
}

impl SessionSettings {
    fn defaults() -> Self {
        Self {
            cookie_key: Key::generate(),
            cookie_name: "session".into(),
            ttl: time::Duration::hours(5),
            secure_cookies: false,
        }
    }
}

/// Proxy configuration.
///
/// Required pieces (`client`, `forwarder`) are constructor parameters.
/// Use [`from_env()`](ProxyConfig::from_env) for the process setup, or
/// [`new()`](ProxyConfig::new) with `with_*` methods for full control.
pub struct ProxyConfig {
    pub(super) client: AuthClient,
    pub(super) forwarder: ApiForwarder,
    pub(super) session: SessionSettings,
    pub(super) movement_payload: serde_json::Value,
    pub(super) server_token: Option<String>,
    pub(super) port: u16,
}

impl ProxyConfig {
    #[must_use]
    pub fn new(client: AuthClient, forwarder: ApiForwarder) -> Self {
        Self {
            client,
            forwarder,
            session: SessionSettings::defaults(),
            movement_payload: payload::example_movement(),
            server_token: None,
            port: DEFAULT_PORT,
        }
    }

    /// Create config from environment variables.
    ///
    /// # Required env vars
    /// - `CLIENT_ID`: HMRC application client ID
    /// - `CLIENT_SECRET`: HMRC application client secret
    ///
    /// # Optional env vars
    /// - `SERVER_TOKEN`: HMRC server token (retained, not used by any route)
    /// - `PORT`: listen port (default 8080)
    /// - `REDIRECT_URI`: OAuth2 callback URI
    /// - `GVMS_BASE_URL`: API and token host (default HMRC sandbox)
    /// - `OAUTH_SCOPE`: requested scope
    /// - `COOKIE_KEY`: cookie signing key bytes (at least 64)
    /// - `SECURE_COOKIES`: `"1"` or `"true"` to mark the session cookie `Secure`
    /// - `GMR_PAYLOAD_PATH`: JSON file replacing the example movement payload
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::Config`] if required env vars are missing or values are invalid.
    pub fn from_env() -> Result<Self, ProxyError> {
        let client_id =
            std::env::var("CLIENT_ID").map_err(|_| config_error("CLIENT_ID is required"))?;
        let client_secret = std::env::var("CLIENT_SECRET")
            .map_err(|_| config_error("CLIENT_SECRET is required"))?;

        let redirect_uri: Url = std::env::var("REDIRECT_URI")
            .as_deref()
            .unwrap_or(DEFAULT_REDIRECT_URI)
            .parse()
            .map_err(|e| config_error(format!("REDIRECT_URI: {e}")))?;
        check_callback_path(redirect_uri.path()).map_err(ProxyError::from)?;

        let base_url: Url = std::env::var("GVMS_BASE_URL")
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .parse()
            .map_err(|e| config_error(format!("GVMS_BASE_URL: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(config_error(format!("GVMS_BASE_URL: {base_url} cannot be a base URL")));
        }

        let mut oauth = OAuthConfig::new(client_id, client_secret, redirect_uri)
            .with_base_url(&base_url);
        if let Ok(scope) = std::env::var("OAUTH_SCOPE") {
            oauth = oauth.with_scope(scope);
        }

        let forwarder = ApiForwarder::new(ForwarderConfig::default().with_base_url(&base_url));

        let port = match std::env::var("PORT") {
            Ok(p) => p
                .parse::<u16>()
                .map_err(|e| config_error(format!("PORT: {e}")))?,
            Err(_) => DEFAULT_PORT,
        };

        let secure = matches!(
            std::env::var("SECURE_COOKIES").as_deref(),
            Ok("1") | Ok("true"),
        );

        let cookie_key = match std::env::var("COOKIE_KEY") {
            Ok(k) => Key::try_from(k.as_bytes()).map_err(|_| {
                config_error(
                    "COOKIE_KEY is set but invalid (must be at least 64 bytes). \
                     Remove the env var to use an ephemeral key, or provide a valid key.",
                )
            })?,
            Err(_) => Key::generate(),
        };

        let mut config = Self::new(AuthClient::new(oauth), forwarder)
            .with_cookie_key(cookie_key)
            .with_secure_cookies(secure)
            .with_port(port);

        if let Ok(token) = std::env::var("SERVER_TOKEN") {
            config = config.with_server_token(token);
        }
        if let Ok(path) = std::env::var("GMR_PAYLOAD_PATH") {
            let movement = payload::load_movement(&PathBuf::from(path))?;
            config = config.with_movement_payload(movement);
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_cookie_key(mut self, key: Key) -> Self {
        self.session.cookie_key = key;
        self
    }

    #[must_use]
    pub fn with_session_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.session.cookie_name = name.into();
        self
    }

    /// Session lifetime since last activity (default 5 hours).
    #[must_use]
    pub fn with_session_ttl(mut self, ttl: time::Duration) -> Self {
        self.session.ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.session.secure_cookies = secure;
        self
    }

    /// Payload sent by the create and update routes.
    #[must_use]
    pub fn with_movement_payload(mut self, payload: serde_json::Value) -> Self {
        self.movement_payload = payload;
        self
    }

    #[must_use]
    pub fn with_server_token(mut self, token: impl Into<String>) -> Self {
        self.server_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub fn server_token(&self) -> Option<&str> {
        self.server_token.as_deref()
    }
}

/// Reject a callback path that would shadow or collide with a proxy route.
pub(crate) fn check_callback_path(path: &str) -> Result<(), Error> {
    let collides = FIXED_ROUTES.contains(&path)
        || GMR_ROUTE_PREFIXES
            .iter()
            .any(|prefix| path.starts_with(prefix) || path == prefix.trim_end_matches('/'));
    if collides {
        return Err(Error::Config(format!(
            "REDIRECT_URI path {path} collides with a proxy route"
        )));
    }
    Ok(())
}

fn config_error(msg: impl Into<String>) -> ProxyError {
    ProxyError::from(Error::Config(msg.into()))
}
