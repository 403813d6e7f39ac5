use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use url::Url;

use crate::error::Error;

/// HMRC sandbox host serving the OAuth endpoints and the GVMS API.
pub const DEFAULT_BASE_URL: &str = "https://test-api.service.hmrc.gov.uk/";

/// Scope required to list and write goods movement records.
pub const DEFAULT_SCOPE: &str = "write:goods-movement-system";

const AUTHORIZE_PATH: &str = "oauth/authorize";
const TOKEN_PATH: &str = "oauth/token";

/// HMRC `OAuth2` client configuration.
///
/// Required fields are constructor parameters; the endpoints default to the
/// HMRC sandbox and can be moved with [`with_base_url`](Self::with_base_url).
///
/// ```rust,ignore
/// use gvms_proxy::OAuthConfig;
///
/// let config = OAuthConfig::new("id", "secret", "http://localhost:8080/oauth20/callback".parse()?)
///     .with_scope("read:goods-movement-system");
/// ```
#[derive(Clone)]
#[non_exhaustive]
pub struct OAuthConfig {
    pub(crate) client_id: String,
    pub(crate) client_secret: String,
    pub(crate) auth_url: Url,
    pub(crate) token_url: Url,
    pub(crate) redirect_uri: Url,
    pub(crate) scope: String,
}

impl OAuthConfig {
    /// Create a new OAuth2 configuration against the HMRC sandbox.
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: Url,
    ) -> Self {
        let base: Url = DEFAULT_BASE_URL.parse().expect("valid default URL");
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            auth_url: base.join(AUTHORIZE_PATH).expect("valid default URL"),
            token_url: base.join(TOKEN_PATH).expect("valid default URL"),
            redirect_uri,
            scope: DEFAULT_SCOPE.into(),
        }
    }

    /// Point both the authorize and token endpoints at another token host.
    ///
    /// A path prefix on `base` is kept whether or not it ends in `/`. A base
    /// that cannot carry a path (`mailto:` and the like) leaves the endpoints unchanged.
    #[must_use]
    pub fn with_base_url(mut self, base: &Url) -> Self {
        let base = directory_url(base);
        if let (Ok(auth), Ok(token)) = (base.join(AUTHORIZE_PATH), base.join(TOKEN_PATH)) {
            self.auth_url = auth;
            self.token_url = token;
        }
        self
    }

    /// Override the authorization endpoint.
    #[must_use]
    pub fn with_auth_url(mut self, url: Url) -> Self {
        self.auth_url = url;
        self
    }

    /// Override the token endpoint.
    #[must_use]
    pub fn with_token_url(mut self, url: Url) -> Self {
        self.token_url = url;
        self
    }

    /// Override the requested scope (default: `write:goods-movement-system`).
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn auth_url(&self) -> &Url {
        &self.auth_url
    }

    #[must_use]
    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    #[must_use]
    pub fn redirect_uri(&self) -> &Url {
        &self.redirect_uri
    }

    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }
}

/// `base` with a trailing `/`, so relative joins append instead of replacing the last segment.
fn directory_url(base: &Url) -> Url {
    let mut url = base.clone();
    if !url.cannot_be_a_base() && !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("auth_url", &self.auth_url.as_str())
            .field("token_url", &self.token_url.as_str())
            .field("redirect_uri", &self.redirect_uri.as_str())
            .field("scope", &self.scope)
            .finish()
    }
}

/// Parameters of the authorization redirect, fixed for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct AuthorizationRequest {
    pub client_id: String,
    pub redirect_uri: Url,
    pub scope: String,
}

/// Token record returned by the HMRC token endpoint.
///
/// Stored as-is in the session cookie. Fields the proxy does not know about
/// are kept in `extra` so the record round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuthToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    /// Absolute expiry computed from `expires_in` at exchange time. Never
    /// consulted before the token is reused.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub expires_at: Option<OffsetDateTime>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl OAuthToken {
    /// Build a bare bearer token record.
    #[must_use]
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: Some("bearer".into()),
            expires_in: None,
            refresh_token: None,
            scope: None,
            expires_at: None,
            extra: serde_json::Map::new(),
        }
    }
}

/// `OAuth2` authorization-code client for the HMRC developer hub.
pub struct AuthClient {
    config: OAuthConfig,
    authorization_url: Url,
    http: reqwest::Client,
}

impl std::fmt::Debug for AuthClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthClient")
            .field("client_id", &self.config.client_id)
            .field("authorization_url", &self.authorization_url.as_str())
            .finish_non_exhaustive()
    }
}

impl AuthClient {
    /// Create a client; the authorization URL is built once here.
    #[must_use]
    pub fn new(config: OAuthConfig) -> Self {
        let authorization_url = Self::build_authorization_url(
            &config.auth_url,
            &config.client_id,
            &config.scope,
            &config.redirect_uri,
        );
        Self {
            config,
            authorization_url,
            http: reqwest::Client::new(),
        }
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    #[must_use]
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// The static parameters the authorization URL is built from.
    #[must_use]
    pub fn authorization_request(&self) -> AuthorizationRequest {
        AuthorizationRequest {
            client_id: self.config.client_id.clone(),
            redirect_uri: self.config.redirect_uri.clone(),
            scope: self.config.scope.clone(),
        }
    }

    /// Authorization URL users are redirected to when no token is present.
    #[must_use]
    pub fn authorization_url(&self) -> &Url {
        &self.authorization_url
    }

    /// Build the authorization-code redirect URL. Pure: equal inputs give equal URLs.
    #[must_use]
    pub fn build_authorization_url(
        auth_url: &Url,
        client_id: &str,
        scope: &str,
        redirect_uri: &Url,
    ) -> Url {
        let mut url = auth_url.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", client_id)
            .append_pair("redirect_uri", redirect_uri.as_str())
            .append_pair("scope", scope);
        url
    }

    /// Exchange an authorization code for a token with the configured client credentials.
    ///
    /// One round-trip, never retried.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Authentication`] on network failure, a non-success
    /// status, or an unreadable token body.
    pub async fn exchange_code(&self, code: &str) -> Result<OAuthToken, Error> {
        self.exchange_code_with(
            code,
            &self.config.redirect_uri,
            &self.config.client_id,
            &self.config.client_secret,
        )
        .await
    }

    /// Exchange an authorization code using explicit client credentials.
    ///
    /// # Errors
    ///
    /// See [`exchange_code`](Self::exchange_code).
    pub async fn exchange_code_with(
        &self,
        code: &str,
        redirect_uri: &Url,
        client_id: &str,
        client_secret: &str,
    ) -> Result<OAuthToken, Error> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri.as_str()),
            ("client_id", client_id),
            ("client_secret", client_secret),
        ];

        let response = self
            .http
            .post(self.config.token_url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&params)
            .send()
            .await
            .map_err(|e| Error::authentication("token exchange", e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                operation: "token exchange",
                status: Some(status),
                detail: body,
            });
        }

        let mut token = response
            .json::<OAuthToken>()
            .await
            .map_err(|e| Error::authentication("token decode", e.to_string()))?;

        if let Some(secs) = token.expires_in {
            let secs = i64::try_from(secs).unwrap_or(i64::MAX);
            token.expires_at =
                OffsetDateTime::now_utc().checked_add(time::Duration::seconds(secs));
        }

        Ok(token)
    }
}
