//! Single-shot forwarding of GVMS API calls.
//!
//! The forwarder is a dumb bridge: one outbound request per call, no retry,
//! no explicit timeout, no schema checks. Whatever comes back is handed to the
//! caller unmodified, as an [`UpstreamResponse`] on 2xx or an
//! [`UpstreamFailure`] otherwise.

use axum::body::Bytes;
use reqwest::{Client, header};
use url::Url;

use crate::error::UpstreamFailure;
use crate::oauth::DEFAULT_BASE_URL;

/// Path of the goods movement service under the API host.
pub const SERVICE_NAME: &str = "customs/goods-movement-system";

/// Version encoded in the `Accept` header.
pub const SERVICE_VERSION: &str = "1.0";

const ACCEPT_VENDOR: &str = "hmrc";

/// HTTP verb of a forwarded call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl ApiMethod {
    /// Whether a request body is sent for this verb.
    #[must_use]
    pub fn is_mutating(self) -> bool {
        matches!(self, Self::Post | Self::Put)
    }

    fn as_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

/// One call to forward. Built per incoming request, never persisted.
#[derive(Debug, Clone)]
pub struct ApiCallRequest {
    pub endpoint: String,
    pub method: ApiMethod,
    pub bearer_token: Option<String>,
    pub body: Option<serde_json::Value>,
}

impl ApiCallRequest {
    #[must_use]
    pub fn new(method: ApiMethod, endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method,
            bearer_token: None,
            body: None,
        }
    }

    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Successful upstream reply, relayed verbatim.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// Outcome of [`ApiForwarder::forward`].
pub type ApiCallResult = Result<UpstreamResponse, UpstreamFailure>;

/// Where and how the forwarder reaches the GVMS API.
#[derive(Debug, Clone)]
pub struct ForwarderConfig {
    pub base_url: String,
    pub service_name: String,
    pub service_version: String,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            service_name: SERVICE_NAME.to_string(),
            service_version: SERVICE_VERSION.to_string(),
        }
    }
}

impl ForwarderConfig {
    #[must_use]
    pub fn with_base_url(mut self, base: &Url) -> Self {
        self.base_url = base.to_string();
        self
    }

    /// `Accept` header value, e.g. `application/vnd.hmrc.1.0+json`.
    #[must_use]
    pub fn accept_header(&self) -> String {
        format!("application/vnd.{ACCEPT_VENDOR}.{}+json", self.service_version)
    }

    /// Target URL: base + service path + endpoint.
    #[must_use]
    pub fn target_url(&self, endpoint: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let service = self.service_name.trim_matches('/');
        if endpoint.starts_with('/') {
            format!("{base}/{service}{endpoint}")
        } else {
            format!("{base}/{service}/{endpoint}")
        }
    }
}

/// Forwards [`ApiCallRequest`]s to the GVMS API.
#[derive(Debug, Clone)]
pub struct ApiForwarder {
    client: Client,
    config: ForwarderConfig,
}

impl Default for ApiForwarder {
    fn default() -> Self {
        Self::new(ForwarderConfig::default())
    }
}

impl ApiForwarder {
    #[must_use]
    pub fn new(config: ForwarderConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    #[must_use]
    pub fn config(&self) -> &ForwarderConfig {
        &self.config
    }

    /// Issue exactly one upstream call and hand back its raw outcome.
    ///
    /// # Errors
    ///
    /// [`UpstreamFailure::Transport`] if the request could not be completed,
    /// [`UpstreamFailure::Status`] with the untouched body for a non-2xx reply.
    pub async fn forward(&self, request: ApiCallRequest) -> ApiCallResult {
        let url = self.config.target_url(&request.endpoint);

        let mut req = self
            .client
            .request(request.method.as_reqwest(), &url)
            .header(header::ACCEPT, self.config.accept_header());

        if let Some(token) = &request.bearer_token {
            req = req.bearer_auth(token);
        }

        if request.method.is_mutating() {
            if let Some(body) = &request.body {
                req = req.json(body);
            }
        }

        tracing::debug!(method = ?request.method, url = %url, "Forwarding GVMS call");

        let response = req.send().await?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?;

        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), url = %url, "GVMS call failed");
            return Err(UpstreamFailure::Status {
                status: status.as_u16(),
                content_type,
                body,
            });
        }

        Ok(UpstreamResponse {
            status: status.as_u16(),
            content_type,
            body,
        })
    }
}
