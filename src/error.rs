use axum::body::Bytes;

/// Errors raised by the token exchange and the API forwarder.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The authorization server rejected or failed the code exchange.
    #[error("authentication failed during {operation}: {detail}")]
    Authentication {
        operation: &'static str,
        status: Option<u16>,
        detail: String,
    },

    /// The forwarded GVMS call did not succeed.
    #[error(transparent)]
    Upstream(#[from] UpstreamFailure),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Raw outcome of a failed upstream call, kept verbatim for relay.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamFailure {
    #[error("upstream responded with status {status}")]
    Status {
        status: u16,
        content_type: Option<String>,
        body: Bytes,
    },

    #[error("upstream transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl Error {
    pub(crate) fn authentication(operation: &'static str, detail: impl Into<String>) -> Self {
        Self::Authentication {
            operation,
            status: None,
            detail: detail.into(),
        }
    }
}
