use axum::Json;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

use crate::error::{Error, UpstreamFailure};

/// HTTP boundary for every failure a route can hit.
///
/// A missing session is not represented here: it leads to the authorization
/// redirect instead of an error response.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// Token exchange with the authorization server failed.
    #[error("authentication failure: {0}")]
    AuthenticationFailure(Error),

    /// The forwarded call failed; relayed verbatim.
    #[error("upstream call failure: {0}")]
    UpstreamCallFailure(UpstreamFailure),

    /// The detached outbound task panicked or was aborted.
    #[error("outbound task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// Missing or invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<Error> for ProxyError {
    fn from(e: Error) -> Self {
        match e {
            Error::Upstream(failure) => Self::UpstreamCallFailure(failure),
            Error::Config(msg) => Self::Config(msg),
            other => Self::AuthenticationFailure(other),
        }
    }
}

impl From<UpstreamFailure> for ProxyError {
    fn from(failure: UpstreamFailure) -> Self {
        Self::UpstreamCallFailure(failure)
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        match self {
            Self::AuthenticationFailure(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, Json("Authentication failed")).into_response()
            }
            Self::UpstreamCallFailure(UpstreamFailure::Status {
                status,
                content_type,
                body,
            }) => {
                let status =
                    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                match content_type {
                    Some(ct) => (status, [(header::CONTENT_TYPE, ct)], body).into_response(),
                    None => (status, body).into_response(),
                }
            }
            Self::UpstreamCallFailure(UpstreamFailure::Transport(e)) => {
                (StatusCode::BAD_GATEWAY, e.to_string()).into_response()
            }
            Self::Task(_) | Self::Config(_) => {
                tracing::error!(error = %self, "Proxy internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
            }
        }
    }
}
