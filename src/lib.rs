//! Server-side proxy for the HMRC Goods Vehicle Movement Service.
//!
//! Users authenticate with the HMRC `OAuth2` authorization-code flow; the
//! resulting token lives in a signed session cookie and is attached as a
//! bearer token to the GMR calls forwarded upstream.

pub mod error;
pub mod forward;
pub mod middleware;
pub mod oauth;
pub mod payload;

// Re-exports for convenient access
pub use error::{Error, UpstreamFailure};
pub use forward::{
    ApiCallRequest, ApiCallResult, ApiForwarder, ApiMethod, ForwarderConfig, UpstreamResponse,
};
pub use oauth::{AuthClient, AuthorizationRequest, OAuthConfig, OAuthToken};
