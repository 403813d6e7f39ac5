//! Axum layer of the proxy: signed-cookie sessions and the GVMS routes.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use gvms_proxy::middleware::{ProxyConfig, proxy_routes};
//!
//! let config = ProxyConfig::from_env()?;
//! let port = config.port();
//! let app = proxy_routes(config);
//!
//! let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
//! axum::serve(listener, app).await?;
//! ```

mod config;
mod cookies;
mod error;
mod extractor;
mod routes;
mod session;
mod state;

pub use config::{DEFAULT_PORT, DEFAULT_REDIRECT_URI, ProxyConfig};
pub use error::ProxyError;
pub use routes::proxy_routes;
pub use session::{AuthState, Session};

/// Re-export cookie key type for builder API.
pub use axum_extra::extract::cookie::Key as CookieKey;
