use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::oauth::OAuthToken;

/// Per-browser authorization state, carried entirely in the signed cookie.
///
/// There is no server-side store; a missing, tampered or expired cookie
/// simply yields `Session::default()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "oauth2Token", default, skip_serializing_if = "Option::is_none")]
    oauth_token: Option<OAuthToken>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    caller: Option<String>,
    #[serde(
        rename = "expiresAt",
        default,
        skip_serializing_if = "Option::is_none",
        with = "time::serde::rfc3339::option"
    )]
    pub(super) expires_at: Option<OffsetDateTime>,
}

/// Where a session stands in the authorization-code flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    /// Redirected to the authorization server, waiting for the callback.
    PendingCallback,
    Authenticated,
}

impl Session {
    /// Current stage of the authorization-code flow.
    #[must_use]
    pub fn state(&self) -> AuthState {
        match (&self.oauth_token, &self.caller) {
            (Some(_), _) => AuthState::Authenticated,
            (None, Some(_)) => AuthState::PendingCallback,
            (None, None) => AuthState::Unauthenticated,
        }
    }

    /// Record the route to return to once the callback completes.
    ///
    /// Any stored token is left untouched; the caller decides whether to redirect.
    pub fn begin_authorization(&mut self, intended_route: impl Into<String>) {
        self.caller = Some(intended_route.into());
    }

    /// Store a freshly exchanged token. Returns the recorded return route.
    pub fn complete_authorization(&mut self, token: OAuthToken) -> Option<&str> {
        self.oauth_token = Some(token);
        self.caller.as_deref()
    }

    /// Stored token, as-is. Its expiry is not checked.
    #[must_use]
    pub fn current_token(&self) -> Option<&OAuthToken> {
        self.oauth_token.as_ref()
    }

    /// Route recorded by the last [`begin_authorization`](Self::begin_authorization).
    #[must_use]
    pub fn caller(&self) -> Option<&str> {
        self.caller.as_deref()
    }

    /// Expiry of the cookie this session was read from or last written to.
    #[must_use]
    pub fn expires_at(&self) -> Option<OffsetDateTime> {
        self.expires_at
    }

    pub(super) fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}
