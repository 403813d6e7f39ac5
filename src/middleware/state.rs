use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;

use super::config::SessionSettings;
use crate::forward::ApiForwarder;
use crate::oauth::AuthClient;

/// Read-only state shared by every route handler.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) client: Arc<AuthClient>,
    pub(crate) forwarder: Arc<ApiForwarder>,
    pub(crate) session: SessionSettings,
    pub(crate) movement_payload: Arc<serde_json::Value>,
}

// SignedCookieJar requires Key to be extractable from state
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.session.cookie_key.clone()
    }
}
