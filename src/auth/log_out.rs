//! Log-out route handler that invalidates authentication cookies and redirects users.
//!
//! Also ends sessions whose API token the finance API no longer accepts.

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;

use crate::{
    AppState,
    auth::{ApiToken, cookie::get_token_from_cookies, invalidate_auth_cookie},
    dashboard::{SessionKey, SessionStore},
    endpoints,
};

/// The state needed to end a session.
#[derive(Debug, Clone)]
pub struct LogOutState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The dashboard state of each signed-in session.
    pub sessions: SessionStore,
}

impl FromRef<AppState> for LogOutState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            sessions: state.sessions.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LogOutState> for Key {
    fn from_ref(state: &LogOutState) -> Self {
        state.cookie_key.clone()
    }
}

fn forget_session(sessions: &SessionStore, key: &SessionKey) {
    if let Err(error) = sessions.remove(key) {
        tracing::error!("Could not remove dashboard state for session: {error}");
    }
}

/// Invalidate the auth cookie, drop the session's dashboard state and
/// redirect the client to the log-in page.
pub async fn get_log_out(State(state): State<LogOutState>, jar: PrivateCookieJar) -> Response {
    if let Some(token) = get_token_from_cookies(&jar) {
        forget_session(&state.sessions, &SessionKey::from_token(&token.api_token));
    }

    let jar = invalidate_auth_cookie(jar);

    (jar, Redirect::to(endpoints::LOG_IN_VIEW)).into_response()
}

/// Log the user out because the finance API rejected their token.
///
/// The session's dashboard state is dropped and the auth cookie invalidated.
/// htmx requests get an `HX-Redirect` to the log-in page, other requests a
/// plain redirect.
pub fn force_log_out(
    sessions: &SessionStore,
    token: &ApiToken,
    jar: PrivateCookieJar,
    is_htmx_request: bool,
) -> Response {
    tracing::info!("Finance API rejected the token, ending the session");
    forget_session(sessions, &token.session_key());

    let jar = invalidate_auth_cookie(jar);

    if is_htmx_request {
        (
            StatusCode::OK,
            HxRedirect(endpoints::LOG_IN_VIEW.to_owned()),
            jar,
        )
            .into_response()
    } else {
        (jar, Redirect::to(endpoints::LOG_IN_VIEW)).into_response()
    }
}
