//! Defines functions for storing the user's API token in a private cookie.

use std::cmp::max;

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime};

use crate::auth::token::SessionToken;

pub(crate) const COOKIE_TOKEN: &str = "session";
/// The default duration for which auth cookies are valid.
pub const DEFAULT_COOKIE_DURATION: Duration = Duration::hours(8);

fn build_cookie(value: String, expiry: OffsetDateTime) -> Cookie<'static> {
    Cookie::build((COOKIE_TOKEN, value))
        .path("/")
        .expires(expiry)
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(true)
        .build()
}

/// Add an auth cookie holding `api_token` to the cookie jar.
///
/// Sets the initial expiry of the cookie to `duration` from the current time.
/// You can use [DEFAULT_COOKIE_DURATION] for the default duration.
///
/// # Errors
///
/// Returns a [serde_json::Error] if the token cannot be serialized.
pub fn set_auth_cookie(
    jar: PrivateCookieJar,
    api_token: &str,
    duration: Duration,
) -> Result<PrivateCookieJar, serde_json::Error> {
    let token = SessionToken {
        api_token: api_token.to_owned(),
        expires_at: OffsetDateTime::now_utc() + duration,
    };

    set_session_token(jar, &token)
}

fn set_session_token(
    jar: PrivateCookieJar,
    token: &SessionToken,
) -> Result<PrivateCookieJar, serde_json::Error> {
    let value = serde_json::to_string(token)?;

    Ok(jar.add(build_cookie(value, token.expires_at)))
}

/// Get the session token from the auth cookie.
///
/// Returns `None` if the cookie is missing, cannot be read, or has expired.
pub(crate) fn get_token_from_cookies(jar: &PrivateCookieJar) -> Option<SessionToken> {
    let cookie = jar.get(COOKIE_TOKEN)?;

    let token: SessionToken = serde_json::from_str(cookie.value_trimmed())
        .inspect_err(|error| tracing::debug!("Could not parse auth cookie: {error}"))
        .ok()?;

    if token.expires_at <= OffsetDateTime::now_utc() {
        tracing::debug!("Auth cookie expired at {}", token.expires_at);
        return None;
    }

    Some(token)
}

/// Push the expiry of the auth cookie out to at least `duration` from now.
///
/// # Errors
///
/// Returns a [serde_json::Error] if the token cannot be serialized. The
/// cookie jar is not modified.
pub(crate) fn extend_auth_cookie_duration(
    jar: PrivateCookieJar,
    token: SessionToken,
    duration: Duration,
) -> Result<PrivateCookieJar, serde_json::Error> {
    let new_expiry = OffsetDateTime::now_utc().saturating_add(duration);
    let token = SessionToken {
        expires_at: max(token.expires_at, new_expiry),
        ..token
    };

    set_session_token(jar, &token)
}

/// Set the auth cookie to an invalid value and set its max age to zero, which should delete the cookie on the client side.
pub fn invalidate_auth_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_TOKEN, "deleted"))
            .path("/")
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}
