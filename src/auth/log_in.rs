//! This file defines the routes for displaying the log-in page and handling log-in requests.
//! The auth module handles the lower level cookie auth logic.
//!
//! Logging in only stores the user's API token for the finance API. The token
//! is checked by the finance API the first time it is used.

use axum::{
    Form,
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    auth::{invalidate_auth_cookie, normalize_redirect_url, set_auth_cookie},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base, card_view,
        loading_spinner,
    },
};

fn log_in_form(redirect_url: Option<&str>) -> Markup {
    html! {
        form
            hx-post=(endpoints::LOG_IN_API)
            hx-target-error="#alert-container"
            hx-indicator="#indicator"
            hx-disabled-elt="#token, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            @if let Some(redirect_url) = redirect_url {
                input type="hidden" name="redirect_url" value=(redirect_url);
            }

            div
            {
                label for="token" class=(FORM_LABEL_STYLE) { "API token" }

                input
                    type="password"
                    name="token"
                    id="token"
                    placeholder="Paste the token from the finance app"
                    autocomplete="off"
                    required
                    autofocus
                    tabindex="0"
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div class="flex items-center gap-x-3"
            {
                input
                    type="checkbox"
                    name="remember_me"
                    id="remember_me"
                    tabindex="0"
                    class="rounded-xs";

                label
                    for="remember_me"
                    class="block text-sm font-medium text-gray-900 dark:text-white"
                {
                    "Keep me logged in for one week"
                }
            }

            button
                type="submit" id="submit-button" tabindex="0"
                class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Log in"
            }
        }
    }
}

fn parse_redirect_url(raw_url: Option<&str>, source: &str) -> Option<String> {
    match raw_url.and_then(normalize_redirect_url) {
        Some(redirect_url) => Some(redirect_url),
        None => {
            if let Some(redirect_url) = raw_url {
                tracing::warn!("Invalid redirect URL from {source}: {redirect_url}");
            }
            None
        }
    }
}

/// Display the log-in page.
pub async fn get_log_in_page(Query(query): Query<RedirectQuery>) -> Response {
    let redirect_url = parse_redirect_url(query.redirect_url.as_deref(), "log-in query");
    let log_in_form = log_in_form(redirect_url.as_deref());
    let content = card_view("Log in with your API token", &log_in_form);
    base("Log In", &[], &content).into_response()
}

/// How long the auth cookie should last if the user selects "remember me" at log-in.
const REMEMBER_ME_COOKIE_DURATION: Duration = Duration::days(7);

/// The state needed to perform a login.
#[derive(Debug, Clone)]
pub struct LogInState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
}

impl FromRef<AppState> for LogInState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LogInState> for Key {
    fn from_ref(state: &LogInState) -> Self {
        state.cookie_key.clone()
    }
}

/// Handler for log-in requests via the POST method.
///
/// On a successful log-in request, the auth cookie is set and the client is
/// redirected to the page they came from, or the dashboard page.
/// An empty token is answered with an alert.
pub async fn post_log_in(
    State(state): State<LogInState>,
    jar: PrivateCookieJar,
    Form(log_in_data): Form<LogInData>,
) -> Response {
    let token = log_in_data.token.trim();

    if token.is_empty() {
        return Error::EmptyToken.into_alert_response();
    }

    let cookie_duration = if log_in_data.remember_me.is_some() {
        REMEMBER_ME_COOKIE_DURATION
    } else {
        state.cookie_duration
    };

    let redirect_url = parse_redirect_url(log_in_data.redirect_url.as_deref(), "log-in form")
        .unwrap_or_else(|| endpoints::DASHBOARD_VIEW.to_owned());

    set_auth_cookie(jar.clone(), token, cookie_duration)
        .map(|updated_jar| {
            tracing::info!("Stored API token for a new session");
            (StatusCode::SEE_OTHER, HxRedirect(redirect_url), updated_jar)
        })
        .map_err(|err| {
            tracing::error!("Error setting auth cookie: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                HxRedirect(endpoints::INTERNAL_ERROR_VIEW.to_owned()),
                invalidate_auth_cookie(jar),
            )
        })
        .into_response()
}

#[derive(Deserialize)]
pub struct RedirectQuery {
    pub redirect_url: Option<String>,
}

/// The raw data entered by the user in the log-in form.
#[derive(Clone, Serialize, Deserialize)]
pub struct LogInData {
    /// The bearer token for the finance API.
    pub token: String,

    /// Whether to extend the initial auth cookie duration.
    ///
    /// This value comes from a checkbox, so it either has a string value or is not set
    /// (see the [MDN docs](https://developer.mozilla.org/en-US/docs/Web/HTML/Element/input/checkbox#value_2)).
    /// The `Some` variant should be interpreted as `true` irregardless of the
    /// string value, and the `None` variant should be interpreted as `false`.
    pub remember_me: Option<String>,

    /// Optional URL to redirect to after logging in.
    /// Only accepted from the log-in form submission.
    pub redirect_url: Option<String>,
}

#[cfg(test)]
mod log_in_page_tests {
    use axum::{
        Form,
        extract::{Query, State},
        http::{StatusCode, header::CONTENT_TYPE},
    };
    use axum_extra::extract::PrivateCookieJar;
    use scraper::Selector;
    use time::{Duration, OffsetDateTime};

    use crate::{
        app_state::create_cookie_key,
        auth::{DEFAULT_COOKIE_DURATION, cookie::get_token_from_cookies},
        endpoints,
        test_utils::{
            assert_hx_endpoint, assert_hx_redirect, assert_valid_html, must_get_form,
            parse_html_document,
        },
    };

    use super::{LogInData, LogInState, RedirectQuery, get_log_in_page, post_log_in};

    fn get_state() -> LogInState {
        LogInState {
            cookie_key: create_cookie_key("foobar"),
            cookie_duration: DEFAULT_COOKIE_DURATION,
        }
    }

    fn log_in_data(token: &str, remember_me: bool, redirect_url: Option<&str>) -> LogInData {
        LogInData {
            token: token.to_owned(),
            remember_me: remember_me.then(|| "on".to_owned()),
            redirect_url: redirect_url.map(str::to_owned),
        }
    }

    async fn submit(data: LogInData) -> (axum::response::Response, LogInState) {
        let state = get_state();
        let jar = PrivateCookieJar::new(state.cookie_key.clone());

        let response = post_log_in(State(state.clone()), jar, Form(data)).await;

        (response, state)
    }

    fn stored_token(
        response: &axum::response::Response,
        state: &LogInState,
    ) -> Option<(String, OffsetDateTime)> {
        let jar = PrivateCookieJar::from_headers(
            &cookie_header(response),
            state.cookie_key.clone(),
        );

        get_token_from_cookies(&jar).map(|token| (token.api_token, token.expires_at))
    }

    /// Turn the response's Set-Cookie header into a request Cookie header.
    fn cookie_header(response: &axum::response::Response) -> axum::http::HeaderMap {
        let mut headers = axum::http::HeaderMap::new();

        for value in response.headers().get_all("set-cookie") {
            let cookie = value.to_str().unwrap().split(';').next().unwrap().to_owned();
            headers.append("cookie", cookie.parse().unwrap());
        }

        headers
    }

    #[tokio::test]
    async fn log_in_page_displays_form() {
        let response = get_log_in_page(Query(RedirectQuery { redirect_url: None })).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response
                .headers()
                .get(CONTENT_TYPE)
                .unwrap()
                .to_str()
                .unwrap()
                .starts_with("text/html")
        );

        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let form = must_get_form(&document);
        assert_hx_endpoint(&form, endpoints::LOG_IN_API, "hx-post");

        let token_inputs = form
            .select(&Selector::parse("input[type=password][name=token]").unwrap())
            .count();
        assert_eq!(token_inputs, 1, "want 1 token input, got {token_inputs}");
        let redirect_inputs = form
            .select(&Selector::parse("input[name=redirect_url]").unwrap())
            .count();
        assert_eq!(redirect_inputs, 0);
    }

    #[tokio::test]
    async fn log_in_page_preserves_redirect_url() {
        let redirect_url = "/transactions/new?type=INCOME".to_owned();
        let response = get_log_in_page(Query(RedirectQuery {
            redirect_url: Some(redirect_url.clone()),
        }))
        .await;

        let document = parse_html_document(response).await;
        let input = document
            .select(&Selector::parse("input[name=redirect_url]").unwrap())
            .next()
            .expect("redirect_url input missing");
        assert_eq!(input.value().attr("value"), Some(redirect_url.as_str()));
    }

    #[tokio::test]
    async fn log_in_page_drops_external_redirect_url() {
        let response = get_log_in_page(Query(RedirectQuery {
            redirect_url: Some("https://evil.example.com".to_owned()),
        }))
        .await;

        let document = parse_html_document(response).await;
        let redirect_inputs = document
            .select(&Selector::parse("input[name=redirect_url]").unwrap())
            .count();
        assert_eq!(redirect_inputs, 0);
    }

    #[tokio::test]
    async fn log_in_stores_token_and_redirects_to_dashboard() {
        let (response, state) = submit(log_in_data("  abc.def  ", false, None)).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::DASHBOARD_VIEW);

        let (token, expires_at) = stored_token(&response, &state).expect("no auth cookie");
        assert_eq!(token, "abc.def");
        assert!(
            (expires_at - (OffsetDateTime::now_utc() + DEFAULT_COOKIE_DURATION)).abs()
                < Duration::seconds(1)
        );
    }

    #[tokio::test]
    async fn log_in_redirects_to_requested_page() {
        let (response, _) = submit(log_in_data(
            "abc.def",
            false,
            Some(endpoints::NEW_TRANSACTION_VIEW),
        ))
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::NEW_TRANSACTION_VIEW);
    }

    #[tokio::test]
    async fn remember_me_extends_cookie_duration() {
        let (response, state) = submit(log_in_data("abc.def", true, None)).await;

        let (_, expires_at) = stored_token(&response, &state).expect("no auth cookie");
        assert!(
            (expires_at - (OffsetDateTime::now_utc() + Duration::days(7))).abs()
                < Duration::seconds(1)
        );
    }

    #[tokio::test]
    async fn empty_token_shows_alert() {
        let (response, _) = submit(log_in_data("   ", false, None)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().get("set-cookie").is_none());
        assert!(response.headers().get("hx-redirect").is_none());
    }
}
