//! Dashboard HTTP handlers and view rendering.
//!
//! This module contains:
//! - Route handlers for displaying the dashboard and changing its date range
//!   and chart selection
//! - HTML view functions for rendering the dashboard UI
//! - State and form types used by the handlers
//!
//! Range changes load transactions from the finance API. The session lock is
//! only held to start and finish a fetch, never while waiting for the API.

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use maud::{Markup, html};
use serde::Deserialize;
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    AppState, Error,
    api::ApiClient,
    auth::{ApiToken, force_log_out},
    dashboard::{
        aggregation::FlowGranularity,
        cards::summary_cards_view,
        charts::{
            DASHBOARD_CONTENT_ID, category_expenses_chart, chart_view, daily_flow_chart,
            monthly_flow_chart,
        },
        range::{DateRange, YearMonth},
        session::SessionStore,
        state::{DashboardState, FetchOutcome, FetchTicket, MonthOption},
        tables::{selection_banner, transactions_table},
    },
    endpoints,
    html::{ECHARTS_SCRIPT_URL, FORM_TEXT_INPUT_STYLE, HeadElement, base, link},
    navigation::NavBar,
    timezone::local_today,
};

/// The date format used by date inputs and chart keys, e.g. "2024-03-05".
const DATE_KEY_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

const MONTH_BUTTON_STYLE: &str = "px-3 py-1 text-sm rounded-full border \
    border-gray-300 dark:border-gray-600 text-gray-700 dark:text-gray-300 \
    hover:bg-gray-100 dark:hover:bg-gray-700 whitespace-nowrap";
const MONTH_BUTTON_ACTIVE_STYLE: &str = "px-3 py-1 text-sm rounded-full border \
    border-blue-600 bg-blue-600 text-white whitespace-nowrap";

/// The state needed for displaying and updating the dashboard.
#[derive(Debug, Clone)]
pub struct DashboardPageState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The client for loading transactions from the finance API.
    pub api_client: ApiClient,
    /// The dashboard state of each signed-in session.
    pub sessions: SessionStore,
    /// The local timezone as a canonical timezone name, e.g. "America/Sao_Paulo".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            api_client: state.api_client.clone(),
            sessions: state.sessions.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<DashboardPageState> for Key {
    fn from_ref(state: &DashboardPageState) -> Self {
        state.cookie_key.clone()
    }
}

/// Form data for changing one or both ends of the date range.
///
/// A field that is missing leaves that end of the range as it is, while a
/// field that is present but empty removes that bound.
#[derive(Debug, Default, Deserialize)]
pub struct RangeForm {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Form data for picking a whole month as the date range.
#[derive(Debug, Deserialize)]
pub struct MonthPickForm {
    /// Any date in the month, usually its first day.
    pub anchor: String,
}

/// Form data for toggling the day selected in the flow chart.
#[derive(Debug, Deserialize)]
pub struct DaySelectionForm {
    pub day: String,
}

/// Form data for toggling the month selected in the flow chart.
#[derive(Debug, Deserialize)]
pub struct MonthSelectionForm {
    pub month: String,
}

/// Form data for toggling the category selected in the expenses chart.
#[derive(Debug, Deserialize)]
pub struct CategorySelectionForm {
    pub category: String,
}

fn parse_date_key(raw: &str) -> Result<Date, Error> {
    Date::parse(raw.trim(), DATE_KEY_FORMAT).map_err(|error| {
        tracing::debug!("Invalid date key {raw:?}: {error}");
        Error::InvalidDateKey(raw.to_owned())
    })
}

/// Parse an optional date input where an empty value means "no bound".
fn parse_date_bound(raw: &str) -> Result<Option<Date>, Error> {
    if raw.trim().is_empty() {
        Ok(None)
    } else {
        parse_date_key(raw).map(Some)
    }
}

/// Start a fetch with `start_fetch`, wait for the finance API and hand the
/// result back to the session's state.
///
/// The state is left untouched if the request fails.
async fn fetch_transactions(
    state: &DashboardPageState,
    token: &ApiToken,
    today: Date,
    start_fetch: impl FnOnce(&mut DashboardState) -> FetchTicket,
) -> Result<(), Error> {
    let key = token.session_key();
    let ticket = state.sessions.with_session(&key, today, start_fetch)?;

    let transactions = state
        .api_client
        .list_transactions(token.as_str(), ticket.range)
        .await
        .inspect_err(|error| {
            tracing::error!("Could not load transactions for {:?}: {error}", ticket.range)
        })?;

    let outcome = state.sessions.with_session(&key, today, |dashboard| {
        dashboard.complete_fetch(ticket, transactions)
    })?;

    if outcome == FetchOutcome::Stale {
        tracing::debug!("Discarded transactions for superseded request {}", ticket.seq);
    }

    Ok(())
}

/// Render the dashboard content for the session.
fn render_content(
    state: &DashboardPageState,
    token: &ApiToken,
    today: Date,
) -> Result<Markup, Error> {
    state
        .sessions
        .with_session(&token.session_key(), today, |dashboard| {
            dashboard_content(dashboard)
        })
}

/// Turn the outcome of an htmx request into the updated dashboard content or an alert.
fn content_response(
    state: &DashboardPageState,
    token: &ApiToken,
    jar: PrivateCookieJar,
    result: Result<Markup, Error>,
) -> Response {
    match result {
        Ok(content) => content.into_response(),
        Err(Error::SessionExpired) => force_log_out(&state.sessions, token, jar, true),
        Err(error) => error.into_alert_response(),
    }
}

/// Load the transactions for the session's current range again and render
/// the updated dashboard content.
///
/// Used after changes made through the finance API, such as deleting a transaction.
pub async fn refresh_dashboard_content(
    state: &DashboardPageState,
    token: &ApiToken,
    jar: PrivateCookieJar,
) -> Response {
    let result = async {
        let today = local_today(&state.local_timezone)?;
        fetch_transactions(state, token, today, DashboardState::refresh).await?;
        render_content(state, token, today)
    }
    .await;

    content_response(state, token, jar, result)
}

/// Display the dashboard with freshly loaded transactions for the session's range.
pub async fn get_dashboard_page(
    State(state): State<DashboardPageState>,
    Extension(token): Extension<ApiToken>,
    jar: PrivateCookieJar,
) -> Response {
    let result = async {
        let today = local_today(&state.local_timezone)?;
        fetch_transactions(&state, &token, today, DashboardState::refresh).await?;
        render_content(&state, &token, today)
    }
    .await;

    match result {
        Ok(content) => {
            dashboard_view(NavBar::new(endpoints::DASHBOARD_VIEW), &content).into_response()
        }
        Err(Error::SessionExpired) => force_log_out(&state.sessions, &token, jar, false),
        Err(error) => error.into_response(),
    }
}

/// Change one or both ends of the date range and load the transactions for it.
pub async fn post_dashboard_range(
    State(state): State<DashboardPageState>,
    Extension(token): Extension<ApiToken>,
    jar: PrivateCookieJar,
    Form(form): Form<RangeForm>,
) -> Response {
    let result = async {
        let start = form.start_date.as_deref().map(parse_date_bound).transpose()?;
        let end = form.end_date.as_deref().map(parse_date_bound).transpose()?;
        let today = local_today(&state.local_timezone)?;

        fetch_transactions(&state, &token, today, |dashboard| match (start, end) {
            (Some(start), Some(end)) => dashboard.set_range(DateRange::new(start, end)),
            (Some(start), None) => dashboard.set_start_date(start),
            (None, Some(end)) => dashboard.set_end_date(end),
            (None, None) => dashboard.refresh(),
        })
        .await?;

        render_content(&state, &token, today)
    }
    .await;

    content_response(&state, &token, jar, result)
}

/// Set the date range to the whole month of the picked anchor and load the
/// transactions for it.
pub async fn post_dashboard_month(
    State(state): State<DashboardPageState>,
    Extension(token): Extension<ApiToken>,
    jar: PrivateCookieJar,
    Form(form): Form<MonthPickForm>,
) -> Response {
    let result = async {
        let anchor = parse_date_key(&form.anchor)?;
        let today = local_today(&state.local_timezone)?;

        fetch_transactions(&state, &token, today, |dashboard| {
            dashboard.select_month(anchor)
        })
        .await?;

        render_content(&state, &token, today)
    }
    .await;

    content_response(&state, &token, jar, result)
}

/// Apply `update` to the session's state and render the dashboard content.
///
/// Selection changes only narrow the loaded transactions, so nothing is fetched.
fn update_selection(
    state: &DashboardPageState,
    token: &ApiToken,
    update: impl FnOnce(&mut DashboardState),
) -> Result<Markup, Error> {
    let today = local_today(&state.local_timezone)?;

    state
        .sessions
        .with_session(&token.session_key(), today, |dashboard| {
            update(dashboard);
            dashboard_content(dashboard)
        })
}

/// Toggle the selection of a day from the flow chart.
pub async fn post_select_day(
    State(state): State<DashboardPageState>,
    Extension(token): Extension<ApiToken>,
    jar: PrivateCookieJar,
    Form(form): Form<DaySelectionForm>,
) -> Response {
    let result = parse_date_key(&form.day).and_then(|day| {
        update_selection(&state, &token, |dashboard| dashboard.select_day(day))
    });

    content_response(&state, &token, jar, result)
}

/// Toggle the selection of a month from the flow chart.
pub async fn post_select_month(
    State(state): State<DashboardPageState>,
    Extension(token): Extension<ApiToken>,
    jar: PrivateCookieJar,
    Form(form): Form<MonthSelectionForm>,
) -> Response {
    let result = form
        .month
        .trim()
        .parse::<YearMonth>()
        .map_err(|error| {
            tracing::debug!("Invalid month key: {error}");
            Error::InvalidDateKey(form.month.clone())
        })
        .and_then(|month| {
            update_selection(&state, &token, |dashboard| {
                dashboard.select_month_filter(month)
            })
        });

    content_response(&state, &token, jar, result)
}

/// Toggle the selection of a category from the expenses chart.
pub async fn post_select_category(
    State(state): State<DashboardPageState>,
    Extension(token): Extension<ApiToken>,
    jar: PrivateCookieJar,
    Form(form): Form<CategorySelectionForm>,
) -> Response {
    let result = update_selection(&state, &token, |dashboard| {
        dashboard.select_category(&form.category)
    });

    content_response(&state, &token, jar, result)
}

/// Remove the chart selection so the full list is shown.
pub async fn post_clear_selection(
    State(state): State<DashboardPageState>,
    Extension(token): Extension<ApiToken>,
    jar: PrivateCookieJar,
) -> Response {
    let result = update_selection(&state, &token, DashboardState::clear_selection);

    content_response(&state, &token, jar, result)
}

fn month_picker(options: &[MonthOption]) -> Markup {
    html! {
        div id="month-picker" class="flex gap-2 overflow-x-auto pb-2"
        {
            @for option in options {
                button
                    type="button"
                    name="anchor"
                    value=(option.anchor)
                    hx-post=(endpoints::DASHBOARD_MONTH)
                    aria-pressed=(option.is_active)
                    class=(if option.is_active { MONTH_BUTTON_ACTIVE_STYLE } else { MONTH_BUTTON_STYLE })
                {
                    (option.month().label())
                }
            }
        }
    }
}

fn date_input(name: &str, label: &str, value: Option<Date>) -> Markup {
    html! {
        label class="flex flex-col text-sm gap-1"
        {
            (label)

            input
                type="date"
                name=(name)
                value=[value]
                hx-post=(endpoints::DASHBOARD_RANGE)
                hx-trigger="change"
                class=(FORM_TEXT_INPUT_STYLE);
        }
    }
}

fn range_controls(range: DateRange, options: &[MonthOption]) -> Markup {
    html! {
        section
            id="dashboard-controls"
            class="w-full mx-auto mb-4 flex flex-col gap-4"
            hx-target={"#" (DASHBOARD_CONTENT_ID)}
            hx-target-error="#alert-container"
            hx-swap="innerHTML"
            hx-sync="this:replace"
        {
            (month_picker(options))

            div id="range-inputs" class="flex gap-4"
            {
                (date_input("start_date", "From", range.start))
                (date_input("end_date", "To", range.end))
            }
        }
    }
}

fn charts_view(dashboard: &DashboardState) -> Markup {
    let flow_chart = match dashboard.flow_granularity() {
        FlowGranularity::Daily => {
            let rows = dashboard.daily_flow();
            (!rows.is_empty()).then(|| daily_flow_chart(&rows))
        }
        FlowGranularity::Monthly => {
            let rows = dashboard.monthly_flow();
            (!rows.is_empty()).then(|| monthly_flow_chart(&rows))
        }
    };
    let category_rows = dashboard.category_expenses();
    let category_chart =
        (!category_rows.is_empty()).then(|| category_expenses_chart(&category_rows));

    html! {
        section id="charts" class="w-full mx-auto mb-4"
        {
            div class="grid grid-cols-1 xl:grid-cols-2 gap-4"
            {
                @if let Some(chart) = &flow_chart {
                    div { (chart_view(chart)) }
                }

                @if let Some(chart) = &category_chart {
                    div { (chart_view(chart)) }
                }
            }
        }
    }
}

/// Renders the contents of the dashboard: range controls, summary, charts and
/// the transaction list.
///
/// This is swapped into `#dashboard-content` by htmx after every change.
fn dashboard_content(dashboard: &DashboardState) -> Markup {
    let filtered_transactions = dashboard.filtered_transactions();
    let new_transaction_link = link(endpoints::NEW_TRANSACTION_VIEW, "add a transaction");

    html! {
        (range_controls(dashboard.range(), &dashboard.month_options()))

        (summary_cards_view(&dashboard.summary()))

        @if dashboard.transactions().is_empty() {
            div id="no-data" class="flex flex-col items-center py-8"
            {
                h2 class="text-xl font-bold" { "Nothing here yet..." }

                p
                {
                    "There are no transactions in this period. Pick another period or "
                    (new_transaction_link) "."
                }
            }
        } @else {
            (charts_view(dashboard))
            (selection_banner(dashboard.selection()))
            (transactions_table(&filtered_transactions))
        }
    }
}

/// Renders the full dashboard page around `content`.
fn dashboard_view(nav_bar: NavBar<'_>, content: &Markup) -> Markup {
    let nav_bar = nav_bar.into_html();

    let content = html!(
        (nav_bar)

        div
            id=(DASHBOARD_CONTENT_ID)
            class="flex flex-col items-center px-2 lg:px-6 lg:py-8 mx-auto
                max-w-screen-xl text-gray-900 dark:text-white"
        {
            (content)
        }
    );

    let scripts = [HeadElement::ScriptLink(ECHARTS_SCRIPT_URL.to_owned())];

    base("Dashboard", &scripts, &content)
}
