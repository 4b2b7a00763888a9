//! Defines the route handler for the page for creating a new transaction.

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use maud::{Markup, html};
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    api::ApiClient,
    auth::{ApiToken, force_log_out},
    dashboard::SessionStore,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_RADIO_INPUT_STYLE,
        FORM_RADIO_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base, currency_input_styles,
        loading_spinner,
    },
    navigation::NavBar,
    timezone::local_today,
    transaction::{Category, TransactionType},
};

fn type_picker(selected: TransactionType) -> Markup {
    html! {
        fieldset
        {
            legend class=(FORM_LABEL_STYLE) { "Type" }

            div class="flex gap-4"
            {
                @for kind in [TransactionType::Expense, TransactionType::Income] {
                    @let id = format!("type-{}", kind.as_query_value().to_lowercase());

                    div class="flex flex-1 items-center gap-2"
                    {
                        input
                            type="radio"
                            name="type"
                            id=(id)
                            value=(kind.as_query_value())
                            checked[kind == selected]
                            hx-get=(endpoints::NEW_TRANSACTION_VIEW)
                            hx-target="body"
                            hx-push-url="true"
                            class=(FORM_RADIO_INPUT_STYLE);

                        label for=(id) class=(FORM_RADIO_LABEL_STYLE) { (kind.label()) }
                    }
                }
            }
        }
    }
}

fn create_transaction_view(
    kind: TransactionType,
    max_date: Date,
    available_categories: &[&Category],
) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_TRANSACTION_VIEW).into_html();
    let spinner = loading_spinner();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                hx-post=(endpoints::TRANSACTIONS_API)
                hx-target-error="#alert-container"
                hx-disabled-elt="#submit-button"
                class="w-full space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { "New Transaction" }

                (type_picker(kind))

                div
                {
                    label for="description" class=(FORM_LABEL_STYLE) { "Description" }

                    input
                        name="description"
                        id="description"
                        type="text"
                        placeholder="Description"
                        required
                        autofocus
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="amount" class=(FORM_LABEL_STYLE) { "Amount" }

                    // w-full needed to ensure input takes the full width when prefilled with a value
                    div class="input-wrapper w-full"
                    {
                        input
                            name="amount"
                            id="amount"
                            type="number"
                            step="0.01"
                            min="0.01"
                            placeholder="0.00"
                            required
                            class=(FORM_TEXT_INPUT_STYLE);
                    }
                }

                div
                {
                    label for="date" class=(FORM_LABEL_STYLE) { "Date" }

                    input
                        name="date"
                        id="date"
                        type="date"
                        max=(max_date)
                        value=(max_date)
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }

                    select
                        name="category_id"
                        id="category_id"
                        class=(FORM_TEXT_INPUT_STYLE)
                    {
                        option value="" { "No category" }

                        @for category in available_categories {
                            option value=(category.id) { (category.name) }
                        }
                    }
                }

                button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                {
                    span id="indicator" class="inline htmx-indicator" { (spinner) }
                    " Create Transaction"
                }
            }
        }
    };

    base("Create Transaction", &[currency_input_styles()], &content)
}

/// The state needed for the new transaction page.
#[derive(Debug, Clone)]
pub struct CreateTransactionPageState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The client for loading categories from the finance API.
    pub api_client: ApiClient,
    /// The dashboard state of each signed-in session.
    pub sessions: SessionStore,
    /// The local timezone as a canonical timezone name, e.g. "America/Sao_Paulo".
    pub local_timezone: String,
}

impl FromRef<AppState> for CreateTransactionPageState {
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
impl FromRef<CreateTransactionPageState> for Key {
    fn from_ref(state: &CreateTransactionPageState) -> Self {
        state.cookie_key.clone()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct NewTransactionQuery {
    /// The type of transaction to create, expenses if not given.
    #[serde(rename = "type")]
    pub kind: Option<TransactionType>,
}

/// Renders the page for creating a transaction.
///
/// Only the categories matching the requested transaction type are offered.
pub async fn get_create_transaction_page(
    State(state): State<CreateTransactionPageState>,
    Extension(token): Extension<ApiToken>,
    jar: PrivateCookieJar,
    Query(query): Query<NewTransactionQuery>,
) -> Response {
    let kind = query.kind.unwrap_or(TransactionType::Expense);

    let result = async {
        let max_date = local_today(&state.local_timezone)?;
        let categories = state
            .api_client
            .list_categories(token.as_str())
            .await
            .inspect_err(|error| {
                tracing::error!("Failed to retrieve categories for new transaction page: {error}")
            })?;

        Ok::<_, Error>((max_date, categories))
    }
    .await;

    match result {
        Ok((max_date, categories)) => {
            let available_categories: Vec<&Category> = categories
                .iter()
                .filter(|category| category.kind == kind)
                .collect();

            create_transaction_view(kind, max_date, &available_categories).into_response()
        }
        Err(Error::SessionExpired) => force_log_out(&state.sessions, &token, jar, false),
        Err(error) => error.into_response(),
    }
}
