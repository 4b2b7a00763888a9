//! Defines the endpoint for creating a new transaction.

use axum::{
    Extension,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since it accepts the repeated and missing fields
// that HTML forms send.
use axum_extra::extract::{Form, PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use serde::{Deserialize, Deserializer};
use time::Date;

use crate::{
    AppState, Error,
    api::ApiClient,
    auth::{ApiToken, force_log_out},
    dashboard::SessionStore,
    endpoints,
    transaction::{Category, CategoryId, NewTransaction, TransactionType},
};

/// The state needed to create a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The client for creating transactions through the finance API.
    pub api_client: ApiClient,
    /// The dashboard state of each signed-in session.
    pub sessions: SessionStore,
}

impl FromRef<AppState> for CreateTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            api_client: state.api_client.clone(),
            sessions: state.sessions.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<CreateTransactionState> for Key {
    fn from_ref(state: &CreateTransactionState) -> Self {
        state.cookie_key.clone()
    }
}

/// The form data for creating a transaction.
#[derive(Debug, Deserialize)]
pub struct TransactionForm {
    /// Text detailing the transaction.
    pub description: String,
    /// The value of the transaction.
    pub amount: f64,
    /// The date when the transaction ocurred.
    pub date: Date,
    /// Whether the transaction is income or an expense.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// The ID of the category to attach, if any.
    #[serde(default, deserialize_with = "deserialize_category_id")]
    pub category_id: Option<CategoryId>,
}

/// The "No category" option submits an empty value.
fn deserialize_category_id<'de, D>(deserializer: D) -> Result<Option<CategoryId>, D::Error>
where
    D: Deserializer<'de>,
{
    let category_id = Option::<CategoryId>::deserialize(deserializer)?;

    Ok(category_id.filter(|id| !id.trim().is_empty()))
}

/// Check that the category exists and belongs to the same transaction type.
fn check_category(
    category_id: &str,
    kind: TransactionType,
    categories: &[Category],
) -> Result<(), Error> {
    let category = categories
        .iter()
        .find(|category| category.id == category_id)
        .ok_or_else(|| Error::InvalidCategory(category_id.to_owned()))?;

    if category.kind != kind {
        return Err(Error::CategoryTypeMismatch(category.name.clone()));
    }

    Ok(())
}

/// Validate the form and turn it into the request body for the finance API.
///
/// The categories are only loaded when the form names one.
async fn build_new_transaction(
    api_client: &ApiClient,
    token: &ApiToken,
    form: TransactionForm,
) -> Result<NewTransaction, Error> {
    let description = form.description.trim();

    if description.is_empty() {
        return Err(Error::EmptyDescription);
    }

    if !form.amount.is_finite() || form.amount <= 0.0 {
        return Err(Error::InvalidAmount(form.amount));
    }

    if let Some(category_id) = &form.category_id {
        let categories = api_client.list_categories(token.as_str()).await?;
        check_category(category_id, form.kind, &categories)?;
    }

    Ok(NewTransaction {
        description: description.to_owned(),
        amount: form.amount,
        date: form.date,
        kind: form.kind,
        category_id: form.category_id,
    })
}

/// A route handler for creating a new transaction, redirects to the dashboard on success.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionState>,
    Extension(token): Extension<ApiToken>,
    jar: PrivateCookieJar,
    Form(form): Form<TransactionForm>,
) -> Response {
    let result = async {
        let new_transaction = build_new_transaction(&state.api_client, &token, form).await?;

        state
            .api_client
            .create_transaction(token.as_str(), &new_transaction)
            .await
            .inspect_err(|error| tracing::error!("could not create transaction: {error}"))
    }
    .await;

    match result {
        Ok(()) => (
            HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(Error::SessionExpired) => force_log_out(&state.sessions, &token, jar, true),
        Err(error) => error.into_alert_response(),
    }
}
