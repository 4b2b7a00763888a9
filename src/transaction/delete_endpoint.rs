//! Defines the endpoint for deleting a transaction from the dashboard.

use axum::{
    Extension,
    extract::{Path, State},
    response::Response,
};
use axum_extra::extract::PrivateCookieJar;

use crate::{
    Error,
    auth::{ApiToken, force_log_out},
    dashboard::{DashboardPageState, refresh_dashboard_content},
    transaction::TransactionId,
};

/// A route handler for deleting a transaction.
///
/// On success the transactions for the current range are loaded again and the
/// updated dashboard content is returned. Otherwise an alert is returned and
/// the dashboard is left as it is.
pub async fn delete_transaction_endpoint(
    State(state): State<DashboardPageState>,
    Extension(token): Extension<ApiToken>,
    jar: PrivateCookieJar,
    Path(transaction_id): Path<TransactionId>,
) -> Response {
    match state
        .api_client
        .delete_transaction(token.as_str(), &transaction_id)
        .await
    {
        Ok(()) => {
            tracing::info!("Deleted transaction {transaction_id}");
            refresh_dashboard_content(&state, &token, jar).await
        }
        Err(Error::SessionExpired) => force_log_out(&state.sessions, &token, jar, true),
        Err(error) => {
            tracing::error!("Could not delete transaction {transaction_id}: {error}");
            error.into_alert_response()
        }
    }
}
