//! Defines the app level error type and conversions to rendered HTML pages and alerts.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};

use crate::{alert::Alert, endpoints, internal_server_error::InternalServerError};

/// The errors that may occur in the application.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum Error {
    /// The finance API rejected the user's token with 403 Forbidden.
    ///
    /// The user must provide a new token before any more data can be loaded.
    #[error("the API token has expired or is not authorized")]
    SessionExpired,

    /// The finance API could not be reached, timed out, or answered with an
    /// unexpected status code.
    #[error("the finance API is unavailable: {0}")]
    ApiUnavailable(String),

    /// The finance API answered with a body that could not be decoded.
    #[error("the finance API sent an invalid response: {0}")]
    InvalidApiResponse(String),

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that does not exist")]
    DeleteMissingTransaction,

    /// An empty string was used as a transaction description.
    #[error("transaction description cannot be empty")]
    EmptyDescription,

    /// A transaction amount was negative, zero or not a finite number.
    #[error("{0} is not a valid transaction amount")]
    InvalidAmount(f64),

    /// The category chosen for a transaction is for the other transaction type.
    #[error("the category \"{0}\" cannot be used for this type of transaction")]
    CategoryTypeMismatch(String),

    /// The category ID used to create a transaction did not match a known category.
    #[error("the category ID does not refer to a valid category")]
    InvalidCategory(String),

    /// The user submitted the log in form without a token.
    #[error("the API token cannot be empty")]
    EmptyToken,

    /// A chart selection sent a key that is not a valid day or month.
    #[error("\"{0}\" is not a valid date")]
    InvalidDateKey(String),

    /// Could not acquire the session lock
    #[error("could not acquire the session lock")]
    SessionLockError,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            tracing::error!("Could not decode finance API response: {error}");
            Error::InvalidApiResponse(error.to_string())
        } else {
            tracing::error!("Finance API request failed: {error}");
            Error::ApiUnavailable(error.to_string())
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::SessionExpired => Redirect::to(endpoints::LOG_IN_VIEW).into_response(),
            Error::ApiUnavailable(_) | Error::InvalidApiResponse(_) => InternalServerError {
                description: "Finance API Unavailable",
                fix: "Could not load your transactions. Check that the finance API is running \
                    and try again.",
            }
            .into_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::SessionLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Convert the error into an HTTP response with an HTML alert.
    pub fn into_alert_response(self) -> Response {
        let (status_code, alert) = match self {
            Error::SessionExpired => (
                StatusCode::UNAUTHORIZED,
                Alert::Error {
                    message: "Session expired".to_owned(),
                    details: "Your API token is no longer valid. Log in again to continue."
                        .to_owned(),
                },
            ),
            Error::ApiUnavailable(_) => (
                StatusCode::BAD_GATEWAY,
                Alert::Error {
                    message: "Finance API unavailable".to_owned(),
                    details: "The request could not be completed. Nothing was changed, \
                    try again in a moment."
                        .to_owned(),
                },
            ),
            Error::InvalidApiResponse(_) => (
                StatusCode::BAD_GATEWAY,
                Alert::Error {
                    message: "Unexpected response from the finance API".to_owned(),
                    details: "The finance API sent data that could not be read. \
                    Check the server logs for more details."
                        .to_owned(),
                },
            ),
            Error::DeleteMissingTransaction => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete transaction".to_owned(),
                    details: "The transaction could not be found. \
                    Try refreshing the page to see if the transaction has already been deleted."
                        .to_owned(),
                },
            ),
            Error::EmptyDescription => (
                StatusCode::BAD_REQUEST,
                Alert::ErrorSimple {
                    message: "Enter a description for the transaction".to_owned(),
                },
            ),
            Error::InvalidAmount(amount) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid amount".to_owned(),
                    details: format!("{amount} is not a valid amount. Enter a number above zero."),
                },
            ),
            Error::CategoryTypeMismatch(name) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid category".to_owned(),
                    details: format!(
                        "The category \"{name}\" belongs to the other transaction type. \
                        Choose a category that matches the transaction type."
                    ),
                },
            ),
            Error::InvalidCategory(category_id) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid category ID".to_owned(),
                    details: format!("Could not find a category with the ID {category_id:?}"),
                },
            ),
            Error::EmptyToken => (
                StatusCode::BAD_REQUEST,
                Alert::ErrorSimple {
                    message: "Enter your API token".to_owned(),
                },
            ),
            Error::InvalidDateKey(key) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid selection".to_owned(),
                    details: format!("\"{key}\" is not a valid date."),
                },
            ),
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Invalid Timezone Settings".to_owned(),
                    details: format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                    ),
                },
            ),
            Error::SessionLockError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Something went wrong".to_owned(),
                    details:
                        "An unexpected error occurred, check the server logs for more details."
                            .to_owned(),
                },
            ),
        };

        (status_code, alert.into_html()).into_response()
    }
}
