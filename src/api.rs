//! A typed client for the finance REST API.
//!
//! Every request is made on behalf of a user and carries their bearer token.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::{
    Error,
    dashboard::DateRange,
    transaction::{Category, NewTransaction, Transaction},
};

/// The query parameter date format the finance API expects.
const API_DATE_FORMAT: &[time::format_description::BorrowedFormatItem] =
    time::macros::format_description!("[year]-[month]-[day]");

/// Talks to the finance REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the API at `base_url`, e.g. "http://localhost:8080".
    ///
    /// Requests that take longer than `timeout` fail with [Error::ApiUnavailable].
    ///
    /// # Errors
    /// Returns [Error::ApiUnavailable] if the HTTP client could not be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// The URL of a single transaction, with `id` percent-encoded as one path segment.
    fn transaction_url(&self, id: &str) -> Result<Url, Error> {
        if matches!(id.trim(), "" | "." | "..") {
            tracing::warn!("Refusing to build a transaction URL for the ID {id:?}");
            return Err(Error::DeleteMissingTransaction);
        }

        let mut url = Url::parse(&self.url("/transactions")).map_err(|error| {
            tracing::error!("Invalid finance API URL {}: {error}", self.base_url);
            Error::ApiUnavailable(error.to_string())
        })?;

        url.path_segments_mut()
            .map_err(|()| {
                tracing::error!("Finance API URL {} cannot have a path", self.base_url);
                Error::ApiUnavailable(format!("{} cannot be a base URL", self.base_url))
            })?
            .push(id);

        Ok(url)
    }

    /// Get the user's transactions within `range`.
    ///
    /// Open bounds are left out of the query.
    ///
    /// # Errors
    /// Returns [Error::SessionExpired] if the API responds with 403 Forbidden,
    /// [Error::InvalidApiResponse] if the response could not be decoded, and
    /// [Error::ApiUnavailable] for any other failure.
    pub async fn list_transactions(
        &self,
        token: &str,
        range: DateRange,
    ) -> Result<Vec<Transaction>, Error> {
        let mut query = Vec::with_capacity(2);

        if let Some(start) = range.start {
            query.push(("startDate", format_api_date(start)?));
        }

        if let Some(end) = range.end {
            query.push(("endDate", format_api_date(end)?));
        }

        tracing::debug!("Fetching transactions for {query:?}");

        let request = self
            .client
            .get(self.url("/transactions"))
            .bearer_auth(token)
            .query(&query);

        let response = send(request).await?;
        decode_json(response).await
    }

    /// Delete the transaction with `id`.
    ///
    /// # Errors
    /// Returns [Error::DeleteMissingTransaction] if the API responds with 404 Not Found
    /// or `id` cannot name a transaction,
    /// [Error::SessionExpired] on 403 Forbidden and [Error::ApiUnavailable]
    /// for any other failure.
    pub async fn delete_transaction(&self, token: &str, id: &str) -> Result<(), Error> {
        let request = self
            .client
            .delete(self.transaction_url(id)?)
            .bearer_auth(token);

        let response = request.send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::warn!("Tried to delete missing transaction {id}");
            return Err(Error::DeleteMissingTransaction);
        }

        check_status(response).map(|_| ())
    }

    /// Get all of the user's categories.
    ///
    /// # Errors
    /// See [ApiClient::list_transactions].
    pub async fn list_categories(&self, token: &str) -> Result<Vec<Category>, Error> {
        let request = self.client.get(self.url("/categories")).bearer_auth(token);

        let response = send(request).await?;
        decode_json(response).await
    }

    /// Create a transaction.
    ///
    /// # Errors
    /// Returns [Error::SessionExpired] if the API responds with 403 Forbidden
    /// and [Error::ApiUnavailable] for any other failure.
    pub async fn create_transaction(
        &self,
        token: &str,
        new_transaction: &NewTransaction,
    ) -> Result<(), Error> {
        let request = self
            .client
            .post(self.url("/transactions"))
            .bearer_auth(token)
            .json(new_transaction);

        send(request).await.map(|_| ())
    }
}

fn format_api_date(date: time::Date) -> Result<String, Error> {
    date.format(API_DATE_FORMAT).map_err(|error| {
        tracing::error!("Could not format date {date}: {error}");
        Error::ApiUnavailable(error.to_string())
    })
}

/// Send the request and map unsuccessful status codes to errors.
async fn send(request: RequestBuilder) -> Result<Response, Error> {
    let response = request.send().await?;

    check_status(response)
}

/// A 403 Forbidden becomes [Error::SessionExpired]. Any other unsuccessful
/// status becomes [Error::ApiUnavailable] carrying the status.
fn check_status(response: Response) -> Result<Response, Error> {
    let status = response.status();

    if status.is_success() {
        return Ok(response);
    }

    if status == StatusCode::FORBIDDEN {
        tracing::warn!("Finance API rejected the token for {}", response.url().path());
        return Err(Error::SessionExpired);
    }

    tracing::error!(
        "Finance API responded to {} with {status}",
        response.url().path()
    );
    Err(Error::ApiUnavailable(status.to_string()))
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T, Error> {
    let body = response.bytes().await?;

    serde_json::from_slice(&body).map_err(|error| {
        tracing::error!("Could not decode finance API response: {error}");
        Error::InvalidApiResponse(error.to_string())
    })
}
