//! An in-process finance API for handler and router tests.

use std::{
    net::SocketAddr,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{delete, get},
};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    api::ApiClient,
    transaction::{Category, Transaction, TransactionType},
};

/// The bearer token the mock API accepts.
pub(crate) const TEST_TOKEN: &str = "test-token";

#[derive(Default)]
struct MockData {
    transactions: Vec<Transaction>,
    categories: Vec<Category>,
    forbidden: bool,
    failing: bool,
    requested_ranges: Vec<(Option<String>, Option<String>)>,
    created: Vec<Value>,
    next_id: u32,
}

/// A finance API holding transactions in memory.
#[derive(Clone, Default)]
pub(crate) struct MockApi {
    data: Arc<Mutex<MockData>>,
}

#[derive(Deserialize)]
struct ListQuery {
    #[serde(rename = "startDate")]
    start_date: Option<String>,
    #[serde(rename = "endDate")]
    end_date: Option<String>,
}

impl MockApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_transactions(self, transactions: Vec<Transaction>) -> Self {
        self.data().transactions = transactions;
        self
    }

    pub(crate) fn with_categories(self, categories: Vec<Category>) -> Self {
        self.data().categories = categories;
        self
    }

    /// Answer every request with 403 Forbidden.
    pub(crate) fn set_forbidden(&self, forbidden: bool) {
        self.data().forbidden = forbidden;
    }

    /// Answer every request with 500 Internal Server Error.
    pub(crate) fn set_failing(&self, failing: bool) {
        self.data().failing = failing;
    }

    /// The `startDate` and `endDate` of each list request, oldest first.
    pub(crate) fn requested_ranges(&self) -> Vec<(Option<String>, Option<String>)> {
        self.data().requested_ranges.clone()
    }

    /// The request bodies of each create request, oldest first.
    pub(crate) fn created(&self) -> Vec<Value> {
        self.data().created.clone()
    }

    pub(crate) fn transaction_ids(&self) -> Vec<String> {
        self.data()
            .transactions
            .iter()
            .map(|transaction| transaction.id.clone())
            .collect()
    }

    fn data(&self) -> MutexGuard<'_, MockData> {
        self.data.lock().unwrap()
    }

    /// Serve the mock API on a random local port and return a client for it.
    pub(crate) async fn start(&self) -> ApiClient {
        let app = Router::new()
            .route("/transactions", get(list_transactions).post(create_transaction))
            .route("/transactions/{id}", delete(delete_transaction))
            .route("/categories", get(list_categories))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address: SocketAddr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        ApiClient::new(&format!("http://{address}"), Duration::from_secs(5)).unwrap()
    }

    /// The response to send instead of handling the request, if any.
    fn rejection(&self, headers: &HeaderMap) -> Option<Response> {
        let authorized = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value == format!("Bearer {TEST_TOKEN}"));
        let data = self.data();

        if !authorized || data.forbidden {
            Some(StatusCode::FORBIDDEN.into_response())
        } else if data.failing {
            Some(StatusCode::INTERNAL_SERVER_ERROR.into_response())
        } else {
            None
        }
    }
}

async fn list_transactions(
    State(api): State<MockApi>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Response {
    if let Some(rejection) = api.rejection(&headers) {
        return rejection;
    }

    let mut data = api.data();
    data.requested_ranges
        .push((query.start_date.clone(), query.end_date.clone()));

    let in_range = |transaction: &&Transaction| {
        let day = transaction.date.get(..10).unwrap_or_default();
        query.start_date.as_deref().is_none_or(|start| day >= start)
            && query.end_date.as_deref().is_none_or(|end| day <= end)
    };
    let transactions: Vec<Transaction> =
        data.transactions.iter().filter(in_range).cloned().collect();

    Json(transactions).into_response()
}

async fn delete_transaction(
    State(api): State<MockApi>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Some(rejection) = api.rejection(&headers) {
        return rejection;
    }

    let mut data = api.data();
    let count_before = data.transactions.len();
    data.transactions.retain(|transaction| transaction.id != id);

    if data.transactions.len() == count_before {
        StatusCode::NOT_FOUND.into_response()
    } else {
        StatusCode::NO_CONTENT.into_response()
    }
}

async fn list_categories(State(api): State<MockApi>, headers: HeaderMap) -> Response {
    if let Some(rejection) = api.rejection(&headers) {
        return rejection;
    }

    Json(api.data().categories.clone()).into_response()
}

async fn create_transaction(
    State(api): State<MockApi>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Some(rejection) = api.rejection(&headers) {
        return rejection;
    }

    let mut data = api.data();
    data.next_id += 1;
    let kind = match body["type"].as_str() {
        Some("INCOME") => TransactionType::Income,
        _ => TransactionType::Expense,
    };
    let category = body["categoryId"].as_str().and_then(|id| {
        data.categories
            .iter()
            .find(|category| category.id == id)
            .cloned()
    });
    let transaction = Transaction {
        id: format!("created-{}", data.next_id),
        description: body["description"].as_str().unwrap_or_default().to_owned(),
        amount: body["amount"].as_f64().unwrap_or_default(),
        kind,
        date: body["date"].as_str().unwrap_or_default().to_owned(),
        category,
    };

    data.created.push(body);
    data.transactions.push(transaction.clone());

    (StatusCode::CREATED, Json(transaction)).into_response()
}
