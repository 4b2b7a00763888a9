//! Transactions and categories from the finance API.
//!
//! This module contains:
//! - The `Transaction` and `Category` models exchanged with the finance API
//! - The page and endpoint for creating a transaction
//! - The endpoint for deleting a transaction from the dashboard

mod create_endpoint;
mod create_page;
mod delete_endpoint;
mod models;

pub use create_endpoint::create_transaction_endpoint;
pub use create_page::get_create_transaction_page;
pub use delete_endpoint::delete_transaction_endpoint;
pub use models::{Category, CategoryId, NewTransaction, Transaction, TransactionId, TransactionType};

#[cfg(test)]
pub(crate) use models::test_utils;
