//! The transaction and category models exchanged with the finance API.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

/// The opaque ID the finance API assigns to a transaction.
pub type TransactionId = String;

/// The opaque ID the finance API assigns to a category.
pub type CategoryId = String;

/// The format of the day key at the start of a transaction's date string.
const DAY_KEY_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// The number of characters in a `YYYY-MM-DD` day key.
const DAY_KEY_LENGTH: usize = 10;

/// Whether money came in or went out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Money received.
    Income,
    /// Money spent.
    Expense,
}

impl TransactionType {
    /// The value used by the API and in query strings, e.g. "INCOME".
    pub fn as_query_value(self) -> &'static str {
        match self {
            Self::Income => "INCOME",
            Self::Expense => "EXPENSE",
        }
    }

    /// A human readable label for the type.
    pub fn label(self) -> &'static str {
        match self {
            Self::Income => "Income",
            Self::Expense => "Expense",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_query_value())
    }
}

/// A named grouping for transactions, typed to either income or expenses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    /// The ID of the category.
    pub id: CategoryId,
    /// The display name of the category.
    pub name: String,
    /// The type of transaction this category may be attached to.
    #[serde(rename = "type")]
    pub kind: TransactionType,
}

/// A single dated money movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// A text description of what the transaction was for.
    #[serde(default)]
    pub description: String,
    /// The amount of money, always non-negative. The direction is given by `kind`.
    pub amount: f64,
    /// Whether the transaction is income or an expense.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// The date as sent by the API, `YYYY-MM-DD` optionally followed by a time.
    #[serde(default)]
    pub date: String,
    /// The category, if the transaction has been categorised.
    #[serde(default)]
    pub category: Option<Category>,
}

impl Transaction {
    /// The calendar day of the transaction.
    ///
    /// Only the first ten characters of the date string are considered, so
    /// a trailing time of day is ignored. Returns `None` if the date is
    /// missing or cannot be parsed.
    pub fn day(&self) -> Option<Date> {
        let day_key = self.date.get(..DAY_KEY_LENGTH)?;

        Date::parse(day_key, DAY_KEY_FORMAT).ok()
    }

    /// The name of the transaction's category, if it has one.
    pub fn category_name(&self) -> Option<&str> {
        self.category.as_ref().map(|category| category.name.as_str())
    }

    /// Whether this transaction is income.
    pub fn is_income(&self) -> bool {
        self.kind == TransactionType::Income
    }

    /// Whether this transaction is an expense.
    pub fn is_expense(&self) -> bool {
        self.kind == TransactionType::Expense
    }
}

/// The request body for creating a transaction through the finance API.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    /// Text detailing the transaction.
    pub description: String,
    /// The non-negative amount of money.
    pub amount: f64,
    /// When the transaction happened.
    pub date: Date,
    /// Whether the transaction is income or an expense.
    #[serde(rename = "type")]
    pub kind: TransactionType,
    /// The category to attach, `null` for none.
    pub category_id: Option<CategoryId>,
}


#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::{NewTransaction, Transaction, TransactionType, test_utils::expense};

    #[test]
    fn deserializes_api_transaction() {
        let json = r#"{
            "id": "6f1c",
            "description": "Groceries",
            "amount": 42.5,
            "type": "EXPENSE",
            "date": "2024-03-01",
            "category": {"id": "c1", "name": "Food", "type": "EXPENSE"}
        }"#;

        let transaction: Transaction = serde_json::from_str(json).unwrap();

        assert_eq!(transaction.id, "6f1c");
        assert_eq!(transaction.kind, TransactionType::Expense);
        assert_eq!(transaction.amount, 42.5);
        assert_eq!(transaction.category_name(), Some("Food"));
        assert_eq!(transaction.day(), Some(date!(2024 - 03 - 01)));
    }

    #[test]
    fn deserializes_transaction_without_category() {
        let json = r#"{"id": "1", "description": "Salary", "amount": 1000, "type": "INCOME", "date": "2024-03-01"}"#;

        let transaction: Transaction = serde_json::from_str(json).unwrap();

        assert!(transaction.is_income());
        assert_eq!(transaction.category, None);
        assert_eq!(transaction.category_name(), None);
    }

    #[test]
    fn deserializes_transaction_with_null_category_and_missing_date() {
        let json = r#"{"id": "1", "amount": 5, "type": "EXPENSE", "category": null}"#;

        let transaction: Transaction = serde_json::from_str(json).unwrap();

        assert_eq!(transaction.category, None);
        assert_eq!(transaction.date, "");
        assert_eq!(transaction.day(), None);
    }

    #[test]
    fn day_ignores_time_of_day() {
        let transaction = expense("1", "2024-03-01T23:59:59.000Z", 10.0, None);

        assert_eq!(transaction.day(), Some(date!(2024 - 03 - 01)));
    }

    #[test]
    fn day_is_none_for_unparseable_date() {
        for bad_date in ["", "2024-03", "yesterday!", "2024-13-01", "2023-02-29"] {
            let transaction = expense("1", bad_date, 10.0, None);

            assert_eq!(transaction.day(), None, "expected no day for {bad_date:?}");
        }
    }

    #[test]
    fn serializes_new_transaction_for_api() {
        let new_transaction = NewTransaction {
            description: "Coffee".to_owned(),
            amount: 4.5,
            date: date!(2024 - 03 - 02),
            kind: TransactionType::Expense,
            category_id: None,
        };

        let json = serde_json::to_value(&new_transaction).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "description": "Coffee",
                "amount": 4.5,
                "date": "2024-03-02",
                "type": "EXPENSE",
                "categoryId": null,
            })
        );
    }
}
