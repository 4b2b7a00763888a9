//! Transaction aggregation for the dashboard charts and summary cards.
//!
//! Provides pure functions that bucket transactions by day, by month and by
//! category, and that total income and expenses for a set of transactions.

use std::collections::{BTreeMap, HashMap};

use time::Date;

use crate::{
    dashboard::range::{YearMonth, days_between},
    transaction::Transaction,
};

/// The label used for expenses that have no category.
pub(super) const UNCATEGORIZED_LABEL: &str = "Other";

/// Data spanning more days than this is charted by month instead of by day.
const MAX_DAILY_SPAN_DAYS: i64 = 92;

/// Income and expense totals for one calendar day.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyFlow {
    pub day: Date,
    pub income: f64,
    pub expense: f64,
}

/// Income and expense totals for one calendar month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyFlow {
    pub month: YearMonth,
    pub income: f64,
    pub expense: f64,
}

/// The total spent in one expense category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryExpense {
    pub label: String,
    pub expense: f64,
}

/// Totals over a set of transactions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Summary {
    pub income: f64,
    pub expense: f64,
    pub net: f64,
    pub count: usize,
}

/// Whether the flow chart shows one bar per day or one bar per month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowGranularity {
    Daily,
    Monthly,
}

/// Adds a transaction's amount to the income or expense side of a bucket.
fn accumulate(income: &mut f64, expense: &mut f64, transaction: &Transaction) {
    if transaction.is_income() {
        *income += transaction.amount;
    } else {
        *expense += transaction.amount;
    }
}

/// Groups transactions by calendar day and totals income and expenses.
///
/// Transactions without a parseable date are skipped.
///
/// # Returns
/// One row per distinct day, in ascending order of day.
pub(super) fn aggregate_daily_flow(transactions: &[Transaction]) -> Vec<DailyFlow> {
    let mut totals: BTreeMap<Date, (f64, f64)> = BTreeMap::new();

    for transaction in transactions {
        let Some(day) = transaction.day() else {
            continue;
        };

        let (income, expense) = totals.entry(day).or_insert((0.0, 0.0));
        accumulate(income, expense, transaction);
    }

    totals
        .into_iter()
        .map(|(day, (income, expense))| DailyFlow {
            day,
            income,
            expense,
        })
        .collect()
}

/// Groups transactions by calendar month and totals income and expenses.
///
/// Transactions without a parseable date are skipped.
///
/// # Returns
/// One row per distinct month, in ascending order of month.
pub(super) fn aggregate_monthly_flow(transactions: &[Transaction]) -> Vec<MonthlyFlow> {
    let mut totals: BTreeMap<YearMonth, (f64, f64)> = BTreeMap::new();

    for transaction in transactions {
        let Some(day) = transaction.day() else {
            continue;
        };

        let (income, expense) = totals.entry(YearMonth::of(day)).or_insert((0.0, 0.0));
        accumulate(income, expense, transaction);
    }

    totals
        .into_iter()
        .map(|(month, (income, expense))| MonthlyFlow {
            month,
            income,
            expense,
        })
        .collect()
}

/// Picks the flow chart granularity from the span of dates in `transactions`.
pub(super) fn flow_granularity(transactions: &[Transaction]) -> FlowGranularity {
    let mut days = transactions.iter().filter_map(Transaction::day);

    let Some(first) = days.next() else {
        return FlowGranularity::Daily;
    };

    let (earliest, latest) = days.fold((first, first), |(earliest, latest), day| {
        (earliest.min(day), latest.max(day))
    });

    if days_between(earliest, latest) > MAX_DAILY_SPAN_DAYS {
        FlowGranularity::Monthly
    } else {
        FlowGranularity::Daily
    }
}

/// Groups expense transactions by category name and totals each group.
///
/// Income is ignored. Expenses without a category are grouped under
/// [UNCATEGORIZED_LABEL].
///
/// # Returns
/// One row per category, largest total first. Categories with equal totals
/// keep the order in which they first appear in `transactions`.
pub(super) fn aggregate_category_expenses(transactions: &[Transaction]) -> Vec<CategoryExpense> {
    let mut rows: Vec<CategoryExpense> = Vec::new();
    let mut row_index: HashMap<&str, usize> = HashMap::new();

    for transaction in transactions.iter().filter(|t| t.is_expense()) {
        let label = transaction.category_name().unwrap_or(UNCATEGORIZED_LABEL);

        match row_index.get(label) {
            Some(&index) => rows[index].expense += transaction.amount,
            None => {
                row_index.insert(label, rows.len());
                rows.push(CategoryExpense {
                    label: label.to_owned(),
                    expense: transaction.amount,
                });
            }
        }
    }

    // `sort_by` is stable, so ties stay in first-appearance order.
    rows.sort_by(|a, b| b.expense.total_cmp(&a.expense));
    rows
}

/// Totals income and expenses and counts the transactions.
pub(super) fn calculate_summary(transactions: &[Transaction]) -> Summary {
    let mut summary = Summary {
        count: transactions.len(),
        ..Summary::default()
    };

    for transaction in transactions {
        accumulate(&mut summary.income, &mut summary.expense, transaction);
    }

    summary.net = summary.income - summary.expense;
    summary
}

#[cfg(test)]
mod tests {
    use time::{Month, macros::date};

    use crate::{
        dashboard::{
            aggregation::{
                CategoryExpense, DailyFlow, FlowGranularity, MonthlyFlow, Summary,
                UNCATEGORIZED_LABEL, aggregate_category_expenses, aggregate_daily_flow,
                aggregate_monthly_flow, calculate_summary, flow_granularity,
            },
            range::YearMonth,
        },
        transaction::{
            Transaction,
            test_utils::{expense, income},
        },
    };

    fn example_transactions() -> Vec<Transaction> {
        vec![
            income("1", "2024-03-01", 1000.0),
            expense("2", "2024-03-01", 200.0, Some("Food")),
            expense("3", "2024-03-02", 50.0, Some("Food")),
        ]
    }

    fn mixed_transactions() -> Vec<Transaction> {
        vec![
            expense("1", "2024-03-05T10:00:00", 12.5, Some("Transport")),
            income("2", "2024-01-31", 300.0),
            expense("3", "2024-01-01", 80.0, None),
            expense("4", "2024-03-05", 40.0, Some("Food")),
            income("5", "not a date", 99.0),
            expense("6", "2024-02-29", 80.0, Some("Rent")),
            expense("7", "2024-02-10", 7.5, Some("Transport")),
        ]
    }

    fn sum_of(transactions: &[Transaction], is_income: bool) -> f64 {
        transactions
            .iter()
            .filter(|t| t.day().is_some() && t.is_income() == is_income)
            .map(|t| t.amount)
            .sum()
    }

    #[test]
    fn daily_flow_matches_example() {
        let got = aggregate_daily_flow(&example_transactions());

        assert_eq!(
            got,
            vec![
                DailyFlow {
                    day: date!(2024 - 03 - 01),
                    income: 1000.0,
                    expense: 200.0
                },
                DailyFlow {
                    day: date!(2024 - 03 - 02),
                    income: 0.0,
                    expense: 50.0
                },
            ]
        );
    }

    #[test]
    fn daily_flow_is_empty_for_no_transactions() {
        assert!(aggregate_daily_flow(&[]).is_empty());
    }

    #[test]
    fn daily_flow_preserves_totals_and_sorts_days() {
        let transactions = mixed_transactions();

        let got = aggregate_daily_flow(&transactions);

        let income_total: f64 = got.iter().map(|row| row.income).sum();
        let expense_total: f64 = got.iter().map(|row| row.expense).sum();
        assert_eq!(income_total, sum_of(&transactions, true));
        assert_eq!(expense_total, sum_of(&transactions, false));
        assert!(got.windows(2).all(|pair| pair[0].day < pair[1].day));
        assert_eq!(got.len(), 5);
    }

    #[test]
    fn daily_flow_merges_times_on_the_same_day() {
        let got = aggregate_daily_flow(&mixed_transactions());

        let march_fifth = got
            .iter()
            .find(|row| row.day == date!(2024 - 03 - 05))
            .expect("expected a row for 2024-03-05");
        assert_eq!(march_fifth.expense, 52.5);
    }

    #[test]
    fn monthly_flow_groups_by_month() {
        let got = aggregate_monthly_flow(&mixed_transactions());

        assert_eq!(
            got,
            vec![
                MonthlyFlow {
                    month: YearMonth::new(2024, Month::January),
                    income: 300.0,
                    expense: 80.0
                },
                MonthlyFlow {
                    month: YearMonth::new(2024, Month::February),
                    income: 0.0,
                    expense: 87.5
                },
                MonthlyFlow {
                    month: YearMonth::new(2024, Month::March),
                    income: 0.0,
                    expense: 52.5
                },
            ]
        );
    }

    #[test]
    fn monthly_flow_totals_equal_daily_flow_totals() {
        let transactions = mixed_transactions();

        let daily = aggregate_daily_flow(&transactions);
        let monthly = aggregate_monthly_flow(&transactions);

        let daily_totals = daily
            .iter()
            .fold((0.0, 0.0), |(i, e), row| (i + row.income, e + row.expense));
        let monthly_totals = monthly
            .iter()
            .fold((0.0, 0.0), |(i, e), row| (i + row.income, e + row.expense));
        assert_eq!(daily_totals, monthly_totals);
    }

    #[test]
    fn granularity_is_daily_for_short_spans() {
        assert_eq!(
            flow_granularity(&example_transactions()),
            FlowGranularity::Daily
        );
        assert_eq!(flow_granularity(&[]), FlowGranularity::Daily);
    }

    #[test]
    fn granularity_is_monthly_for_long_spans() {
        let transactions = vec![
            income("1", "2024-01-01", 1.0),
            income("2", "2024-04-03", 1.0),
        ];

        assert_eq!(flow_granularity(&transactions), FlowGranularity::Monthly);
    }

    #[test]
    fn granularity_boundary_is_inclusive_of_92_days() {
        let transactions = vec![
            income("1", "2024-01-01", 1.0),
            income("2", "2024-04-02", 1.0),
        ];

        assert_eq!(flow_granularity(&transactions), FlowGranularity::Daily);
    }

    #[test]
    fn category_expenses_match_example() {
        let got = aggregate_category_expenses(&example_transactions());

        assert_eq!(
            got,
            vec![CategoryExpense {
                label: "Food".to_owned(),
                expense: 250.0
            }]
        );
    }

    #[test]
    fn category_expenses_sorted_descending_with_other() {
        let got = aggregate_category_expenses(&mixed_transactions());

        let labels: Vec<&str> = got.iter().map(|row| row.label.as_str()).collect();
        // "Other" and "Rent" tie at 80, "Other" appears first.
        assert_eq!(labels, vec![UNCATEGORIZED_LABEL, "Rent", "Food", "Transport"]);
        assert!(got.windows(2).all(|pair| pair[0].expense >= pair[1].expense));
    }

    #[test]
    fn category_expenses_preserve_expense_total() {
        let transactions = mixed_transactions();

        let got = aggregate_category_expenses(&transactions);

        let want: f64 = transactions
            .iter()
            .filter(|t| t.is_expense())
            .map(|t| t.amount)
            .sum();
        let total: f64 = got.iter().map(|row| row.expense).sum();
        assert_eq!(total, want);
    }

    #[test]
    fn category_expenses_empty_without_expenses() {
        let transactions = vec![income("1", "2024-03-01", 10.0)];

        assert!(aggregate_category_expenses(&transactions).is_empty());
    }

    #[test]
    fn category_names_are_case_sensitive() {
        let transactions = vec![
            expense("1", "2024-03-01", 1.0, Some("food")),
            expense("2", "2024-03-01", 2.0, Some("Food")),
        ];

        let got = aggregate_category_expenses(&transactions);

        assert_eq!(got.len(), 2);
        assert_eq!(got[0].label, "Food");
    }

    #[test]
    fn summary_matches_example() {
        let got = calculate_summary(&example_transactions());

        assert_eq!(
            got,
            Summary {
                income: 1000.0,
                expense: 250.0,
                net: 750.0,
                count: 3
            }
        );
    }

    #[test]
    fn summary_counts_transactions_without_dates() {
        let got = calculate_summary(&mixed_transactions());

        assert_eq!(got.count, 7);
        assert_eq!(got.income, 399.0);
        assert_eq!(got.net, got.income - got.expense);
    }

    #[test]
    fn summary_of_nothing_is_zero() {
        assert_eq!(calculate_summary(&[]), Summary::default());
    }
}
