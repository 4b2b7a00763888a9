//! Chart-driven narrowing of the transaction list.

use time::Date;

use crate::{dashboard::range::YearMonth, transaction::Transaction};

/// The chart element the user has selected, if any.
///
/// At most one kind of selection is active at a time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    None,
    Day(Date),
    Month(YearMonth),
    Category(String),
}

impl Selection {
    /// Select `day`, or clear the selection if `day` is already selected.
    pub fn toggle_day(&mut self, day: Date) {
        *self = match self {
            Selection::Day(selected) if *selected == day => Selection::None,
            _ => Selection::Day(day),
        };
    }

    /// Select `month`, or clear the selection if `month` is already selected.
    pub fn toggle_month(&mut self, month: YearMonth) {
        *self = match self {
            Selection::Month(selected) if *selected == month => Selection::None,
            _ => Selection::Month(month),
        };
    }

    /// Select the category `name`, or clear the selection if it is already selected.
    pub fn toggle_category(&mut self, name: &str) {
        *self = match self {
            Selection::Category(selected) if selected == name => Selection::None,
            _ => Selection::Category(name.to_owned()),
        };
    }

    pub fn clear(&mut self) {
        *self = Selection::None;
    }

    /// Whether `transaction` should be shown under this selection.
    pub fn matches(&self, transaction: &Transaction) -> bool {
        match self {
            Selection::None => true,
            Selection::Day(day) => transaction.day() == Some(*day),
            Selection::Month(month) => transaction.day().is_some_and(|day| month.contains(day)),
            Selection::Category(name) => transaction.category_name() == Some(name.as_str()),
        }
    }
}

/// The transactions that match `selection`, in their original order.
pub(super) fn apply_selection<'a>(
    transactions: &'a [Transaction],
    selection: &Selection,
) -> Vec<&'a Transaction> {
    transactions
        .iter()
        .filter(|transaction| selection.matches(transaction))
        .collect()
}

#[cfg(test)]
mod tests {
    use time::{Month, macros::date};

    use crate::{
        dashboard::{
            cross_filter::{Selection, apply_selection},
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
            expense("4", "2024-04-02T08:30:00", 20.0, None),
            expense("5", "", 5.0, Some("Other")),
        ]
    }

    fn ids(transactions: &[&Transaction]) -> Vec<String> {
        transactions.iter().map(|t| t.id.clone()).collect()
    }

    #[test]
    fn no_selection_returns_everything_in_order() {
        let transactions = example_transactions();

        let got = apply_selection(&transactions, &Selection::None);

        assert_eq!(ids(&got), vec!["1", "2", "3", "4", "5"]);
        assert!(
            got.iter()
                .zip(transactions.iter())
                .all(|(got, want)| std::ptr::eq(*got, want))
        );
    }

    #[test]
    fn category_selection_filters_and_toggles_off() {
        let transactions = example_transactions();
        let mut selection = Selection::None;

        selection.toggle_category("Food");
        let got = apply_selection(&transactions, &selection);
        assert_eq!(ids(&got), vec!["2", "3"]);

        selection.toggle_category("Food");
        assert_eq!(selection, Selection::None);
        assert_eq!(apply_selection(&transactions, &selection).len(), 5);
    }

    #[test]
    fn category_selection_never_matches_uncategorized() {
        let transactions = example_transactions();

        let got = apply_selection(&transactions, &Selection::Category("Other".to_owned()));

        assert_eq!(ids(&got), vec!["5"]);
    }

    #[test]
    fn category_selection_is_case_sensitive() {
        let transactions = example_transactions();

        let got = apply_selection(&transactions, &Selection::Category("food".to_owned()));

        assert!(got.is_empty());
    }

    #[test]
    fn day_selection_matches_day_key() {
        let transactions = example_transactions();

        let got = apply_selection(&transactions, &Selection::Day(date!(2024 - 03 - 01)));

        assert_eq!(ids(&got), vec!["1", "2"]);
    }

    #[test]
    fn day_selection_ignores_time_of_day() {
        let transactions = example_transactions();

        let got = apply_selection(&transactions, &Selection::Day(date!(2024 - 04 - 02)));

        assert_eq!(ids(&got), vec!["4"]);
    }

    #[test]
    fn month_selection_matches_whole_month() {
        let transactions = example_transactions();

        let got = apply_selection(
            &transactions,
            &Selection::Month(YearMonth::new(2024, Month::March)),
        );

        assert_eq!(ids(&got), vec!["1", "2", "3"]);
    }

    #[test]
    fn toggling_the_same_day_twice_clears_selection() {
        let mut selection = Selection::None;

        selection.toggle_day(date!(2024 - 03 - 01));
        assert_eq!(selection, Selection::Day(date!(2024 - 03 - 01)));

        selection.toggle_day(date!(2024 - 03 - 01));
        assert_eq!(selection, Selection::None);
    }

    #[test]
    fn toggling_a_different_day_replaces_selection() {
        let mut selection = Selection::Day(date!(2024 - 03 - 01));

        selection.toggle_day(date!(2024 - 03 - 02));

        assert_eq!(selection, Selection::Day(date!(2024 - 03 - 02)));
    }

    #[test]
    fn toggling_the_same_month_twice_clears_selection() {
        let month = YearMonth::new(2024, Month::March);
        let mut selection = Selection::None;

        selection.toggle_month(month);
        selection.toggle_month(month);

        assert_eq!(selection, Selection::None);
    }

    #[test]
    fn category_replaces_day_and_day_replaces_category() {
        let mut selection = Selection::Day(date!(2024 - 03 - 01));

        selection.toggle_category("Food");
        assert_eq!(selection, Selection::Category("Food".to_owned()));

        selection.toggle_day(date!(2024 - 03 - 01));
        assert_eq!(selection, Selection::Day(date!(2024 - 03 - 01)));
    }

    #[test]
    fn month_replaces_category() {
        let month = YearMonth::new(2024, Month::March);
        let mut selection = Selection::Category("Food".to_owned());

        selection.toggle_month(month);

        assert_eq!(selection, Selection::Month(month));
    }

    #[test]
    fn clear_resets_any_selection() {
        let mut selection = Selection::Category("Food".to_owned());

        selection.clear();

        assert_eq!(selection, Selection::None);
    }
}
