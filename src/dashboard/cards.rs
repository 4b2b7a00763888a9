//! Card components for displaying the summary of the loaded transactions.
//!
//! Shows total income, total expenses and the net balance for the active
//! date range, plus the number of records loaded.

use maud::{Markup, html};

use crate::{dashboard::aggregation::Summary, html::format_currency};

const CARD_STYLE: &str = "bg-white dark:bg-gray-800 border border-gray-200 \
    dark:border-gray-700 rounded-lg p-4 shadow-md flex flex-col gap-2";
const CARD_TITLE_STYLE: &str = "text-sm font-medium text-gray-600 dark:text-gray-400";
const AMOUNT_STYLE: &str = "text-2xl font-bold";
const INCOME_STYLE: &str = "text-green-600 dark:text-green-400";
const EXPENSE_STYLE: &str = "text-red-600 dark:text-red-400";

/// The style for the net balance, which only depends on its sign.
fn net_style(net: f64) -> &'static str {
    if net >= 0.0 {
        INCOME_STYLE
    } else {
        EXPENSE_STYLE
    }
}

/// Renders the income, expense and net balance cards.
///
/// The totals always cover every loaded transaction, regardless of any chart selection.
pub(super) fn summary_cards_view(summary: &Summary) -> Markup {
    html! {
        section id="summary" class="w-full mx-auto mb-4"
        {
            div class="grid grid-cols-1 sm:grid-cols-3 gap-4"
            {
                (summary_card("Income", summary.income, INCOME_STYLE))
                (summary_card("Expenses", summary.expense, EXPENSE_STYLE))
                (summary_card("Net Balance", summary.net, net_style(summary.net)))
            }

            p id="record-count" class="mt-2 text-sm text-gray-600 dark:text-gray-400"
            {
                (record_count_label(summary.count))
            }
        }
    }
}

fn summary_card(title: &str, amount: f64, amount_style: &str) -> Markup {
    html! {
        div class=(CARD_STYLE) data-card=(title)
        {
            h4 class=(CARD_TITLE_STYLE) { (title) }
            span class={(AMOUNT_STYLE) " " (amount_style)} { (format_currency(amount)) }
        }
    }
}

fn record_count_label(count: usize) -> String {
    match count {
        1 => "Showing 1 record".to_owned(),
        count => format!("Showing {count} records"),
    }
}
