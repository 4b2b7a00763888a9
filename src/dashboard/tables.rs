//! Table views for the dashboard's transaction list.
//!
//! Provides the list of transactions narrowed by the chart selection and a
//! banner describing the active selection.

use maud::{Markup, html};

use crate::{
    dashboard::{charts::DASHBOARD_CONTENT_ID, cross_filter::Selection, range::format_day},
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DELETE_STYLE, BUTTON_SECONDARY_STYLE, CATEGORY_BADGE_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, format_currency,
    },
    transaction::Transaction,
};

const INCOME_AMOUNT_STYLE: &str = "text-green-600 dark:text-green-400";
const EXPENSE_AMOUNT_STYLE: &str = "text-red-600 dark:text-red-400";

/// Describes the active selection, e.g. "Showing transactions on 05/03/2024".
fn selection_description(selection: &Selection) -> Option<String> {
    match selection {
        Selection::None => None,
        Selection::Day(day) => Some(format!("Showing transactions on {}", format_day(*day))),
        Selection::Month(month) => Some(format!("Showing transactions in {}", month.label())),
        Selection::Category(name) => Some(format!("Showing expenses in \"{name}\"")),
    }
}

/// Renders the banner for the active chart selection with a button to clear it.
///
/// Renders nothing when no selection is active.
pub(super) fn selection_banner(selection: &Selection) -> Markup {
    let Some(description) = selection_description(selection) else {
        return html! {};
    };

    html! {
        div
            id="selection-banner"
            class="w-full flex justify-between items-center mb-4 p-3 rounded-lg
                bg-blue-50 dark:bg-gray-800 text-blue-800 dark:text-blue-300"
        {
            span { (description) }

            button
                type="button"
                hx-post=(endpoints::CLEAR_SELECTION)
                hx-target={"#" (DASHBOARD_CONTENT_ID)}
                hx-target-error="#alert-container"
                hx-swap="innerHTML"
                class=(BUTTON_SECONDARY_STYLE)
            {
                "Clear filter"
            }
        }
    }
}

/// Renders the transactions that match the active selection.
pub(super) fn transactions_table(transactions: &[&Transaction]) -> Markup {
    html! {
        section id="transactions" class="w-full mx-auto mb-8"
        {
            h3 class="text-xl font-semibold mb-4" { "Transactions" }

            div class="overflow-x-auto rounded-lg shadow"
            {
                table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                            th scope="col" class={(TABLE_CELL_STYLE) " text-right"} { "Amount" }
                            th scope="col" class=(TABLE_CELL_STYLE) { span class="sr-only" { "Actions" } }
                        }
                    }

                    tbody
                    {
                        @for transaction in transactions {
                            (transaction_row(transaction))
                        }

                        @if transactions.is_empty() {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                td colspan="5" class={(TABLE_CELL_STYLE) " text-center"}
                                {
                                    "No transactions in this period."
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn transaction_row(transaction: &Transaction) -> Markup {
    let date = transaction
        .day()
        .map(format_day)
        .unwrap_or_else(|| transaction.date.clone());
    let (sign, amount_style) = if transaction.is_income() {
        ("", INCOME_AMOUNT_STYLE)
    } else {
        ("-", EXPENSE_AMOUNT_STYLE)
    };
    let delete_url = format_endpoint(endpoints::TRANSACTION, &transaction.id);

    html! {
        tr class=(TABLE_ROW_STYLE) data-transaction-id=(transaction.id)
        {
            td class={(TABLE_CELL_STYLE) " whitespace-nowrap"} { (date) }
            td class=(TABLE_CELL_STYLE) { (transaction.description) }
            td class=(TABLE_CELL_STYLE)
            {
                @if let Some(name) = transaction.category_name() {
                    span class=(CATEGORY_BADGE_STYLE) { (name) }
                } @else {
                    span class="text-gray-400" { "-" }
                }
            }
            td class={(TABLE_CELL_STYLE) " text-right whitespace-nowrap " (amount_style)}
            {
                (sign) (format_currency(transaction.amount))
            }
            td class=(TABLE_CELL_STYLE)
            {
                button
                    type="button"
                    hx-delete=(delete_url)
                    hx-confirm={"Delete \"" (transaction.description) "\"?"}
                    hx-target={"#" (DASHBOARD_CONTENT_ID)}
                    hx-target-error="#alert-container"
                    hx-swap="innerHTML"
                    class=(BUTTON_DELETE_STYLE)
                {
                    "Delete"
                }
            }
        }
    }
}
