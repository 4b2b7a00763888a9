//! The per-session dashboard state and the operations that change it.

use time::Date;

use crate::{
    dashboard::{
        aggregation::{
            CategoryExpense, DailyFlow, FlowGranularity, MonthlyFlow, Summary,
            aggregate_category_expenses, aggregate_daily_flow, aggregate_monthly_flow,
            calculate_summary, flow_granularity,
        },
        cross_filter::{Selection, apply_selection},
        range::{DateRange, YearMonth, is_active_month, month_picker_anchors, month_range},
    },
    transaction::Transaction,
};

/// A request to load transactions for `range`.
///
/// Tickets are numbered in the order they are issued so that a response for
/// an older request can be recognised and discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub seq: u64,
    pub range: DateRange,
}

/// What happened when a fetch response was handed back to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    Stale,
}

/// A month offered by the quick-pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthOption {
    pub anchor: Date,
    pub is_active: bool,
}

impl MonthOption {
    pub fn month(&self) -> YearMonth {
        YearMonth::of(self.anchor)
    }
}

/// Everything the dashboard shows for one session.
///
/// The range and transactions only change together, when a fetch completes.
/// Charts, the summary and the filtered list are computed from the current
/// fields on every call.
#[derive(Debug, Clone)]
pub struct DashboardState {
    range: DateRange,
    month_anchors: Vec<Date>,
    transactions: Vec<Transaction>,
    selection: Selection,
    latest_seq: u64,
}

impl DashboardState {
    /// Create the state for a new session, showing the current month to date.
    pub fn new(today: Date) -> Self {
        Self {
            range: DateRange::month_to_date(today),
            month_anchors: month_picker_anchors(today),
            transactions: Vec::new(),
            selection: Selection::None,
            latest_seq: 0,
        }
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Issue a ticket to reload the current range.
    pub fn refresh(&mut self) -> FetchTicket {
        self.issue_ticket(self.range)
    }

    /// Issue a ticket to load `range`.
    pub fn set_range(&mut self, range: DateRange) -> FetchTicket {
        if range.is_inverted() {
            tracing::warn!(
                "Requested date range starts after it ends: {:?} > {:?}",
                range.start,
                range.end
            );
        }

        self.issue_ticket(range)
    }

    /// Issue a ticket for the current range with a new start date.
    ///
    /// `None` removes the lower bound.
    pub fn set_start_date(&mut self, start: Option<Date>) -> FetchTicket {
        self.set_range(DateRange::new(start, self.range.end))
    }

    /// Issue a ticket for the current range with a new end date.
    ///
    /// `None` removes the upper bound.
    pub fn set_end_date(&mut self, end: Option<Date>) -> FetchTicket {
        self.set_range(DateRange::new(self.range.start, end))
    }

    /// Issue a ticket for the whole calendar month containing `anchor`.
    pub fn select_month(&mut self, anchor: Date) -> FetchTicket {
        self.set_range(month_range(anchor))
    }

    /// Hand back the transactions loaded for `ticket`.
    ///
    /// Only the most recently issued ticket is applied. Applying it replaces
    /// the range and transactions and clears the selection.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        transactions: Vec<Transaction>,
    ) -> FetchOutcome {
        if ticket.seq != self.latest_seq {
            tracing::debug!(
                "Discarding stale fetch #{} (latest is #{})",
                ticket.seq,
                self.latest_seq
            );
            return FetchOutcome::Stale;
        }

        self.range = ticket.range;
        self.transactions = transactions;
        self.selection.clear();

        FetchOutcome::Applied
    }

    /// Toggle the day filter.
    pub fn select_day(&mut self, day: Date) {
        self.selection.toggle_day(day);
    }

    /// Toggle the month filter. This narrows the list and does not change the range.
    pub fn select_month_filter(&mut self, month: YearMonth) {
        self.selection.toggle_month(month);
    }

    /// Toggle the category filter.
    pub fn select_category(&mut self, name: &str) {
        self.selection.toggle_category(name);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// The transactions that match the current selection.
    pub fn filtered_transactions(&self) -> Vec<&Transaction> {
        apply_selection(&self.transactions, &self.selection)
    }

    pub fn daily_flow(&self) -> Vec<DailyFlow> {
        aggregate_daily_flow(&self.transactions)
    }

    pub fn monthly_flow(&self) -> Vec<MonthlyFlow> {
        aggregate_monthly_flow(&self.transactions)
    }

    pub fn flow_granularity(&self) -> FlowGranularity {
        flow_granularity(&self.transactions)
    }

    pub fn category_expenses(&self) -> Vec<CategoryExpense> {
        aggregate_category_expenses(&self.transactions)
    }

    /// Totals for all loaded transactions, ignoring the selection.
    pub fn summary(&self) -> Summary {
        calculate_summary(&self.transactions)
    }

    /// The quick-pick months with the month of the range start marked active.
    pub fn month_options(&self) -> Vec<MonthOption> {
        self.month_anchors
            .iter()
            .map(|&anchor| MonthOption {
                anchor,
                is_active: is_active_month(anchor, self.range),
            })
            .collect()
    }

    fn issue_ticket(&mut self, range: DateRange) -> FetchTicket {
        self.latest_seq += 1;

        FetchTicket {
            seq: self.latest_seq,
            range,
        }
    }
}
