//! Dashboard module
//!
//! Provides an overview page with income and expense charts, a summary of
//! the selected date range and the list of transactions. Clicking a chart
//! narrows the list to a day, month or category.

mod aggregation;
mod cards;
mod charts;
mod cross_filter;
mod handlers;
mod range;
mod session;
mod state;
mod tables;

pub use handlers::{
    DashboardPageState, get_dashboard_page, post_clear_selection, post_dashboard_month,
    post_dashboard_range, post_select_category, post_select_day, post_select_month,
    refresh_dashboard_content,
};
pub use range::DateRange;
pub use session::{SessionKey, SessionStore};
