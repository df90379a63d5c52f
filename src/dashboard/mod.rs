//! Dashboard module
//!
//! Summarises a user's transactions: totals for a month, the expenses of
//! that month by category, and monthly totals over the preceding months.

mod aggregation;
mod handlers;
mod transaction;

pub use handlers::get_dashboard_stats;
