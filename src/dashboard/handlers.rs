//! Dashboard HTTP handlers.
//!
//! This module contains:
//! - The route handler for the dashboard statistics
//! - State, query and response types used by the handler

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    AppState, Error, UserID,
    dashboard::{
        aggregation::{
            BucketOrder, CategoryTotal, MonthlyBucket, add_months, bucket_by_month,
            format_month_label, month_start, totals_by_category, totals_by_type, trailing_months,
        },
        transaction::{Transaction, get_transactions_in_date_range},
    },
    db::lock_connection,
    extract::AppQuery,
    parse_date,
    timezone::get_local_offset,
    transaction::TransactionType,
};

/// The number of months in the monthly data when the client does not ask for a number.
const DEFAULT_MONTH_COUNT: u8 = 6;
/// The most months the monthly data can cover.
const MAX_MONTH_COUNT: u8 = 24;

/// The state needed for computing the dashboard statistics.
///
/// Contains the database connection and timezone information required
/// by dashboard handlers.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "America/Sao_Paulo".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The query parameters for the dashboard statistics.
#[derive(Debug, Default, Deserialize)]
pub struct StatsQuery {
    /// A date in the month to compute the statistics for, defaults to today.
    pub anchor: Option<String>,
    /// How many months the monthly data should cover, ending at the anchor month.
    pub months: Option<u8>,
    /// The order of the monthly data.
    pub order: Option<BucketOrder>,
}

/// The totals for one month of the monthly data.
#[derive(Debug, Serialize)]
pub struct MonthlyData {
    /// The month, e.g. "2024-03".
    month: String,
    /// The abbreviated month name, e.g. "Mar".
    label: &'static str,
    #[serde(with = "rust_decimal::serde::float")]
    income: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    expense: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    investment: Decimal,
}

impl From<&MonthlyBucket> for MonthlyData {
    fn from(bucket: &MonthlyBucket) -> Self {
        Self {
            month: format!("{}-{:02}", bucket.month.year(), u8::from(bucket.month.month())),
            label: format_month_label(&bucket.month),
            income: bucket.totals.income,
            expense: bucket.totals.expense,
            investment: bucket.totals.investment,
        }
    }
}

/// The expenses of one category in the anchor month.
#[derive(Debug, Serialize)]
pub struct CategoryBreakdown {
    /// The category ID.
    category: String,
    name: String,
    emoji: &'static str,
    #[serde(with = "rust_decimal::serde::float")]
    value: Decimal,
}

impl From<CategoryTotal> for CategoryBreakdown {
    fn from(total: CategoryTotal) -> Self {
        Self {
            category: total.category.id,
            name: total.category.name,
            emoji: total.category.emoji,
            value: total.total,
        }
    }
}

/// The statistics shown on the dashboard.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// Income minus expenses minus investments in the anchor month.
    #[serde(with = "rust_decimal::serde::float")]
    balance: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    total_income: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    total_expense: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    total_investment: Decimal,
    monthly_data: Vec<MonthlyData>,
    expenses_by_category: Vec<CategoryBreakdown>,
}

/// Display the dashboard statistics for the logged in user.
///
/// The totals and the expenses by category cover the anchor month. The
/// monthly data covers the months up to and including the anchor month.
///
/// # Errors
///
/// Returns a 400 error if the anchor is not a date or the number of months
/// is out of range.
pub async fn get_dashboard_stats(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserID>,
    AppQuery(query): AppQuery<StatsQuery>,
) -> Result<Json<DashboardStats>, Error> {
    let month_count = query.months.unwrap_or(DEFAULT_MONTH_COUNT);
    if !(1..=MAX_MONTH_COUNT).contains(&month_count) {
        return Err(Error::InvalidMonthCount {
            got: month_count,
            max: MAX_MONTH_COUNT,
        });
    }

    let anchor = match query.anchor.as_deref() {
        Some(raw_anchor) => parse_date(raw_anchor)?,
        None => get_local_date(&state.local_timezone)?,
    };
    let anchor_month = month_start(anchor);
    let months = trailing_months(anchor, month_count)?;
    let first_month = months.first().copied().unwrap_or(anchor_month);
    let after_last_month = add_months(anchor_month, 1)?;

    let transactions = {
        let connection = lock_connection(&state.db_connection)?;
        get_transactions_in_date_range(user_id, first_month..after_last_month, &connection)?
    };

    build_dashboard_stats(
        &transactions,
        anchor_month,
        &months,
        query.order.unwrap_or_default(),
    )
    .map(Json)
}

/// Today's date in `local_timezone`.
fn get_local_date(local_timezone: &str) -> Result<Date, Error> {
    let local_offset = get_local_offset(local_timezone)
        .ok_or_else(|| Error::InvalidTimezoneError(local_timezone.to_owned()))?;

    Ok(OffsetDateTime::now_utc().to_offset(local_offset).date())
}

fn build_dashboard_stats(
    transactions: &[Transaction],
    anchor_month: Date,
    months: &[Date],
    order: BucketOrder,
) -> Result<DashboardStats, Error> {
    let anchor_month_transactions: Vec<Transaction> = transactions
        .iter()
        .filter(|transaction| month_start(transaction.date) == anchor_month)
        .cloned()
        .collect();
    let totals = totals_by_type(&anchor_month_transactions)?;

    Ok(DashboardStats {
        balance: totals.balance()?,
        total_income: totals.income,
        total_expense: totals.expense,
        total_investment: totals.investment,
        monthly_data: bucket_by_month(transactions, months, order)?
            .iter()
            .map(MonthlyData::from)
            .collect(),
        expenses_by_category: totals_by_category(
            &anchor_month_transactions,
            TransactionType::Expense,
        )?
        .into_iter()
        .map(CategoryBreakdown::from)
        .collect(),
    })
}
