//! Transaction data aggregation for the dashboard.
//!
//! Provides pure functions to total transactions by type, group them by
//! category and bucket them by calendar month. All arithmetic is exact
//! decimal arithmetic, nothing is rounded.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Deserialize;
use time::{Date, Duration, Month};

use crate::{
    Error,
    category::CategoryDisplay,
    dashboard::transaction::Transaction,
    transaction::TransactionType,
};

/// The sum of the amounts of each transaction type.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(super) struct TypeTotals {
    pub income: Decimal,
    pub expense: Decimal,
    pub investment: Decimal,
}

impl TypeTotals {
    fn add(&mut self, transaction: &Transaction) -> Result<(), Error> {
        let total = match transaction.transaction_type {
            Some(TransactionType::Income) => &mut self.income,
            Some(TransactionType::Expense) => &mut self.expense,
            Some(TransactionType::Investment) => &mut self.investment,
            None => return Ok(()),
        };

        *total = checked_sum(*total, transaction.amount)?;

        Ok(())
    }

    /// Income minus expenses minus investments.
    ///
    /// # Errors
    ///
    /// Returns [Error::AmountOverflow] if the result does not fit in a [Decimal].
    pub fn balance(&self) -> Result<Decimal, Error> {
        self.income
            .checked_sub(self.expense)
            .and_then(|balance| balance.checked_sub(self.investment))
            .ok_or(Error::AmountOverflow)
    }
}

fn checked_sum(total: Decimal, amount: Decimal) -> Result<Decimal, Error> {
    total.checked_add(amount).ok_or(Error::AmountOverflow)
}

/// Totals the amounts of `transactions` by transaction type.
///
/// Transactions whose type is not recognised are left out of every total.
///
/// # Errors
///
/// Returns [Error::AmountOverflow] if a total does not fit in a [Decimal].
pub(super) fn totals_by_type(transactions: &[Transaction]) -> Result<TypeTotals, Error> {
    let mut totals = TypeTotals::default();

    for transaction in transactions {
        totals.add(transaction)?;
    }

    Ok(totals)
}

/// The total amount of the transactions in one category.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct CategoryTotal {
    pub category: CategoryDisplay,
    pub total: Decimal,
}

/// Totals the amounts of the `transaction_type` transactions in `transactions` by category.
///
/// Transactions without a category are left out. The result is ordered by
/// total, largest first, with ties ordered by category ID.
///
/// # Errors
///
/// Returns [Error::AmountOverflow] if a total does not fit in a [Decimal].
pub(super) fn totals_by_category(
    transactions: &[Transaction],
    transaction_type: TransactionType,
) -> Result<Vec<CategoryTotal>, Error> {
    let mut totals: HashMap<&str, Decimal> = HashMap::new();

    for transaction in transactions {
        if transaction.transaction_type != Some(transaction_type) {
            continue;
        }

        if let Some(category) = transaction.category.as_deref() {
            let total = totals.entry(category).or_default();
            *total = checked_sum(*total, transaction.amount)?;
        }
    }

    let mut totals: Vec<_> = totals.into_iter().collect();
    totals.sort_by(|(left_id, left_total), (right_id, right_total)| {
        right_total.cmp(left_total).then_with(|| left_id.cmp(right_id))
    });

    Ok(totals
        .into_iter()
        .map(|(id, total)| CategoryTotal {
            category: CategoryDisplay::new(id),
            total,
        })
        .collect())
}

/// The order of the monthly buckets.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum BucketOrder {
    /// Oldest month first, e.g. for charts.
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    /// Newest month first, e.g. for history lists.
    #[serde(rename = "desc")]
    Descending,
}

/// The totals of one calendar month.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct MonthlyBucket {
    /// The first day of the month.
    pub month: Date,
    pub totals: TypeTotals,
}

/// Totals `transactions` by type for each month in `months`.
///
/// `months` must hold the first day of each month, in ascending order, as
/// returned by [trailing_months]. Every month gets a bucket, even if it has
/// no transactions. Transactions outside of `months` are left out.
///
/// # Errors
///
/// Returns [Error::AmountOverflow] if a total does not fit in a [Decimal].
pub(super) fn bucket_by_month(
    transactions: &[Transaction],
    months: &[Date],
    order: BucketOrder,
) -> Result<Vec<MonthlyBucket>, Error> {
    let mut totals: HashMap<Date, TypeTotals> = months
        .iter()
        .map(|month| (*month, TypeTotals::default()))
        .collect();

    for transaction in transactions {
        if let Some(month_totals) = totals.get_mut(&month_start(transaction.date)) {
            month_totals.add(transaction)?;
        }
    }

    let buckets = months.iter().map(|month| MonthlyBucket {
        month: *month,
        totals: totals[month],
    });

    Ok(match order {
        BucketOrder::Ascending => buckets.collect(),
        BucketOrder::Descending => buckets.rev().collect(),
    })
}

/// The first day of the month containing `date`.
pub(super) fn month_start(date: Date) -> Date {
    date - Duration::days(i64::from(date.day()) - 1)
}

/// Move `month` by `delta` months, e.g. -1 for the previous month.
///
/// # Errors
///
/// Returns [Error::InvalidDate] if the result is out of the supported range of dates.
pub(super) fn add_months(month: Date, delta: i32) -> Result<Date, Error> {
    let out_of_range = || Error::InvalidDate(format!("{month} {delta:+} months"));

    let index = month.year() * 12 + i32::from(u8::from(month.month())) - 1 + delta;
    let year = index.div_euclid(12);
    let month_number = u8::try_from(index.rem_euclid(12) + 1).map_err(|_| out_of_range())?;
    let month_of_year = Month::try_from(month_number).map_err(|_| out_of_range())?;

    Date::from_calendar_date(year, month_of_year, 1).map_err(|_| out_of_range())
}

/// The first days of the `count` months up to and including the month of
/// `anchor`, oldest first.
///
/// # Errors
///
/// Returns [Error::InvalidDate] if the months are out of the supported range of dates.
pub(super) fn trailing_months(anchor: Date, count: u8) -> Result<Vec<Date>, Error> {
    let anchor_month = month_start(anchor);

    (0..i32::from(count))
        .rev()
        .map(|months_back| add_months(anchor_month, -months_back))
        .collect()
}

/// Formats the month of `date` as a three-letter abbreviation, e.g. "Jan".
pub(super) fn format_month_label(date: &Date) -> &'static str {
    match date.month() {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    }
}
