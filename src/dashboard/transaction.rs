//! Database queries for retrieving dashboard transaction data.
//!
//! This module provides a simplified transaction view optimized for dashboard
//! aggregations, containing only the fields needed for the totals (amount,
//! date, type and category).

use std::ops::Range;

use rust_decimal::Decimal;
use rusqlite::{Connection, params};
use time::Date;

use crate::{Amount, Error, UserID, transaction::TransactionType};

/// A simplified transaction view for dashboard aggregations.
///
/// This is separate from the main Transaction domain model because the
/// dashboard must cope with rows whose type is not recognised, which are
/// skipped by the aggregations instead of failing the request.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct Transaction {
    pub amount: Decimal,
    pub date: Date,
    /// `None` if the stored type is not one of the known transaction types.
    pub transaction_type: Option<TransactionType>,
    pub category: Option<String>,
}

/// Gets the transactions of `user_id` with a date in `date_range`.
///
/// The range excludes its end, e.g. use the first day of the next month to
/// include the whole of the last month.
///
/// # Errors
/// Returns [Error::SqlError] if:
/// - Database connection fails
/// - SQL query preparation or execution fails
pub(super) fn get_transactions_in_date_range(
    user_id: UserID,
    date_range: Range<Date>,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let mut stmt = connection.prepare(
        "SELECT amount, date, type, category
        FROM \"transaction\"
        WHERE user_id = ?1 AND date >= ?2 AND date < ?3",
    )?;

    stmt.query_map(
        params![user_id.as_i64(), date_range.start, date_range.end],
        |row| {
            let amount: Amount = row.get(0)?;
            let raw_type: String = row.get(2)?;

            Ok(Transaction {
                amount: amount.as_decimal(),
                date: row.get(1)?,
                transaction_type: raw_type.parse().ok(),
                category: row.get(3)?,
            })
        },
    )?
    .collect::<Result<Vec<Transaction>, rusqlite::Error>>()
    .map_err(|error| error.into())
}
