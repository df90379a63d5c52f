//! Defines the core data models and database queries for transactions.
//!
//! Every query is scoped to the owner of the transactions, a transaction that
//! belongs to another user is indistinguishable from one that does not exist.

use rusqlite::{Connection, Row, params};
use serde::Serialize;
use time::{Date, OffsetDateTime};

use crate::{
    Error, UserID,
    transaction::{Amount, TransactionKind},
};

/// Alias for the integer type used for transaction IDs.
pub type TransactionId = i64;

time::serde::format_description!(date_format, Date, "[year]-[month]-[day]");

// ============================================================================
// MODELS
// ============================================================================

/// An income, expense or investment, i.e. an event where money was earned,
/// spent or put aside.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// A short description shown in lists, e.g. "Salário".
    pub title: String,
    /// How much money was earned, spent or invested.
    pub amount: Amount,
    /// The type of the transaction and the details specific to that type.
    #[serde(flatten)]
    pub kind: TransactionKind,
    /// How the money moved, e.g. "pix", "card" or "cash".
    pub method: String,
    /// The ID of the category in the category catalog.
    pub category: Option<String>,
    /// When the transaction happened.
    #[serde(with = "date_format")]
    pub date: Date,
    /// When the transaction was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// The user that owns the transaction.
    pub user_id: UserID,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        title: &str,
        amount: Amount,
        kind: TransactionKind,
        date: Date,
    ) -> TransactionBuilder {
        TransactionBuilder {
            title: title.to_owned(),
            amount,
            kind,
            method: DEFAULT_METHOD.to_owned(),
            category: None,
            date,
        }
    }
}

/// The payment method used when none is given.
pub const DEFAULT_METHOD: &str = "pix";

/// A builder for creating [Transaction] instances.
///
/// The builder holds every field the user controls, so the same builder is
/// used both to create a transaction and to replace the fields of an existing one.
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// A short description of the transaction.
    pub title: String,

    /// How much money moved, always positive.
    pub amount: Amount,

    /// The type of the transaction.
    pub kind: TransactionKind,

    /// The payment channel, e.g. "pix", "card", "boleto".
    ///
    /// This is an open set of labels, any non-empty string is accepted.
    pub method: String,

    /// The ID of an entry in the category catalog.
    ///
    /// The request layer checks that the ID exists before it reaches the
    /// database, the table itself does not constrain it.
    pub category: Option<String>,

    /// The date when the transaction occurred.
    pub date: Date,
}

impl TransactionBuilder {
    /// Set the payment method for the transaction.
    pub fn method(mut self, method: &str) -> Self {
        self.method = method.to_owned();
        self
    }

    /// Set the category for the transaction.
    pub fn category(mut self, category: Option<&str>) -> Self {
        self.category = category.map(str::to_owned);
        self
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const TRANSACTION_COLUMNS: &str =
    "id, title, amount, type, investment_type, method, category, date, created_at, user_id";

/// Create a new transaction owned by `user_id`.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error,
/// e.g. `user_id` does not refer to a user.
pub fn create_transaction(
    builder: TransactionBuilder,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "INSERT INTO \"transaction\"
             (title, amount, type, investment_type, method, category, date, created_at, user_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            params![
                builder.title,
                builder.amount,
                builder.kind.transaction_type(),
                builder.kind.investment_type(),
                builder.method,
                builder.category,
                builder.date,
                OffsetDateTime::now_utc(),
                user_id.as_i64(),
            ],
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Retrieve the transaction `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" WHERE id = ?1 AND user_id = ?2"
        ))?
        .query_row(params![id, user_id.as_i64()], map_transaction_row)?;

    Ok(transaction)
}

/// Get the `limit` most recent transactions of `user_id`.
///
/// Transactions are ordered by date, newest first. Transactions on the same
/// date are ordered by ID, most recently created first.
///
/// Rows that cannot be read as a [Transaction], e.g. rows with an unknown
/// type written by an older version, are logged and left out.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error.
pub fn list_transactions(
    user_id: UserID,
    limit: u32,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    let mut statement = connection.prepare(&format!(
        "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\"
         WHERE user_id = ?1
         ORDER BY date DESC, id DESC
         LIMIT ?2"
    ))?;
    let rows = statement.query_map(params![user_id.as_i64(), limit], map_transaction_row)?;

    let mut transactions = Vec::new();
    for row in rows {
        match row {
            Ok(transaction) => transactions.push(transaction),
            Err(
                error @ (rusqlite::Error::FromSqlConversionFailure(..)
                | rusqlite::Error::InvalidColumnType(..)),
            ) => {
                tracing::warn!("Skipping unreadable transaction of user {user_id}: {error}");
            }
            Err(error) => return Err(error.into()),
        }
    }

    Ok(transactions)
}

/// Replace every user controlled field of the transaction `id` owned by `user_id`.
///
/// The ID, owner and creation time are kept.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn update_transaction(
    id: TransactionId,
    user_id: UserID,
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(&format!(
            "UPDATE \"transaction\"
             SET title = ?1, amount = ?2, type = ?3, investment_type = ?4, method = ?5,
                 category = ?6, date = ?7
             WHERE id = ?8 AND user_id = ?9
             RETURNING {TRANSACTION_COLUMNS}"
        ))?
        .query_row(
            params![
                builder.title,
                builder.amount,
                builder.kind.transaction_type(),
                builder.kind.investment_type(),
                builder.method,
                builder.category,
                builder.date,
                id,
                user_id.as_i64(),
            ],
            map_transaction_row,
        )?;

    Ok(transaction)
}

/// Delete the transaction `id` owned by `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a transaction owned by `user_id`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn delete_transaction(
    id: TransactionId,
    user_id: UserID,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM \"transaction\" WHERE id = ?1 AND user_id = ?2",
        params![id, user_id.as_i64()],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Get the number of transactions owned by `user_id`.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
#[cfg(test)]
pub fn count_transactions(user_id: UserID, connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM \"transaction\" WHERE user_id = ?1",
            [user_id.as_i64()],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Insert a transaction row without any validation, as an older version or
/// another tool might have written it.
#[cfg(test)]
pub(crate) fn insert_raw_transaction(
    connection: &Connection,
    user_id: UserID,
    transaction_type: &str,
    amount: &str,
    date: Date,
) -> TransactionId {
    connection
        .query_row(
            "INSERT INTO \"transaction\" (title, amount, type, method, date, created_at, user_id)
             VALUES ('Legado', ?1, ?2, 'pix', ?3, ?4, ?5)
             RETURNING id",
            params![
                amount,
                transaction_type,
                date,
                OffsetDateTime::now_utc(),
                user_id.as_i64()
            ],
            |row| row.get(0),
        )
        .unwrap()
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                amount TEXT NOT NULL,
                type TEXT NOT NULL,
                investment_type TEXT,
                method TEXT NOT NULL,
                category TEXT,
                date TEXT NOT NULL,
                created_at TEXT NOT NULL,
                user_id INTEGER NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Used by the transaction list and the dashboard.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_user_date ON \"transaction\"(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
///
/// The row must contain the columns in [TRANSACTION_COLUMNS], in that order.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let title = row.get(1)?;
    let amount = row.get(2)?;
    let transaction_type = row.get(3)?;
    let investment_type = row.get(4)?;
    let method = row.get(5)?;
    let category = row.get(6)?;
    let date = row.get(7)?;
    let created_at = row.get(8)?;
    let user_id = UserID::new(row.get(9)?);

    let kind = TransactionKind::new(transaction_type, investment_type).map_err(|error| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(error))
    })?;

    Ok(Transaction {
        id,
        title,
        amount,
        kind,
        method,
        category,
        date,
        created_at,
        user_id,
    })
}

// ============================================================================
// TESTS
// ============================================================================
