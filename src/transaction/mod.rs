//! Transaction management for the finance tracker.
//!
//! This module contains everything related to transactions:
//! - The `Transaction` model, its type and amount, and `TransactionBuilder` for creating
//!   transactions
//! - Database functions for storing, querying, and managing transactions
//! - Validation of the transaction fields sent by clients
//! - Route handlers for listing, creating, editing and deleting transactions

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

mod amount;
mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod form;
mod kind;
mod list_endpoint;

pub use amount::Amount;
pub use core::{
    DEFAULT_METHOD, Transaction, TransactionBuilder, TransactionId, create_transaction,
    create_transaction_table, get_transaction,
};
pub use create_endpoint::create_transaction_endpoint;
pub use delete_endpoint::delete_transaction_endpoint;
pub use edit_endpoint::edit_transaction_endpoint;
pub use kind::{InvestmentType, TransactionKind, TransactionType};
pub use list_endpoint::get_transactions_endpoint;

#[cfg(test)]
pub(crate) use core::insert_raw_transaction;

/// The state needed by the transaction route handlers.
#[derive(Debug, Clone)]
pub struct TransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}
