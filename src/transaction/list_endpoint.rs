//! Defines the endpoint for listing the most recent transactions.

use axum::{Extension, Json, extract::State};

use crate::{
    Error, UserID,
    db::lock_connection,
    transaction::{Transaction, TransactionState, core::list_transactions},
};

/// The most transactions returned by a single request.
pub const MAX_LISTED_TRANSACTIONS: u32 = 50;

/// A route handler for listing the logged in user's most recent transactions, newest first.
pub async fn get_transactions_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
) -> Result<Json<Vec<Transaction>>, Error> {
    let connection = lock_connection(&state.db_connection)?;

    list_transactions(user_id, MAX_LISTED_TRANSACTIONS, &connection).map(Json)
}
