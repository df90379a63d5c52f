//! Defines the endpoint for creating a new transaction.

use axum::{Extension, Json, extract::State, http::StatusCode};

use crate::{
    Error, UserID,
    db::lock_connection,
    extract::AppJson,
    transaction::{Transaction, TransactionState, core::create_transaction, form::TransactionForm},
};

/// A route handler for creating a new transaction owned by the logged in user.
///
/// Responds with the stored transaction, including its generated ID.
///
/// # Errors
///
/// Returns a 400 error if the form is invalid, see [TransactionForm::validate].
pub async fn create_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    AppJson(form): AppJson<TransactionForm>,
) -> Result<(StatusCode, Json<Transaction>), Error> {
    let builder = form.validate()?;
    let connection = lock_connection(&state.db_connection)?;

    let transaction = create_transaction(builder, user_id, &connection)?;
    tracing::debug!("User {user_id} created transaction {}", transaction.id);

    Ok((StatusCode::CREATED, Json(transaction)))
}
