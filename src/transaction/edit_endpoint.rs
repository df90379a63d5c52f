//! Defines the endpoint for replacing the fields of a transaction.

use axum::{Extension, Json, extract::State};
use serde::Deserialize;

use crate::{
    Error, UserID,
    db::lock_connection,
    extract::AppJson,
    transaction::{
        Transaction, TransactionState,
        core::{TransactionId, update_transaction},
        form::TransactionForm,
    },
};

/// The ID of the transaction to edit and its new fields.
#[derive(Debug, Deserialize)]
pub struct EditTransactionForm {
    pub id: Option<TransactionId>,
    #[serde(flatten)]
    pub fields: TransactionForm,
}

/// A route handler for replacing every field of one of the logged in user's transactions.
///
/// # Errors
///
/// Returns:
/// - a 400 error if the ID is missing or the fields are invalid,
/// - a 404 error if the transaction does not exist or belongs to another user.
pub async fn edit_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    AppJson(form): AppJson<EditTransactionForm>,
) -> Result<Json<Transaction>, Error> {
    let id = form.id.ok_or(Error::MissingFields)?;
    let builder = form.fields.validate()?;
    let connection = lock_connection(&state.db_connection)?;

    update_transaction(id, user_id, builder, &connection).map(Json)
}
