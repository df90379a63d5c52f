//! Defines the endpoint for deleting a transaction.

use axum::{Extension, Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    Error, UserID,
    db::lock_connection,
    extract::AppQuery,
    transaction::{
        TransactionState,
        core::{TransactionId, delete_transaction},
    },
};

/// The query parameters for deleting a transaction.
#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    pub id: Option<TransactionId>,
}

/// A route handler for deleting one of the logged in user's transactions.
///
/// # Errors
///
/// Returns:
/// - a 400 error if the ID is missing or not an integer,
/// - a 404 error if the transaction does not exist or belongs to another user.
pub async fn delete_transaction_endpoint(
    State(state): State<TransactionState>,
    Extension(user_id): Extension<UserID>,
    AppQuery(query): AppQuery<DeleteQuery>,
) -> Result<Json<Value>, Error> {
    let id = query.id.ok_or(Error::MissingFields)?;
    let connection = lock_connection(&state.db_connection)?;

    delete_transaction(id, user_id, &connection)?;
    tracing::debug!("User {user_id} deleted transaction {id}");

    Ok(Json(json!({ "id": id })))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use time::macros::date;

    use crate::{
        Error, Transaction, TransactionKind, endpoints,
        test_utils::TestApp,
        transaction::{core::create_transaction, get_transaction},
    };

    fn rent() -> crate::TransactionBuilder {
        let amount = "1500".parse().unwrap();
        Transaction::build("Aluguel", amount, TransactionKind::Expense, date!(2024 - 03 - 01))
            .category(Some("rent"))
    }

    #[tokio::test]
    async fn can_delete_transaction() {
        let app = TestApp::new();
        let (user_id, cookie) = app.create_user_and_log_in("ana@example.com", "ana").await;
        let created =
            create_transaction(rent(), user_id, &app.state.db_connection.lock().unwrap()).unwrap();

        let response = app
            .server
            .delete(endpoints::TRANSACTIONS)
            .add_query_param("id", created.id)
            .add_cookie(cookie)
            .await;

        response.assert_status_ok();
        assert_eq!(
            get_transaction(created.id, user_id, &app.state.db_connection.lock().unwrap()),
            Err(Error::NotFound)
        );
    }

    #[tokio::test]
    async fn deleting_foreign_transaction_is_not_found() {
        let app = TestApp::new();
        let (ana, _) = app.create_user_and_log_in("ana@example.com", "ana").await;
        let (_, bruno_cookie) = app.create_user_and_log_in("bruno@example.com", "bruno").await;
        let created =
            create_transaction(rent(), ana, &app.state.db_connection.lock().unwrap()).unwrap();

        app.server
            .delete(endpoints::TRANSACTIONS)
            .add_query_param("id", created.id)
            .add_cookie(bruno_cookie)
            .await
            .assert_status(StatusCode::NOT_FOUND);

        assert!(get_transaction(created.id, ana, &app.state.db_connection.lock().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn deleting_twice_is_not_found() {
        let app = TestApp::new();
        let (user_id, cookie) = app.create_user_and_log_in("ana@example.com", "ana").await;
        let created =
            create_transaction(rent(), user_id, &app.state.db_connection.lock().unwrap()).unwrap();

        app.server
            .delete(endpoints::TRANSACTIONS)
            .add_query_param("id", created.id)
            .add_cookie(cookie.clone())
            .await
            .assert_status_ok();
        app.server
            .delete(endpoints::TRANSACTIONS)
            .add_query_param("id", created.id)
            .add_cookie(cookie)
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_without_id_is_bad_request() {
        let app = TestApp::new();
        let (_, cookie) = app.create_user_and_log_in("ana@example.com", "ana").await;

        app.server
            .delete(endpoints::TRANSACTIONS)
            .add_cookie(cookie)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
