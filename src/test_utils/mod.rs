#![allow(missing_docs)]

use axum_extra::extract::cookie::Cookie;
use axum_test::TestServer;
use rusqlite::Connection;
use serde_json::json;

use crate::{
    AppState, NewUser, PasswordHash, UserID, auth::COOKIE_TOKEN, build_router, endpoints,
    user::{create_user, parse_email},
};

pub(crate) const TEST_PASSWORD: &str = "thisisaverysecurepassword!!!!";

pub(crate) fn get_test_state() -> AppState {
    let connection = Connection::open_in_memory().expect("Could not open database in memory.");

    AppState::new(connection, "foobar", "Etc/UTC", false).expect("Could not create app state.")
}

/// The full application router backed by an in-memory database.
pub(crate) struct TestApp {
    pub server: TestServer,
    pub state: AppState,
}

impl TestApp {
    pub(crate) fn new() -> Self {
        Self::with_state(get_test_state())
    }

    pub(crate) fn with_state(state: AppState) -> Self {
        let server =
            TestServer::try_new(build_router(state.clone())).expect("Could not create test server.");

        Self { server, state }
    }

    /// Create a user directly in the database and log in through the API.
    ///
    /// Returns the new user's ID and the auth cookie for their session.
    pub(crate) async fn create_user_and_log_in(
        &self,
        email: &str,
        username: &str,
    ) -> (UserID, Cookie<'static>) {
        let new_user = NewUser {
            email: parse_email(email).unwrap(),
            username: Some(username.to_owned()),
            password_hash: Some(PasswordHash::from_raw_password(TEST_PASSWORD, &[], 4).unwrap()),
            first_name: Some("Ana".to_owned()),
            last_name: Some("Silva".to_owned()),
            phone: None,
            onboarding_completed: true,
        };
        let user = create_user(new_user, &self.state.db_connection.lock().unwrap()).unwrap();

        let response = self
            .server
            .post(endpoints::LOG_IN)
            .json(&json!({ "email": email, "password": TEST_PASSWORD }))
            .await;
        response.assert_status_ok();

        (user.id, response.cookie(COOKIE_TOKEN))
    }
}
