//! Registration handler for creating a new user with an email and password.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
    http::StatusCode,
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;
use serde::Deserialize;
use time::Duration;

use crate::{
    AppState, Error, NewUser, PasswordHash,
    auth::{UserSummary, cookie::set_auth_cookie},
    db::lock_connection,
    extract::{AppJson, non_empty},
    user::{create_user, parse_email},
};

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The bcrypt cost used to hash new passwords.
    pub password_cost: u32,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            password_cost: PasswordHash::DEFAULT_COST,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

/// The details a user fills in when signing up.
///
/// Every field is optional here so that a missing field is reported as
/// [Error::MissingFields] rather than as a malformed body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
}

/// Create a new user and log them in.
///
/// # Errors
///
/// Returns a 400 error if a required field is missing, the email is invalid,
/// the password is too weak, or the email or username is already taken.
pub async fn register_user(
    State(state): State<RegistrationState>,
    jar: PrivateCookieJar,
    AppJson(form): AppJson<RegisterForm>,
) -> Result<(StatusCode, PrivateCookieJar, Json<UserSummary>), Error> {
    let username = non_empty(form.username.as_deref()).ok_or(Error::MissingFields)?;
    let first_name = non_empty(form.first_name.as_deref()).ok_or(Error::MissingFields)?;
    let last_name = non_empty(form.last_name.as_deref()).ok_or(Error::MissingFields)?;
    let raw_email = non_empty(form.email.as_deref()).ok_or(Error::MissingFields)?;
    // Passwords are not trimmed, whitespace is part of the password.
    let password = form
        .password
        .as_deref()
        .filter(|password| !password.is_empty())
        .ok_or(Error::MissingFields)?;

    let email = parse_email(raw_email)?;
    let password_hash = PasswordHash::from_raw_password(
        password,
        &[username, first_name, last_name, email.as_str()],
        state.password_cost,
    )?;

    let user = create_user(
        NewUser {
            email,
            username: Some(username.to_owned()),
            password_hash: Some(password_hash),
            first_name: Some(first_name.to_owned()),
            last_name: Some(last_name.to_owned()),
            phone: non_empty(form.phone.as_deref()).map(str::to_owned),
            onboarding_completed: true,
        },
        &*lock_connection(&state.db_connection)?,
    )?;

    tracing::info!("Registered user {}", user.id);

    let jar = set_auth_cookie(jar, user.id, state.cookie_duration)?;

    Ok((StatusCode::CREATED, jar, Json(UserSummary::from(&user))))
}

#[cfg(test)]
mod register_user_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::{Value, json};

    use crate::{
        app_state::create_cookie_key,
        auth::{COOKIE_TOKEN, DEFAULT_COOKIE_DURATION},
        db::initialize,
        endpoints,
        user::get_user_by_login,
    };

    use super::{RegistrationState, register_user};

    fn get_test_state() -> RegistrationState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        RegistrationState {
            cookie_key: create_cookie_key("foobar"),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            password_cost: 4,
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn get_test_server(state: RegistrationState) -> TestServer {
        let app = Router::new()
            .route(endpoints::REGISTER, post(register_user))
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    fn registration(email: &str, username: &str) -> Value {
        json!({
            "username": username,
            "firstName": "Ana",
            "lastName": "Silva",
            "email": email,
            "phone": "+55 11 91234-5678",
            "password": "thisisaverysecurepassword!!!!",
        })
    }

    #[tokio::test]
    async fn create_user_succeeds() {
        let state = get_test_state();
        let server = get_test_server(state.clone());

        let response = server
            .post(endpoints::REGISTER)
            .json(&registration("Ana@Example.com", "ana"))
            .await;

        response.assert_status(StatusCode::CREATED);
        response.assert_json_contains(&json!({ "email": "ana@example.com", "name": "Ana Silva" }));
        response.cookie(COOKIE_TOKEN);

        let connection = state.db_connection.lock().unwrap();
        let user = get_user_by_login("ana", &connection).unwrap();
        assert_eq!(user.phone.as_deref(), Some("+55 11 91234-5678"));
        assert!(user.onboarding_completed);
        assert!(
            user.password_hash
                .unwrap()
                .verify("thisisaverysecurepassword!!!!")
                .unwrap()
        );
    }

    #[tokio::test]
    async fn create_user_fails_with_duplicate_email() {
        let server = get_test_server(get_test_state());
        server
            .post(endpoints::REGISTER)
            .json(&registration("ana@example.com", "ana"))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .post(endpoints::REGISTER)
            .json(&registration("ANA@example.com", "someoneelse"))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({ "error": "this email address is already registered" }));
    }

    #[tokio::test]
    async fn create_user_fails_with_duplicate_username() {
        let server = get_test_server(get_test_state());
        server
            .post(endpoints::REGISTER)
            .json(&registration("ana@example.com", "ana"))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .post(endpoints::REGISTER)
            .json(&registration("bruno@example.com", "ana"))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({ "error": "this username is already taken" }));
    }

    #[tokio::test]
    async fn create_user_fails_when_field_is_missing() {
        let server = get_test_server(get_test_state());
        let mut body = registration("ana@example.com", "ana");
        body.as_object_mut().unwrap().remove("lastName");

        let response = server.post(endpoints::REGISTER).json(&body).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({ "error": "missing required fields" }));
    }

    #[tokio::test]
    async fn create_user_fails_when_password_is_weak() {
        let server = get_test_server(get_test_state());
        let mut body = registration("ana@example.com", "ana");
        body["password"] = json!("password1234");

        server
            .post(endpoints::REGISTER)
            .json(&body)
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_user_fails_with_invalid_email() {
        let server = get_test_server(get_test_state());

        server
            .post(endpoints::REGISTER)
            .json(&registration("not an email", "ana"))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
