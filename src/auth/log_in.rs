//! Log-in handler and the state it needs.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;
use serde::Deserialize;
use time::Duration;

use crate::{
    AppState, Error,
    auth::{UserSummary, cookie::set_auth_cookie},
    db::lock_connection,
    extract::AppJson,
    user::get_user_by_login,
};

/// How long the auth cookie should last if the user selects "remember me" at log-in.
const REMEMBER_ME_COOKIE_DURATION: Duration = Duration::days(7);

/// The state needed to perform a login.
#[derive(Debug, Clone)]
pub struct LoginState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The database connection for looking up users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<LoginState> for Key {
    fn from_ref(state: &LoginState) -> Self {
        state.cookie_key.clone()
    }
}

/// The credentials sent by the client to log in.
///
/// The password is kept as a plain string. There is no need for validation here since
/// it will be compared against the hash in the database.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogInData {
    /// The email address or the username of the user.
    #[serde(alias = "username")]
    pub email: String,

    /// Password entered during log-in.
    pub password: String,

    /// Whether to extend the initial auth cookie duration.
    #[serde(default)]
    pub remember_me: bool,
}

/// Handler for log-in requests.
///
/// On success the auth cookie is set and the user's ID, email and name are returned.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - [Error::InvalidCredentials] if no user has the email/username, the user
///   has no password (accounts created through an identity provider) or the
///   password is wrong.
/// - An internal error occurred when verifying the password.
pub async fn post_log_in(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
    AppJson(user_data): AppJson<LogInData>,
) -> Result<(PrivateCookieJar, Json<UserSummary>), Error> {
    let user = {
        let connection = lock_connection(&state.db_connection)?;

        match get_user_by_login(user_data.email.trim(), &connection) {
            Ok(user) => user,
            Err(Error::NotFound) => return Err(Error::InvalidCredentials),
            Err(error) => return Err(error),
        }
    };

    let password_hash = user
        .password_hash
        .as_ref()
        .ok_or(Error::InvalidCredentials)?;

    let is_password_valid = password_hash
        .verify(&user_data.password)
        .map_err(|error| Error::HashingError(error.to_string()))?;

    if !is_password_valid {
        return Err(Error::InvalidCredentials);
    }

    let cookie_duration = if user_data.remember_me {
        REMEMBER_ME_COOKIE_DURATION
    } else {
        state.cookie_duration
    };

    let jar = set_auth_cookie(jar, user.id, cookie_duration)?;

    tracing::info!("User {} logged in", user.id);

    Ok((jar, Json(UserSummary::from(&user))))
}

#[cfg(test)]
mod log_in_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, http::StatusCode, routing::post};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::json;
    use time::{Duration, OffsetDateTime};

    use crate::{
        NewUser, PasswordHash, User,
        app_state::create_cookie_key,
        auth::{COOKIE_TOKEN, DEFAULT_COOKIE_DURATION},
        db::initialize,
        endpoints,
        user::{create_user, parse_email},
    };

    use super::{LoginState, REMEMBER_ME_COOKIE_DURATION, post_log_in};

    const PASSWORD: &str = "thisisaverysecurepassword!!!!";

    fn create_test_user(connection: &Connection, password_hash: Option<PasswordHash>) -> User {
        create_user(
            NewUser {
                email: parse_email("ana@example.com").unwrap(),
                username: Some("ana".to_owned()),
                password_hash,
                first_name: Some("Ana".to_owned()),
                last_name: Some("Silva".to_owned()),
                phone: None,
                onboarding_completed: true,
            },
            connection,
        )
        .unwrap()
    }

    fn get_test_server(password_hash: Option<PasswordHash>) -> TestServer {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        create_test_user(&connection, password_hash);

        let state = LoginState {
            cookie_key: create_cookie_key("foobar"),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            db_connection: Arc::new(Mutex::new(connection)),
        };
        let app = Router::new()
            .route(endpoints::LOG_IN, post(post_log_in))
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    fn password_hash() -> Option<PasswordHash> {
        Some(PasswordHash::from_raw_password(PASSWORD, &[], 4).unwrap())
    }

    #[tokio::test]
    async fn log_in_succeeds_with_valid_credentials() {
        let server = get_test_server(password_hash());

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({ "email": "ana@example.com", "password": PASSWORD }))
            .await;

        response.assert_status_ok();
        response.assert_json_contains(&json!({ "email": "ana@example.com", "name": "Ana Silva" }));
        let cookie = response.cookie(COOKIE_TOKEN);
        let expires_in = cookie.expires_datetime().unwrap() - OffsetDateTime::now_utc();
        assert!(expires_in <= DEFAULT_COOKIE_DURATION);
    }

    #[tokio::test]
    async fn log_in_accepts_username_and_mixed_case_email() {
        let server = get_test_server(password_hash());

        server
            .post(endpoints::LOG_IN)
            .json(&json!({ "username": "ana", "password": PASSWORD }))
            .await
            .assert_status_ok();
        server
            .post(endpoints::LOG_IN)
            .json(&json!({ "email": "Ana@Example.com", "password": PASSWORD }))
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn remember_me_extends_auth_cookie() {
        let server = get_test_server(password_hash());

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({ "email": "ana@example.com", "password": PASSWORD, "rememberMe": true }))
            .await;

        response.assert_status_ok();
        let cookie = response.cookie(COOKIE_TOKEN);
        let expires_in = cookie.expires_datetime().unwrap() - OffsetDateTime::now_utc();
        assert!(expires_in > REMEMBER_ME_COOKIE_DURATION - Duration::minutes(1));
    }

    #[tokio::test]
    async fn log_in_fails_with_missing_credentials() {
        let server = get_test_server(password_hash());

        server
            .post(endpoints::LOG_IN)
            .json(&json!({ "email": "ana@example.com" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn log_in_fails_with_incorrect_password() {
        let server = get_test_server(password_hash());

        let response = server
            .post(endpoints::LOG_IN)
            .json(&json!({
                "email": "ana@example.com",
                "password": "definitelyNotTheCorrectPassword",
            }))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        response.assert_json(&json!({ "error": "invalid email or password" }));
    }

    #[tokio::test]
    async fn log_in_fails_with_unknown_email() {
        let server = get_test_server(password_hash());

        server
            .post(endpoints::LOG_IN)
            .json(&json!({ "email": "bruno@example.com", "password": PASSWORD }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn log_in_fails_for_account_without_password() {
        let server = get_test_server(None);

        server
            .post(endpoints::LOG_IN)
            .json(&json!({ "email": "ana@example.com", "password": PASSWORD }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
