//! Code for creating the user table and fetching and updating users in the database.

use std::fmt::Display;

use email_address::EmailAddress;
use rusqlite::{Connection, Row, params};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The user's email address, stored in lowercase.
    pub email: String,
    /// The user's handle, unique across users when set.
    pub username: Option<String>,
    /// The user's password hash.
    ///
    /// Accounts created through an external identity provider have no password.
    pub password_hash: Option<PasswordHash>,
    /// The user's first name.
    pub first_name: Option<String>,
    /// The user's last name.
    pub last_name: Option<String>,
    /// The user's display name, derived from the first and last names.
    pub name: Option<String>,
    /// The user's age in years.
    pub age: Option<u32>,
    /// The user's phone number.
    pub phone: Option<String>,
    /// The user's postal address.
    pub address: Option<String>,
    /// Whether the user has filled in the onboarding form.
    pub onboarding_completed: bool,
    /// When the user registered.
    pub created_at: OffsetDateTime,
}

/// The data needed to insert a new user.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    /// The user's email address.
    pub email: EmailAddress,
    /// The user's handle.
    pub username: Option<String>,
    /// The user's password hash, `None` for accounts without a password.
    pub password_hash: Option<PasswordHash>,
    /// The user's first name.
    pub first_name: Option<String>,
    /// The user's last name.
    pub last_name: Option<String>,
    /// The user's phone number.
    pub phone: Option<String>,
    /// Whether the onboarding step should be skipped for this user.
    pub onboarding_completed: bool,
}

/// The profile fields a user may change. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    /// The new first name.
    pub first_name: Option<String>,
    /// The new last name.
    pub last_name: Option<String>,
    /// The new age.
    pub age: Option<u32>,
    /// The new phone number.
    pub phone: Option<String>,
    /// The new postal address.
    pub address: Option<String>,
}

/// Join the first and last names into a display name.
///
/// Returns `None` unless both names are given.
pub(crate) fn display_name(first_name: Option<&str>, last_name: Option<&str>) -> Option<String> {
    match (first_name, last_name) {
        (Some(first_name), Some(last_name)) => Some(format!("{first_name} {last_name}")),
        _ => None,
    }
}

/// Parse and normalise an email address.
///
/// # Errors
///
/// Returns [Error::InvalidEmail] if `raw_email` is not a valid email address.
pub(crate) fn parse_email(raw_email: &str) -> Result<EmailAddress, Error> {
    let normalised = raw_email.trim().to_lowercase();

    normalised
        .parse::<EmailAddress>()
        .map_err(|_| Error::InvalidEmail(raw_email.to_owned()))
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                username TEXT UNIQUE,
                password TEXT,
                first_name TEXT,
                last_name TEXT,
                name TEXT,
                age INTEGER,
                phone TEXT,
                address TEXT,
                onboarding_completed INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

const USER_COLUMNS: &str = "id, email, username, password, first_name, last_name, name, age, \
                            phone, address, onboarding_completed, created_at";

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns a:
/// - [Error::DuplicateEmail] if the email address is already registered,
/// - [Error::DuplicateUsername] if the username is already taken,
/// - [Error::SqlError] if some other SQL related error occurred.
pub fn create_user(new_user: NewUser, connection: &Connection) -> Result<User, Error> {
    let name = display_name(new_user.first_name.as_deref(), new_user.last_name.as_deref());

    connection
        .prepare(&format!(
            "INSERT INTO user (email, username, password, first_name, last_name, name, phone, \
             onboarding_completed, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             RETURNING {USER_COLUMNS}"
        ))?
        .query_row(
            params![
                new_user.email.as_str(),
                new_user.username,
                new_user.password_hash.as_ref().map(PasswordHash::as_str),
                new_user.first_name,
                new_user.last_name,
                name,
                new_user.phone,
                new_user.onboarding_completed,
                OffsetDateTime::now_utc(),
            ],
            map_user_row,
        )
        .map_err(Error::from)
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(&format!("SELECT {USER_COLUMNS} FROM user WHERE id = :id"))?
        .query_row(&[(":id", &user_id.as_i64())], map_user_row)
        .map_err(Error::from)
}

/// Get the user that logs in with `identifier`.
///
/// Identifiers containing an '@' are treated as email addresses and compared
/// case-insensitively, anything else is treated as a username.
///
/// # Errors
///
/// Returns [Error::NotFound] if no user matches `identifier`.
pub fn get_user_by_login(identifier: &str, connection: &Connection) -> Result<User, Error> {
    let identifier = identifier.trim();

    let (column, value) = if identifier.contains('@') {
        ("email", identifier.to_lowercase())
    } else {
        ("username", identifier.to_owned())
    };

    connection
        .prepare(&format!(
            "SELECT {USER_COLUMNS} FROM user WHERE {column} = :value"
        ))?
        .query_row(&[(":value", &value)], map_user_row)
        .map_err(Error::from)
}

/// Update the profile fields of the user `user_id`, leaving the fields that
/// are `None` in `update` unchanged.
///
/// The display name is only rederived when both names are given.
///
/// # Errors
///
/// Returns [Error::NotFound] if `user_id` does not refer to a user.
pub fn update_profile(
    user_id: UserID,
    update: ProfileUpdate,
    connection: &Connection,
) -> Result<User, Error> {
    let name = display_name(update.first_name.as_deref(), update.last_name.as_deref());

    connection
        .prepare(&format!(
            "UPDATE user SET
                first_name = COALESCE(?1, first_name),
                last_name = COALESCE(?2, last_name),
                age = COALESCE(?3, age),
                phone = COALESCE(?4, phone),
                address = COALESCE(?5, address),
                name = COALESCE(?6, name)
             WHERE id = ?7
             RETURNING {USER_COLUMNS}"
        ))?
        .query_row(
            params![
                update.first_name,
                update.last_name,
                update.age,
                update.phone,
                update.address,
                name,
                user_id.as_i64(),
            ],
            map_user_row,
        )
        .map_err(Error::from)
}

/// Record the names collected by the onboarding form and mark the user's
/// onboarding as complete.
///
/// # Errors
///
/// Returns [Error::NotFound] if `user_id` does not refer to a user.
pub fn complete_onboarding(
    user_id: UserID,
    first_name: &str,
    last_name: &str,
    phone: Option<&str>,
    connection: &Connection,
) -> Result<User, Error> {
    let name = display_name(Some(first_name), Some(last_name));

    connection
        .prepare(&format!(
            "UPDATE user SET
                first_name = ?1,
                last_name = ?2,
                phone = COALESCE(?3, phone),
                name = ?4,
                onboarding_completed = 1
             WHERE id = ?5
             RETURNING {USER_COLUMNS}"
        ))?
        .query_row(
            params![first_name, last_name, phone, name, user_id.as_i64()],
            map_user_row,
        )
        .map_err(Error::from)
}

fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_password_hash: Option<String> = row.get(3)?;

    Ok(User {
        id: UserID::new(row.get(0)?),
        email: row.get(1)?,
        username: row.get(2)?,
        password_hash: raw_password_hash.map(|hash| PasswordHash::new_unchecked(&hash)),
        first_name: row.get(4)?,
        last_name: row.get(5)?,
        name: row.get(6)?,
        age: row.get(7)?,
        phone: row.get(8)?,
        address: row.get(9)?,
        onboarding_completed: row.get(10)?,
        created_at: row.get(11)?,
    })
}

#[cfg(test)]
pub(crate) mod user_tests {
    use rusqlite::Connection;

    use crate::{
        Error, PasswordHash,
        user::{
            NewUser, ProfileUpdate, UserID, complete_onboarding, create_user, get_user_by_id,
            get_user_by_login, parse_email, update_profile,
        },
    };

    use super::create_user_table;

    fn get_db_connection() -> Connection {
        let conn =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        create_user_table(&conn).expect("Could not create user table");

        conn
    }

    pub(crate) fn new_test_user(email: &str, username: &str) -> NewUser {
        NewUser {
            email: parse_email(email).unwrap(),
            username: Some(username.to_owned()),
            password_hash: Some(PasswordHash::new_unchecked("hunter2")),
            first_name: Some("Ana".to_owned()),
            last_name: Some("Silva".to_owned()),
            phone: None,
            onboarding_completed: true,
        }
    }

    #[test]
    fn insert_user_succeeds() {
        let db_connection = get_db_connection();

        let inserted_user =
            create_user(new_test_user("ana@example.com", "ana"), &db_connection).unwrap();

        assert!(inserted_user.id.as_i64() > 0);
        assert_eq!(inserted_user.email, "ana@example.com");
        assert_eq!(inserted_user.name.as_deref(), Some("Ana Silva"));
        assert_eq!(
            inserted_user.password_hash,
            Some(PasswordHash::new_unchecked("hunter2"))
        );
        assert!(inserted_user.onboarding_completed);
    }

    #[test]
    fn insert_user_without_password_succeeds() {
        let db_connection = get_db_connection();
        let new_user = NewUser {
            password_hash: None,
            username: None,
            ..new_test_user("oauth@example.com", "unused")
        };

        let inserted_user = create_user(new_user, &db_connection).unwrap();

        assert_eq!(inserted_user.password_hash, None);
        assert_eq!(inserted_user.username, None);
    }

    #[test]
    fn insert_user_fails_on_duplicate_email() {
        let db_connection = get_db_connection();
        create_user(new_test_user("ana@example.com", "ana"), &db_connection).unwrap();

        let result = create_user(new_test_user("ANA@example.com", "other"), &db_connection);

        assert_eq!(result, Err(Error::DuplicateEmail));
    }

    #[test]
    fn insert_user_fails_on_duplicate_username() {
        let db_connection = get_db_connection();
        create_user(new_test_user("ana@example.com", "ana"), &db_connection).unwrap();

        let result = create_user(new_test_user("bia@example.com", "ana"), &db_connection);

        assert_eq!(result, Err(Error::DuplicateUsername));
    }

    #[test]
    fn get_user_fails_with_non_existent_id() {
        let db_connection = get_db_connection();

        let id = UserID::new(42);

        assert_eq!(get_user_by_id(id, &db_connection), Err(Error::NotFound));
    }

    #[test]
    fn get_user_succeeds_with_existing_id() {
        let db_connection = get_db_connection();
        let test_user =
            create_user(new_test_user("ana@example.com", "ana"), &db_connection).unwrap();

        let retrieved_user = get_user_by_id(test_user.id, &db_connection).unwrap();

        assert_eq!(retrieved_user, test_user);
    }

    #[test]
    fn get_user_by_login_matches_email_or_username() {
        let db_connection = get_db_connection();
        let test_user =
            create_user(new_test_user("ana@example.com", "ana"), &db_connection).unwrap();

        assert_eq!(
            get_user_by_login(" Ana@Example.com ", &db_connection).as_ref(),
            Ok(&test_user)
        );
        assert_eq!(
            get_user_by_login("ana", &db_connection).as_ref(),
            Ok(&test_user)
        );
        assert_eq!(
            get_user_by_login("nobody", &db_connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn update_profile_keeps_missing_fields() {
        let db_connection = get_db_connection();
        let test_user =
            create_user(new_test_user("ana@example.com", "ana"), &db_connection).unwrap();

        let updated_user = update_profile(
            test_user.id,
            ProfileUpdate {
                age: Some(31),
                address: Some("Rua das Flores, 12".to_owned()),
                ..Default::default()
            },
            &db_connection,
        )
        .unwrap();

        assert_eq!(updated_user.age, Some(31));
        assert_eq!(updated_user.address.as_deref(), Some("Rua das Flores, 12"));
        assert_eq!(updated_user.first_name, test_user.first_name);
        assert_eq!(updated_user.name, test_user.name);
    }

    #[test]
    fn update_profile_rederives_name() {
        let db_connection = get_db_connection();
        let test_user =
            create_user(new_test_user("ana@example.com", "ana"), &db_connection).unwrap();

        let updated_user = update_profile(
            test_user.id,
            ProfileUpdate {
                first_name: Some("Beatriz".to_owned()),
                last_name: Some("Souza".to_owned()),
                ..Default::default()
            },
            &db_connection,
        )
        .unwrap();

        assert_eq!(updated_user.name.as_deref(), Some("Beatriz Souza"));
    }

    #[test]
    fn update_profile_fails_for_missing_user() {
        let db_connection = get_db_connection();

        let result = update_profile(UserID::new(7), ProfileUpdate::default(), &db_connection);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn complete_onboarding_sets_flag() {
        let db_connection = get_db_connection();
        let new_user = NewUser {
            first_name: None,
            last_name: None,
            onboarding_completed: false,
            ..new_test_user("ana@example.com", "ana")
        };
        let test_user = create_user(new_user, &db_connection).unwrap();
        assert!(!test_user.onboarding_completed);

        let updated_user = complete_onboarding(
            test_user.id,
            "Ana",
            "Silva",
            Some("+55 11 99999-0000"),
            &db_connection,
        )
        .unwrap();

        assert!(updated_user.onboarding_completed);
        assert_eq!(updated_user.name.as_deref(), Some("Ana Silva"));
        assert_eq!(updated_user.phone.as_deref(), Some("+55 11 99999-0000"));
    }
}
