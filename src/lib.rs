//! Fintrack is a web server for tracking personal finances.
//!
//! This library provides a JSON API for registering users, recording their
//! income, expenses and investments, and summarising those transactions for a
//! dashboard.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde_json::json;
use time::Date;
use tokio::signal;

mod app_state;
mod auth;
mod category;
mod dashboard;
mod db;
mod endpoints;
mod extract;
mod logging;
mod profile;
mod routing;
mod timezone;
mod transaction;
mod user;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{PasswordHash, ValidatedPassword};
pub use category::{CATEGORIES, Category, CategoryDisplay, get_category, list_categories_by_type};
pub use db::initialize as initialize_db;
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;
pub use timezone::get_local_offset;
pub use transaction::{
    Amount, InvestmentType, Transaction, TransactionBuilder, TransactionKind, TransactionType,
    create_transaction,
};
pub use user::{NewUser, User, UserID, create_user};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// One or more of the required fields were missing from the request.
    #[error("missing required fields")]
    MissingFields,

    /// The request body could not be parsed.
    ///
    /// The string holds the reason given by the JSON/query parser.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The amount was not a number, or was zero or negative.
    #[error("amount must be a positive number, got \"{0}\"")]
    InvalidAmount(String),

    /// The date could not be parsed as a calendar date.
    #[error("could not parse \"{0}\" as a date")]
    InvalidDate(String),

    /// The transaction type was not one of income, expense or investment.
    #[error("\"{0}\" is not a valid transaction type")]
    InvalidTransactionType(String),

    /// The investment type was not one of the supported kinds of investment.
    #[error("\"{0}\" is not a valid investment type")]
    InvalidInvestmentType(String),

    /// An investment type was given for a transaction that is not an investment.
    #[error("only investment transactions can have an investment type")]
    InvestmentTypeNotAllowed,

    /// The category ID did not match an entry in the category catalog.
    #[error("\"{0}\" is not a valid category")]
    InvalidCategory(String),

    /// The category exists but cannot be used with the transaction's type.
    #[error("the category \"{category}\" cannot be used for {transaction_type} transactions")]
    CategoryTypeMismatch {
        /// The ID of the category.
        category: String,
        /// The type of the transaction the category was used with.
        transaction_type: TransactionType,
    },

    /// The number of months requested for the dashboard is out of range.
    #[error("the number of months must be between 1 and {max}, got {got}")]
    InvalidMonthCount {
        /// The requested number of months.
        got: u8,
        /// The largest number of months allowed.
        max: u8,
    },

    /// The email address is not a valid email address.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// The email address is already used by another user.
    #[error("this email address is already registered")]
    DuplicateEmail,

    /// The username is already used by another user.
    #[error("this username is already taken")]
    DuplicateUsername,

    /// The requested resource was not found.
    ///
    /// Resources owned by another user are reported with this error too, so
    /// that clients cannot probe for IDs that belong to someone else.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The request did not carry a valid session.
    #[error("not authenticated")]
    Unauthenticated,

    /// The user provided an invalid combination of email and password.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The session cookie could not be created.
    #[error("could not create the session cookie: {0}")]
    CookieError(String),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// A sum of amounts does not fit in a decimal number.
    #[error("the sum of the amounts is too large")]
    AmountOverflow,

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    && desc.ends_with("user.username") =>
            {
                Error::DuplicateUsername
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

/// The message sent to clients in place of the details of an internal error.
pub(crate) const INTERNAL_ERROR_MESSAGE: &str = "an unexpected error occurred";

/// The detailed description of an internal error, attached to the response
/// extensions so that it can be revealed in development mode.
#[derive(Debug, Clone)]
pub struct InternalErrorDetails(pub String);

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::MissingFields
            | Error::InvalidRequest(_)
            | Error::InvalidAmount(_)
            | Error::InvalidDate(_)
            | Error::InvalidTransactionType(_)
            | Error::InvalidInvestmentType(_)
            | Error::InvestmentTypeNotAllowed
            | Error::InvalidCategory(_)
            | Error::CategoryTypeMismatch { .. }
            | Error::InvalidMonthCount { .. }
            | Error::InvalidEmail(_)
            | Error::TooWeak(_)
            | Error::DuplicateEmail
            | Error::DuplicateUsername => StatusCode::BAD_REQUEST,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::Unauthenticated | Error::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Error::HashingError(_)
            | Error::CookieError(_)
            | Error::InvalidTimezoneError(_)
            | Error::AmountOverflow
            | Error::DatabaseLockError
            | Error::SqlError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if !status.is_server_error() {
            return (status, Json(json!({ "error": self.to_string() }))).into_response();
        }

        // Internal errors are not intended to be shown to the client.
        tracing::error!("An unexpected error occurred: {}", self);
        let mut response =
            (status, Json(json!({ "error": INTERNAL_ERROR_MESSAGE }))).into_response();
        response
            .extensions_mut()
            .insert(InternalErrorDetails(self.to_string()));

        response
    }
}

/// Reveal the details of internal errors in the response body.
///
/// Only intended for development mode, see [build_router].
pub async fn attach_internal_error_details(response: Response) -> Response {
    let Some(InternalErrorDetails(details)) =
        response.extensions().get::<InternalErrorDetails>().cloned()
    else {
        return response;
    };

    (
        response.status(),
        Json(json!({ "error": INTERNAL_ERROR_MESSAGE, "details": details })),
    )
        .into_response()
}

/// Parse a calendar date from a request.
///
/// Accepts either a plain date, e.g. "2024-03-05", or an RFC 3339 timestamp,
/// e.g. "2024-03-05T12:00:00.000Z", in which case only the date is kept.
///
/// # Errors
///
/// Returns [Error::InvalidDate] if `raw_date` is in neither format.
pub(crate) fn parse_date(raw_date: &str) -> Result<Date, Error> {
    let raw_date = raw_date.trim();

    if let Ok(date) = Date::parse(raw_date, DATE_FORMAT) {
        return Ok(date);
    }

    time::OffsetDateTime::parse(raw_date, &time::format_description::well_known::Rfc3339)
        .map(|date_time| date_time.date())
        .map_err(|_| Error::InvalidDate(raw_date.to_owned()))
}

/// Date format for request and query parameters, e.g. "2024-03-05".
pub(crate) const DATE_FORMAT: &[time::format_description::BorrowedFormatItem] =
    time::macros::format_description!("[year]-[month]-[day]");
