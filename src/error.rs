//! Defines the app level error type and its conversion to JSON error responses.
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::advisor::AdvisorError;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The client sent data that is malformed or out of range.
    ///
    /// The string describes which field was invalid and is safe to show to
    /// the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The expense amount is larger than the account's current balance.
    #[error("the expense amount exceeds the account balance")]
    InsufficientBalance,

    /// The username is already taken by another account.
    #[error("the username \"{0}\" already exists in the database")]
    DuplicateUsername(String),

    /// The username does not exist or the password does not match.
    #[error("invalid username or password")]
    InvalidCredentials,

    /// The request did not carry a valid session.
    #[error("no valid session for the request")]
    Unauthorized,

    /// The requested resource was not found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// The advisory service could not produce a response.
    #[error("advisor request failed: {0}")]
    Upstream(#[from] AdvisorError),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The session cookie could not be created.
    #[error("could not create session cookie: {0}")]
    CookieError(String),

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Error::InvalidInput(left), Error::InvalidInput(right)) => left == right,
            (Error::DuplicateUsername(left), Error::DuplicateUsername(right)) => left == right,
            (Error::HashingError(left), Error::HashingError(right)) => left == right,
            (Error::CookieError(left), Error::CookieError(right)) => left == right,
            (Error::SqlError(left), Error::SqlError(right)) => left == right,
            (Error::Upstream(left), Error::Upstream(right)) => {
                left.to_string() == right.to_string()
            }
            (left, right) => std::mem::discriminant(left) == std::mem::discriminant(right),
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::InvalidInput(rejection.body_text())
    }
}

impl Error {
    /// The status code and client-facing message for the error.
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Error::InvalidInput(reason) => {
                (StatusCode::BAD_REQUEST, format!("Invalid data: {reason}"))
            }
            Error::InsufficientBalance => (
                StatusCode::BAD_REQUEST,
                "Insufficient balance or invalid data".to_owned(),
            ),
            Error::DuplicateUsername(_) => {
                (StatusCode::BAD_REQUEST, "Username already exists".to_owned())
            }
            Error::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Invalid username or password".to_owned(),
            ),
            Error::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_owned()),
            Error::NotFound => (StatusCode::NOT_FOUND, "User not found".to_owned()),
            Error::Upstream(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to get response from AI advisor".to_owned(),
            ),
            Error::HashingError(_)
            | Error::CookieError(_)
            | Error::SqlError(_)
            | Error::DatabaseLockError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An unexpected error occurred".to_owned(),
            ),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        // Details of server-side failures only go to the logs.
        if status.is_server_error() {
            tracing::error!("An unexpected error occurred: {}", self);
        } else {
            tracing::debug!("Request failed: {}", self);
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}
