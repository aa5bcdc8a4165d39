//! This file defines the route for handling log-in requests.
//! The cookie module handles the lower level session cookie logic.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use time::Duration;

use crate::{
    AppState, Error,
    account::{AccountId, get_account_by_username},
    auth::set_auth_cookie,
};

/// The state needed to perform a login.
#[derive(Debug, Clone)]
pub struct LoginState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The bcrypt cost used for the stand-in hash when the username is unknown.
    pub password_hash_cost: u32,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LoginState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            password_hash_cost: state.password_hash_cost,
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
/// The password is stored as a plain string. There is no need for validation here since
/// it will be compared against the hash in the database.
#[derive(Clone, Deserialize)]
pub struct LogInData {
    pub username: String,
    pub password: String,
}

/// The account summary returned after logging in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggedInUser {
    pub id: AccountId,
    pub username: String,
    pub balance: f64,
}

/// Handler for log-in requests.
///
/// On success the session cookie is set and a summary of the account is returned.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - The username does not belong to a registered account.
/// - The password is not correct.
/// - An internal error occurred when verifying the password.
pub async fn post_log_in(
    State(state): State<LoginState>,
    jar: PrivateCookieJar,
    payload: Result<Json<LogInData>, JsonRejection>,
) -> Result<(PrivateCookieJar, Json<Value>), Error> {
    let Json(credentials) = payload?;

    let account = {
        let connection = state.db_connection.lock().map_err(|error| {
            tracing::error!("Could not acquire database lock: {error}");
            Error::DatabaseLockError
        })?;

        get_account_by_username(credentials.username.trim(), &connection)?
    };

    let Some(account) = account else {
        // Unknown usernames cost the same bcrypt work as wrong passwords.
        let _ = bcrypt::hash(&credentials.password, state.password_hash_cost);
        return Err(Error::InvalidCredentials);
    };

    let is_password_valid = account
        .password_hash
        .verify(&credentials.password)
        .map_err(|error| {
            tracing::error!("Unhandled error while verifying credentials: {error}");
            Error::HashingError(error.to_string())
        })?;

    if !is_password_valid {
        return Err(Error::InvalidCredentials);
    }

    let jar = set_auth_cookie(jar, account.id, state.cookie_duration)?;

    tracing::info!("Account {} logged in", account.id);

    let user = LoggedInUser {
        id: account.id,
        username: account.username,
        balance: account.balance,
    };

    Ok((
        jar,
        Json(json!({
            "message": "Login successful",
            "user": user,
        })),
    ))
}
