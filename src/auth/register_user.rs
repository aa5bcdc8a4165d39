//! The endpoint for creating a new account.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
    http::StatusCode,
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    AppState, Error, PasswordHash, ValidatedPassword,
    account::{Account, DEFAULT_INITIAL_BALANCE, NewAccount, create_account},
};

/// The state needed for creating a new account.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The cost used when hashing new passwords.
    pub password_hash_cost: u32,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            password_hash_cost: state.password_hash_cost,
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The JSON body of a registration request.
#[derive(Debug, Deserialize)]
pub struct RegisterData {
    pub username: String,
    pub password: String,
    pub phone: Option<String>,
    pub initial_balance: Option<f64>,
}

/// Create a new account.
///
/// Responds with 201 Created and the new account's ID. The client is not
/// logged in, it should call the log-in endpoint afterwards.
///
/// # Errors
///
/// Returns a:
/// - [Error::InvalidInput] if the username or password is empty, or the
///   initial balance is negative or not a finite number,
/// - [Error::DuplicateUsername] if the username is taken.
pub async fn register_user(
    State(state): State<RegistrationState>,
    payload: Result<Json<RegisterData>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), Error> {
    let Json(data) = payload?;
    let username = data.username.trim();

    if username.is_empty() {
        return Err(Error::InvalidInput("username cannot be empty".to_owned()));
    }

    let initial_balance = data.initial_balance.unwrap_or(DEFAULT_INITIAL_BALANCE);
    if !initial_balance.is_finite() || initial_balance < 0.0 {
        return Err(Error::InvalidInput(
            "initial balance must be a non-negative number".to_owned(),
        ));
    }

    let phone = data
        .phone
        .map(|phone| phone.trim().to_owned())
        .filter(|phone| !phone.is_empty());

    let password = ValidatedPassword::new(&data.password)?;
    let password_hash = PasswordHash::new(password, state.password_hash_cost)?;

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let Account { id, username, .. } = create_account(
        NewAccount {
            username: username.to_owned(),
            password_hash,
            phone,
            initial_balance,
        },
        &connection,
    )?;

    tracing::info!("Registered new account {id} for \"{username}\"");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "User created successfully",
            "user": { "id": id, "username": username },
        })),
    ))
}
