//! Defines the endpoint for viewing the logged-in user's account.
use std::sync::{Arc, Mutex};

use axum::{
    Extension, Json,
    extract::{FromRef, State},
};
use rusqlite::Connection;
use serde::Serialize;

use crate::{
    AppState, Error,
    account::{Account, AccountId, get_account_by_id},
};

/// The state needed to look up an account.
#[derive(Debug, Clone)]
pub struct AccountDetailsState {
    /// The database connection for reading accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountDetailsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The public view of an account, i.e. everything except the password hash.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccountDetails {
    pub id: AccountId,
    pub username: String,
    pub phone: Option<String>,
    pub balance: f64,
}

impl From<Account> for AccountDetails {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            username: account.username,
            phone: account.phone,
            balance: account.balance,
        }
    }
}

/// A route handler that returns the id, username, phone number and balance of
/// the logged-in account.
///
/// # Errors
///
/// Returns [Error::NotFound] if the account no longer exists.
pub async fn get_account_details_endpoint(
    State(state): State<AccountDetailsState>,
    Extension(account_id): Extension<AccountId>,
) -> Result<Json<AccountDetails>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let account = get_account_by_id(account_id, &connection)?;

    Ok(Json(account.into()))
}
