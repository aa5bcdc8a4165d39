//! Code for creating the account table and fetching accounts from the database.

use std::fmt::Display;

use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::{Deserialize, Serialize};

use crate::{Error, PasswordHash};

/// The balance given to new accounts when the client does not specify one.
pub const DEFAULT_INITIAL_BALANCE: f64 = 50000.0;

/// A newtype wrapper for integer account IDs.
///
/// This helps disambiguate account IDs from expense IDs, leading to better
/// compile time errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct AccountId(i64);

impl AccountId {
    /// Create a new account ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the account ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A registered user of the application and their spending balance.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// The account's ID in the application database.
    pub id: AccountId,
    /// The unique name the user logs in with.
    pub username: String,
    /// The account's password hash.
    pub password_hash: PasswordHash,
    /// An optional contact number.
    pub phone: Option<String>,
    /// The money left to spend.
    pub balance: f64,
}

/// The data needed to insert a new account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    /// The unique name the user logs in with.
    pub username: String,
    /// The hash of the account's password.
    pub password_hash: PasswordHash,
    /// An optional contact number.
    pub phone: Option<String>,
    /// The balance the account starts with.
    pub initial_balance: f64,
}

/// Create the account table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            password TEXT NOT NULL,
            phone TEXT,
            balance REAL NOT NULL
        )",
        (),
    )?;

    Ok(())
}

pub fn map_row_to_account(row: &Row) -> Result<Account, rusqlite::Error> {
    let id = AccountId::new(row.get(0)?);
    let username = row.get(1)?;
    let raw_password_hash: String = row.get(2)?;
    let phone = row.get(3)?;
    let balance = row.get(4)?;

    Ok(Account {
        id,
        username,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
        phone,
        balance,
    })
}

/// Create and insert a new account into the database.
///
/// # Errors
///
/// Returns a:
/// - [Error::DuplicateUsername] if the username is already taken,
/// - [Error::SqlError] if some other SQL related error occurred.
pub fn create_account(new_account: NewAccount, connection: &Connection) -> Result<Account, Error> {
    connection
        .execute(
            "INSERT INTO account (username, password, phone, balance) VALUES (?1, ?2, ?3, ?4)",
            params![
                new_account.username,
                new_account.password_hash.as_ref(),
                new_account.phone,
                new_account.initial_balance
            ],
        )
        .map_err(|error| match error {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(_))
                if sql_error.extended_code == 2067 =>
            {
                Error::DuplicateUsername(new_account.username.clone())
            }
            error => error.into(),
        })?;

    let id = AccountId::new(connection.last_insert_rowid());

    Ok(Account {
        id,
        username: new_account.username,
        password_hash: new_account.password_hash,
        phone: new_account.phone,
        balance: new_account.initial_balance,
    })
}

/// Get the account from the database with an ID equal to `account_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `account_id` does not belong to a registered account ([Error::NotFound]),
/// - there was an error trying to access the database.
pub fn get_account_by_id(account_id: AccountId, connection: &Connection) -> Result<Account, Error> {
    connection
        .query_row(
            "SELECT id, username, password, phone, balance FROM account WHERE id = ?1",
            params![account_id.as_i64()],
            map_row_to_account,
        )
        .map_err(|error| error.into())
}

/// Get the account with the username `username`, or `None` if there is no
/// such account.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn get_account_by_username(
    username: &str,
    connection: &Connection,
) -> Result<Option<Account>, Error> {
    connection
        .query_row(
            "SELECT id, username, password, phone, balance FROM account WHERE username = ?1",
            params![username],
            map_row_to_account,
        )
        .optional()
        .map_err(|error| error.into())
}
