//! Code for creating the expense table, recording expenses against an
//! account's balance and querying an account's expenses.

use std::fmt::Display;

use rusqlite::{Connection, Row, TransactionBehavior, params, types::Type};
use serde::{Serialize, Serializer};
use time::{
    OffsetDateTime, PrimitiveDateTime, format_description::BorrowedFormatItem,
    format_description::well_known::Rfc3339, macros::format_description,
};

use crate::{Error, account::AccountId};

/// The number of expenses returned by [list_recent_expenses] in the API.
pub const RECENT_EXPENSES_LIMIT: u32 = 5;

/// Storage format for `created_at`, always UTC, e.g. "2025-01-31 09:05:00.000000".
///
/// Every component has a fixed width so that ordering by the text column is
/// the same as ordering by time.
const CREATED_AT_FORMAT: &[BorrowedFormatItem] = format_description!(
    "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]"
);

/// A newtype wrapper for integer expense IDs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Hash)]
pub struct ExpenseId(i64);

impl ExpenseId {
    /// Create a new expense ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }
}

impl Display for ExpenseId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Money spent by an account. Expenses are never edited after being recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct Expense {
    /// The expense's ID in the application database.
    pub id: ExpenseId,
    /// The account the money was spent from.
    pub account_id: AccountId,
    /// Free-text note about the expense.
    pub description: Option<String>,
    /// The amount of money spent, always positive.
    pub amount: f64,
    /// A free-form category, e.g. "shopping".
    pub category: String,
    /// When the expense was recorded, in UTC.
    pub created_at: OffsetDateTime,
}

/// A validated expense that has not been recorded yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    account_id: AccountId,
    description: Option<String>,
    amount: f64,
    category: String,
}

impl NewExpense {
    /// Validate the fields of a new expense.
    ///
    /// Blank descriptions are treated as missing.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidInput] if `amount` is not a positive, finite
    /// number or `category` is empty.
    pub fn new(
        account_id: AccountId,
        description: Option<String>,
        amount: f64,
        category: &str,
    ) -> Result<Self, Error> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(Error::InvalidInput(
                "amount must be a positive number".to_owned(),
            ));
        }

        let category = category.trim();
        if category.is_empty() {
            return Err(Error::InvalidInput("category cannot be empty".to_owned()));
        }

        let description = description
            .map(|description| description.trim().to_owned())
            .filter(|description| !description.is_empty());

        Ok(Self {
            account_id,
            description,
            amount,
            category: category.to_owned(),
        })
    }
}

/// The outcome of recording an expense.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseReceipt {
    /// The stored expense.
    pub expense: Expense,
    /// The account's balance after the expense was deducted.
    pub new_balance: f64,
}

/// Create the expense table and the index used for listing an account's expenses.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS expense (
            id INTEGER PRIMARY KEY,
            account_id INTEGER NOT NULL,
            description TEXT,
            amount REAL NOT NULL,
            category TEXT NOT NULL,
            created_at TEXT NOT NULL,
            FOREIGN KEY(account_id) REFERENCES account(id) ON UPDATE CASCADE ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_expense_account_created_at
            ON expense(account_id, created_at);",
    )?;

    Ok(())
}

fn format_created_at(created_at: OffsetDateTime) -> Result<String, Error> {
    created_at
        .to_offset(time::UtcOffset::UTC)
        .format(CREATED_AT_FORMAT)
        .map_err(|error| Error::InvalidInput(format!("could not format timestamp: {error}")))
}

fn parse_created_at(text: &str) -> Result<OffsetDateTime, time::error::Parse> {
    PrimitiveDateTime::parse(text, CREATED_AT_FORMAT).map(PrimitiveDateTime::assume_utc)
}

/// Map a row with the columns `id, account_id, description, amount, category, created_at`.
pub fn map_row_to_expense(row: &Row) -> Result<Expense, rusqlite::Error> {
    let id = ExpenseId::new(row.get(0)?);
    let account_id = AccountId::new(row.get(1)?);
    let description = row.get(2)?;
    let amount = row.get(3)?;
    let category = row.get(4)?;
    let raw_created_at: String = row.get(5)?;
    let created_at = parse_created_at(&raw_created_at)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(error)))?;

    Ok(Expense {
        id,
        account_id,
        description,
        amount,
        category,
        created_at,
    })
}

/// Insert an expense with an explicit timestamp without touching the balance.
///
/// Prefer [record_expense], which checks and updates the account balance.
///
/// # Errors
///
/// Returns an [Error::SqlError] if the account does not exist or some other
/// SQL error occurred.
pub fn insert_expense(
    new_expense: &NewExpense,
    created_at: OffsetDateTime,
    connection: &Connection,
) -> Result<Expense, Error> {
    let created_at_text = format_created_at(created_at)?;

    connection.execute(
        "INSERT INTO expense (account_id, description, amount, category, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            new_expense.account_id.as_i64(),
            new_expense.description,
            new_expense.amount,
            new_expense.category,
            created_at_text,
        ],
    )?;

    let id = ExpenseId::new(connection.last_insert_rowid());
    let created_at = parse_created_at(&created_at_text)
        .map_err(|error| Error::InvalidInput(format!("could not parse timestamp: {error}")))?;

    Ok(Expense {
        id,
        account_id: new_expense.account_id,
        description: new_expense.description.clone(),
        amount: new_expense.amount,
        category: new_expense.category.clone(),
        created_at,
    })
}

/// Deduct the expense from the account's balance and store it with the
/// current time.
///
/// The balance check, the deduction and the insert happen in one
/// transaction, so either all of them take effect or none do.
///
/// # Errors
///
/// Returns a:
/// - [Error::NotFound] if the account does not exist,
/// - [Error::InsufficientBalance] if the amount is larger than the balance,
/// - [Error::SqlError] if some other SQL related error occurred.
pub fn record_expense(
    new_expense: NewExpense,
    connection: &mut Connection,
) -> Result<ExpenseReceipt, Error> {
    let transaction = connection.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let balance: f64 = transaction.query_row(
        "SELECT balance FROM account WHERE id = ?1",
        params![new_expense.account_id.as_i64()],
        |row| row.get(0),
    )?;

    if new_expense.amount > balance {
        return Err(Error::InsufficientBalance);
    }

    let new_balance = balance - new_expense.amount;
    transaction.execute(
        "UPDATE account SET balance = ?1 WHERE id = ?2",
        params![new_balance, new_expense.account_id.as_i64()],
    )?;

    let expense = insert_expense(&new_expense, OffsetDateTime::now_utc(), &transaction)?;

    transaction.commit()?;

    Ok(ExpenseReceipt {
        expense,
        new_balance,
    })
}

/// Get every expense for an account, oldest first.
///
/// # Errors
///
/// Returns an [Error::SqlError] if an SQL related error occurred.
pub fn find_expenses_by_account(
    account_id: AccountId,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    connection
        .prepare(
            "SELECT id, account_id, description, amount, category, created_at
            FROM expense
            WHERE account_id = ?1
            ORDER BY created_at ASC, id ASC",
        )?
        .query_map(params![account_id.as_i64()], map_row_to_expense)?
        .map(|maybe_expense| maybe_expense.map_err(Error::from))
        .collect()
}

/// Get up to `limit` of the account's most recent expenses, newest first.
///
/// Expenses recorded at the same instant are ordered by descending ID.
///
/// # Errors
///
/// Returns an [Error::SqlError] if an SQL related error occurred.
pub fn list_recent_expenses(
    account_id: AccountId,
    limit: u32,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    connection
        .prepare(
            "SELECT id, account_id, description, amount, category, created_at
            FROM expense
            WHERE account_id = ?1
            ORDER BY created_at DESC, id DESC
            LIMIT ?2",
        )?
        .query_map(params![account_id.as_i64(), limit], map_row_to_expense)?
        .map(|maybe_expense| maybe_expense.map_err(Error::from))
        .collect()
}

/// Serialize a date time as an RFC 3339 string, e.g. "2025-01-31T09:05:00.5Z".
pub(crate) fn serialize_rfc3339<S>(
    date_time: &OffsetDateTime,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let formatted = date_time
        .format(&Rfc3339)
        .map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&formatted)
}

#[cfg(test)]
mod expense_tests {
    use std::{
        sync::{Arc, Barrier, Mutex},
        thread,
    };

    use rusqlite::Connection;
    use time::{Duration, OffsetDateTime, macros::datetime};

    use crate::{
        Error, PasswordHash,
        account::{AccountId, NewAccount, create_account, get_account_by_id},
        db::initialize,
    };

    use super::{
        NewExpense, find_expenses_by_account, insert_expense, list_recent_expenses,
        record_expense,
    };

    fn get_db_connection_with_account(balance: f64) -> (Connection, AccountId) {
        let conn =
            Connection::open_in_memory().expect("Could not create in-memory SQLite database");
        initialize(&conn).expect("Could not initialize database");
        let account = create_account(
            NewAccount {
                username: "alice".to_owned(),
                password_hash: PasswordHash::new_unchecked("hunter2"),
                phone: None,
                initial_balance: balance,
            },
            &conn,
        )
        .expect("Could not create test account");

        (conn, account.id)
    }

    fn new_expense(account_id: AccountId, amount: f64, category: &str) -> NewExpense {
        NewExpense::new(account_id, None, amount, category).unwrap()
    }

    #[test]
    fn new_expense_rejects_non_positive_amount() {
        let account_id = AccountId::new(1);

        for amount in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(
                matches!(
                    NewExpense::new(account_id, None, amount, "shopping"),
                    Err(Error::InvalidInput(_))
                ),
                "want amount {amount} to be rejected"
            );
        }
    }

    #[test]
    fn new_expense_rejects_empty_category() {
        let result = NewExpense::new(AccountId::new(1), None, 1.0, "  ");

        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn new_expense_drops_blank_description() {
        let expense =
            NewExpense::new(AccountId::new(1), Some("   ".to_owned()), 1.0, "other").unwrap();

        assert_eq!(expense.description, None);
    }

    #[test]
    fn record_expense_deducts_balance() {
        let (mut conn, account_id) = get_db_connection_with_account(100.0);

        let receipt: crate::ExpenseReceipt =
            record_expense(new_expense(account_id, 30.0, "shopping"), &mut conn).unwrap();

        assert_eq!(receipt.new_balance, 70.0);
        assert_eq!(receipt.expense.amount, 30.0);
        assert_eq!(receipt.expense.category, "shopping");
        assert_eq!(get_account_by_id(account_id, &conn).unwrap().balance, 70.0);
        assert_eq!(
            find_expenses_by_account(account_id, &conn).unwrap(),
            vec![receipt.expense]
        );
    }

    #[test]
    fn record_expense_allows_spending_entire_balance() {
        let (mut conn, account_id) = get_db_connection_with_account(100.0);

        let receipt = record_expense(new_expense(account_id, 100.0, "other"), &mut conn).unwrap();

        assert_eq!(receipt.new_balance, 0.0);
    }

    #[test]
    fn record_expense_over_balance_changes_nothing() {
        let (mut conn, account_id) = get_db_connection_with_account(100.0);
        record_expense(new_expense(account_id, 30.0, "shopping"), &mut conn).unwrap();

        let result = record_expense(new_expense(account_id, 80.0, "other"), &mut conn);

        assert_eq!(result, Err(Error::InsufficientBalance));
        assert_eq!(get_account_by_id(account_id, &conn).unwrap().balance, 70.0);
        assert_eq!(find_expenses_by_account(account_id, &conn).unwrap().len(), 1);
    }

    #[test]
    fn concurrent_record_expense_only_one_passes_balance_check() {
        let (conn, account_id) = get_db_connection_with_account(100.0);
        let conn = Arc::new(Mutex::new(conn));
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let conn = conn.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    let mut conn = conn.lock().unwrap();
                    record_expense(new_expense(account_id, 60.0, "shopping"), &mut conn)
                })
            })
            .collect();
        let results: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect();

        assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 1);
        assert!(results.contains(&Err(Error::InsufficientBalance)));
        let conn = conn.lock().unwrap();
        assert_eq!(get_account_by_id(account_id, &conn).unwrap().balance, 40.0);
        assert_eq!(find_expenses_by_account(account_id, &conn).unwrap().len(), 1);
    }

    #[test]
    fn record_expense_for_missing_account_is_not_found() {
        let (mut conn, _) = get_db_connection_with_account(100.0);

        let result = record_expense(new_expense(AccountId::new(42), 1.0, "other"), &mut conn);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn insert_expense_round_trips_timestamp() {
        let (conn, account_id) = get_db_connection_with_account(100.0);
        let created_at = datetime!(2025-01-31 00:00:00.000001 UTC);

        let inserted =
            insert_expense(&new_expense(account_id, 1.0, "other"), created_at, &conn).unwrap();

        assert_eq!(inserted.created_at, created_at);
        assert_eq!(
            find_expenses_by_account(account_id, &conn).unwrap(),
            vec![inserted]
        );
    }

    #[test]
    fn list_recent_expenses_returns_newest_five() {
        let (conn, account_id) = get_db_connection_with_account(1000.0);
        let start = datetime!(2025-01-01 09:00 UTC);
        let mut inserted = Vec::new();
        for i in 0..7 {
            let expense = insert_expense(
                &new_expense(account_id, (i + 1) as f64, "other"),
                start + Duration::minutes(i),
                &conn,
            )
            .unwrap();
            inserted.push(expense);
        }

        let got = list_recent_expenses(account_id, 5, &conn).unwrap();

        let want: Vec<_> = inserted.into_iter().rev().take(5).collect();
        assert_eq!(got, want);
    }

    #[test]
    fn list_recent_expenses_breaks_ties_by_id() {
        let (conn, account_id) = get_db_connection_with_account(1000.0);
        let created_at = OffsetDateTime::now_utc();
        let first =
            insert_expense(&new_expense(account_id, 1.0, "other"), created_at, &conn).unwrap();
        let second =
            insert_expense(&new_expense(account_id, 2.0, "other"), created_at, &conn).unwrap();

        let got = list_recent_expenses(account_id, 5, &conn).unwrap();

        assert_eq!(got, vec![second, first]);
    }

    #[test]
    fn list_recent_expenses_only_includes_own_expenses() {
        let (conn, alice_id) = get_db_connection_with_account(1000.0);
        let bob = create_account(
            NewAccount {
                username: "bob".to_owned(),
                password_hash: PasswordHash::new_unchecked("hunter3"),
                phone: None,
                initial_balance: 10.0,
            },
            &conn,
        )
        .unwrap();
        insert_expense(
            &new_expense(bob.id, 5.0, "other"),
            OffsetDateTime::now_utc(),
            &conn,
        )
        .unwrap();

        assert_eq!(list_recent_expenses(alice_id, 5, &conn), Ok(vec![]));
    }

    #[test]
    fn deleting_account_deletes_expenses() {
        let (mut conn, account_id) = get_db_connection_with_account(100.0);
        record_expense(new_expense(account_id, 10.0, "other"), &mut conn).unwrap();

        conn.execute("DELETE FROM account WHERE id = ?1", [account_id.as_i64()])
            .unwrap();

        let remaining: i64 = conn
            .query_row("SELECT COUNT(*) FROM expense", [], |row| row.get(0))
            .unwrap();
        assert_eq!(remaining, 0);
    }
}
