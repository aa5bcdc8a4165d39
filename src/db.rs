//! Creates the application's database tables.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{Error, account::create_account_table, expense::create_expense_table};

/// Enable foreign keys and create the tables for accounts and expenses if
/// they do not exist yet.
///
/// # Errors
/// Returns an error if a table could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // Foreign keys are a per-connection setting and cannot be changed inside a transaction.
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_account_table(&transaction)?;
    create_expense_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
