//! Expenses: recording money spent against an account's balance and
//! summarising an account's spending.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

mod add_endpoint;
mod core;
mod insights;
mod list_endpoint;

pub use add_endpoint::add_expense_endpoint;
pub use core::{
    Expense, ExpenseId, ExpenseReceipt, NewExpense, RECENT_EXPENSES_LIMIT, create_expense_table,
    find_expenses_by_account, insert_expense, list_recent_expenses, record_expense,
};
pub(crate) use core::serialize_rfc3339;
pub use insights::get_insights_endpoint;
pub use list_endpoint::get_expenses_endpoint;

/// The state needed by the expense route handlers.
#[derive(Debug, Clone)]
pub struct ExpenseState {
    /// The database connection for reading and writing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}
