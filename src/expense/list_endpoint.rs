//! Defines the endpoint for listing the logged-in account's recent expenses.

use axum::{Extension, Json, extract::State};
use serde::Serialize;
use time::OffsetDateTime;

use crate::{
    Error,
    account::AccountId,
    expense::{
        Expense, ExpenseId, ExpenseState, RECENT_EXPENSES_LIMIT, list_recent_expenses,
        serialize_rfc3339,
    },
};

/// How an expense is presented to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseView {
    pub id: ExpenseId,
    pub description: Option<String>,
    pub amount: f64,
    pub category: String,
    /// When the expense was recorded.
    #[serde(serialize_with = "serialize_rfc3339")]
    pub date: OffsetDateTime,
}

impl From<Expense> for ExpenseView {
    fn from(expense: Expense) -> Self {
        Self {
            id: expense.id,
            description: expense.description,
            amount: expense.amount,
            category: expense.category,
            date: expense.created_at,
        }
    }
}

/// A route handler that returns the account's five most recent expenses,
/// newest first.
pub async fn get_expenses_endpoint(
    State(state): State<ExpenseState>,
    Extension(account_id): Extension<AccountId>,
) -> Result<Json<Vec<ExpenseView>>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let expenses = list_recent_expenses(account_id, RECENT_EXPENSES_LIMIT, &connection)?;

    Ok(Json(expenses.into_iter().map(ExpenseView::from).collect()))
}
