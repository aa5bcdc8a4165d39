//! Spending totals for the logged-in account, overall and per category.

use axum::{Extension, Json, extract::State};
use serde::Serialize;

use crate::{
    Error,
    account::AccountId,
    expense::{Expense, ExpenseState, find_expenses_by_account},
};

/// The category for clothes, groceries and similar purchases.
pub const SHOPPING: &str = "shopping";
/// The category for payments to merchants.
pub const MERCHANT: &str = "merchant";
/// The catch-all category.
pub const OTHER: &str = "other";

/// Total spending and the subtotals of the well-known categories.
///
/// Expenses in any other category only count towards `total_spent`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpendingInsights {
    pub total_spent: f64,
    pub shopping_spent: f64,
    pub merchant_spent: f64,
    pub other_spent: f64,
}

impl SpendingInsights {
    /// Sum `expenses` overall and for each well-known category.
    ///
    /// Categories are matched exactly, so "Shopping" is not counted as "shopping".
    pub fn from_expenses(expenses: &[Expense]) -> Self {
        expenses
            .iter()
            .fold(Self::default(), |mut insights, expense| {
                insights.total_spent += expense.amount;

                match expense.category.as_str() {
                    SHOPPING => insights.shopping_spent += expense.amount,
                    MERCHANT => insights.merchant_spent += expense.amount,
                    OTHER => insights.other_spent += expense.amount,
                    _ => {}
                }

                insights
            })
    }
}

/// A route handler that returns the [SpendingInsights] for all of the
/// account's expenses.
pub async fn get_insights_endpoint(
    State(state): State<ExpenseState>,
    Extension(account_id): Extension<AccountId>,
) -> Result<Json<SpendingInsights>, Error> {
    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let expenses = find_expenses_by_account(account_id, &connection)?;

    Ok(Json(SpendingInsights::from_expenses(&expenses)))
}
