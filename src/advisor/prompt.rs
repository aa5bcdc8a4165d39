//! Builds the prompt that asks the model for savings advice.

use serde::Serialize;
use time::OffsetDateTime;

use crate::expense::{Expense, serialize_rfc3339};

/// The parts of an expense the model gets to see.
#[derive(Serialize)]
struct PromptExpense<'a> {
    description: Option<&'a str>,
    amount: f64,
    category: &'a str,
    #[serde(serialize_with = "serialize_rfc3339")]
    date: OffsetDateTime,
}

impl<'a> From<&'a Expense> for PromptExpense<'a> {
    fn from(expense: &'a Expense) -> Self {
        Self {
            description: expense.description.as_deref(),
            amount: expense.amount,
            category: &expense.category,
            date: expense.created_at,
        }
    }
}

/// Combine the user's expense history and their message into one prompt.
///
/// `expenses` may be empty, e.g. for visitors who are not logged in.
pub fn build_prompt(expenses: &[Expense], message: &str) -> String {
    let history: Vec<PromptExpense> = expenses.iter().map(PromptExpense::from).collect();
    let history = serde_json::to_string(&history).unwrap_or_else(|error| {
        tracing::error!("Could not serialize expense history for the advisor: {error}");
        "[]".to_owned()
    });

    format!(
        "You are a financial advisor for students. \
        The user's expenses, as a JSON list, are: {history}\n\
        Analyse their spending patterns and give specific, actionable advice on how they can save money.\n\
        Keep the advice concise and friendly, and relate it to their spending categories (shopping, merchant, other).\n\
        The user wrote: \"{message}\"\n\
        If this is a specific question, answer it using their expenses and your financial knowledge. \
        If it is general, give saving tips based on their expenses."
    )
}
