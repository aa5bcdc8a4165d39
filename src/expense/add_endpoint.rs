//! Defines the endpoint for recording a new expense.

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    Error,
    account::AccountId,
    expense::{ExpenseState, NewExpense, record_expense},
};

/// The JSON body of a request to add an expense.
#[derive(Debug, Deserialize)]
pub struct ExpenseData {
    pub description: Option<String>,
    pub amount: f64,
    pub category: String,
}

/// A route handler for recording an expense against the logged-in account.
///
/// Responds with 201 Created and the account's new balance.
///
/// # Errors
///
/// Returns a:
/// - [Error::InvalidInput] if the amount is not positive or the category is empty,
/// - [Error::InsufficientBalance] if the amount is larger than the balance or
///   the account no longer exists.
pub async fn add_expense_endpoint(
    State(state): State<ExpenseState>,
    Extension(account_id): Extension<AccountId>,
    payload: Result<Json<ExpenseData>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), Error> {
    let Json(data) = payload?;
    let new_expense = NewExpense::new(account_id, data.description, data.amount, &data.category)?;

    let mut connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("Could not acquire database lock: {error}");
        Error::DatabaseLockError
    })?;

    let receipt = record_expense(new_expense, &mut connection).map_err(|error| match error {
        Error::NotFound => {
            tracing::warn!("Account {account_id} has a session but no longer exists");
            Error::InsufficientBalance
        }
        error => error,
    })?;

    tracing::debug!(
        "Recorded expense {} for account {account_id}",
        receipt.expense.id
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Expense added successfully",
            "new_balance": receipt.new_balance,
        })),
    ))
}

#[cfg(test)]
mod add_expense_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Router, http::StatusCode, routing::post};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use serde_json::json;

    use crate::{
        PasswordHash,
        account::{AccountId, NewAccount, create_account, get_account_by_id},
        db::initialize,
        endpoints,
        expense::{ExpenseState, find_expenses_by_account},
    };

    use super::add_expense_endpoint;

    fn get_test_state() -> (ExpenseState, AccountId) {
        let conn = Connection::open_in_memory().expect("Could not open in-memory database");
        initialize(&conn).expect("Could not initialize database");
        let account = create_account(
            NewAccount {
                username: "alice".to_owned(),
                password_hash: PasswordHash::new_unchecked("hunter2"),
                phone: None,
                initial_balance: 100.0,
            },
            &conn,
        )
        .expect("Could not create test account");

        (
            ExpenseState {
                db_connection: Arc::new(Mutex::new(conn)),
            },
            account.id,
        )
    }

    fn get_test_server(state: ExpenseState, account_id: AccountId) -> TestServer {
        let app = Router::new()
            .route(endpoints::ADD_EXPENSE, post(add_expense_endpoint))
            .layer(Extension(account_id))
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn add_expense_returns_new_balance() {
        let (state, account_id) = get_test_state();
        let server = get_test_server(state.clone(), account_id);

        let response = server
            .post(endpoints::ADD_EXPENSE)
            .json(&json!({ "description": "shoes", "amount": 30.0, "category": "shopping" }))
            .await;

        response.assert_status(StatusCode::CREATED);
        response.assert_json(&json!({
            "message": "Expense added successfully",
            "new_balance": 70.0,
        }));

        let connection = state.db_connection.lock().unwrap();
        let expenses = find_expenses_by_account(account_id, &connection).unwrap();
        assert_eq!(expenses.len(), 1);
        assert_eq!(expenses[0].description.as_deref(), Some("shoes"));
    }

    #[tokio::test]
    async fn add_expense_over_balance_is_rejected() {
        let (state, account_id) = get_test_state();
        let server = get_test_server(state.clone(), account_id);

        let response = server
            .post(endpoints::ADD_EXPENSE)
            .json(&json!({ "amount": 100.01, "category": "other" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({ "error": "Insufficient balance or invalid data" }));

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_account_by_id(account_id, &connection).unwrap().balance, 100.0);
        assert!(find_expenses_by_account(account_id, &connection).unwrap().is_empty());
    }

    #[tokio::test]
    async fn add_expense_for_deleted_account_is_rejected() {
        let (state, account_id) = get_test_state();
        let server = get_test_server(state.clone(), account_id);
        state
            .db_connection
            .lock()
            .unwrap()
            .execute("DELETE FROM account", [])
            .unwrap();

        let response = server
            .post(endpoints::ADD_EXPENSE)
            .json(&json!({ "amount": 5.0, "category": "other" }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        response.assert_json(&json!({ "error": "Insufficient balance or invalid data" }));
        let connection = state.db_connection.lock().unwrap();
        assert!(find_expenses_by_account(account_id, &connection).unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_expenses_cannot_overdraw_balance() {
        let (state, account_id) = get_test_state();
        let server = get_test_server(state.clone(), account_id);
        let body = json!({ "amount": 60.0, "category": "shopping" });

        let (first, second) = tokio::join!(
            async { server.post(endpoints::ADD_EXPENSE).json(&body).await },
            async { server.post(endpoints::ADD_EXPENSE).json(&body).await },
        );

        let mut statuses = [first.status_code(), second.status_code()];
        statuses.sort();
        assert_eq!(statuses, [StatusCode::CREATED, StatusCode::BAD_REQUEST]);

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_account_by_id(account_id, &connection).unwrap().balance, 40.0);
        assert_eq!(find_expenses_by_account(account_id, &connection).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn add_expense_with_invalid_fields_is_rejected() {
        let (state, account_id) = get_test_state();
        let server = get_test_server(state, account_id);

        let bodies = [
            json!({ "amount": -5.0, "category": "other" }),
            json!({ "amount": 5.0, "category": "" }),
            json!({ "amount": "5", "category": "other" }),
            json!({ "category": "other" }),
            json!({ "amount": 5.0 }),
        ];

        for body in bodies {
            server
                .post(endpoints::ADD_EXPENSE)
                .json(&body)
                .await
                .assert_status(StatusCode::BAD_REQUEST);
        }
    }
}
