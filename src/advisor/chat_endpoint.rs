//! The endpoint that relays a question to the advisor.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    AppState, Error,
    advisor::{AdvisorClient, build_prompt},
    auth::get_token_from_cookies,
    expense::find_expenses_by_account,
};

/// The state needed to ask the advisor a question.
#[derive(Debug, Clone)]
pub struct ChatState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    pub db_connection: Arc<Mutex<Connection>>,
    pub advisor: AdvisorClient,
}

impl FromRef<AppState> for ChatState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            db_connection: state.db_connection.clone(),
            advisor: state.advisor.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<ChatState> for Key {
    fn from_ref(state: &ChatState) -> Self {
        state.cookie_key.clone()
    }
}

/// The JSON body of a chat request.
#[derive(Debug, Deserialize)]
pub struct ChatData {
    pub message: String,
}

/// A route handler that answers `message` with advice from the model.
///
/// Logging in is optional. With a valid session the account's expenses are
/// included in the prompt, otherwise the model sees an empty history.
///
/// # Errors
///
/// Returns a:
/// - [Error::InvalidInput] if the message is empty,
/// - [Error::Upstream] if the model could not be reached or responded with an error.
pub async fn chat_endpoint(
    State(state): State<ChatState>,
    jar: PrivateCookieJar,
    payload: Result<Json<ChatData>, JsonRejection>,
) -> Result<Json<Value>, Error> {
    let Json(data) = payload?;
    let message = data.message.trim();

    if message.is_empty() {
        return Err(Error::InvalidInput("message cannot be empty".to_owned()));
    }

    let expenses = match get_token_from_cookies(&jar) {
        Ok(token) => {
            let connection = state.db_connection.lock().map_err(|error| {
                tracing::error!("Could not acquire database lock: {error}");
                Error::DatabaseLockError
            })?;

            find_expenses_by_account(token.account_id, &connection)?
        }
        Err(_) => Vec::new(),
    };

    let prompt = build_prompt(&expenses, message);
    let response = state.advisor.generate(&prompt).await?;

    Ok(Json(json!({ "response": response })))
}
