//! Finity is a personal-finance tracker for students.
//!
//! This library provides a JSON API for registering and logging in, recording
//! expenses against a balance, reviewing recent spending and asking a
//! generative-language model for savings advice.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod account;
mod advisor;
mod app_state;
mod auth;
mod db;
mod endpoints;
mod error;
mod expense;
mod index_page;
mod logging;
mod not_found;
mod routing;
#[cfg(test)]
mod test_utils;

pub use account::{
    Account, AccountId, DEFAULT_INITIAL_BALANCE, NewAccount, create_account, get_account_by_username,
};
pub use advisor::{
    AdvisorClient, AdvisorConfig, AdvisorError, ConfigError, DEFAULT_ADVISOR_MODEL,
    DEFAULT_ADVISOR_TIMEOUT, DEFAULT_ADVISOR_URL,
};
pub use app_state::AppState;
pub use auth::{PasswordHash, ValidatedPassword};
pub use db::initialize as initialize_db;
pub use error::Error;
pub use expense::{
    Expense, ExpenseId, ExpenseReceipt, NewExpense, insert_expense, record_expense,
};
pub use logging::{LOG_BODY_LENGTH_LIMIT, logging_middleware};
pub use routing::build_router;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for the Ctrl+C signal: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate_signal) => {
                terminate_signal.recv().await;
            }
            Err(error) => {
                tracing::error!("Failed to install the terminate signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
