//! Accounts: the registered users of the application and their balances.

mod core;
mod details_endpoint;

pub use core::{
    Account, AccountId, DEFAULT_INITIAL_BALANCE, NewAccount, create_account, create_account_table,
    get_account_by_id, get_account_by_username,
};
pub use details_endpoint::get_account_details_endpoint;
