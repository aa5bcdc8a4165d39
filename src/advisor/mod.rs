//! The savings advisor: relays questions and the user's expenses to a
//! generative-language model.

mod chat_endpoint;
pub(crate) mod client;
mod config;
mod prompt;

pub use chat_endpoint::chat_endpoint;
pub use client::{AdvisorClient, AdvisorError};
pub use config::{
    AdvisorConfig, ConfigError, DEFAULT_ADVISOR_MODEL, DEFAULT_ADVISOR_TIMEOUT,
    DEFAULT_ADVISOR_URL,
};
pub use prompt::build_prompt;
