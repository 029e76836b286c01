//! Access token configuration loaded from environment variables.
//!
//! Three comma-separated lists control who may do what:
//! `READ_TOKENS` authorize chats to see the loan, `WRITE_TOKENS` authorize chats
//! and users to change it, `FIN_TOKENS` unlock personal finance tracking.

use crate::errors::{Error, Result};

/// Shared secrets granting the bot's roles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessTokens {
    /// Tokens granting chat read access
    pub read: Vec<String>,
    /// Tokens granting write access (and chat read access)
    pub write: Vec<String>,
    /// Tokens granting finance access
    pub finance: Vec<String>,
}

impl AccessTokens {
    /// Loads all three token lists from the environment.
    ///
    /// # Errors
    /// Returns an error if any of `READ_TOKENS`, `WRITE_TOKENS` or `FIN_TOKENS` is unset.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            read: required_list("READ_TOKENS")?,
            write: required_list("WRITE_TOKENS")?,
            finance: required_list("FIN_TOKENS")?,
        })
    }

    /// A chat may be authorized with either a read or a write token.
    #[must_use]
    pub fn grants_chat_read(&self, token: &str) -> bool {
        contains(&self.read, token) || contains(&self.write, token)
    }

    /// Whether `token` lets a user change the loan.
    #[must_use]
    pub fn grants_write(&self, token: &str) -> bool {
        contains(&self.write, token)
    }

    /// Whether `token` unlocks finance tracking.
    #[must_use]
    pub fn grants_finance(&self, token: &str) -> bool {
        contains(&self.finance, token)
    }
}

fn contains(list: &[String], token: &str) -> bool {
    let token = token.trim();
    !token.is_empty() && list.iter().any(|t| t == token)
}

fn required_list(var: &str) -> Result<Vec<String>> {
    let raw = std::env::var(var).map_err(|e| Error::Config {
        message: format!("{var} is not set: {e}"),
    })?;
    Ok(parse_token_list(&raw))
}

/// Splits a comma-separated list, trimming entries and dropping empty ones.
#[must_use]
pub fn parse_token_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToString::to_string)
        .collect()
}
