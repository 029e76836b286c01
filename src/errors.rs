//! Unified error type for the bot.
//!
//! Variants fall into two groups. User-facing variants (`InvalidFormat`,
//! `Unauthorized`, `NotFound`, `DuplicateCategory`, `AmountTooLarge`) carry a
//! message that is shown verbatim to whoever issued the command. Everything else is an
//! internal failure that gets logged and answered with a generic reply.

use thiserror::Error;

/// All errors produced by the bot.
#[derive(Debug, Error)]
pub enum Error {
    /// An argument was missing or could not be parsed
    #[error("Invalid format. Usage: {usage}")]
    InvalidFormat {
        /// Expected syntax shown back to the user
        usage: String,
    },

    /// The caller lacks the role required for the operation
    #[error("Access denied. {hint}")]
    Unauthorized {
        /// How to obtain access
        hint: String,
    },

    /// The requested entity does not exist
    #[error("{what}")]
    NotFound {
        /// Description of what is missing
        what: String,
    },

    /// A category with this name already exists for the user
    #[error("Category «{name}» already exists")]
    DuplicateCategory {
        /// The rejected category name
        name: String,
    },

    /// A sum or ratio of stored amounts no longer fits in a `Decimal`
    #[error("Amount is too large")]
    AmountTooLarge,

    /// Invalid or missing configuration
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Store failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// A stored record could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing environment variable
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Writing into a `String` failed
    #[error("Formatting error: {0}")]
    Fmt(#[from] std::fmt::Error),

    /// Discord transport failure
    #[error("Serenity/Poise framework error: {0}")]
    Framework(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::Framework(Box::new(value))
    }
}

impl Error {
    /// Shorthand for [`Error::InvalidFormat`].
    pub fn invalid_format(usage: impl Into<String>) -> Self {
        Self::InvalidFormat {
            usage: usage.into(),
        }
    }

    /// Shorthand for [`Error::Unauthorized`].
    pub fn unauthorized(hint: impl Into<String>) -> Self {
        Self::Unauthorized { hint: hint.into() }
    }

    /// Shorthand for [`Error::NotFound`].
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Whether the message of this error is meant for the person who issued the command.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::InvalidFormat { .. }
                | Self::Unauthorized { .. }
                | Self::NotFound { .. }
                | Self::DuplicateCategory { .. }
                | Self::AmountTooLarge
        )
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_classification() {
        assert!(Error::invalid_format("/pay 15000").is_user_facing());
        assert!(Error::unauthorized("Use /user_authorize").is_user_facing());
        assert!(Error::not_found("No loan set").is_user_facing());
        assert!(
            Error::DuplicateCategory {
                name: "Food".to_string()
            }
            .is_user_facing()
        );
        assert!(Error::AmountTooLarge.is_user_facing());
        assert!(
            !Error::Config {
                message: "missing".to_string()
            }
            .is_user_facing()
        );
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            Error::invalid_format("/set 100000").to_string(),
            "Invalid format. Usage: /set 100000"
        );
        assert_eq!(
            Error::DuplicateCategory {
                name: "Food".to_string()
            }
            .to_string(),
            "Category «Food» already exists"
        );
    }
}
