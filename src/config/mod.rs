//! Application configuration: access tokens, bot settings and the store connection.

/// Database configuration and connection management
pub mod database;

/// Bot settings from config.toml and environment overrides
pub mod settings;

/// Access token lists from environment variables
pub mod tokens;

use crate::errors::Result;
use settings::Settings;
use tokens::AccessTokens;
use tracing::info;

/// Everything the handlers need to know about the deployment.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Role-granting tokens
    pub tokens: AccessTokens,
    /// Behaviour settings
    pub settings: Settings,
}

/// Loads the full application configuration from the environment and `config.toml`.
///
/// # Errors
/// Returns an error if a token list is missing or the settings are invalid.
pub fn load_app_config() -> Result<AppConfig> {
    let tokens = AccessTokens::from_env()?;
    let settings = settings::load_default_settings()?;
    info!(
        read_tokens = tokens.read.len(),
        write_tokens = tokens.write.len(),
        finance_tokens = tokens.finance.len(),
        ledger_scope = ?settings.ledger_scope,
        "Loaded application configuration"
    );
    Ok(AppConfig { tokens, settings })
}
