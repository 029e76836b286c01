//! Bot settings from an optional `config.toml`, overridable by environment variables.
//!
//! ```toml
//! [bot]
//! ledger_scope = "global"      # or "per_chat"
//! utc_offset_hours = 3         # local time of loan records
//! session_ttl_minutes = 30     # how long a multi-step flow waits for input
//! ```

use crate::{
    core::keys::LedgerScope,
    errors::{Error, Result},
};
use chrono::{Duration, FixedOffset, Offset, Utc};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// Structure of the whole `config.toml` file
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    /// Bot behaviour settings
    #[serde(default)]
    pub bot: Settings,
}

/// Tunable bot behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// One shared loan ledger or one per chat
    pub ledger_scope: LedgerScope,
    /// Offset from UTC used to timestamp loan records
    pub utc_offset_hours: i32,
    /// Lifetime of a pending multi-step flow
    pub session_ttl_minutes: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ledger_scope: LedgerScope::Global,
            utc_offset_hours: 3,
            session_ttl_minutes: 30,
        }
    }
}

impl Settings {
    /// Time zone of loan timestamps. Out-of-range offsets fall back to UTC.
    #[must_use]
    pub fn local_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_hours * 3600)
            .unwrap_or_else(|| Utc.fix())
    }

    /// Lifetime of a pending multi-step flow.
    #[must_use]
    pub fn session_ttl(&self) -> Duration {
        Duration::minutes(self.session_ttl_minutes)
    }

    /// Applies `LEDGER_SCOPE`, `UTC_OFFSET_HOURS` and `SESSION_TTL_MINUTES` from the environment.
    ///
    /// # Errors
    /// Returns an error if a variable is set but cannot be parsed.
    pub fn apply_env_overrides(mut self) -> Result<Self> {
        if let Ok(scope) = std::env::var("LEDGER_SCOPE") {
            self.ledger_scope = scope
                .parse()
                .map_err(|message: String| Error::Config { message })?;
        }
        if let Ok(offset) = std::env::var("UTC_OFFSET_HOURS") {
            self.utc_offset_hours = parse_env_number("UTC_OFFSET_HOURS", &offset)?;
        }
        if let Ok(ttl) = std::env::var("SESSION_TTL_MINUTES") {
            self.session_ttl_minutes = parse_env_number("SESSION_TTL_MINUTES", &ttl)?;
        }
        Ok(self)
    }
}

fn parse_env_number<T: std::str::FromStr>(var: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e| Error::Config {
        message: format!("Invalid {var} '{raw}': {e}"),
    })
}

/// Loads settings from a TOML file.
///
/// # Errors
/// Returns an error if the file cannot be read or is not valid TOML.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path_ref = path.as_ref();
    debug!("Loading settings from {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {path_ref:?}: {e}"),
    })?;

    let file: ConfigFile = toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config file {path_ref:?}: {e}"),
    })?;
    Ok(file.bot)
}

/// Loads `./config.toml` if present, defaults otherwise, then applies environment overrides.
///
/// # Errors
/// Returns an error if the file exists but is invalid, or an override cannot be parsed.
pub fn load_default_settings() -> Result<Settings> {
    let path = Path::new("config.toml");
    let settings = if path.exists() {
        load_settings(path)?
    } else {
        debug!("No config.toml found, using default settings");
        Settings::default()
    };
    settings.apply_env_overrides()
}
