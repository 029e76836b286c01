//! General Discord commands.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, commands::run},
        core::router::Command,
        errors::{Error, Result},
    };

    /// Shows what the bot can do.
    #[poise::command(prefix_command)]
    pub async fn start(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        run(ctx, Command::Start).await
    }
}

// Re-export all commands
pub use inner::*;
