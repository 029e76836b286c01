//! Loan Discord commands - authorization, `set`, `pay`, `status` and `history`.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, commands::run},
        core::router::{Command, first_word},
        errors::{Error, Result},
    };

    /// Lets this channel see the loan. Takes a read or write token.
    #[poise::command(prefix_command)]
    pub async fn authorize(
        ctx: poise::Context<'_, BotData, Error>,
        #[rest] token: Option<String>,
    ) -> Result<()> {
        let token = first_word(token.as_deref());
        run(ctx, Command::Authorize { token }).await
    }

    /// Lets you set the loan and record payments. Takes a write token.
    #[poise::command(prefix_command)]
    pub async fn user_authorize(
        ctx: poise::Context<'_, BotData, Error>,
        #[rest] token: Option<String>,
    ) -> Result<()> {
        let token = first_word(token.as_deref());
        run(ctx, Command::UserAuthorize { token }).await
    }

    /// Sets the loan amount and starts a fresh payment history.
    #[poise::command(prefix_command)]
    pub async fn set(
        ctx: poise::Context<'_, BotData, Error>,
        #[rest] amount: Option<String>,
    ) -> Result<()> {
        run(ctx, Command::SetLoan { amount }).await
    }

    /// Records a payment against the loan.
    #[poise::command(prefix_command)]
    pub async fn pay(
        ctx: poise::Context<'_, BotData, Error>,
        #[rest] amount: Option<String>,
    ) -> Result<()> {
        run(ctx, Command::Pay { amount }).await
    }

    /// Shows the current loan balance.
    #[poise::command(prefix_command)]
    pub async fn status(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        run(ctx, Command::Status).await
    }

    /// Lists payments since the loan was last set.
    #[poise::command(prefix_command)]
    pub async fn history(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        run(ctx, Command::History).await
    }
}

// Re-export all commands
pub use inner::*;
