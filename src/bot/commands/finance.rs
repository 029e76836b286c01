//! Finance Discord commands - categories, budgets, expenses, analytics and history.
//!
//! Replies to these commands always go to the author's DMs.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, commands::run},
        core::router::{Command, first_word},
        errors::{Error, Result},
    };

    /// Unlocks finance tracking. Takes a finance token.
    #[poise::command(prefix_command)]
    pub async fn fin_auth(
        ctx: poise::Context<'_, BotData, Error>,
        #[rest] token: Option<String>,
    ) -> Result<()> {
        let token = first_word(token.as_deref());
        run(ctx, Command::FinAuth { token }).await
    }

    /// Adds an expense category, then asks for its planned monthly amount.
    #[poise::command(prefix_command)]
    pub async fn fin_add_category(
        ctx: poise::Context<'_, BotData, Error>,
        #[rest] name: Option<String>,
    ) -> Result<()> {
        run(ctx, Command::FinAddCategory { name }).await
    }

    /// Lists your categories.
    #[poise::command(prefix_command)]
    pub async fn fin_categories(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        run(ctx, Command::FinCategories).await
    }

    /// Sets the spending limit of a month: `/fin_set_budget 2025-10 50000`.
    #[poise::command(prefix_command)]
    pub async fn fin_set_budget(
        ctx: poise::Context<'_, BotData, Error>,
        #[rest] args: Option<String>,
    ) -> Result<()> {
        let mut words = args.as_deref().unwrap_or_default().split_whitespace();
        let month = words.next().map(str::to_string);
        let amount = words.next().map(str::to_string);
        run(ctx, Command::FinSetBudget { month, amount }).await
    }

    /// Records an expense: pick a category, then type the amount.
    #[poise::command(prefix_command)]
    pub async fn fin_add_expense(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        run(ctx, Command::FinAddExpense).await
    }

    /// Spending by category for a month, or a month picker.
    #[poise::command(prefix_command)]
    pub async fn fin_analytics(
        ctx: poise::Context<'_, BotData, Error>,
        #[rest] month: Option<String>,
    ) -> Result<()> {
        let month = first_word(month.as_deref());
        run(ctx, Command::FinAnalytics { month }).await
    }

    /// Pages through a month's expenses with edit and delete buttons.
    #[poise::command(prefix_command)]
    pub async fn fin_history(
        ctx: poise::Context<'_, BotData, Error>,
        #[rest] month: Option<String>,
    ) -> Result<()> {
        let month = first_word(month.as_deref());
        run(ctx, Command::FinHistory { month }).await
    }
}

// Re-export all commands
pub use inner::*;
