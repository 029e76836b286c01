//! Bot layer - Discord-specific interface and command handlers
//!
//! This module wires the core router to Discord: prefix commands, the event
//! handler for free text and button presses, and the outbound messenger.

/// Discord command implementations (general, loan, finance)
pub mod commands;
/// Discord event handlers (free text, button presses)
pub mod handlers;
/// Discord-backed messenger
pub mod messenger;

use crate::{
    config::AppConfig,
    core::{Services, messenger::Messenger, reminder},
    errors::{Error, Result},
    store::KvStore,
};
use messenger::DiscordMessenger;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Shared data available to all bot commands and event handlers.
pub struct BotData {
    /// Key-value store for all persistent state
    pub store: KvStore,
    /// Deployment configuration
    pub config: Arc<AppConfig>,
}

impl BotData {
    /// Creates a new `BotData` instance.
    #[must_use]
    pub const fn new(store: KvStore, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }

    /// Handler services sending through `messenger`.
    pub fn services<'a, M: Messenger>(&'a self, messenger: &'a M) -> Services<'a, M> {
        Services::new(&self.store, messenger, &self.config)
    }
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {error}");
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command `{}`: {error}", ctx.command().name);
            if let Err(e) = ctx.say("❌ Something went wrong. Please try again later").await {
                error!("Failed to send error message: {e}");
            }
        }
        poise::FrameworkError::EventHandler { error, event, .. } => {
            error!("Error handling event {}: {error}", event.snake_case_name());
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {e}");
            }
        }
    }
}

/// Connects to Discord and runs until the client stops.
///
/// Commands use the `/` prefix so they read like the chat commands users know.
/// The monthly reminder is spawned once the client is ready.
#[instrument(skip(token, config, store))]
pub async fn run_bot(token: String, config: Arc<AppConfig>, store: KvStore) -> Result<()> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: commands::all(),
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some("/".into()),
                case_insensitive_commands: true,
                ..Default::default()
            },
            event_handler: |ctx, event, framework, data| {
                Box::pin(handlers::event_handler(ctx, event, framework, data))
            },
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(move |ctx, ready, _framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                reminder::spawn(
                    store.clone(),
                    DiscordMessenger::new(Arc::clone(&ctx.http)),
                    config.settings.ledger_scope,
                );
                Ok(BotData::new(store, config))
            })
        })
        .build();

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::DIRECT_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::Client::builder(&token, intents)
        .framework(framework)
        .await
        .inspect_err(|e| error!("Error creating client: {e}"))?;

    info!("Starting bot client...");
    client
        .start()
        .await
        .inspect_err(|e| error!("Client error: {e}"))?;
    Ok(())
}
