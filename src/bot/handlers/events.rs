//! Gateway event handler.
//!
//! Prefix commands are dispatched by poise itself. Everything else arriving as a
//! message is free text for the router, and every button click is a callback.

use crate::{
    bot::{BotData, messenger::DiscordMessenger},
    core::router::{self, Command, Origin},
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::debug;

/// Routes messages and component interactions to the core router.
pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, BotData, Error>,
    data: &BotData,
) -> Result<()> {
    match event {
        serenity::FullEvent::Message { new_message } => on_message(ctx, new_message, data).await,
        serenity::FullEvent::InteractionCreate {
            interaction: serenity::Interaction::Component(component),
        } => on_component(ctx, component, data).await,
        _ => Ok(()),
    }
}

/// Whether a message should reach the router as free text.
///
/// In servers only unknown `/` commands are answered; plain chatter is left alone.
/// Direct messages are always routed since that is where prompts are answered.
fn routes_as_free_text(message: &serenity::Message) -> bool {
    if message.author.bot || Command::parse(&message.content).is_some() {
        return false;
    }
    message.guild_id.is_none() || message.content.trim_start().starts_with('/')
}

async fn on_message(
    ctx: &serenity::Context,
    message: &serenity::Message,
    data: &BotData,
) -> Result<()> {
    if !routes_as_free_text(message) {
        return Ok(());
    }

    let messenger = DiscordMessenger::new(Arc::clone(&ctx.http));
    let origin = Origin {
        chat_id: message.channel_id.get(),
        user_id: message.author.id.get(),
    };
    router::handle_free_text(&data.services(&messenger), origin, &message.content).await;
    Ok(())
}

async fn on_component(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    data: &BotData,
) -> Result<()> {
    component
        .create_response(ctx, serenity::CreateInteractionResponse::Acknowledge)
        .await?;

    debug!(payload = %component.data.custom_id, "Button pressed");
    let messenger = DiscordMessenger::new(Arc::clone(&ctx.http));
    router::handle_callback(
        &data.services(&messenger),
        component.user.id.get(),
        &component.data.custom_id,
    )
    .await;
    Ok(())
}
