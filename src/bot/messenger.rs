//! [`Messenger`] implementation over the Discord HTTP API.
//!
//! Chats are channels; messages to users go to their DM channel. Keyboards become
//! button action rows. Discord allows at most five rows per message, so longer
//! keyboards are continued in follow-up messages.

use crate::{
    core::messenger::{Button, ChatId, Messenger, OutgoingMessage, UserId},
    errors::Result,
};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// Action rows Discord accepts in a single message.
const MAX_ROWS_PER_MESSAGE: usize = 5;

/// Sends messages through a shared serenity HTTP client.
#[derive(Clone)]
pub struct DiscordMessenger {
    http: Arc<serenity::Http>,
}

impl DiscordMessenger {
    /// Wraps the client's HTTP handle.
    #[must_use]
    pub const fn new(http: Arc<serenity::Http>) -> Self {
        Self { http }
    }

    async fn send(&self, channel: serenity::ChannelId, message: OutgoingMessage) -> Result<()> {
        let mut rows = message.keyboard.chunks(MAX_ROWS_PER_MESSAGE);

        let mut first = serenity::CreateMessage::new().content(message.text);
        if let Some(chunk) = rows.next() {
            first = first.components(action_rows(chunk));
        }
        channel.send_message(&*self.http, first).await?;

        for chunk in rows {
            channel
                .send_message(
                    &*self.http,
                    serenity::CreateMessage::new().components(action_rows(chunk)),
                )
                .await?;
        }
        Ok(())
    }
}

fn action_rows(rows: &[Vec<Button>]) -> Vec<serenity::CreateActionRow> {
    rows.iter()
        .map(|row| {
            serenity::CreateActionRow::Buttons(
                row.iter()
                    .map(|button| {
                        serenity::CreateButton::new(button.payload.clone())
                            .label(button.label.clone())
                            .style(serenity::ButtonStyle::Secondary)
                    })
                    .collect(),
            )
        })
        .collect()
}

#[async_trait]
impl Messenger for DiscordMessenger {
    async fn send_to_chat(&self, chat_id: ChatId, message: OutgoingMessage) -> Result<()> {
        self.send(serenity::ChannelId::new(chat_id), message).await
    }

    async fn send_to_user(&self, user_id: UserId, message: OutgoingMessage) -> Result<()> {
        let dm = serenity::UserId::new(user_id)
            .create_dm_channel(&*self.http)
            .await?;
        self.send(dm.id, message).await
    }
}
