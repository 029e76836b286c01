//! Outbound messaging seam.
//!
//! Core handlers never talk to Discord directly. They describe what to send as an
//! [`OutgoingMessage`] (text plus an optional button keyboard) and hand it to a
//! [`Messenger`], which the bot layer implements on top of serenity.

use crate::errors::Result;
use async_trait::async_trait;

/// Identifier of a chat (a Discord channel).
pub type ChatId = u64;
/// Identifier of a user.
pub type UserId = u64;

/// Where a message should be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recipient {
    /// A chat/channel visible to everyone in it
    Chat(ChatId),
    /// A private conversation with a single user
    User(UserId),
}

/// A button that sends `payload` back to the bot when pressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    /// Text shown on the button
    pub label: String,
    /// Callback payload delivered on press
    pub payload: String,
}

impl Button {
    /// Creates a button with the given label and payload.
    pub fn new(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            payload: payload.into(),
        }
    }
}

/// A message with an optional keyboard laid out in rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutgoingMessage {
    /// Message body
    pub text: String,
    /// Button rows, top to bottom
    pub keyboard: Vec<Vec<Button>>,
}

impl OutgoingMessage {
    /// Creates a plain text message.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: Vec::new(),
        }
    }

    /// Attaches button rows to the message.
    #[must_use]
    pub fn with_keyboard(mut self, keyboard: Vec<Vec<Button>>) -> Self {
        self.keyboard = keyboard;
        self
    }

    /// Iterates over every button in the keyboard, row by row.
    pub fn buttons(&self) -> impl Iterator<Item = &Button> {
        self.keyboard.iter().flatten()
    }
}

impl From<String> for OutgoingMessage {
    fn from(text: String) -> Self {
        Self::text(text)
    }
}

impl From<&str> for OutgoingMessage {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

/// Delivers messages to chats and users.
///
/// A returned error means the message was not delivered; broadcast callers decide
/// what that implies for the recipient.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Sends a message into a chat.
    async fn send_to_chat(&self, chat_id: ChatId, message: OutgoingMessage) -> Result<()>;

    /// Sends a message privately to a user.
    async fn send_to_user(&self, user_id: UserId, message: OutgoingMessage) -> Result<()>;

    /// Sends a message to either kind of recipient.
    async fn deliver(&self, recipient: Recipient, message: OutgoingMessage) -> Result<()> {
        match recipient {
            Recipient::Chat(chat_id) => self.send_to_chat(chat_id, message).await,
            Recipient::User(user_id) => self.send_to_user(user_id, message).await,
        }
    }
}
