//! Shared test utilities for `LoanBuddy`.
//!
//! Provides an in-memory store, a messenger that records everything sent through
//! it, and a harness bundling both with a test configuration.
#![allow(clippy::unwrap_used)]

use crate::{
    config::{AppConfig, settings::Settings, tokens::AccessTokens},
    core::{
        Services, keys,
        messenger::{ChatId, Messenger, OutgoingMessage, Recipient, UserId},
    },
    errors::{Error, Result},
    store::KvStore,
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::{collections::HashSet, str::FromStr, sync::Mutex};

/// Read token accepted by [`test_config`].
pub const READ_TOKEN: &str = "read-token";
/// Write token accepted by [`test_config`].
pub const WRITE_TOKEN: &str = "write-token";
/// Finance token accepted by [`test_config`].
pub const FIN_TOKEN: &str = "fin-token";

/// Parses a decimal literal.
pub fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Creates an in-memory `SQLite` store with all tables initialized.
/// This is the standard setup for all store-backed tests.
pub async fn setup_test_store() -> Result<KvStore> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(KvStore::new(db))
}

/// Configuration with one token of each kind and default settings.
pub fn test_config() -> AppConfig {
    AppConfig {
        tokens: AccessTokens {
            read: vec![READ_TOKEN.to_string()],
            write: vec![WRITE_TOKEN.to_string()],
            finance: vec![FIN_TOKEN.to_string()],
        },
        settings: Settings::default(),
    }
}

/// Messenger that keeps every delivered message in memory.
///
/// Chats listed as failing reject every send; those attempts are not recorded.
#[derive(Debug, Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<(Recipient, OutgoingMessage)>>,
    failing_chats: HashSet<ChatId>,
}

impl RecordingMessenger {
    /// A messenger whose sends to `chats` always fail.
    pub fn failing_for(chats: impl IntoIterator<Item = ChatId>) -> Self {
        Self {
            sent: Mutex::default(),
            failing_chats: chats.into_iter().collect(),
        }
    }

    /// Everything delivered so far, in order.
    pub fn sent(&self) -> Vec<(Recipient, OutgoingMessage)> {
        self.sent.lock().unwrap().clone()
    }

    /// Texts delivered to one chat.
    pub fn texts_to_chat(&self, chat_id: ChatId) -> Vec<String> {
        self.texts_to(Recipient::Chat(chat_id))
    }

    /// Texts delivered privately to one user.
    pub fn texts_to_user(&self, user_id: UserId) -> Vec<String> {
        self.texts_to(Recipient::User(user_id))
    }

    /// The last message delivered privately to one user.
    pub fn last_to_user(&self, user_id: UserId) -> Option<OutgoingMessage> {
        self.sent()
            .into_iter()
            .rev()
            .find(|(recipient, _)| *recipient == Recipient::User(user_id))
            .map(|(_, message)| message)
    }

    /// Forgets everything recorded so far.
    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }

    fn texts_to(&self, recipient: Recipient) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|(to, _)| *to == recipient)
            .map(|(_, message)| message.text)
            .collect()
    }

    fn record(&self, recipient: Recipient, message: OutgoingMessage) {
        self.sent.lock().unwrap().push((recipient, message));
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_to_chat(&self, chat_id: ChatId, message: OutgoingMessage) -> Result<()> {
        if self.failing_chats.contains(&chat_id) {
            return Err(Error::Config {
                message: format!("chat {chat_id} is unreachable"),
            });
        }
        self.record(Recipient::Chat(chat_id), message);
        Ok(())
    }

    async fn send_to_user(&self, user_id: UserId, message: OutgoingMessage) -> Result<()> {
        self.record(Recipient::User(user_id), message);
        Ok(())
    }
}

/// Store, messenger and configuration for handler tests.
pub struct TestHarness {
    /// In-memory store
    pub store: KvStore,
    /// Recording messenger
    pub messenger: RecordingMessenger,
    /// Configuration handed to handlers
    pub config: AppConfig,
}

impl TestHarness {
    /// Harness with [`test_config`].
    pub async fn new() -> Result<Self> {
        Self::with_config(test_config()).await
    }

    /// Harness with a custom configuration.
    pub async fn with_config(config: AppConfig) -> Result<Self> {
        Ok(Self {
            store: setup_test_store().await?,
            messenger: RecordingMessenger::default(),
            config,
        })
    }

    /// Harness whose messenger cannot reach `chats`.
    pub async fn with_failing_chats(chats: impl IntoIterator<Item = ChatId>) -> Result<Self> {
        Ok(Self {
            store: setup_test_store().await?,
            messenger: RecordingMessenger::failing_for(chats),
            config: test_config(),
        })
    }

    /// Borrows the harness as handler services.
    pub fn services(&self) -> Services<'_, RecordingMessenger> {
        Services::new(&self.store, &self.messenger, &self.config)
    }

    /// Puts `chat_id` into the authorized chat set without sending anything.
    pub async fn authorize_chat(&self, chat_id: ChatId) -> Result<()> {
        self.store
            .set_add(keys::auth_chats(), &chat_id.to_string())
            .await?;
        Ok(())
    }

    /// Grants `user_id` write access without sending anything.
    pub async fn authorize_writer(&self, user_id: UserId) -> Result<()> {
        self.store
            .set_add(keys::auth_users(), &user_id.to_string())
            .await?;
        Ok(())
    }

    /// Grants `user_id` finance access without sending anything.
    pub async fn authorize_finance(&self, user_id: UserId) -> Result<()> {
        self.store
            .set_add(keys::fin_auth_users(), &user_id.to_string())
            .await?;
        Ok(())
    }
}
