//! Fan-out of one message to many chats.
//!
//! Sends are sequential. What happens to a chat whose send fails depends on the
//! caller's [`FailurePolicy`].

use super::{
    keys,
    messenger::{ChatId, Messenger, OutgoingMessage},
};
use crate::{errors::Result, store::KvStore};
use tracing::{info, warn};

/// What to do with a chat that could not be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Drop the chat from the authorized set after a single failed send
    RevokeOnFailure,
    /// Log the failure and keep the chat
    IgnoreOnFailure,
}

/// Outcome of a broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Number of chats that received the message
    pub delivered: usize,
    /// Chats whose send failed
    pub failed: Vec<ChatId>,
}

/// Every chat in the authorized set. Members that are not valid ids are skipped.
pub async fn authorized_chats(store: &KvStore) -> Result<Vec<ChatId>> {
    let members = store.set_members(keys::auth_chats()).await?;
    Ok(members
        .iter()
        .filter_map(|member| member.parse::<ChatId>().ok())
        .collect())
}

/// Sends `message` to each chat in `audience`, applying `policy` to failures.
pub async fn broadcast<M: Messenger>(
    store: &KvStore,
    messenger: &M,
    audience: &[ChatId],
    message: &OutgoingMessage,
    policy: FailurePolicy,
) -> Result<BroadcastReport> {
    let mut report = BroadcastReport::default();

    for &chat_id in audience {
        match messenger.send_to_chat(chat_id, message.clone()).await {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                warn!(chat_id, error = %e, "Failed to deliver broadcast");
                if policy == FailurePolicy::RevokeOnFailure {
                    store
                        .set_remove(keys::auth_chats(), &chat_id.to_string())
                        .await?;
                    info!(chat_id, "Revoked authorization of unreachable chat");
                }
                report.failed.push(chat_id);
            }
        }
    }

    Ok(report)
}
