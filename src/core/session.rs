//! Per-user session state for the multi-step finance flows.
//!
//! A session says what the next free-text message from a user means: a planned
//! amount for a freshly added category, the amount of a new expense, or a
//! corrected amount for an existing one. Sessions expire so an abandoned flow does
//! not capture an unrelated message days later.

use super::{keys, messenger::UserId};
use crate::{errors::Result, store::KvStore};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// What the bot is waiting for from a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Session {
    /// Nothing pending
    #[default]
    Idle,
    /// A category was added and needs its planned monthly amount
    AwaitingPlannedAmount {
        /// Category being created
        category: String,
    },
    /// A category was picked and the expense amount is expected
    AwaitingExpenseAmount {
        /// Category of the new expense
        category: String,
    },
    /// A replacement amount for an existing expense is expected
    AwaitingEditedAmount {
        /// Month bucket of the expense
        month: String,
        /// Position of the expense in the month list
        index: usize,
        /// Date of the expense when the edit started; a shifted list no longer matches it
        recorded_at: DateTime<Utc>,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredSession {
    session: Session,
    expires_at: DateTime<Utc>,
}

/// Loads the current session of `user_id`. Expired sessions are dropped and read as idle.
pub async fn load(store: &KvStore, user_id: UserId) -> Result<Session> {
    load_at(store, user_id, Utc::now()).await
}

async fn load_at(store: &KvStore, user_id: UserId, now: DateTime<Utc>) -> Result<Session> {
    let key = keys::fin_session(user_id);
    let Some(stored) = store.get::<StoredSession>(&key).await? else {
        return Ok(Session::Idle);
    };

    if stored.expires_at <= now {
        debug!(user_id, "Session expired");
        store.delete(&key).await?;
        return Ok(Session::Idle);
    }
    Ok(stored.session)
}

/// Starts `session` for `user_id`, replacing whatever was pending.
pub async fn begin(store: &KvStore, user_id: UserId, session: Session, ttl: Duration) -> Result<()> {
    let stored = StoredSession {
        session,
        expires_at: Utc::now() + ttl,
    };
    store.set(&keys::fin_session(user_id), &stored).await
}

/// Returns `user_id` to idle.
pub async fn clear(store: &KvStore, user_id: UserId) -> Result<()> {
    store.delete(&keys::fin_session(user_id)).await?;
    Ok(())
}
