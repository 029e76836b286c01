//! Core business logic - transport-agnostic loan tracking, finance tracking,
//! command routing and the monthly reminder.
//!
//! Handlers read and write the [`KvStore`] and talk to users only through a
//! [`Messenger`], so everything here is testable without Discord.

/// Amount parsing and formatting
pub mod amount;
/// Expense analytics and report rendering
pub mod analytics;
/// Fan-out to authorized chats
pub mod broadcast;
/// Month buckets and calendar helpers
pub mod calendar;
/// Button callback payloads
pub mod callback;
/// Paginated expense history with edit and delete
pub mod expense_history;
/// Finance tracking: access, categories, budgets, expense entry
pub mod finance;
/// Key schema of the key-value store
pub mod keys;
/// Loan tracking: authorization, balance, payments
pub mod loan;
/// Outbound messaging seam
pub mod messenger;
/// Monthly loan reminder
pub mod reminder;
/// Command and callback routing
pub mod router;
/// Per-user session state for multi-step flows
pub mod session;

use crate::{config::AppConfig, store::KvStore};
use messenger::Messenger;

/// Collaborators shared by every handler invocation.
pub struct Services<'a, M: Messenger> {
    /// Persistent state
    pub store: &'a KvStore,
    /// Outbound messages
    pub messenger: &'a M,
    /// Deployment configuration
    pub config: &'a AppConfig,
}

impl<'a, M: Messenger> Services<'a, M> {
    /// Bundles the collaborators for one update.
    #[must_use]
    pub const fn new(store: &'a KvStore, messenger: &'a M, config: &'a AppConfig) -> Self {
        Self {
            store,
            messenger,
            config,
        }
    }
}
