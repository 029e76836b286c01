//! Key schema for the key-value store.
//!
//! Every logical entity maps to exactly one key string. Nothing else in the crate
//! formats keys by hand.

use super::messenger::{ChatId, UserId};
use serde::Deserialize;
use std::fmt;

/// How many loan ledgers a deployment keeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerScope {
    /// One ledger shared by every chat
    #[default]
    Global,
    /// One ledger per chat
    PerChat,
}

impl LedgerScope {
    /// Resolves the ledger a command issued in `chat_id` operates on.
    #[must_use]
    pub const fn ledger_for(self, chat_id: ChatId) -> LedgerId {
        match self {
            Self::Global => LedgerId::Global,
            Self::PerChat => LedgerId::Chat(chat_id),
        }
    }
}

impl std::str::FromStr for LedgerScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "global" => Ok(Self::Global),
            "per_chat" | "per-chat" | "chat" => Ok(Self::PerChat),
            other => Err(format!("unknown ledger scope '{other}'")),
        }
    }
}

/// A single loan ledger: one credit record plus its payment history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedgerId {
    /// The deployment-wide ledger
    Global,
    /// The ledger owned by one chat
    Chat(ChatId),
}

impl fmt::Display for LedgerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("global"),
            Self::Chat(chat_id) => write!(f, "{chat_id}"),
        }
    }
}

/// Credit record of a ledger.
#[must_use]
pub fn credit(ledger: LedgerId) -> String {
    format!("credit:{ledger}")
}

/// Ordered payment history of a ledger.
#[must_use]
pub fn history(ledger: LedgerId) -> String {
    format!("history:{ledger}")
}

/// Set of chats allowed to read the loan status.
#[must_use]
pub fn auth_chats() -> &'static str {
    "auth:chats"
}

/// Set of users allowed to change the loan.
#[must_use]
pub fn auth_users() -> &'static str {
    "auth:users"
}

/// Set of users with access to finance tracking.
#[must_use]
pub fn fin_auth_users() -> &'static str {
    "fin:auth_users"
}

/// Set of category names owned by a user.
#[must_use]
pub fn fin_categories(user_id: UserId) -> String {
    format!("fin:categories:{user_id}")
}

/// Category record holding the planned monthly amount.
#[must_use]
pub fn fin_category(user_id: UserId, category: &str) -> String {
    format!("fin:category:{user_id}:{category}")
}

/// Monthly budget limit of a user.
#[must_use]
pub fn fin_budget(user_id: UserId, month: &str) -> String {
    format!("fin:budget:{user_id}:{month}")
}

/// Ordered expense list of a user for one month bucket.
#[must_use]
pub fn fin_expenses(user_id: UserId, month: &str) -> String {
    format!("fin:expenses:{user_id}:{month}")
}

/// Expense a user was last asked to confirm the deletion of.
#[must_use]
pub fn fin_pending_delete(user_id: UserId) -> String {
    format!("fin:pending_delete:{user_id}")
}

/// Per-user session record for the multi-step finance flows.
#[must_use]
pub fn fin_session(user_id: UserId) -> String {
    format!("fin:session:{user_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_ledger_keys() {
        assert_eq!(credit(LedgerId::Global), "credit:global");
        assert_eq!(history(LedgerId::Global), "history:global");
    }

    #[test]
    fn test_per_chat_ledger_keys() {
        let ledger = LedgerScope::PerChat.ledger_for(77);
        assert_eq!(credit(ledger), "credit:77");
        assert_eq!(history(ledger), "history:77");
        assert_eq!(LedgerScope::Global.ledger_for(77), LedgerId::Global);
    }

    #[test]
    fn test_finance_keys() {
        assert_eq!(fin_categories(5), "fin:categories:5");
        assert_eq!(fin_category(5, "Food"), "fin:category:5:Food");
        assert_eq!(fin_budget(5, "2025-10"), "fin:budget:5:2025-10");
        assert_eq!(fin_expenses(5, "2025-10"), "fin:expenses:5:2025-10");
        assert_eq!(fin_session(5), "fin:session:5");
        assert_eq!(fin_pending_delete(5), "fin:pending_delete:5");
    }

    #[test]
    fn test_parse_ledger_scope() {
        assert_eq!("global".parse::<LedgerScope>(), Ok(LedgerScope::Global));
        assert_eq!("Per_Chat".parse::<LedgerScope>(), Ok(LedgerScope::PerChat));
        assert!("tenant".parse::<LedgerScope>().is_err());
    }
}
