//! Records persisted in the key-value store.
//!
//! All records are stored as JSON documents. Amounts are `Decimal` so that sums
//! and balances never pick up binary floating point error.

use crate::core::messenger::UserId;
use chrono::{DateTime, FixedOffset, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The loan of a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credit {
    /// Amount the loan was set to
    pub initial_amount: Decimal,
    /// Outstanding balance; may go negative
    pub current_amount: Decimal,
    /// Local time of the last change
    pub last_updated: DateTime<FixedOffset>,
}

/// One payment against the loan. Never edited once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// Who paid
    pub user_id: UserId,
    /// Amount paid
    pub amount: Decimal,
    /// Local time of the payment
    pub date: DateTime<FixedOffset>,
    /// Loan balance right after this payment
    pub new_balance: Decimal,
}

/// An expense category with its planned monthly amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Owner
    pub user_id: UserId,
    /// Category name, unique per user
    pub name: String,
    /// Planned spending per month
    pub planned_amount: Decimal,
    /// When the planned amount was entered
    pub created_at: DateTime<Utc>,
}

/// A single expense in a month bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    /// Owner
    pub user_id: UserId,
    /// Category name
    pub category: String,
    /// Amount spent, always positive
    pub amount: Decimal,
    /// Free-form note
    #[serde(default)]
    pub description: String,
    /// When the expense was recorded
    pub date: DateTime<Utc>,
}

/// Spending limit for one month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    /// Monthly limit
    pub limit: Decimal,
}
