//! Monthly loan reminder.
//!
//! A background task that wakes at midnight UTC on the first of the next month and
//! every 30 days after that, and posts the balance and payment history of each
//! loan ledger to its chats. Unreachable chats are skipped, never revoked.

use super::{
    amount::format_amount,
    broadcast::{self, FailurePolicy},
    calendar::first_of_next_month,
    keys::{LedgerId, LedgerScope},
    loan,
    messenger::{Messenger, OutgoingMessage},
};
use crate::{
    errors::Result,
    models::{Credit, PaymentRecord},
    store::KvStore,
};
use chrono::{DateTime, Utc};
use std::{fmt::Write, time::Duration};
use tokio::{task::JoinHandle, time::Instant};
use tracing::{error, info};

/// Interval between reminders after the first one.
pub const REMINDER_PERIOD: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Time from `now` until midnight UTC on the first of the next month.
#[must_use]
pub fn delay_until_next_month(now: DateTime<Utc>) -> Duration {
    (first_of_next_month(now) - now).to_std().unwrap_or_default()
}

/// Renders the reminder text for one ledger.
pub fn format_reminder(credit: &Credit, history: &[PaymentRecord]) -> Result<String> {
    let mut text = format!(
        "📅 Monthly update:\nLoan balance: {}\n",
        format_amount(credit.current_amount)
    );
    if history.is_empty() {
        text.push_str("Payment history is empty");
    } else {
        text.push_str("Recent payments:");
        for payment in history {
            write!(
                text,
                "\n{}: -{}",
                payment.date.format("%d.%m.%Y"),
                format_amount(payment.amount)
            )?;
        }
    }
    Ok(text)
}

async fn ledgers(store: &KvStore, scope: LedgerScope) -> Result<Vec<LedgerId>> {
    Ok(match scope {
        LedgerScope::Global => vec![LedgerId::Global],
        LedgerScope::PerChat => broadcast::authorized_chats(store)
            .await?
            .into_iter()
            .map(LedgerId::Chat)
            .collect(),
    })
}

/// Sends one round of reminders. Returns the number of chats reached.
///
/// Ledgers without a loan are skipped.
pub async fn send_monthly_reminders<M: Messenger>(
    store: &KvStore,
    messenger: &M,
    scope: LedgerScope,
) -> Result<usize> {
    let mut delivered = 0;

    for ledger in ledgers(store, scope).await? {
        let Some(credit) = loan::get_credit(store, ledger).await? else {
            continue;
        };
        let history = loan::get_history(store, ledger).await?;
        let message = OutgoingMessage::text(format_reminder(&credit, &history)?);

        let audience = loan::audience(store, ledger).await?;
        let report = broadcast::broadcast(
            store,
            messenger,
            &audience,
            &message,
            FailurePolicy::IgnoreOnFailure,
        )
        .await?;
        delivered += report.delivered;
    }

    Ok(delivered)
}

/// Spawns the reminder task.
pub fn spawn<M: Messenger + 'static>(
    store: KvStore,
    messenger: M,
    scope: LedgerScope,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let delay = delay_until_next_month(Utc::now());
        info!(delay_hours = delay.as_secs() / 3600, "Monthly reminder scheduled");

        let mut ticker = tokio::time::interval_at(Instant::now() + delay, REMINDER_PERIOD);
        loop {
            ticker.tick().await;
            match send_monthly_reminders(&store, &messenger, scope).await {
                Ok(delivered) => info!(delivered, "Monthly reminders sent"),
                Err(e) => error!(error = %e, "Failed to send monthly reminders"),
            }
        }
    })
}
