//! Loan tracking - authorization, the loan balance and its payment history.
//!
//! Chats authorized with a read or write token may look at the balance. Users
//! authorized with a write token may set the loan and record payments. Every
//! change is broadcast to the chats of the affected ledger; a chat that cannot be
//! reached loses its authorization.

use super::{
    Services,
    amount::{format_amount, or_too_large, parse_invariant},
    broadcast::{self, FailurePolicy},
    keys::{self, LedgerId},
    messenger::{ChatId, Messenger, OutgoingMessage, UserId},
};
use crate::{
    errors::{Error, Result},
    models::{Credit, PaymentRecord},
    store::KvStore,
};
use chrono::{DateTime, FixedOffset, Utc};
use std::fmt::Write;
use tracing::{info, instrument};

const AUTHORIZE_USAGE: &str = "/authorize <token>";
const SET_USAGE: &str = "/set 100000";
const PAY_USAGE: &str = "/pay 15000";
const INVALID_TOKEN: &str = "Invalid authorization token";

fn local_now<M: Messenger>(svc: &Services<'_, M>) -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&svc.config.settings.local_offset())
}

/// Grants `chat_id` read access if `token` is a read or write token. Idempotent.
#[instrument(skip(svc, token))]
pub async fn authorize<M: Messenger>(
    svc: &Services<'_, M>,
    chat_id: ChatId,
    token: Option<&str>,
) -> Result<()> {
    let token = token.ok_or_else(|| Error::invalid_format(AUTHORIZE_USAGE))?;
    if !svc.config.tokens.grants_chat_read(token) {
        return Err(Error::unauthorized(INVALID_TOKEN));
    }

    svc.store
        .set_add(keys::auth_chats(), &chat_id.to_string())
        .await?;
    info!("Chat authorized for reading");
    svc.messenger
        .send_to_chat(chat_id, "✅ Chat authorized for reading!".into())
        .await
}

/// Grants `user_id` write access if `token` is a write token.
///
/// Without a token this does nothing: the command is often typed in a group,
/// where an error reply would only add noise.
#[instrument(skip(svc, token))]
pub async fn authorize_user<M: Messenger>(
    svc: &Services<'_, M>,
    user_id: UserId,
    token: Option<&str>,
) -> Result<()> {
    let Some(token) = token else {
        return Ok(());
    };
    if !svc.config.tokens.grants_write(token) {
        return Err(Error::unauthorized(INVALID_TOKEN));
    }

    svc.store
        .set_add(keys::auth_users(), &user_id.to_string())
        .await?;
    info!("User authorized for writing");
    svc.messenger
        .send_to_user(user_id, "✅ You are authorized to record payments!".into())
        .await
}

async fn require_writer(store: &KvStore, user_id: UserId, action: &str) -> Result<()> {
    if store
        .set_contains(keys::auth_users(), &user_id.to_string())
        .await?
    {
        Ok(())
    } else {
        Err(Error::unauthorized(format!(
            "You are not allowed to {action}. Use /user_authorize <token>"
        )))
    }
}

async fn require_reader(store: &KvStore, chat_id: ChatId) -> Result<()> {
    if store
        .set_contains(keys::auth_chats(), &chat_id.to_string())
        .await?
    {
        Ok(())
    } else {
        Err(Error::unauthorized(
            "This chat is not authorized. Use /authorize <token>",
        ))
    }
}

/// Current credit of `ledger`, if a loan was ever set.
pub async fn get_credit(store: &KvStore, ledger: LedgerId) -> Result<Option<Credit>> {
    store.get(&keys::credit(ledger)).await
}

/// Payment history of `ledger`, oldest first.
pub async fn get_history(store: &KvStore, ledger: LedgerId) -> Result<Vec<PaymentRecord>> {
    store.list_range(&keys::history(ledger)).await
}

/// Chats that hear about changes to `ledger`.
///
/// The global ledger notifies every authorized chat; a per-chat ledger only its
/// own chat, and only while that chat is authorized.
pub async fn audience(store: &KvStore, ledger: LedgerId) -> Result<Vec<ChatId>> {
    let authorized = broadcast::authorized_chats(store).await?;
    Ok(match ledger {
        LedgerId::Global => authorized,
        LedgerId::Chat(chat_id) => authorized.into_iter().filter(|&c| c == chat_id).collect(),
    })
}

async fn notify<M: Messenger>(svc: &Services<'_, M>, ledger: LedgerId, text: String) -> Result<()> {
    let chats = audience(svc.store, ledger).await?;
    let report = broadcast::broadcast(
        svc.store,
        svc.messenger,
        &chats,
        &OutgoingMessage::text(text),
        FailurePolicy::RevokeOnFailure,
    )
    .await?;
    info!(
        delivered = report.delivered,
        revoked = report.failed.len(),
        "Loan notification sent"
    );
    Ok(())
}

/// Starts a new loan epoch: sets the balance to `amount_text` and clears the history.
#[instrument(skip(svc, amount_text))]
pub async fn set_loan<M: Messenger>(
    svc: &Services<'_, M>,
    chat_id: ChatId,
    user_id: UserId,
    amount_text: Option<&str>,
) -> Result<()> {
    require_writer(svc.store, user_id, "set the loan amount").await?;

    let amount = amount_text
        .and_then(parse_invariant)
        .ok_or_else(|| Error::invalid_format(SET_USAGE))?;

    let ledger = svc.config.settings.ledger_scope.ledger_for(chat_id);
    let credit = Credit {
        initial_amount: amount,
        current_amount: amount,
        last_updated: local_now(svc),
    };
    svc.store.set(&keys::credit(ledger), &credit).await?;
    svc.store.delete(&keys::history(ledger)).await?;
    info!(%ledger, %amount, "Loan amount set");

    notify(
        svc,
        ledger,
        format!("💰 New loan amount set: {}", format_amount(amount)),
    )
    .await
}

/// Records a payment: lowers the balance, appends to the history and notifies everyone.
///
/// The balance is allowed to go below zero.
#[instrument(skip(svc, amount_text))]
pub async fn pay<M: Messenger>(
    svc: &Services<'_, M>,
    chat_id: ChatId,
    user_id: UserId,
    amount_text: Option<&str>,
) -> Result<()> {
    require_writer(svc.store, user_id, "record payments").await?;

    let ledger = svc.config.settings.ledger_scope.ledger_for(chat_id);
    let Some(mut credit) = get_credit(svc.store, ledger).await? else {
        return Err(Error::not_found(
            "Set the loan amount first with /set <amount>",
        ));
    };

    let payment = amount_text
        .and_then(parse_invariant)
        .ok_or_else(|| Error::invalid_format(PAY_USAGE))?;

    let now = local_now(svc);
    credit.current_amount = or_too_large(credit.current_amount.checked_sub(payment))?;
    credit.last_updated = now;
    svc.store.set(&keys::credit(ledger), &credit).await?;

    let record = PaymentRecord {
        user_id,
        amount: payment,
        date: now,
        new_balance: credit.current_amount,
    };
    svc.store.list_push(&keys::history(ledger), &record).await?;
    info!(%ledger, %payment, balance = %credit.current_amount, "Payment recorded");

    svc.messenger
        .send_to_user(
            user_id,
            format!(
                "✅ Payment of {} accepted!\nNew balance: {}",
                format_amount(payment),
                format_amount(credit.current_amount)
            )
            .into(),
        )
        .await?;

    notify(
        svc,
        ledger,
        format!(
            "💳 Payment received: {}\nLoan balance: {}",
            format_amount(payment),
            format_amount(credit.current_amount)
        ),
    )
    .await
}

/// Replies with the current balance.
#[instrument(skip(svc))]
pub async fn show_status<M: Messenger>(svc: &Services<'_, M>, chat_id: ChatId) -> Result<()> {
    require_reader(svc.store, chat_id).await?;

    let ledger = svc.config.settings.ledger_scope.ledger_for(chat_id);
    let credit = get_credit(svc.store, ledger)
        .await?
        .ok_or_else(|| Error::not_found("The loan amount has not been set"))?;

    svc.messenger
        .send_to_chat(
            chat_id,
            format!(
                "💳 Current loan balance: {}",
                format_amount(credit.current_amount)
            )
            .into(),
        )
        .await
}

/// Replies with every payment of the current loan epoch, oldest first.
#[instrument(skip(svc))]
pub async fn show_history<M: Messenger>(svc: &Services<'_, M>, chat_id: ChatId) -> Result<()> {
    require_reader(svc.store, chat_id).await?;

    let ledger = svc.config.settings.ledger_scope.ledger_for(chat_id);
    let history = get_history(svc.store, ledger).await?;
    if history.is_empty() {
        return Err(Error::not_found("Payment history is empty"));
    }

    let text = format_history(&history)?;
    svc.messenger.send_to_chat(chat_id, text.into()).await
}

/// Renders history lines as `dd.mm.yyyy: -amount → balance`.
pub fn format_history(history: &[PaymentRecord]) -> Result<String> {
    let mut text = String::from("📜 Payment history:\n");
    for payment in history {
        writeln!(
            text,
            "{}: -{} → {}",
            payment.date.format("%d.%m.%Y"),
            format_amount(payment.amount),
            format_amount(payment.new_balance)
        )?;
    }
    Ok(text)
}
