//! Paginated expense history of a month, with per-entry edit and delete.
//!
//! Entries are addressed by their position in the month list. Deleting an entry
//! shifts the ones after it down by one, so every button is re-rendered after a
//! change. Edits and deletions also remember the date of the entry they started
//! from and refuse to touch a different entry that has since moved into its place.

use super::{
    Services,
    amount::{format_amount, parse_flexible},
    calendar::{current_month, is_valid_month},
    callback::{Callback, CallbackAction},
    keys,
    messenger::{Button, Messenger, OutgoingMessage, UserId},
    session::{self, Session},
};
use crate::{
    errors::{Error, Result},
    models::ExpenseRecord,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use tracing::{info, instrument};

/// Expenses shown per page.
pub const PAGE_SIZE: usize = 5;

const HISTORY_USAGE: &str = "/fin_history 2025-10";
const AMOUNT_USAGE: &str = "a positive number, e.g. 1500";
const STALE_ENTRY: &str =
    "This expense has changed since the buttons were shown. Open /fin_history again";

/// Deletion awaiting confirmation, stored under [`keys::fin_pending_delete`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct PendingDelete {
    month: String,
    index: usize,
    recorded_at: DateTime<Utc>,
}

/// Number of pages needed for `total` entries. An empty month still has one page.
#[must_use]
pub fn page_count(total: usize) -> usize {
    total.div_ceil(PAGE_SIZE).max(1)
}

fn describe(expense: &ExpenseRecord) -> String {
    format!(
        "{} {} — {}",
        expense.date.format("%d.%m"),
        expense.category,
        format_amount(expense.amount)
    )
}

fn button(label: impl Into<String>, action: CallbackAction, user_id: UserId) -> Button {
    Button::new(label, Callback::new(action, user_id).encode())
}

/// Renders one page with edit and delete buttons for each entry and page navigation.
///
/// `page` is clamped to the last page.
pub fn render_page(
    user_id: UserId,
    month: &str,
    expenses: &[ExpenseRecord],
    page: usize,
) -> Result<OutgoingMessage> {
    let pages = page_count(expenses.len());
    let page = page.min(pages - 1);
    let start = page * PAGE_SIZE;
    let end = (start + PAGE_SIZE).min(expenses.len());

    let mut text = format!("🧾 Expenses for {month} (page {}/{pages})\n", page + 1);
    let mut edit_row = Vec::new();
    let mut delete_row = Vec::new();
    for (index, expense) in expenses.iter().enumerate().take(end).skip(start) {
        let number = index + 1;
        write!(text, "\n{number}. {}", describe(expense))?;
        let month = month.to_string();
        edit_row.push(button(
            format!("✏️ {number}"),
            CallbackAction::Edit {
                month: month.clone(),
                index,
            },
            user_id,
        ));
        delete_row.push(button(
            format!("🗑 {number}"),
            CallbackAction::Delete { month, index },
            user_id,
        ));
    }

    let mut navigation = Vec::new();
    if page > 0 {
        navigation.push(button(
            "⬅️ Prev",
            CallbackAction::HistoryPage {
                month: month.to_string(),
                page: page - 1,
            },
            user_id,
        ));
    }
    if page + 1 < pages {
        navigation.push(button(
            "Next ➡️",
            CallbackAction::HistoryPage {
                month: month.to_string(),
                page: page + 1,
            },
            user_id,
        ));
    }

    let keyboard: Vec<Vec<Button>> = [edit_row, delete_row, navigation]
        .into_iter()
        .filter(|row| !row.is_empty())
        .collect();
    Ok(OutgoingMessage::text(text).with_keyboard(keyboard))
}

async fn load_month<M: Messenger>(
    svc: &Services<'_, M>,
    user_id: UserId,
    month: &str,
) -> Result<Vec<ExpenseRecord>> {
    svc.store
        .list_range(&keys::fin_expenses(user_id, month))
        .await
}

async fn load_entry<M: Messenger>(
    svc: &Services<'_, M>,
    user_id: UserId,
    month: &str,
    index: usize,
) -> Result<ExpenseRecord> {
    load_month(svc, user_id, month)
        .await?
        .into_iter()
        .nth(index)
        .ok_or_else(|| Error::not_found("Expense not found"))
}

/// `/fin_history [YYYY-MM]`: first page of a month, the current one by default.
#[instrument(skip(svc))]
pub async fn show_history<M: Messenger>(
    svc: &Services<'_, M>,
    user_id: UserId,
    month: Option<&str>,
) -> Result<()> {
    let month = match month {
        Some(month) if is_valid_month(month) => month.to_string(),
        Some(_) => return Err(Error::invalid_format(HISTORY_USAGE)),
        None => current_month(),
    };
    show_page(svc, user_id, &month, 0).await
}

/// Sends one page of the history of `month`.
#[instrument(skip(svc))]
pub async fn show_page<M: Messenger>(
    svc: &Services<'_, M>,
    user_id: UserId,
    month: &str,
    page: usize,
) -> Result<()> {
    let expenses = load_month(svc, user_id, month).await?;
    if expenses.is_empty() {
        return Err(Error::not_found(format!("No expenses for {month}")));
    }

    let message = render_page(user_id, month, &expenses, page)?;
    svc.messenger.send_to_user(user_id, message).await
}

/// Shows what can be done with one expense.
#[instrument(skip(svc))]
pub async fn show_edit_menu<M: Messenger>(
    svc: &Services<'_, M>,
    user_id: UserId,
    month: &str,
    index: usize,
) -> Result<()> {
    let expense = load_entry(svc, user_id, month, index).await?;
    let month = month.to_string();

    let message = OutgoingMessage::text(format!(
        "✏️ Expense #{}: {}\nWhat would you like to do?",
        index + 1,
        describe(&expense)
    ))
    .with_keyboard(vec![
        vec![button(
            "💰 Change amount",
            CallbackAction::EditAmount {
                month: month.clone(),
                index,
            },
            user_id,
        )],
        vec![button(
            "🗑 Delete",
            CallbackAction::Delete {
                month: month.clone(),
                index,
            },
            user_id,
        )],
        vec![button(
            "⬅️ Back",
            CallbackAction::HistoryPage {
                month,
                page: index / PAGE_SIZE,
            },
            user_id,
        )],
    ]);
    svc.messenger.send_to_user(user_id, message).await
}

/// Waits for a replacement amount for one expense.
#[instrument(skip(svc))]
pub async fn begin_edit_amount<M: Messenger>(
    svc: &Services<'_, M>,
    user_id: UserId,
    month: &str,
    index: usize,
) -> Result<()> {
    let expense = load_entry(svc, user_id, month, index).await?;
    session::begin(
        svc.store,
        user_id,
        Session::AwaitingEditedAmount {
            month: month.to_string(),
            index,
            recorded_at: expense.date,
        },
        svc.config.settings.session_ttl(),
    )
    .await?;

    svc.messenger
        .send_to_user(
            user_id,
            format!(
                "💬 Enter the new amount for {} (now {}):",
                expense.category,
                format_amount(expense.amount)
            )
            .into(),
        )
        .await
}

/// Replaces the amount of the expense the session points at.
#[instrument(skip(svc, text))]
pub async fn submit_edited_amount<M: Messenger>(
    svc: &Services<'_, M>,
    user_id: UserId,
    text: &str,
) -> Result<()> {
    let amount = parse_flexible(text)
        .filter(|amount| amount.is_sign_positive() && !amount.is_zero())
        .ok_or_else(|| Error::invalid_format(AMOUNT_USAGE))?;

    let Session::AwaitingEditedAmount {
        month,
        index,
        recorded_at,
    } = session::load(svc.store, user_id).await?
    else {
        return Err(Error::not_found("No expense is being edited"));
    };

    let key = keys::fin_expenses(user_id, &month);
    let mut expense = load_entry(svc, user_id, &month, index).await?;
    let previous = expense.amount;
    expense.amount = amount;
    let replaced = svc
        .store
        .list_set_at_if(&key, index, expense.clone(), |current: &ExpenseRecord| {
            current.date == recorded_at
        })
        .await?;
    session::clear(svc.store, user_id).await?;
    if replaced.is_none() {
        return Err(Error::not_found(STALE_ENTRY));
    }
    info!(month, index, %previous, %amount, "Expense amount changed");

    svc.messenger
        .send_to_user(
            user_id,
            format!(
                "✅ Amount updated: {} {} → {}",
                expense.category,
                format_amount(previous),
                format_amount(amount)
            )
            .into(),
        )
        .await?;
    show_page(svc, user_id, &month, index / PAGE_SIZE).await
}

/// Asks to confirm the deletion of one expense.
#[instrument(skip(svc))]
pub async fn request_delete<M: Messenger>(
    svc: &Services<'_, M>,
    user_id: UserId,
    month: &str,
    index: usize,
) -> Result<()> {
    let expense = load_entry(svc, user_id, month, index).await?;
    let pending = PendingDelete {
        month: month.to_string(),
        index,
        recorded_at: expense.date,
    };
    svc.store
        .set(&keys::fin_pending_delete(user_id), &pending)
        .await?;
    let month = month.to_string();

    let message = OutgoingMessage::text(format!(
        "🗑 Delete expense #{}: {}?",
        index + 1,
        describe(&expense)
    ))
    .with_keyboard(vec![vec![
        button(
            "✅ Yes, delete",
            CallbackAction::DeleteConfirm {
                month: month.clone(),
                index,
            },
            user_id,
        ),
        button(
            "❌ Cancel",
            CallbackAction::DeleteCancel { month, index },
            user_id,
        ),
    ]]);
    svc.messenger.send_to_user(user_id, message).await
}

/// Deletes one expense and shows the page it was on.
#[instrument(skip(svc))]
pub async fn confirm_delete<M: Messenger>(
    svc: &Services<'_, M>,
    user_id: UserId,
    month: &str,
    index: usize,
) -> Result<()> {
    let pending_key = keys::fin_pending_delete(user_id);
    let pending = svc
        .store
        .get::<PendingDelete>(&pending_key)
        .await?
        .filter(|pending| pending.month == month && pending.index == index)
        .ok_or_else(|| Error::not_found(STALE_ENTRY))?;
    svc.store.delete(&pending_key).await?;

    let removed: ExpenseRecord = svc
        .store
        .list_remove_at_if(
            &keys::fin_expenses(user_id, month),
            index,
            |current: &ExpenseRecord| current.date == pending.recorded_at,
        )
        .await?
        .ok_or_else(|| Error::not_found(STALE_ENTRY))?;
    info!(month, index, amount = %removed.amount, "Expense deleted");

    svc.messenger
        .send_to_user(
            user_id,
            format!("✅ Expense deleted: {}", describe(&removed)).into(),
        )
        .await?;

    let remaining = load_month(svc, user_id, month).await?;
    if remaining.is_empty() {
        return Ok(());
    }
    let message = render_page(user_id, month, &remaining, index / PAGE_SIZE)?;
    svc.messenger.send_to_user(user_id, message).await
}

/// Leaves the expense alone and returns to its page.
#[instrument(skip(svc))]
pub async fn cancel_delete<M: Messenger>(
    svc: &Services<'_, M>,
    user_id: UserId,
    month: &str,
    index: usize,
) -> Result<()> {
    svc.store.delete(&keys::fin_pending_delete(user_id)).await?;
    show_page(svc, user_id, month, index / PAGE_SIZE).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::{TestHarness, d};
    use chrono::Duration;

    const USER: UserId = 9;
    const MONTH: &str = "2025-10";

    async fn seed(harness: &TestHarness, amounts: &[&str]) -> Result<()> {
        for (i, amount) in amounts.iter().enumerate() {
            let record = ExpenseRecord {
                user_id: USER,
                category: format!("Cat{i}"),
                amount: d(amount),
                description: String::new(),
                date: Utc::now() + Duration::seconds(i64::try_from(i).unwrap()),
            };
            harness
                .store
                .list_push(&keys::fin_expenses(USER, MONTH), &record)
                .await?;
        }
        Ok(())
    }

    async fn amounts(harness: &TestHarness) -> Result<Vec<String>> {
        let expenses: Vec<ExpenseRecord> = harness
            .store
            .list_range(&keys::fin_expenses(USER, MONTH))
            .await?;
        Ok(expenses.iter().map(|e| e.amount.to_string()).collect())
    }

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0), 1);
        assert_eq!(page_count(5), 1);
        assert_eq!(page_count(6), 2);
        assert_eq!(page_count(12), 3);
    }

    #[tokio::test]
    async fn test_pages_and_navigation() -> Result<()> {
        let harness = TestHarness::new().await?;
        seed(&harness, &["1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12"]).await?;
        let svc = harness.services();

        show_page(&svc, USER, MONTH, 0).await?;
        let first = harness.messenger.last_to_user(USER).unwrap();
        assert!(first.text.contains("(page 1/3)"));
        assert_eq!(first.keyboard[0].len(), 5);
        assert_eq!(first.keyboard[2].len(), 1);
        assert_eq!(
            first.keyboard[2][0].payload,
            "expense_history_page:2025-10:1:9"
        );

        show_page(&svc, USER, MONTH, 2).await?;
        let last = harness.messenger.last_to_user(USER).unwrap();
        assert!(last.text.contains("(page 3/3)"));
        assert!(last.text.contains("11. "));
        assert!(last.text.contains("12. "));
        assert_eq!(last.keyboard[0].len(), 2);
        assert_eq!(last.keyboard[1][0].payload, "expense_delete:2025-10:10:9");
        assert_eq!(last.keyboard[2][0].label, "⬅️ Prev");

        show_page(&svc, USER, MONTH, 40).await?;
        let clamped = harness.messenger.last_to_user(USER).unwrap();
        assert!(clamped.text.contains("(page 3/3)"));
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_month() -> Result<()> {
        let harness = TestHarness::new().await?;
        let result = show_history(&harness.services(), USER, Some(MONTH)).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));

        let bad = show_history(&harness.services(), USER, Some("2025/10")).await;
        assert!(matches!(bad, Err(Error::InvalidFormat { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_middle_entry_keeps_order() -> Result<()> {
        let harness = TestHarness::new().await?;
        seed(&harness, &["10", "20", "30", "40"]).await?;
        let svc = harness.services();

        request_delete(&svc, USER, MONTH, 1).await?;
        assert_eq!(amounts(&harness).await?, vec!["10", "20", "30", "40"]);

        confirm_delete(&svc, USER, MONTH, 1).await?;
        assert_eq!(amounts(&harness).await?, vec!["10", "30", "40"]);

        let page = harness.messenger.last_to_user(USER).unwrap();
        assert!(page.text.contains("2. "));
        assert!(!page.text.contains("4. "));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_out_of_range() -> Result<()> {
        let harness = TestHarness::new().await?;
        seed(&harness, &["10"]).await?;
        let svc = harness.services();

        let request = request_delete(&svc, USER, MONTH, 3).await;
        assert!(matches!(request, Err(Error::NotFound { .. })));
        let confirm = confirm_delete(&svc, USER, MONTH, 3).await;
        assert!(matches!(confirm, Err(Error::NotFound { .. })));

        assert_eq!(amounts(&harness).await?, vec!["10"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_confirm_without_request_deletes_nothing() -> Result<()> {
        let harness = TestHarness::new().await?;
        seed(&harness, &["10", "20"]).await?;

        let result = confirm_delete(&harness.services(), USER, MONTH, 0).await;

        assert!(matches!(result, Err(Error::NotFound { .. })));
        assert_eq!(amounts(&harness).await?, vec!["10", "20"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_stale_delete_confirmation_does_not_hit_shifted_entry() -> Result<()> {
        let harness = TestHarness::new().await?;
        seed(&harness, &["10", "20", "30"]).await?;
        let svc = harness.services();

        // "30" moves into index 1 once "20" is gone elsewhere
        request_delete(&svc, USER, MONTH, 1).await?;
        harness
            .store
            .list_remove_at_if(
                &keys::fin_expenses(USER, MONTH),
                1,
                |_: &ExpenseRecord| true,
            )
            .await?;

        let result = confirm_delete(&svc, USER, MONTH, 1).await;

        assert!(matches!(result, Err(Error::NotFound { .. })));
        assert_eq!(amounts(&harness).await?, vec!["10", "30"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_only_latest_delete_request_can_be_confirmed() -> Result<()> {
        let harness = TestHarness::new().await?;
        seed(&harness, &["10", "20", "30"]).await?;
        let svc = harness.services();

        request_delete(&svc, USER, MONTH, 0).await?;
        request_delete(&svc, USER, MONTH, 2).await?;

        let old = confirm_delete(&svc, USER, MONTH, 0).await;
        assert!(matches!(old, Err(Error::NotFound { .. })));
        assert_eq!(amounts(&harness).await?, vec!["10", "20", "30"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_last_entry_empties_month() -> Result<()> {
        let harness = TestHarness::new().await?;
        seed(&harness, &["10"]).await?;
        let svc = harness.services();

        request_delete(&svc, USER, MONTH, 0).await?;
        confirm_delete(&svc, USER, MONTH, 0).await?;

        assert!(amounts(&harness).await?.is_empty());
        assert!(!harness.store.contains_key(&keys::fin_pending_delete(USER)).await?);
        assert_eq!(
            harness.messenger.texts_to_user(USER).len(),
            2,
            "only the prompt and the confirmation are sent"
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_delete_returns_to_page() -> Result<()> {
        let harness = TestHarness::new().await?;
        seed(&harness, &["1", "2", "3", "4", "5", "6", "7"]).await?;
        let svc = harness.services();

        request_delete(&svc, USER, MONTH, 6).await?;
        cancel_delete(&svc, USER, MONTH, 6).await?;

        assert_eq!(amounts(&harness).await?.len(), 7);
        let late = confirm_delete(&svc, USER, MONTH, 6).await;
        assert!(matches!(late, Err(Error::NotFound { .. })));
        let page = harness.messenger.last_to_user(USER).unwrap();
        assert!(page.text.contains("(page 2/2)"));
        Ok(())
    }

    #[tokio::test]
    async fn test_edit_amount_flow() -> Result<()> {
        let harness = TestHarness::new().await?;
        seed(&harness, &["10", "20"]).await?;
        let svc = harness.services();

        show_edit_menu(&svc, USER, MONTH, 1).await?;
        let menu = harness.messenger.last_to_user(USER).unwrap();
        assert_eq!(
            menu.keyboard[0][0].payload,
            "expense_edit_amount:2025-10:1:9"
        );

        begin_edit_amount(&svc, USER, MONTH, 1).await?;
        assert!(matches!(
            session::load(&harness.store, USER).await?,
            Session::AwaitingEditedAmount { ref month, index: 1, .. } if month == MONTH
        ));

        submit_edited_amount(&svc, USER, "25,5").await?;

        assert_eq!(amounts(&harness).await?, vec!["10", "25.5"]);
        assert_eq!(session::load(&harness.store, USER).await?, Session::Idle);
        assert!(
            harness
                .messenger
                .texts_to_user(USER)
                .iter()
                .any(|t| t == "✅ Amount updated: Cat1 20₽ → 25.5₽")
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_edit_rejects_bad_amount_and_missing_entry() -> Result<()> {
        let harness = TestHarness::new().await?;
        seed(&harness, &["10"]).await?;
        let svc = harness.services();

        let missing = begin_edit_amount(&svc, USER, MONTH, 4).await;
        assert!(matches!(missing, Err(Error::NotFound { .. })));

        begin_edit_amount(&svc, USER, MONTH, 0).await?;
        let bad = submit_edited_amount(&svc, USER, "-3").await;
        assert!(matches!(bad, Err(Error::InvalidFormat { .. })));
        assert_eq!(amounts(&harness).await?, vec!["10"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_edit_after_shift_leaves_other_entry_alone() -> Result<()> {
        let harness = TestHarness::new().await?;
        seed(&harness, &["10", "20", "30"]).await?;
        let svc = harness.services();

        begin_edit_amount(&svc, USER, MONTH, 1).await?;
        request_delete(&svc, USER, MONTH, 1).await?;
        confirm_delete(&svc, USER, MONTH, 1).await?;

        let result = submit_edited_amount(&svc, USER, "99").await;

        assert!(matches!(result, Err(Error::NotFound { .. })));
        assert_eq!(amounts(&harness).await?, vec!["10", "30"]);
        assert_eq!(session::load(&harness.store, USER).await?, Session::Idle);
        Ok(())
    }
}
