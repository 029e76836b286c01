//! Finance tracking - access, categories, monthly budgets and expense entry.
//!
//! Each user keeps their own categories. A category is created in two steps:
//! the name first, then its planned monthly amount as the next message. Expenses
//! are entered by picking a category button and typing the amount. Which step a
//! user is in lives in their [`Session`].

use super::{
    Services,
    amount::{format_amount, parse_flexible},
    analytics,
    calendar::{current_month, is_valid_month},
    callback::{Callback, CallbackAction, MAX_PAYLOAD_CHARS},
    keys,
    messenger::{Button, Messenger, OutgoingMessage, UserId},
    session::{self, Session},
};
use crate::{
    errors::{Error, Result},
    models::{Budget, Category, ExpenseRecord},
    store::KvStore,
};
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{info, instrument, warn};

/// Longest category name, in characters. Names become button labels and payloads.
pub const MAX_CATEGORY_NAME_CHARS: usize = 50;

const FIN_AUTH_USAGE: &str = "/fin_auth <token>";
const ADD_CATEGORY_USAGE: &str = "/fin_add_category Food";
const SET_BUDGET_USAGE: &str = "/fin_set_budget 2025-10 50000";
const AMOUNT_USAGE: &str = "a positive number, e.g. 1500";
const PLANNED_USAGE: &str = "a number of at least 0, e.g. 15000";

/// Grants finance access to `user_id` if `token` is a finance token.
#[instrument(skip(svc, token))]
pub async fn authorize<M: Messenger>(
    svc: &Services<'_, M>,
    user_id: UserId,
    token: Option<&str>,
) -> Result<()> {
    let token = token.ok_or_else(|| Error::invalid_format(FIN_AUTH_USAGE))?;
    if !svc.config.tokens.grants_finance(token) {
        return Err(Error::unauthorized("Invalid finance token"));
    }

    svc.store
        .set_add(keys::fin_auth_users(), &user_id.to_string())
        .await?;
    info!("Finance access granted");
    svc.messenger
        .send_to_user(user_id, "✅ Access to finance tracking granted".into())
        .await
}

/// Fails with `Unauthorized` unless `user_id` has finance access.
pub async fn require_finance(store: &KvStore, user_id: UserId) -> Result<()> {
    if store
        .set_contains(keys::fin_auth_users(), &user_id.to_string())
        .await?
    {
        Ok(())
    } else {
        Err(Error::unauthorized(
            "Authorize first with /fin_auth <token>",
        ))
    }
}

/// Category names of `user_id` in store order.
pub async fn categories(store: &KvStore, user_id: UserId) -> Result<Vec<String>> {
    store.set_members(&keys::fin_categories(user_id)).await
}

/// Planned monthly amount per category, for categories whose amount was entered.
pub async fn planned_amounts(store: &KvStore, user_id: UserId) -> Result<HashMap<String, Decimal>> {
    let mut planned = HashMap::new();
    for name in categories(store, user_id).await? {
        if let Some(category) = store
            .get::<Category>(&keys::fin_category(user_id, &name))
            .await?
        {
            planned.insert(name, category.planned_amount);
        }
    }
    Ok(planned)
}

/// Adds a category and asks for its planned monthly amount.
#[instrument(skip(svc))]
pub async fn add_category<M: Messenger>(
    svc: &Services<'_, M>,
    user_id: UserId,
    name: Option<&str>,
) -> Result<()> {
    require_finance(svc.store, user_id).await?;

    let name = name
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| Error::invalid_format(ADD_CATEGORY_USAGE))?;
    if name.chars().count() > MAX_CATEGORY_NAME_CHARS {
        return Err(Error::invalid_format(format!(
            "{ADD_CATEGORY_USAGE} (at most {MAX_CATEGORY_NAME_CHARS} characters)"
        )));
    }

    if !svc
        .store
        .set_add(&keys::fin_categories(user_id), name)
        .await?
    {
        return Err(Error::DuplicateCategory {
            name: name.to_string(),
        });
    }

    session::begin(
        svc.store,
        user_id,
        Session::AwaitingPlannedAmount {
            category: name.to_string(),
        },
        svc.config.settings.session_ttl(),
    )
    .await?;
    info!(category = name, "Category added");

    svc.messenger
        .send_to_user(
            user_id,
            format!(
                "✅ Category «{name}» added\n💬 How much do you plan to spend on it per month? (e.g. 15000)"
            )
            .into(),
        )
        .await
}

/// Stores the planned monthly amount of a freshly added category.
#[instrument(skip(svc, text))]
pub async fn submit_planned_amount<M: Messenger>(
    svc: &Services<'_, M>,
    user_id: UserId,
    category: &str,
    text: &str,
) -> Result<()> {
    let planned = parse_flexible(text)
        .filter(|amount| !amount.is_sign_negative())
        .ok_or_else(|| Error::invalid_format(PLANNED_USAGE))?;

    let record = Category {
        user_id,
        name: category.to_string(),
        planned_amount: planned,
        created_at: Utc::now(),
    };
    svc.store
        .set(&keys::fin_category(user_id, category), &record)
        .await?;
    session::clear(svc.store, user_id).await?;
    info!(category, %planned, "Planned amount stored");

    svc.messenger
        .send_to_user(
            user_id,
            format!(
                "✅ Planned amount for «{category}»: {} per month",
                format_amount(planned)
            )
            .into(),
        )
        .await
}

/// Lists the categories of `user_id`.
#[instrument(skip(svc))]
pub async fn list_categories<M: Messenger>(svc: &Services<'_, M>, user_id: UserId) -> Result<()> {
    let names = categories(svc.store, user_id).await?;
    if names.is_empty() {
        return Err(Error::not_found(
            "No categories yet. Add one with /fin_add_category <name>",
        ));
    }

    let list: Vec<String> = names.iter().map(|name| format!("• {name}")).collect();
    svc.messenger
        .send_to_user(
            user_id,
            format!("📂 Your categories:\n{}", list.join("\n")).into(),
        )
        .await
}

/// Stores the spending limit for a month.
#[instrument(skip(svc))]
pub async fn set_budget<M: Messenger>(
    svc: &Services<'_, M>,
    user_id: UserId,
    month: Option<&str>,
    amount: Option<&str>,
) -> Result<()> {
    require_finance(svc.store, user_id).await?;

    let month = month
        .filter(|m| is_valid_month(m))
        .ok_or_else(|| Error::invalid_format(SET_BUDGET_USAGE))?;
    let limit = amount
        .and_then(parse_flexible)
        .filter(|limit| !limit.is_sign_negative())
        .ok_or_else(|| Error::invalid_format(SET_BUDGET_USAGE))?;

    svc.store
        .set(&keys::fin_budget(user_id, month), &Budget { limit })
        .await?;
    info!(month, %limit, "Budget set");

    svc.messenger
        .send_to_user(
            user_id,
            format!("✅ Budget for {month} set: {}", format_amount(limit)).into(),
        )
        .await
}

/// Shows one button per category, two per row, to start a new expense.
#[instrument(skip(svc))]
pub async fn start_expense_entry<M: Messenger>(
    svc: &Services<'_, M>,
    user_id: UserId,
) -> Result<()> {
    require_finance(svc.store, user_id).await?;

    let names = categories(svc.store, user_id).await?;
    if names.is_empty() {
        return Err(Error::not_found(
            "Add categories first with /fin_add_category <name>",
        ));
    }

    let buttons: Vec<Button> = names
        .iter()
        .filter_map(|name| {
            let callback = Callback::new(
                CallbackAction::ExpenseCategory {
                    category: name.clone(),
                },
                user_id,
            );
            if !callback.fits() {
                warn!(
                    category = %name,
                    limit = MAX_PAYLOAD_CHARS,
                    "Category name too long for a button"
                );
                return None;
            }
            Some(Button::new(name.clone(), callback.encode()))
        })
        .collect();
    let mut keyboard: Vec<Vec<Button>> = buttons.chunks(2).map(<[Button]>::to_vec).collect();
    keyboard.push(vec![cancel_button(user_id)]);

    svc.messenger
        .send_to_user(
            user_id,
            OutgoingMessage::text("🛒 Choose a category for the expense:").with_keyboard(keyboard),
        )
        .await
}

fn cancel_button(user_id: UserId) -> Button {
    Button::new(
        "❌ Cancel",
        Callback::new(CallbackAction::ExpenseCancel, user_id).encode(),
    )
}

async fn await_expense_amount<M: Messenger>(
    svc: &Services<'_, M>,
    user_id: UserId,
    category: &str,
) -> Result<()> {
    if !categories(svc.store, user_id)
        .await?
        .iter()
        .any(|name| name == category)
    {
        return Err(Error::not_found(format!("Category «{category}» not found")));
    }

    session::begin(
        svc.store,
        user_id,
        Session::AwaitingExpenseAmount {
            category: category.to_string(),
        },
        svc.config.settings.session_ttl(),
    )
    .await
}

/// A category button was pressed: remember the category and ask for the amount.
#[instrument(skip(svc))]
pub async fn select_expense_category<M: Messenger>(
    svc: &Services<'_, M>,
    user_id: UserId,
    category: &str,
) -> Result<()> {
    await_expense_amount(svc, user_id, category).await?;

    let enter_amount = Callback::new(
        CallbackAction::ExpenseAmount {
            category: category.to_string(),
        },
        user_id,
    );
    let message = OutgoingMessage::text(format!(
        "📂 Category: «{category}»\n💬 Reply with the amount (e.g. 1500)"
    ))
    .with_keyboard(vec![
        vec![Button::new("✍️ Enter amount", enter_amount.encode())],
        vec![cancel_button(user_id)],
    ]);
    svc.messenger.send_to_user(user_id, message).await
}

/// The "enter amount" button was pressed.
#[instrument(skip(svc))]
pub async fn prompt_expense_amount<M: Messenger>(
    svc: &Services<'_, M>,
    user_id: UserId,
    category: &str,
) -> Result<()> {
    await_expense_amount(svc, user_id, category).await?;
    svc.messenger
        .send_to_user(
            user_id,
            "💬 Enter the expense amount (e.g. 1500):".into(),
        )
        .await
}

/// Abandons the expense being entered.
#[instrument(skip(svc))]
pub async fn cancel_expense_entry<M: Messenger>(
    svc: &Services<'_, M>,
    user_id: UserId,
) -> Result<()> {
    session::clear(svc.store, user_id).await?;
    svc.messenger
        .send_to_user(user_id, "❌ Expense entry cancelled".into())
        .await
}

/// Records an expense for the category picked earlier and shows the month's analytics.
#[instrument(skip(svc, text))]
pub async fn submit_expense_amount<M: Messenger>(
    svc: &Services<'_, M>,
    user_id: UserId,
    text: &str,
) -> Result<()> {
    let amount = parse_flexible(text)
        .filter(|amount| amount.is_sign_positive() && !amount.is_zero())
        .ok_or_else(|| Error::invalid_format(AMOUNT_USAGE))?;

    let Session::AwaitingExpenseAmount { category } = session::load(svc.store, user_id).await?
    else {
        return Err(Error::not_found(
            "Pick a category first with /fin_add_expense",
        ));
    };

    let month = current_month();
    let record = ExpenseRecord {
        user_id,
        category: category.clone(),
        amount,
        description: String::new(),
        date: Utc::now(),
    };
    svc.store
        .list_push(&keys::fin_expenses(user_id, &month), &record)
        .await?;
    session::clear(svc.store, user_id).await?;
    info!(category, %amount, month, "Expense recorded");

    svc.messenger
        .send_to_user(
            user_id,
            format!(
                "✅ Expense recorded: {category} — {}",
                format_amount(amount)
            )
            .into(),
        )
        .await?;

    analytics::show_report(svc, user_id, &month).await
}
