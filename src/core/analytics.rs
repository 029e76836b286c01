//! Expense analytics - per-category sums against planned amounts for one month.
//!
//! A report aggregates a month's expenses into one [`CategorySpend`] per category
//! and renders them with a status emoji and a text progress bar scaled to the
//! largest category.

use super::{
    Services,
    amount::{format_amount, or_too_large},
    calendar::{is_valid_month, recent_months},
    callback::{Callback, CallbackAction},
    finance, keys,
    messenger::{Button, Messenger, OutgoingMessage, UserId},
};
use crate::{
    errors::{Error, Result},
    models::{Budget, ExpenseRecord},
    store::KvStore,
};
use chrono::Utc;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use std::{collections::HashMap, fmt::Write};
use tracing::instrument;

/// Width of the progress bar in characters.
pub const BAR_WIDTH: usize = 20;

/// Months offered by the picker: the current one and five before it.
pub const PICKER_MONTHS: u32 = 6;

const ANALYTICS_USAGE: &str = "/fin_analytics 2025-10";

/// Spending in one category for one month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySpend {
    /// Category name
    pub category: String,
    /// Total spent
    pub sum: Decimal,
    /// Planned amount, zero when none was entered
    pub planned: Decimal,
}

impl CategorySpend {
    /// Share of the planned amount already spent.
    pub fn percent(&self) -> Result<Decimal> {
        completion_percent(self.sum, self.planned)
    }
}

/// `spent / planned * 100`, rounded to one decimal. Zero when nothing is planned.
pub fn completion_percent(spent: Decimal, planned: Decimal) -> Result<Decimal> {
    if planned <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }
    let ratio = spent
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|scaled| scaled.checked_div(planned));
    Ok(or_too_large(ratio)?.round_dp(1))
}

/// Traffic light for a completion percentage.
#[must_use]
pub fn status_emoji(percent: Decimal) -> &'static str {
    if percent <= Decimal::from(50) {
        "🟢"
    } else if percent <= Decimal::from(80) {
        "🟡"
    } else if percent <= Decimal::ONE_HUNDRED {
        "🟠"
    } else {
        "🔴"
    }
}

/// Generates a bar like `██████████░░░░░░░░░░` filled in proportion to `sum / max`.
#[must_use]
pub fn format_bar(sum: Decimal, max: Decimal) -> String {
    let filled = if max > Decimal::ZERO {
        sum.checked_div(max)
            .and_then(|ratio| ratio.checked_mul(Decimal::from(BAR_WIDTH)))
            .and_then(|cells| cells.round().to_usize())
            .unwrap_or(0)
            .min(BAR_WIDTH)
    } else {
        0
    };
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

/// Sums expenses per category, in order of first appearance.
pub fn aggregate(
    expenses: &[ExpenseRecord],
    planned: &HashMap<String, Decimal>,
) -> Result<Vec<CategorySpend>> {
    let mut spends: Vec<CategorySpend> = Vec::new();
    for expense in expenses {
        match spends.iter_mut().find(|s| s.category == expense.category) {
            Some(spend) => spend.sum = or_too_large(spend.sum.checked_add(expense.amount))?,
            None => spends.push(CategorySpend {
                category: expense.category.clone(),
                sum: expense.amount,
                planned: planned
                    .get(&expense.category)
                    .copied()
                    .unwrap_or_default(),
            }),
        }
    }
    Ok(spends)
}

fn checked_total(amounts: impl IntoIterator<Item = Decimal>) -> Result<Decimal> {
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |total, amount| {
            or_too_large(total.checked_add(amount))
        })
}

/// Everything shown in a monthly analytics message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthReport {
    /// Month bucket
    pub month: String,
    /// Per-category spending
    pub spends: Vec<CategorySpend>,
    /// Sum of all expenses in the month
    pub total_spent: Decimal,
    /// Sum of the planned amounts of all the user's categories
    pub total_planned: Decimal,
    /// Budget limit of the month, if one was set
    pub budget_limit: Option<Decimal>,
}

impl MonthReport {
    /// Overall completion against the planned total.
    pub fn completion_percent(&self) -> Result<Decimal> {
        completion_percent(self.total_spent, self.total_planned)
    }

    /// Renders the report as message text.
    pub fn render(&self) -> Result<String> {
        let mut text = format!("📊 Expenses for {}\n", self.month);
        if let Some(limit) = self.budget_limit {
            writeln!(text, "🎯 Budget limit: {}", format_amount(limit))?;
        }
        text.push('\n');

        let max = self
            .spends
            .iter()
            .map(|s| s.sum)
            .max()
            .unwrap_or_default();
        for spend in &self.spends {
            let percent = spend.percent()?;
            writeln!(
                text,
                "{} {}: {} ({percent:.1}%) of {}",
                status_emoji(percent),
                spend.category,
                format_amount(spend.sum),
                format_amount(spend.planned)
            )?;
            writeln!(text, "`{}`", format_bar(spend.sum, max))?;
        }

        writeln!(text, "\n💰 Spent: {}", format_amount(self.total_spent))?;
        writeln!(text, "📋 Planned: {}", format_amount(self.total_planned))?;
        write!(text, "📈 Completion: {:.1}%", self.completion_percent()?)?;
        Ok(text)
    }
}

/// Builds the report of `month`, or `None` when it has no expenses.
pub async fn build_report(
    store: &KvStore,
    user_id: UserId,
    month: &str,
) -> Result<Option<MonthReport>> {
    let expenses: Vec<ExpenseRecord> = store.list_range(&keys::fin_expenses(user_id, month)).await?;
    if expenses.is_empty() {
        return Ok(None);
    }

    let planned = finance::planned_amounts(store, user_id).await?;
    let spends = aggregate(&expenses, &planned)?;
    let budget = store
        .get::<Budget>(&keys::fin_budget(user_id, month))
        .await?;

    Ok(Some(MonthReport {
        month: month.to_string(),
        total_spent: checked_total(spends.iter().map(|s| s.sum))?,
        total_planned: checked_total(planned.values().copied())?,
        spends,
        budget_limit: budget.map(|b| b.limit),
    }))
}

/// Sends the analytics of `month` to the user.
#[instrument(skip(svc))]
pub async fn show_report<M: Messenger>(
    svc: &Services<'_, M>,
    user_id: UserId,
    month: &str,
) -> Result<()> {
    let report = build_report(svc.store, user_id, month)
        .await?
        .ok_or_else(|| Error::not_found(format!("No expenses for {month}")))?;
    svc.messenger
        .send_to_user(user_id, report.render()?.into())
        .await
}

/// Offers the current month and the five before it as buttons.
#[instrument(skip(svc))]
pub async fn show_month_picker<M: Messenger>(svc: &Services<'_, M>, user_id: UserId) -> Result<()> {
    let keyboard: Vec<Vec<Button>> = recent_months(Utc::now(), PICKER_MONTHS)
        .chunks(3)
        .map(|row| {
            row.iter()
                .map(|month| {
                    let callback = Callback::new(
                        CallbackAction::AnalyticsMonth {
                            month: month.clone(),
                        },
                        user_id,
                    );
                    Button::new(month.clone(), callback.encode())
                })
                .collect()
        })
        .collect();

    svc.messenger
        .send_to_user(
            user_id,
            OutgoingMessage::text("📅 Choose a month:").with_keyboard(keyboard),
        )
        .await
}

/// `/fin_analytics [YYYY-MM]`: the report for a given month, or the picker.
#[instrument(skip(svc))]
pub async fn show_analytics<M: Messenger>(
    svc: &Services<'_, M>,
    user_id: UserId,
    month: Option<&str>,
) -> Result<()> {
    match month {
        Some(month) if is_valid_month(month) => show_report(svc, user_id, month).await,
        Some(_) => Err(Error::invalid_format(ANALYTICS_USAGE)),
        None => show_month_picker(svc, user_id).await,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        core::calendar::current_month,
        test_utils::{TestHarness, d},
    };

    const USER: UserId = 5;

    fn expense(category: &str, amount: &str) -> ExpenseRecord {
        ExpenseRecord {
            user_id: USER,
            category: category.to_string(),
            amount: d(amount),
            description: String::new(),
            date: Utc::now(),
        }
    }

    #[test]
    fn test_completion_percent() {
        assert_eq!(completion_percent(d("1500"), d("15000")).unwrap(), d("10"));
        assert_eq!(completion_percent(d("1"), d("3")).unwrap(), d("33.3"));
        assert_eq!(
            completion_percent(d("100"), Decimal::ZERO).unwrap(),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_completion_percent_overflow_is_an_error() {
        assert!(matches!(
            completion_percent(Decimal::MAX, d("1")),
            Err(Error::AmountTooLarge)
        ));
        assert!(matches!(
            completion_percent(d("1000"), d("0.0000000000000000000000000001")),
            Err(Error::AmountTooLarge)
        ));
    }

    #[test]
    fn test_aggregate_overflow_is_an_error() {
        let mut huge = expense("Food", "1");
        huge.amount = Decimal::MAX;
        let expenses = vec![huge.clone(), huge];

        assert!(matches!(
            aggregate(&expenses, &HashMap::new()),
            Err(Error::AmountTooLarge)
        ));
    }

    #[test]
    fn test_status_emoji_thresholds() {
        assert_eq!(status_emoji(d("50")), "🟢");
        assert_eq!(status_emoji(d("50.1")), "🟡");
        assert_eq!(status_emoji(d("80")), "🟡");
        assert_eq!(status_emoji(d("100")), "🟠");
        assert_eq!(status_emoji(d("100.1")), "🔴");
    }

    #[test]
    fn test_format_bar() {
        assert_eq!(format_bar(d("10"), d("10")), "█".repeat(20));
        assert_eq!(
            format_bar(d("5"), d("10")),
            format!("{}{}", "█".repeat(10), "░".repeat(10))
        );
        assert_eq!(format_bar(d("0"), d("0")), "░".repeat(20));
    }

    #[test]
    fn test_aggregate_sums_per_category_in_first_seen_order() {
        let expenses = vec![
            expense("Rent", "30000"),
            expense("Food", "500"),
            expense("Rent", "100"),
            expense("Food", "250.5"),
        ];
        let planned = HashMap::from([("Food".to_string(), d("15000"))]);

        let spends = aggregate(&expenses, &planned).unwrap();

        assert_eq!(
            spends,
            vec![
                CategorySpend {
                    category: "Rent".to_string(),
                    sum: d("30100"),
                    planned: Decimal::ZERO,
                },
                CategorySpend {
                    category: "Food".to_string(),
                    sum: d("750.5"),
                    planned: d("15000"),
                },
            ]
        );
    }

    #[test]
    fn test_render_includes_totals_and_limit() {
        let report = MonthReport {
            month: "2025-10".to_string(),
            spends: vec![CategorySpend {
                category: "Food".to_string(),
                sum: d("1500"),
                planned: d("15000"),
            }],
            total_spent: d("1500"),
            total_planned: d("20000"),
            budget_limit: Some(d("50000")),
        };

        let text = report.render().unwrap();

        assert!(text.starts_with("📊 Expenses for 2025-10\n🎯 Budget limit: 50000₽"));
        assert!(text.contains("🟢 Food: 1500₽ (10.0%) of 15000₽"));
        assert!(text.contains("💰 Spent: 1500₽"));
        assert!(text.contains("📋 Planned: 20000₽"));
        assert!(text.ends_with("📈 Completion: 7.5%"));
    }

    #[tokio::test]
    async fn test_build_report_uses_all_planned_amounts() -> Result<()> {
        let harness = TestHarness::new().await?;
        let store = &harness.store;
        for (name, planned) in [("Food", "15000"), ("Rent", "30000")] {
            store.set_add(&keys::fin_categories(USER), name).await?;
            store
                .set(
                    &keys::fin_category(USER, name),
                    &crate::models::Category {
                        user_id: USER,
                        name: name.to_string(),
                        planned_amount: d(planned),
                        created_at: Utc::now(),
                    },
                )
                .await?;
        }
        store
            .list_push(&keys::fin_expenses(USER, "2025-10"), &expense("Food", "1500"))
            .await?;

        let report = build_report(store, USER, "2025-10").await?.unwrap();

        assert_eq!(report.spends.len(), 1);
        assert_eq!(report.total_spent, d("1500"));
        assert_eq!(report.total_planned, d("45000"));
        assert_eq!(report.budget_limit, None);
        assert!(build_report(store, USER, "2025-09").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_show_analytics_without_month_offers_picker() -> Result<()> {
        let harness = TestHarness::new().await?;

        show_analytics(&harness.services(), USER, None).await?;

        let message = harness.messenger.last_to_user(USER).unwrap();
        let payloads: Vec<&str> = message.buttons().map(|b| b.payload.as_str()).collect();
        assert_eq!(payloads.len(), 6);
        assert_eq!(
            payloads[0],
            format!("analytics_month:{}:{USER}", current_month())
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_show_analytics_rejects_bad_month_and_empty_month() -> Result<()> {
        let harness = TestHarness::new().await?;
        let svc = harness.services();

        let bad = show_analytics(&svc, USER, Some("10/2025")).await;
        assert!(matches!(bad, Err(Error::InvalidFormat { .. })));

        let empty = show_analytics(&svc, USER, Some("2020-01")).await;
        assert!(matches!(empty, Err(Error::NotFound { .. })));
        Ok(())
    }
}
