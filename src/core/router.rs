//! Command and callback routing.
//!
//! Turns an inbound text or button press into a call to the loan or finance
//! handlers, and turns whatever error comes back into a reply. User-facing errors
//! are shown as-is to the operation's reply target; anything else is logged and
//! answered with a generic failure.

use super::{
    Services, analytics,
    callback::{Callback, CallbackAction},
    expense_history, finance, loan,
    messenger::{ChatId, Messenger, Recipient, UserId},
    session::{self, Session},
};
use crate::errors::{Error, Result};
use tracing::{debug, error};

const UNKNOWN_COMMAND: &str = "Unknown command. Use /start for help";
const GENERIC_FAILURE: &str = "❌ Something went wrong. Please try again later";

/// Where an inbound update came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Origin {
    /// Chat the update was posted in
    pub chat_id: ChatId,
    /// Author of the update
    pub user_id: UserId,
}

/// A parsed bot command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/start`
    Start,
    /// `/authorize <token>`
    Authorize {
        /// Read or write token
        token: Option<String>,
    },
    /// `/user_authorize <token>`
    UserAuthorize {
        /// Write token
        token: Option<String>,
    },
    /// `/set <amount>`
    SetLoan {
        /// Raw amount text
        amount: Option<String>,
    },
    /// `/pay <amount>`
    Pay {
        /// Raw amount text
        amount: Option<String>,
    },
    /// `/status`
    Status,
    /// `/history`
    History,
    /// `/fin_auth <token>`
    FinAuth {
        /// Finance token
        token: Option<String>,
    },
    /// `/fin_add_category <name>`
    FinAddCategory {
        /// Category name, may contain spaces
        name: Option<String>,
    },
    /// `/fin_categories`
    FinCategories,
    /// `/fin_set_budget <month> <amount>`
    FinSetBudget {
        /// Month bucket
        month: Option<String>,
        /// Raw limit text
        amount: Option<String>,
    },
    /// `/fin_add_expense`
    FinAddExpense,
    /// `/fin_analytics [month]`
    FinAnalytics {
        /// Month bucket; the picker is shown without one
        month: Option<String>,
    },
    /// `/fin_history [month]`
    FinHistory {
        /// Month bucket; current month without one
        month: Option<String>,
    },
}

/// First whitespace-separated word of `args`.
#[must_use]
pub fn first_word(args: Option<&str>) -> Option<String> {
    args?.split_whitespace().next().map(str::to_string)
}

fn rest(args: Option<&str>) -> Option<String> {
    args.map(str::trim)
        .filter(|rest| !rest.is_empty())
        .map(str::to_string)
}

impl Command {
    /// Parses a message starting with `/`. The command word is case-insensitive.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim_start().strip_prefix('/')?;
        let (name, args) = match text.split_once(char::is_whitespace) {
            Some((name, args)) => (name, Some(args)),
            None => (text, None),
        };
        Self::from_parts(name, args)
    }

    /// Builds a command from its name (without `/`) and raw arguments.
    #[must_use]
    pub fn from_parts(name: &str, args: Option<&str>) -> Option<Self> {
        let command = match name.to_lowercase().as_str() {
            "start" => Self::Start,
            "authorize" => Self::Authorize {
                token: first_word(args),
            },
            "user_authorize" => Self::UserAuthorize {
                token: first_word(args),
            },
            "set" => Self::SetLoan { amount: rest(args) },
            "pay" => Self::Pay { amount: rest(args) },
            "status" => Self::Status,
            "history" => Self::History,
            "fin_auth" => Self::FinAuth {
                token: first_word(args),
            },
            "fin_add_category" => Self::FinAddCategory { name: rest(args) },
            "fin_categories" => Self::FinCategories,
            "fin_set_budget" => {
                let mut words = args.unwrap_or_default().split_whitespace();
                Self::FinSetBudget {
                    month: words.next().map(str::to_string),
                    amount: words.next().map(str::to_string),
                }
            }
            "fin_add_expense" => Self::FinAddExpense,
            "fin_analytics" => Self::FinAnalytics {
                month: first_word(args),
            },
            "fin_history" => Self::FinHistory {
                month: first_word(args),
            },
            _ => return None,
        };
        Some(command)
    }

    /// Where replies and errors of this command go.
    #[must_use]
    pub const fn reply_target(&self, origin: Origin) -> Recipient {
        match self {
            Self::Start
            | Self::Authorize { .. }
            | Self::SetLoan { .. }
            | Self::Status
            | Self::History => Recipient::Chat(origin.chat_id),
            Self::UserAuthorize { .. }
            | Self::Pay { .. }
            | Self::FinAuth { .. }
            | Self::FinAddCategory { .. }
            | Self::FinCategories
            | Self::FinSetBudget { .. }
            | Self::FinAddExpense
            | Self::FinAnalytics { .. }
            | Self::FinHistory { .. } => Recipient::User(origin.user_id),
        }
    }
}

/// Help text listing every command.
#[must_use]
pub fn help_text() -> &'static str {
    "👋 Loan & budget bot\n\n\
     Loan:\n\
     /authorize <token> - allow this chat to see the loan\n\
     /user_authorize <token> - allow yourself to change it\n\
     /set <amount> - set the loan amount\n\
     /pay <amount> - record a payment\n\
     /status - current balance\n\
     /history - payment history\n\n\
     Finance:\n\
     /fin_auth <token> - unlock finance tracking\n\
     /fin_add_category <name> - add a category\n\
     /fin_categories - list categories\n\
     /fin_set_budget <YYYY-MM> <amount> - set a monthly limit\n\
     /fin_add_expense - record an expense\n\
     /fin_analytics [YYYY-MM] - spending by category\n\
     /fin_history [YYYY-MM] - edit or delete expenses"
}

async fn run_command<M: Messenger>(
    svc: &Services<'_, M>,
    origin: Origin,
    command: &Command,
) -> Result<()> {
    let Origin { chat_id, user_id } = origin;
    match command {
        Command::Start => svc.messenger.send_to_chat(chat_id, help_text().into()).await,
        Command::Authorize { token } => loan::authorize(svc, chat_id, token.as_deref()).await,
        Command::UserAuthorize { token } => {
            loan::authorize_user(svc, user_id, token.as_deref()).await
        }
        Command::SetLoan { amount } => {
            loan::set_loan(svc, chat_id, user_id, amount.as_deref()).await
        }
        Command::Pay { amount } => loan::pay(svc, chat_id, user_id, amount.as_deref()).await,
        Command::Status => loan::show_status(svc, chat_id).await,
        Command::History => loan::show_history(svc, chat_id).await,
        Command::FinAuth { token } => finance::authorize(svc, user_id, token.as_deref()).await,
        Command::FinAddCategory { name } => {
            finance::add_category(svc, user_id, name.as_deref()).await
        }
        Command::FinCategories => finance::list_categories(svc, user_id).await,
        Command::FinSetBudget { month, amount } => {
            finance::set_budget(svc, user_id, month.as_deref(), amount.as_deref()).await
        }
        Command::FinAddExpense => finance::start_expense_entry(svc, user_id).await,
        Command::FinAnalytics { month } => {
            analytics::show_analytics(svc, user_id, month.as_deref()).await
        }
        Command::FinHistory { month } => {
            expense_history::show_history(svc, user_id, month.as_deref()).await
        }
    }
}

/// Runs a command and replies to its target if it fails.
pub async fn dispatch<M: Messenger>(svc: &Services<'_, M>, origin: Origin, command: Command) {
    debug!(?command, chat_id = origin.chat_id, user_id = origin.user_id, "Dispatching command");
    let result = run_command(svc, origin, &command).await;
    settle(svc, command.reply_target(origin), result).await;
}

/// Entry point for any inbound text: commands are dispatched, everything else
/// goes to [`handle_free_text`].
pub async fn handle_text<M: Messenger>(svc: &Services<'_, M>, origin: Origin, text: &str) {
    match Command::parse(text) {
        Some(command) => dispatch(svc, origin, command).await,
        None => handle_free_text(svc, origin, text).await,
    }
}

/// Text that is not a command answers whatever the user's session is waiting for.
pub async fn handle_free_text<M: Messenger>(svc: &Services<'_, M>, origin: Origin, text: &str) {
    let Origin { chat_id, user_id } = origin;
    let session = match session::load(svc.store, user_id).await {
        Ok(session) => session,
        Err(e) => {
            settle(svc, Recipient::Chat(chat_id), Err(e)).await;
            return;
        }
    };

    let (target, result) = match session {
        Session::AwaitingPlannedAmount { category } => (
            Recipient::User(user_id),
            finance::submit_planned_amount(svc, user_id, &category, text).await,
        ),
        Session::AwaitingExpenseAmount { .. } => (
            Recipient::User(user_id),
            finance::submit_expense_amount(svc, user_id, text).await,
        ),
        Session::AwaitingEditedAmount { .. } => (
            Recipient::User(user_id),
            expense_history::submit_edited_amount(svc, user_id, text).await,
        ),
        Session::Idle => (
            Recipient::Chat(chat_id),
            svc.messenger
                .send_to_chat(chat_id, UNKNOWN_COMMAND.into())
                .await,
        ),
    };
    settle(svc, target, result).await;
}

async fn run_callback<M: Messenger>(
    svc: &Services<'_, M>,
    user_id: UserId,
    action: CallbackAction,
) -> Result<()> {
    match action {
        CallbackAction::ExpenseCategory { category } => {
            finance::select_expense_category(svc, user_id, &category).await
        }
        CallbackAction::ExpenseAmount { category } => {
            finance::prompt_expense_amount(svc, user_id, &category).await
        }
        CallbackAction::ExpenseCancel => finance::cancel_expense_entry(svc, user_id).await,
        CallbackAction::AnalyticsMonth { month } => {
            analytics::show_report(svc, user_id, &month).await
        }
        CallbackAction::HistoryPage { month, page } => {
            expense_history::show_page(svc, user_id, &month, page).await
        }
        CallbackAction::Edit { month, index } => {
            expense_history::show_edit_menu(svc, user_id, &month, index).await
        }
        CallbackAction::EditAmount { month, index } => {
            expense_history::begin_edit_amount(svc, user_id, &month, index).await
        }
        CallbackAction::Delete { month, index } => {
            expense_history::request_delete(svc, user_id, &month, index).await
        }
        CallbackAction::DeleteConfirm { month, index } => {
            expense_history::confirm_delete(svc, user_id, &month, index).await
        }
        CallbackAction::DeleteCancel { month, index } => {
            expense_history::cancel_delete(svc, user_id, &month, index).await
        }
    }
}

/// Handles a button press by `user_id`.
///
/// Presses on buttons rendered for another user, and payloads that do not parse,
/// are ignored without a reply.
pub async fn handle_callback<M: Messenger>(svc: &Services<'_, M>, user_id: UserId, payload: &str) {
    let Some(callback) = Callback::parse(payload) else {
        debug!(payload, "Ignoring unparseable callback");
        return;
    };
    if callback.user_id != user_id {
        debug!(
            payload,
            presser = user_id,
            "Ignoring callback rendered for another user"
        );
        return;
    }

    let result = run_callback(svc, user_id, callback.action).await;
    settle(svc, Recipient::User(user_id), result).await;
}

/// Reply text for a failed operation.
#[must_use]
pub fn error_reply(error: &Error) -> String {
    match error {
        Error::NotFound { .. } => format!("ℹ️ {error}"),
        e if e.is_user_facing() => format!("❌ {e}"),
        _ => GENERIC_FAILURE.to_string(),
    }
}

async fn settle<M: Messenger>(svc: &Services<'_, M>, target: Recipient, result: Result<()>) {
    let Err(e) = result else {
        return;
    };
    if e.is_user_facing() {
        debug!(error = %e, "Operation rejected");
    } else {
        error!(error = %e, "Operation failed");
    }

    if let Err(send_error) = svc.messenger.deliver(target, error_reply(&e).into()).await {
        error!(error = %send_error, "Failed to deliver error reply");
    }
}
