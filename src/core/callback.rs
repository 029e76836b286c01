//! Button callback payloads.
//!
//! Payloads are colon-delimited, start with an action tag and always end with the
//! id of the user the buttons were rendered for, e.g.
//! `expense_history_page:2025-10:1:42`. Category names may themselves contain
//! colons, so they are taken as everything between the tag and the user id.

use super::messenger::UserId;

/// Longest payload a button can carry; Discord rejects longer `custom_id`s.
pub const MAX_PAYLOAD_CHARS: usize = 100;

/// What a button press asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    /// A category was picked for a new expense
    ExpenseCategory {
        /// Picked category
        category: String,
    },
    /// "Enter amount" was pressed for a picked category
    ExpenseAmount {
        /// Picked category
        category: String,
    },
    /// Expense entry was cancelled
    ExpenseCancel,
    /// A month was picked in the analytics picker
    AnalyticsMonth {
        /// Picked month bucket
        month: String,
    },
    /// A page of the expense history was requested
    HistoryPage {
        /// Month bucket
        month: String,
        /// Zero-based page
        page: usize,
    },
    /// The edit menu of an expense was requested
    Edit {
        /// Month bucket
        month: String,
        /// Position in the month list
        index: usize,
    },
    /// A new amount for an expense is about to be typed
    EditAmount {
        /// Month bucket
        month: String,
        /// Position in the month list
        index: usize,
    },
    /// Deletion of an expense was requested and needs confirmation
    Delete {
        /// Month bucket
        month: String,
        /// Position in the month list
        index: usize,
    },
    /// Deletion was confirmed
    DeleteConfirm {
        /// Month bucket
        month: String,
        /// Position in the month list
        index: usize,
    },
    /// Deletion was called off
    DeleteCancel {
        /// Month bucket
        month: String,
        /// Position in the month list
        index: usize,
    },
}

/// A decoded button payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Callback {
    /// Requested action
    pub action: CallbackAction,
    /// User the buttons belong to
    pub user_id: UserId,
}

impl Callback {
    /// Pairs an action with the user it belongs to.
    #[must_use]
    pub const fn new(action: CallbackAction, user_id: UserId) -> Self {
        Self { action, user_id }
    }

    /// Whether the encoded payload is short enough to be sent as a button.
    #[must_use]
    pub fn fits(&self) -> bool {
        self.encode().chars().count() <= MAX_PAYLOAD_CHARS
    }

    /// Decodes a payload. Unknown tags and malformed fields yield `None`.
    #[must_use]
    pub fn parse(payload: &str) -> Option<Self> {
        let (tag, rest) = payload.split_once(':')?;
        let (body, user) = match rest.rsplit_once(':') {
            Some((body, user)) => (body, user),
            None => ("", rest),
        };
        let user_id = user.parse::<UserId>().ok()?;

        let action = match tag {
            "expense_category" => CallbackAction::ExpenseCategory {
                category: non_empty(body)?.to_string(),
            },
            "expense_amount" => CallbackAction::ExpenseAmount {
                category: non_empty(body)?.to_string(),
            },
            "expense_cancel" if body.is_empty() => CallbackAction::ExpenseCancel,
            "analytics_month" => CallbackAction::AnalyticsMonth {
                month: non_empty(body)?.to_string(),
            },
            "expense_history_page" => {
                let (month, page) = month_and_number(body)?;
                CallbackAction::HistoryPage { month, page }
            }
            "expense_edit" => {
                let (month, index) = month_and_number(body)?;
                CallbackAction::Edit { month, index }
            }
            "expense_edit_amount" => {
                let (month, index) = month_and_number(body)?;
                CallbackAction::EditAmount { month, index }
            }
            "expense_delete" => {
                let (month, index) = month_and_number(body)?;
                CallbackAction::Delete { month, index }
            }
            "expense_delete_confirm" => {
                let (month, index) = month_and_number(body)?;
                CallbackAction::DeleteConfirm { month, index }
            }
            "expense_delete_cancel" => {
                let (month, index) = month_and_number(body)?;
                CallbackAction::DeleteCancel { month, index }
            }
            _ => return None,
        };

        Some(Self { action, user_id })
    }

    /// Encodes the callback into its payload string.
    #[must_use]
    pub fn encode(&self) -> String {
        let user = self.user_id;
        match &self.action {
            CallbackAction::ExpenseCategory { category } => {
                format!("expense_category:{category}:{user}")
            }
            CallbackAction::ExpenseAmount { category } => {
                format!("expense_amount:{category}:{user}")
            }
            CallbackAction::ExpenseCancel => format!("expense_cancel:{user}"),
            CallbackAction::AnalyticsMonth { month } => format!("analytics_month:{month}:{user}"),
            CallbackAction::HistoryPage { month, page } => {
                format!("expense_history_page:{month}:{page}:{user}")
            }
            CallbackAction::Edit { month, index } => format!("expense_edit:{month}:{index}:{user}"),
            CallbackAction::EditAmount { month, index } => {
                format!("expense_edit_amount:{month}:{index}:{user}")
            }
            CallbackAction::Delete { month, index } => {
                format!("expense_delete:{month}:{index}:{user}")
            }
            CallbackAction::DeleteConfirm { month, index } => {
                format!("expense_delete_confirm:{month}:{index}:{user}")
            }
            CallbackAction::DeleteCancel { month, index } => {
                format!("expense_delete_cancel:{month}:{index}:{user}")
            }
        }
    }
}

fn non_empty(s: &str) -> Option<&str> {
    (!s.is_empty()).then_some(s)
}

fn month_and_number(body: &str) -> Option<(String, usize)> {
    let (month, number) = body.split_once(':')?;
    Some((non_empty(month)?.to_string(), number.parse().ok()?))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_expense_category() {
        let callback = Callback::parse("expense_category:Food:42").unwrap();
        assert_eq!(callback.user_id, 42);
        assert_eq!(
            callback.action,
            CallbackAction::ExpenseCategory {
                category: "Food".to_string()
            }
        );
    }

    #[test]
    fn test_category_may_contain_colons() {
        let callback = Callback::parse("expense_category:Kids: school:42");
        assert_eq!(
            callback.map(|c| c.action),
            Some(CallbackAction::ExpenseCategory {
                category: "Kids: school".to_string()
            })
        );
    }

    #[test]
    fn test_parse_history_page_and_cancel() {
        assert_eq!(
            Callback::parse("expense_history_page:2025-10:2:7"),
            Some(Callback::new(
                CallbackAction::HistoryPage {
                    month: "2025-10".to_string(),
                    page: 2
                },
                7
            ))
        );
        assert_eq!(
            Callback::parse("expense_cancel:7"),
            Some(Callback::new(CallbackAction::ExpenseCancel, 7))
        );
    }

    #[test]
    fn test_rejects_malformed_payloads() {
        assert_eq!(Callback::parse("expense_delete:2025-10:x:7"), None);
        assert_eq!(Callback::parse("expense_delete:2025-10:1:bob"), None);
        assert_eq!(Callback::parse("expense_category::7"), None);
        assert_eq!(Callback::parse("something_else:1:2"), None);
        assert_eq!(Callback::parse("no-colons"), None);
    }

    #[test]
    fn test_encoded_payloads_parse_back() {
        let actions = [
            CallbackAction::ExpenseAmount {
                category: "Rent".to_string(),
            },
            CallbackAction::AnalyticsMonth {
                month: "2025-09".to_string(),
            },
            CallbackAction::DeleteConfirm {
                month: "2025-09".to_string(),
                index: 11,
            },
            CallbackAction::EditAmount {
                month: "2025-09".to_string(),
                index: 0,
            },
        ];
        for action in actions {
            let callback = Callback::new(action, 99);
            assert_eq!(Callback::parse(&callback.encode()), Some(callback));
        }
    }

    #[test]
    fn test_fits_counts_characters() {
        let short = Callback::new(
            CallbackAction::ExpenseCategory {
                category: "Food".to_string(),
            },
            UserId::MAX,
        );
        assert!(short.fits());

        let long = Callback::new(
            CallbackAction::ExpenseCategory {
                category: "x".repeat(67),
            },
            123_456_789_012_345_678,
        );
        assert_eq!(long.encode().len(), 103);
        assert!(!long.fits());
    }

    #[test]
    fn test_encode_matches_wire_format() {
        let callback = Callback::new(
            CallbackAction::Delete {
                month: "2025-10".to_string(),
                index: 3,
            },
            42,
        );
        assert_eq!(callback.encode(), "expense_delete:2025-10:3:42");
    }
}
