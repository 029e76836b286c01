//! Amount parsing and formatting.
//!
//! Two parsing dialects exist. Loan commands use the invariant currency style:
//! `,` is a thousands separator and `.` the decimal point. Finance input is typed
//! on phones, so spaces are dropped and `,` is accepted as the decimal separator.
//! Both reject amounts beyond [`MAX_WHOLE_AMOUNT`] or with more than
//! [`MAX_FRACTION_DIGITS`] decimals, so sums and percentages stay far from the
//! limits of `Decimal`.

use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Currency sign appended to every displayed amount.
pub const CURRENCY: &str = "₽";

const CURRENCY_SIGNS: [char; 3] = ['₽', '$', '¤'];

/// Largest absolute amount accepted from user input.
pub const MAX_WHOLE_AMOUNT: i64 = 1_000_000_000_000_000;

/// Most digits accepted after the decimal point, ignoring trailing zeros.
pub const MAX_FRACTION_DIGITS: u32 = 2;

/// Parses an amount in invariant currency style, e.g. `100000`, `1,250.50`, `(300)`, `₽500`.
///
/// Parentheses denote a negative amount. Returns `None` if the text is not a number.
#[must_use]
pub fn parse_invariant(text: &str) -> Option<Decimal> {
    let trimmed = text.trim();
    let (negative, body) = match trimmed
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
    {
        Some(inner) => (true, inner.trim()),
        None => (false, trimmed),
    };

    let cleaned: String = body
        .trim_matches(|c: char| CURRENCY_SIGNS.contains(&c) || c.is_whitespace())
        .chars()
        .filter(|&c| c != ',')
        .collect();

    let value = parse_plain(&cleaned)?;
    if negative {
        if value.is_sign_negative() {
            return None;
        }
        return Some(-value);
    }
    Some(value)
}

/// Parses a user-typed amount, e.g. `1500`, `15 000`, `99,90`.
#[must_use]
pub fn parse_flexible(text: &str) -> Option<Decimal> {
    let cleaned: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && !CURRENCY_SIGNS.contains(c))
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    parse_plain(&cleaned)
}

fn parse_plain(cleaned: &str) -> Option<Decimal> {
    if cleaned.is_empty() || cleaned.contains(['e', 'E']) {
        return None;
    }
    Decimal::from_str(cleaned)
        .ok()
        .filter(|value| value.abs() <= Decimal::from(MAX_WHOLE_AMOUNT))
        .filter(|value| value.normalize().scale() <= MAX_FRACTION_DIGITS)
}

/// Turns the result of a `checked_*` operation into [`Error::AmountTooLarge`] on overflow.
pub fn or_too_large(value: Option<Decimal>) -> Result<Decimal> {
    value.ok_or(Error::AmountTooLarge)
}

/// Formats an amount without trailing zeros, e.g. `1500₽`, `99.9₽`.
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    format!("{}{CURRENCY}", amount.normalize())
}
