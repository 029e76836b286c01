//! Month buckets and calendar arithmetic.

use chrono::{DateTime, Datelike, Months, NaiveDate, TimeZone, Utc};

/// Month bucket (`YYYY-MM`) of an instant, in UTC.
#[must_use]
pub fn month_bucket(at: DateTime<Utc>) -> String {
    at.format("%Y-%m").to_string()
}

/// Month bucket of the current UTC time.
#[must_use]
pub fn current_month() -> String {
    month_bucket(Utc::now())
}

/// The month of `at` followed by the `count - 1` months before it, newest first.
#[must_use]
pub fn recent_months(at: DateTime<Utc>, count: u32) -> Vec<String> {
    (0..count)
        .filter_map(|back| at.checked_sub_months(Months::new(back)))
        .map(month_bucket)
        .collect()
}

/// Whether `month` is a well-formed `YYYY-MM` bucket.
#[must_use]
pub fn is_valid_month(month: &str) -> bool {
    month.len() == 7 && NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d").is_ok()
}

/// Midnight UTC on the first day of the month after `at`.
#[must_use]
pub fn first_of_next_month(at: DateTime<Utc>) -> DateTime<Utc> {
    let (year, month) = if at.month() == 12 {
        (at.year() + 1, 1)
    } else {
        (at.year(), at.month() + 1)
    };
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .unwrap_or(at)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 30, 0).unwrap()
    }

    #[test]
    fn test_month_bucket() {
        assert_eq!(month_bucket(utc(2025, 3, 9)), "2025-03");
    }

    #[test]
    fn test_recent_months_cross_year_boundary() {
        assert_eq!(
            recent_months(utc(2025, 2, 28), 6),
            vec!["2025-02", "2025-01", "2024-12", "2024-11", "2024-10", "2024-09"]
        );
    }

    #[test]
    fn test_recent_months_from_month_end() {
        // March 31st minus one month clamps to February, not March 3rd
        assert_eq!(recent_months(utc(2025, 3, 31), 2), vec!["2025-03", "2025-02"]);
    }

    #[test]
    fn test_is_valid_month() {
        assert!(is_valid_month("2025-10"));
        assert!(!is_valid_month("2025-13"));
        assert!(!is_valid_month("2025-1"));
        assert!(!is_valid_month("October"));
    }

    #[test]
    fn test_first_of_next_month() {
        assert_eq!(
            first_of_next_month(utc(2025, 10, 18)),
            Utc.with_ymd_and_hms(2025, 11, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            first_of_next_month(utc(2025, 12, 31)),
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
        );
    }
}
