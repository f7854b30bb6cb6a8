//! Display and input helpers for money and dates.
//!
//! Money is whole local-currency units shown with `.` as the thousands
//! separator (`800.000`). Dates are date-only values shown as `DD-MM-YYYY`
//! and exchanged with the backend as ISO `YYYY-MM-DD`.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::calculations::common::round_currency;

const THOUSANDS_SEPARATOR: char = '.';

/// Formats a monetary amount rounded to whole units with thousands
/// separators.
pub fn format_money(value: Decimal) -> String {
    let rounded = round_currency(value);
    let digits = rounded.abs().trunc().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(THOUSANDS_SEPARATOR);
        }
        grouped.push(ch);
    }

    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Formats an optional amount, using "—" when absent.
pub fn format_opt_money(value: &Option<Decimal>) -> String {
    value
        .map(format_money)
        .unwrap_or_else(|| "—".to_string())
}

/// Parses user-typed money. Every non-digit character (currency symbols,
/// separators, spaces) is ignored. Returns `None` when no digit remains.
/// Never fails with an error.
pub fn parse_money(input: &str) -> Option<Decimal> {
    let digits: String = input.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().map_or_else(
        |e| {
            tracing::warn!(input = %input, "money value out of range: {}", e);
            None
        },
        Some,
    )
}

/// Formats a date as `DD-MM-YYYY`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d-%m-%Y").to_string()
}

/// Formats an optional date, using an empty string when absent.
pub fn format_opt_date(date: Option<NaiveDate>) -> String {
    date.map(format_date).unwrap_or_default()
}

/// Parses an ISO `YYYY-MM-DD` date. Returns `None` for empty or malformed
/// input.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_or_else(
        |e| {
            tracing::warn!(input = %input, "invalid date: {}", e);
            None
        },
        Some,
    )
}
