//! Input validation for employee-facing fields.
//!
//! Chilean RUT numbers carry a modulo-11 check digit: the body digits are
//! weighted 2, 3, 4, 5, 6, 7, 2, 3, ... from the right, summed, and the
//! check digit is `11 - (sum % 11)` with 11 written as `0` and 10 as `K`.

use std::sync::LazyLock;

use regex::Regex;

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\+?56)?9\d{8}$").expect("valid phone regex"));

/// Removes dots and hyphens from a RUT.
pub fn clean_rut(rut: &str) -> String {
    rut.trim().chars().filter(|c| *c != '.' && *c != '-').collect()
}

/// Check digit for the numeric body of a RUT, or `None` when the body is
/// empty or contains non-digits.
pub fn rut_check_digit(body: &str) -> Option<char> {
    if body.is_empty() {
        return None;
    }

    let mut sum = 0u32;
    let mut multiplier = 2u32;
    for ch in body.chars().rev() {
        sum += ch.to_digit(10)? * multiplier;
        multiplier = if multiplier == 7 { 2 } else { multiplier + 1 };
    }

    match 11 - (sum % 11) {
        11 => Some('0'),
        10 => Some('K'),
        n => char::from_digit(n, 10),
    }
}

/// Whether `rut` (with or without dots and hyphen) has a correct check digit.
pub fn validate_rut(rut: &str) -> bool {
    let clean = clean_rut(rut);
    if clean.chars().count() < 2 {
        return false;
    }
    let Some((idx, dv)) = clean.char_indices().last() else {
        return false;
    };
    let body = &clean[..idx];
    rut_check_digit(body) == Some(dv.to_ascii_uppercase())
}

/// Formats a RUT as `12.345.678-5`. Input too short to hold a body and a
/// check digit is returned unchanged.
pub fn format_rut(rut: &str) -> String {
    let clean = clean_rut(rut);
    let Some((idx, dv)) = clean.char_indices().last() else {
        return rut.to_string();
    };
    if idx == 0 {
        return rut.to_string();
    }
    let body = &clean[..idx];

    let len = body.chars().count();
    let mut formatted = String::with_capacity(len + len / 3 + 2);
    for (pos, ch) in body.chars().enumerate() {
        if pos > 0 && (len - pos) % 3 == 0 {
            formatted.push('.');
        }
        formatted.push(ch);
    }
    formatted.push('-');
    formatted.push(dv);
    formatted
}

/// Chilean mobile numbers: `+56 9 XXXX XXXX`, `56 9...` or `9 XXXX XXXX`.
/// Whitespace is ignored.
pub fn validate_phone(phone: &str) -> bool {
    let compact: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    PHONE_RE.is_match(&compact)
}
