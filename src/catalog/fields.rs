//! Field parsing rules for raw catalog text
//!
//! These reproduce the catalog's historical data quirks on purpose:
//! numeric fields keep digits only (`"$24.95"` becomes `2495`), zero means
//! "not provided" everywhere except quantity, and decimals read the leading
//! numeric prefix the way a browser's `parseFloat` does.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Returns true if `url` points at an item page
pub fn is_item_url(url: &str, marker: &str) -> bool {
    url.contains(marker)
}

/// Extracts the external identifier that follows `marker` in `url`
///
/// The identifier is the run of ASCII digits right after the marker. Returns an
/// empty string when the marker is missing or not followed by a digit.
pub fn external_id_from_url(url: &str, marker: &str) -> String {
    let Some(position) = url.find(marker) else {
        return String::new();
    };

    url[position + marker.len()..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect()
}

fn digits_only(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Parses a measurement or price by keeping only its digits
///
/// Zero, empty input, or a digit run too long for `i64` yields `None`.
pub fn parse_whole_number(raw: Option<&str>) -> Option<i64> {
    match digits_only(raw?).parse::<i64>() {
        Ok(0) | Err(_) => None,
        Ok(value) => Some(value),
    }
}

/// Parses a stock quantity by keeping only its digits
///
/// Unlike other numeric fields, zero is a real value, and unparseable text
/// also reads as zero.
pub fn parse_quantity(raw: Option<&str>) -> i64 {
    raw.map(digits_only)
        .and_then(|digits| digits.parse::<i64>().ok())
        .unwrap_or(0)
}

/// Parses a decimal field to two places from its leading numeric prefix
///
/// `"13.5% Alc./Vol."` reads as `13.50`. Non-numeric text and zero yield `None`.
pub fn parse_decimal(raw: Option<&str>) -> Option<Decimal> {
    let prefix = numeric_prefix(raw?.trim_start());
    let prefix = prefix.strip_prefix('+').unwrap_or(prefix);
    let value = if prefix.starts_with('.') || prefix.starts_with("-.") {
        Decimal::from_str(&prefix.replacen('.', "0.", 1)).ok()?
    } else {
        Decimal::from_str(prefix).ok()?
    };
    if value.is_zero() {
        return None;
    }

    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    Some(rounded)
}

/// Longest prefix of the form `[+-]?(digits[.digits]|.digits)`
fn numeric_prefix(text: &str) -> &str {
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let has_int = end > int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > frac_start {
            end = frac_end;
        } else if !has_int {
            return "";
        }
    } else if !has_int {
        return "";
    }

    &text[..end]
}
