// src/services/numeric.rs

//! Numeric text normalization for ratio tables.
//!
//! Counts arrive as "1,234" or "1,234명"; rates arrive as "3.5 : 1", "3.5:1"
//! or a bare "3.5", sometimes mixed inside a single table.

use std::sync::LazyLock;

use regex::Regex;

static RATIO_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*:\s*1").expect("valid ratio pattern"));

static NUMBER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("valid number pattern"));

/// Parse a count by keeping only its digits.
///
/// Returns 0 when the text holds no digit. Values too large for `u64`
/// saturate.
pub fn parse_integer(text: &str) -> u64 {
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return 0;
    }
    digits.parse().unwrap_or(u64::MAX)
}

/// Parse a competition rate.
///
/// Tries a `<number> : 1` ratio first, then the first bare number, then 0.0.
/// Thousands separators are ignored.
pub fn parse_rate(text: &str) -> f64 {
    let text = text.replace(',', "");

    if let Some(value) = RATIO_PATTERN
        .captures(&text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
    {
        return value;
    }

    NUMBER_PATTERN
        .find(&text)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0.0)
}
