//! Display helpers for currency, rates, and dates.

use chrono::{DateTime, Utc};

/// Formats a dollar amount with thousands separators, e.g. `$1,234.50` or `-$5.00`.
#[must_use]
pub fn format_currency(amount: f64) -> String {
    let cents = format!("{:.2}", amount.abs());
    let (whole, fraction) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && cents != "0.00" { "-" } else { "" };
    format!("{sign}${grouped}.{fraction}")
}

/// Formats a rate in `[0, 1]` as a percentage without trailing zeros, e.g. `15%` or `4.5%`.
#[must_use]
pub fn format_percentage(rate: f64) -> String {
    let formatted = format!("{:.2}", rate * 100.0);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    format!("{trimmed}%")
}

/// Formats a timestamp as a short calendar date, e.g. `Mar 5, 2024`.
#[must_use]
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Truncates `text` to at most `max_chars` characters, marking the cut with `…`.
#[must_use]
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{kept}…")
}
