//! Display formatting for dashboard figures

use chrono::{Datelike, NaiveDate};

/// `15.5` → `"15.5%"`
#[must_use]
pub fn format_percent(value: f64) -> String {
    format!("{value:.1}%")
}

/// `1_200_000.0` → `"1.2M"`
#[must_use]
pub fn format_compact_number(value: f64) -> String {
    if value >= 1e9 {
        format!("{:.1}B", value / 1e9)
    } else if value >= 1e6 {
        format!("{:.1}M", value / 1e6)
    } else if value >= 1e3 {
        format!("{:.1}K", value / 1e3)
    } else {
        value.to_string()
    }
}

/// `1000000` → `"1,000,000원"`
#[must_use]
pub fn format_currency(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0 { "-" } else { "" };
    format!("{sign}{grouped}원")
}

/// `"2024-11-01"` → `"2024년 11월 1일"`; anything unparseable is returned as is
#[must_use]
pub fn format_date(date: &str) -> String {
    let day = date.get(..10).unwrap_or(date);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").map_or_else(
        |_| date.to_string(),
        |d| format!("{}년 {}월 {}일", d.year(), d.month(), d.day()),
    )
}
