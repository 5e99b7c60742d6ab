//! Loose conversions between wire text, numbers and dates.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Largest distance from the epoch, in milliseconds, that a date may hold.
/// Stays inside the range chrono represents on both sides of the epoch.
pub const MAX_DATE_MILLIS: f64 = 8.2e15;

/// Parses numeric text the way a loose wire number is read: surrounding
/// whitespace is ignored, empty text is 0, radix prefixes `0x`/`0o`/`0b` are
/// accepted, and anything else that is not a decimal literal is NaN.
pub fn parse_number(text: &str) -> f64 {
    let text = text.trim();
    if text.is_empty() {
        return 0.0;
    }

    match text {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    let radix = match text.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        return parse_radix(&text[2..], radix);
    }

    // Rejects the `inf`/`nan` spellings that `f64::from_str` would accept.
    let decimal = text
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'));
    if !decimal {
        return f64::NAN;
    }

    text.parse::<f64>().unwrap_or(f64::NAN)
}

/// Unsigned digits in `radix`, accumulated as a float so wide literals lose
/// precision instead of failing.
fn parse_radix(digits: &str, radix: u32) -> f64 {
    if digits.is_empty() {
        return f64::NAN;
    }

    digits
        .chars()
        .try_fold(0.0, |acc, c| {
            c.to_digit(radix).map(|d| acc * f64::from(radix) + f64::from(d))
        })
        .unwrap_or(f64::NAN)
}

/// Shortest text that reads back as `n`: `12345`, `12345.67`, `1e+21`, `NaN`.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }

    let abs = n.abs();
    if (1e-6..1e21).contains(&abs) {
        return n.to_string();
    }

    let exp = format!("{n:e}");
    match exp.split_once('e') {
        Some((mantissa, power)) if !power.starts_with('-') => format!("{mantissa}e+{power}"),
        _ => exp,
    }
}

/// Canonical text form of a date: ISO-8601, millisecond precision, `Z` suffix.
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Date at `millis` from the epoch, truncated toward zero.
pub fn date_from_millis(millis: f64) -> Option<DateTime<Utc>> {
    if !millis.is_finite() || millis.abs() > MAX_DATE_MILLIS {
        return None;
    }

    DateTime::<Utc>::from_timestamp_millis(millis.trunc() as i64)
}

/// Milliseconds since the epoch.
pub fn date_to_millis(date: &DateTime<Utc>) -> f64 {
    date.timestamp_millis() as f64
}

const NAIVE_DATE_TIME_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const NAIVE_DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

/// Parses date text. Zone-less forms are read as UTC.
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Some(date.with_timezone(&Utc));
    }

    for format in NAIVE_DATE_TIME_FORMATS {
        if let Ok(date) = NaiveDateTime::parse_from_str(text, format) {
            return Some(date.and_utc());
        }
    }

    for format in NAIVE_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0).map(|d| d.and_utc());
        }
    }

    if let Some(date) = parse_partial_iso(text) {
        return Some(date);
    }

    DateTime::parse_from_rfc2822(text)
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

/// `YYYY` and `YYYY-MM`.
fn parse_partial_iso(text: &str) -> Option<DateTime<Utc>> {
    let (year, month) = match text.split_once('-') {
        Some((year, month)) if month.len() == 2 => (year, month.parse::<u32>().ok()?),
        None => (text, 1),
        _ => return None,
    };
    if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    NaiveDate::from_ymd_opt(year.parse().ok()?, month, 1)?
        .and_hms_opt(0, 0, 0)
        .map(|d| d.and_utc())
}

/// Folds text for base comparison: case and accents are ignored.
pub fn fold_base(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// True when `a` and `b` differ at most in case or accents.
pub fn base_eq(a: &str, b: &str) -> bool {
    fold_base(a) == fold_base(b)
}
