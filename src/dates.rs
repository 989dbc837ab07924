//! Date precision and human-readable date rendering.
//!
//! Stored dates may have been entered with partial precision (just a year,
//! or a year and month). A companion precision value records how much of
//! the stored date is real, so rendering never invents a day or a time.

use crate::db::Value;
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};

/// Suffix of the per-row precision companion of a date field.
pub const PRECISION_SUFFIX: &str = "__precision";

/// How much of a stored date value is meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatePrecision {
    DateAndTime,
    DateOnly,
    MonthOnly,
    YearOnly,
}

impl DatePrecision {
    /// Stored integer code of this precision.
    pub fn code(self) -> i64 {
        match self {
            Self::DateAndTime => 0,
            Self::DateOnly => 1,
            Self::MonthOnly => 2,
            Self::YearOnly => 3,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Self::DateAndTime),
            1 => Some(Self::DateOnly),
            2 => Some(Self::MonthOnly),
            3 => Some(Self::YearOnly),
            _ => None,
        }
    }

    /// Reads a precision companion value.
    ///
    /// A missing or unreadable companion means date-only: computed
    /// expressions carry no companion, and a full date is the conservative
    /// reading.
    pub fn from_value(value: Option<&Value>) -> Self {
        value
            .and_then(Value::as_i64)
            .and_then(Self::from_code)
            .unwrap_or(Self::DateOnly)
    }
}

/// Name of the precision companion for a date alias.
pub fn precision_alias(alias: &str) -> String {
    format!("{alias}{PRECISION_SUFFIX}")
}

/// Returns the date alias a precision companion belongs to.
pub fn date_alias_of(companion: &str) -> Option<&str> {
    companion
        .strip_suffix(PRECISION_SUFFIX)
        .filter(|alias| !alias.is_empty())
}

/// Parses the textual forms dates are stored in: `YYYY`, `YYYY-MM`,
/// `YYYY-MM-DD`, and date-times with a space or `T` separator.
pub fn parse_stored_date(text: &str) -> Option<(NaiveDate, Option<NaiveTime>)> {
    let text = text.trim();

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some((dt.date(), Some(dt.time())));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some((date, None));
    }

    let mut parts = text.splitn(2, '-');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u32 = match parts.next() {
        Some(month) => month.parse().ok()?,
        None => 1,
    };
    NaiveDate::from_ymd_opt(year, month, 1).map(|date| (date, None))
}

/// Renders a stored date for display at the given precision.
///
/// `with_time` adds the time of day for full-precision Datetime fields;
/// `american` selects a 12-hour clock. Values that cannot be parsed are
/// returned unchanged, and NULL renders as the empty string.
pub fn format_date_value(
    value: &Value,
    precision: DatePrecision,
    with_time: bool,
    american: bool,
) -> String {
    let text = value.to_cell_string(", ");
    if text.trim().is_empty() {
        return String::new();
    }
    let Some((date, time)) = parse_stored_date(&text) else {
        return text;
    };

    match precision {
        DatePrecision::YearOnly => date.year().to_string(),
        DatePrecision::MonthOnly => format!("{} {}", date.format("%B"), date.year()),
        DatePrecision::DateOnly | DatePrecision::DateAndTime => {
            let date_text = date.format("%B %-d, %Y").to_string();
            match (precision, with_time, time) {
                (DatePrecision::DateAndTime, true, Some(time)) => {
                    let time_format = if american { "%-I:%M:%S %p" } else { "%-H:%M:%S" };
                    format!("{date_text} {}", time.format(time_format))
                }
                _ => date_text,
            }
        }
    }
}
