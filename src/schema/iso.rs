//! ISO date/time text parsers used as the default decoders
//!
//! Patterns are matched at the start of the text:
//! - date: `YYYY-MM-DD`
//! - time: `HH:MM:SS`
//! - datetime: date and time joined by `T` or a space

use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;

use super::errors::ConversionError;
use super::value::Value;

const DATE_PATTERN: &str = r"([0-9]{4})-([0-9]{2})-([0-9]{2})";
const TIME_PATTERN: &str = r"([0-9]{2}):([0-9]{2}):([0-9]{2})";

/// Calendar kinds the parser understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarKind {
    Date,
    Time,
    DateTime,
}

impl CalendarKind {
    fn regex(self) -> &'static Regex {
        static DATE: OnceLock<Regex> = OnceLock::new();
        static TIME: OnceLock<Regex> = OnceLock::new();
        static DATE_TIME: OnceLock<Regex> = OnceLock::new();

        let (cell, pattern) = match self {
            CalendarKind::Date => (&DATE, format!("^{}", DATE_PATTERN)),
            CalendarKind::Time => (&TIME, format!("^{}", TIME_PATTERN)),
            CalendarKind::DateTime => (
                &DATE_TIME,
                format!("^{}[T ]{}", DATE_PATTERN, TIME_PATTERN),
            ),
        };
        cell.get_or_init(|| Regex::new(&pattern).expect("static calendar pattern"))
    }
}

/// Parses `text` as the given calendar kind.
pub fn parse(kind: CalendarKind, text: &str) -> Result<Value, ConversionError> {
    let invalid = || ConversionError::InvalidIsoFormat(text.to_string());

    let caps = kind.regex().captures(text).ok_or_else(invalid)?;
    let mut numbers = Vec::with_capacity(6);
    for group in caps.iter().skip(1) {
        let digits = group.map(|m| m.as_str()).ok_or_else(invalid)?;
        numbers.push(digits.parse::<u32>().map_err(|_| invalid())?);
    }

    let date = |n: &[u32]| NaiveDate::from_ymd_opt(n[0] as i32, n[1], n[2]);
    let time = |n: &[u32]| NaiveTime::from_hms_opt(n[0], n[1], n[2]);

    let value = match kind {
        CalendarKind::Date => date(&numbers[..]).map(Value::Date),
        CalendarKind::Time => time(&numbers[..]).map(Value::Time),
        CalendarKind::DateTime => date(&numbers[..3])
            .zip(time(&numbers[3..]))
            .map(|(d, t)| Value::DateTime(NaiveDateTime::new(d, t))),
    };
    value.ok_or_else(invalid)
}

/// Returns a decoder function for `kind` that accepts text values only.
pub fn parser(kind: CalendarKind) -> impl Fn(&Value) -> Result<Value, ConversionError> {
    move |raw: &Value| match raw {
        Value::Str(text) => parse(kind, text),
        other => Err(ConversionError::NotText(other.type_name())),
    }
}
