//! Typed property values (RFC 5545 §3.3).

use std::fmt;

use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::NaiveDate;

use super::{DateTime, Duration, RRule, UtcOffset};

/// PERIOD value (RFC 5545 §3.3.9).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Period {
    Explicit { start: DateTime, end: DateTime },
    Duration { start: DateTime, duration: Duration },
}

impl Period {
    #[must_use]
    pub fn start(&self) -> &DateTime {
        match self {
            Self::Explicit { start, .. } | Self::Duration { start, .. } => start,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit { start, end } => write!(f, "{start}/{end}"),
            Self::Duration { start, duration } => write!(f, "{start}/{duration}"),
        }
    }
}

/// Parsed property value.
///
/// Multi-valued DATE, DATE-TIME, and PERIOD properties (RDATE, EXDATE,
/// FREEBUSY) use the list variants. Text that could not be typed is kept
/// as [`Value::Unknown`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Binary(Vec<u8>),
    Boolean(bool),
    CalAddress(String),
    Date(NaiveDate),
    DateList(Vec<NaiveDate>),
    DateTime(DateTime),
    DateTimeList(Vec<DateTime>),
    Duration(Duration),
    Float(f64),
    Integer(i32),
    Period(Period),
    PeriodList(Vec<Period>),
    Recur(Box<RRule>),
    Text(String),
    Uri(String),
    UtcOffset(UtcOffset),
    Unknown(String),
}

impl Value {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_integer(&self) -> Option<i32> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_duration(&self) -> Option<&Duration> {
        match self {
            Self::Duration(d) => Some(d),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_recur(&self) -> Option<&RRule> {
        match self {
            Self::Recur(r) => Some(r),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_utc_offset(&self) -> Option<UtcOffset> {
        match self {
            Self::UtcOffset(o) => Some(*o),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ",")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binary(bytes) => write!(f, "{}", STANDARD.encode(bytes)),
            Self::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            Self::CalAddress(s) | Self::Uri(s) | Self::Unknown(s) => write!(f, "{s}"),
            Self::Date(d) => write!(f, "{}", d.format("%Y%m%d")),
            Self::DateList(dates) => {
                let formatted: Vec<_> = dates.iter().map(|d| d.format("%Y%m%d")).collect();
                write_list(f, &formatted)
            }
            Self::DateTime(dt) => write!(f, "{dt}"),
            Self::DateTimeList(dts) => write_list(f, dts),
            Self::Duration(d) => write!(f, "{d}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Period(p) => write!(f, "{p}"),
            Self::PeriodList(ps) => write_list(f, ps),
            Self::Recur(r) => write!(f, "{r}"),
            Self::Text(s) => write!(f, "{}", escape_text(s)),
            Self::UtcOffset(o) => write!(f, "{o}"),
        }
    }
}
