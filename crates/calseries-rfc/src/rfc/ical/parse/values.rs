//! Value parsers (RFC 5545 §3.3).

use chrono::{NaiveDate, NaiveDateTime};

use super::error::{ParseError, ParseErrorKind, ParseResult};
use crate::rfc::ical::core::{
    DateTime, DateTimeForm, Duration, Frequency, Period, RRule, RecurUntil, UtcOffset,
};

/// Reads a fixed-width run of ASCII digits.
fn digits(s: &str, range: std::ops::Range<usize>) -> Option<u32> {
    let part = s.get(range)?;
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    part.parse().ok()
}

/// Parses `YYYYMMDD`.
///
/// ## Errors
/// Returns [`ParseErrorKind::InvalidDate`] unless `s` is eight digits naming
/// a real date.
pub fn parse_date(s: &str, line: usize) -> ParseResult<NaiveDate> {
    let err = || ParseError::new(ParseErrorKind::InvalidDate, line, 1).with_context(s.to_string());
    if s.len() != 8 {
        return Err(err());
    }
    let year = digits(s, 0..4).and_then(|y| i32::try_from(y).ok()).ok_or_else(err)?;
    let month = digits(s, 4..6).ok_or_else(err)?;
    let day = digits(s, 6..8).ok_or_else(err)?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(err)
}

fn parse_local(s: &str, line: usize) -> ParseResult<(NaiveDateTime, bool)> {
    let err = || ParseError::new(ParseErrorKind::InvalidDateTime, line, 1).with_context(s.to_string());
    let (date, time) = s.split_once('T').ok_or_else(err)?;
    let date = parse_date(date, line)?;
    let (time, is_utc) = time
        .strip_suffix('Z')
        .map_or((time, false), |t| (t, true));
    if time.len() != 6 {
        return Err(ParseError::new(ParseErrorKind::InvalidTime, line, 10).with_context(s.to_string()));
    }
    let hour = digits(time, 0..2).ok_or_else(err)?;
    let minute = digits(time, 2..4).ok_or_else(err)?;
    // Leap second 60 is clamped; chrono has no representation for it here.
    let second = digits(time, 4..6).ok_or_else(err)?.min(59);
    let local = date.and_hms_opt(hour, minute, second).ok_or_else(|| {
        ParseError::new(ParseErrorKind::InvalidTime, line, 10).with_context(s.to_string())
    })?;
    Ok((local, is_utc))
}

/// Parses `YYYYMMDDTHHMMSS[Z]`. A trailing `Z` wins over `tzid`.
///
/// ## Errors
/// Returns an error if the text is not a valid DATE-TIME.
pub fn parse_datetime(s: &str, tzid: Option<&str>, line: usize) -> ParseResult<DateTime> {
    let (local, is_utc) = parse_local(s, line)?;
    let form = match (is_utc, tzid) {
        (true, _) => DateTimeForm::Utc,
        (false, Some(tzid)) => DateTimeForm::Zoned {
            tzid: tzid.to_string(),
        },
        (false, None) => DateTimeForm::Floating,
    };
    Ok(DateTime::new(local, form))
}

/// Parses `(+|-)HHMM[SS]`.
///
/// ## Errors
/// Returns [`ParseErrorKind::InvalidUtcOffset`] for anything else.
pub fn parse_utc_offset(s: &str, line: usize) -> ParseResult<UtcOffset> {
    let err = || ParseError::new(ParseErrorKind::InvalidUtcOffset, line, 1).with_context(s.to_string());
    let (sign, body) = if let Some(body) = s.strip_prefix('-') {
        (-1, body)
    } else {
        (1, s.strip_prefix('+').ok_or_else(err)?)
    };
    if body.len() != 4 && body.len() != 6 {
        return Err(err());
    }
    let hours = digits(body, 0..2).ok_or_else(err)?;
    let minutes = digits(body, 2..4).ok_or_else(err)?;
    let seconds = if body.len() == 6 { digits(body, 4..6).ok_or_else(err)? } else { 0 };
    let total = i32::try_from(hours * 3600 + minutes * 60 + seconds).map_err(|_e| err())?;
    Ok(UtcOffset::from_seconds(sign * total))
}

/// Parses `[+|-]P(nW | [nD][T[nH][nM][nS]])`.
///
/// ## Errors
/// Returns [`ParseErrorKind::InvalidDuration`] for malformed text.
pub fn parse_duration(s: &str, line: usize) -> ParseResult<Duration> {
    let err = || ParseError::new(ParseErrorKind::InvalidDuration, line, 1).with_context(s.to_string());
    let (negative, body) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let body = body.strip_prefix('P').ok_or_else(err)?;
    if body.is_empty() {
        return Err(err());
    }

    let mut duration = Duration {
        negative,
        ..Duration::zero()
    };
    let mut in_time = false;
    let mut number = String::new();
    for c in body.chars() {
        if c.is_ascii_digit() {
            number.push(c);
            continue;
        }
        if c == 'T' && !in_time && number.is_empty() {
            in_time = true;
            continue;
        }
        let n: u32 = number.parse().map_err(|_e| err())?;
        number.clear();
        match (c, in_time) {
            ('W', false) => duration.weeks = n,
            ('D', false) => duration.days = n,
            ('H', true) => duration.seconds = add_seconds(duration.seconds, n, 3600).ok_or_else(err)?,
            ('M', true) => duration.seconds = add_seconds(duration.seconds, n, 60).ok_or_else(err)?,
            ('S', true) => duration.seconds = add_seconds(duration.seconds, n, 1).ok_or_else(err)?,
            _ => return Err(err()),
        }
    }
    if !number.is_empty() {
        return Err(err());
    }
    Ok(duration)
}

fn add_seconds(total: u32, n: u32, unit: u32) -> Option<u32> {
    n.checked_mul(unit).and_then(|s| total.checked_add(s))
}

/// Parses `start/end` or `start/duration`.
///
/// ## Errors
/// Returns an error if either half is malformed.
pub fn parse_period(s: &str, tzid: Option<&str>, line: usize) -> ParseResult<Period> {
    let (start, tail) = s.split_once('/').ok_or_else(|| {
        ParseError::new(ParseErrorKind::InvalidPeriod, line, 1).with_context(s.to_string())
    })?;
    let start = parse_datetime(start, tzid, line)?;
    if tail.starts_with(['P', '+', '-']) {
        let duration = parse_duration(tail, line)?;
        Ok(Period::Duration { start, duration })
    } else {
        let end = parse_datetime(tail, tzid, line)?;
        Ok(Period::Explicit { start, end })
    }
}

/// Parses a RECUR value such as `FREQ=WEEKLY;BYDAY=MO,WE;UNTIL=20240101T000000Z`.
///
/// ## Errors
/// Returns an error when FREQ is missing or unknown, a bound is malformed,
/// or both COUNT and UNTIL are given.
pub fn parse_rrule(s: &str, line: usize) -> ParseResult<RRule> {
    let invalid = |context: String| {
        ParseError::new(ParseErrorKind::InvalidRRule, line, 1).with_context(context)
    };

    let mut freq = None;
    let mut interval = None;
    let mut count = None;
    let mut until = None;
    let mut parts = Vec::new();

    for part in s.split(';').filter(|p| !p.is_empty()) {
        let (name, value) = part
            .split_once('=')
            .ok_or_else(|| invalid(format!("malformed part '{part}'")))?;
        match name.to_ascii_uppercase().as_str() {
            "FREQ" => {
                freq = Some(Frequency::parse(value).ok_or_else(|| {
                    ParseError::new(ParseErrorKind::InvalidFrequency, line, 1)
                        .with_context(value.to_string())
                })?);
            }
            "INTERVAL" => {
                interval = Some(
                    value
                        .parse::<u32>()
                        .ok()
                        .filter(|n| *n > 0)
                        .ok_or_else(|| invalid(format!("bad INTERVAL '{value}'")))?,
                );
            }
            "COUNT" => {
                count = Some(
                    value
                        .parse::<u32>()
                        .map_err(|_e| invalid(format!("bad COUNT '{value}'")))?,
                );
            }
            "UNTIL" => {
                until = Some(if value.contains('T') {
                    RecurUntil::DateTime(parse_datetime(value, None, line)?)
                } else {
                    RecurUntil::Date(parse_date(value, line)?)
                });
            }
            other => parts.push((other.to_string(), value.to_ascii_uppercase())),
        }
    }

    if count.is_some() && until.is_some() {
        return Err(ParseError::new(ParseErrorKind::UntilCountConflict, line, 1));
    }
    let freq = freq.ok_or_else(|| invalid("missing FREQ".to_string()))?;

    Ok(RRule {
        freq,
        interval,
        count,
        until,
        parts,
    })
}

/// Undoes TEXT escaping (`\\`, `\;`, `\,`, `\n`/`\N`).
#[must_use]
pub fn unescape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => out.push('\n'),
            Some(escaped) => out.push(escaped),
            None => out.push('\\'),
        }
    }
    out
}

pub(super) fn parse_boolean(s: &str, line: usize) -> ParseResult<bool> {
    match s.to_ascii_uppercase().as_str() {
        "TRUE" => Ok(true),
        "FALSE" => Ok(false),
        _ => Err(ParseError::new(ParseErrorKind::InvalidBoolean, line, 1).with_context(s.to_string())),
    }
}

pub(super) fn parse_integer(s: &str, line: usize) -> ParseResult<i32> {
    s.trim().parse().map_err(|_e| {
        ParseError::new(ParseErrorKind::InvalidInteger, line, 1).with_context(s.to_string())
    })
}

pub(super) fn parse_float(s: &str, line: usize) -> ParseResult<f64> {
    s.trim().parse().map_err(|_e| {
        ParseError::new(ParseErrorKind::InvalidFloat, line, 1).with_context(s.to_string())
    })
}
