//! Document parser: content lines to a component tree with typed values.

use std::collections::HashMap;
use std::sync::LazyLock;

use base64::{Engine, engine::general_purpose::STANDARD};

use super::error::{ParseError, ParseErrorKind, ParseResult};
use super::lexer::{ContentLine, parse_content_line, split_lines};
use super::values::{
    parse_boolean, parse_date, parse_datetime, parse_duration, parse_float, parse_integer,
    parse_period, parse_rrule, parse_utc_offset, unescape_text,
};
use crate::rfc::ical::core::{Component, ComponentKind, ICalendar, Property, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueType {
    Binary,
    Boolean,
    CalAddress,
    Date,
    DateTime,
    Duration,
    Float,
    Integer,
    Period,
    Recur,
    Text,
    Uri,
    UtcOffset,
    Unknown,
}

impl ValueType {
    fn from_param(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "BINARY" => Self::Binary,
            "BOOLEAN" => Self::Boolean,
            "CAL-ADDRESS" => Self::CalAddress,
            "DATE" => Self::Date,
            "DATE-TIME" => Self::DateTime,
            "DURATION" => Self::Duration,
            "FLOAT" => Self::Float,
            "INTEGER" => Self::Integer,
            "PERIOD" => Self::Period,
            "RECUR" => Self::Recur,
            "TEXT" => Self::Text,
            "URI" => Self::Uri,
            "UTC-OFFSET" => Self::UtcOffset,
            _ => Self::Unknown,
        }
    }
}

/// Default value type per property name (RFC 5545 §3.8). Names not listed
/// default to TEXT.
static DEFAULT_VALUE_TYPES: LazyLock<HashMap<&'static str, ValueType>> = LazyLock::new(|| {
    use ValueType as T;
    HashMap::from([
        ("DTSTART", T::DateTime),
        ("DTEND", T::DateTime),
        ("DUE", T::DateTime),
        ("DTSTAMP", T::DateTime),
        ("CREATED", T::DateTime),
        ("LAST-MODIFIED", T::DateTime),
        ("COMPLETED", T::DateTime),
        ("RECURRENCE-ID", T::DateTime),
        ("RDATE", T::DateTime),
        ("EXDATE", T::DateTime),
        ("DURATION", T::Duration),
        ("TRIGGER", T::Duration),
        ("FREEBUSY", T::Period),
        ("RRULE", T::Recur),
        ("EXRULE", T::Recur),
        ("TZOFFSETFROM", T::UtcOffset),
        ("TZOFFSETTO", T::UtcOffset),
        ("PERCENT-COMPLETE", T::Integer),
        ("PRIORITY", T::Integer),
        ("REPEAT", T::Integer),
        ("SEQUENCE", T::Integer),
        ("ATTENDEE", T::CalAddress),
        ("ORGANIZER", T::CalAddress),
        ("URL", T::Uri),
        ("TZURL", T::Uri),
        ("SOURCE", T::Uri),
        ("ATTACH", T::Uri),
    ])
});

fn value_type_of(cl: &ContentLine) -> ValueType {
    if let Some(explicit) = cl.param_value("VALUE") {
        return ValueType::from_param(explicit);
    }
    let default = DEFAULT_VALUE_TYPES
        .get(cl.name.as_str())
        .copied()
        .unwrap_or(ValueType::Text);
    // Lenient typing for producers that omit VALUE=DATE / DATE-TIME.
    match default {
        ValueType::DateTime if !cl.value.contains('T') && cl.value.len() >= 8 => ValueType::Date,
        ValueType::Duration if !cl.value.starts_with(['P', '+', '-']) => ValueType::DateTime,
        other => other,
    }
}

/// Parses a comma-separated list, producing the single variant for one item.
fn parse_list<T>(
    raw: &str,
    mut item: impl FnMut(&str) -> ParseResult<T>,
    single: fn(T) -> Value,
    list: fn(Vec<T>) -> Value,
) -> ParseResult<Value> {
    let mut items: Vec<T> = raw
        .split(',')
        .map(|s| item(s.trim()))
        .collect::<ParseResult<_>>()?;
    if items.len() == 1
        && let Some(only) = items.pop()
    {
        return Ok(single(only));
    }
    Ok(list(items))
}

fn parse_value(raw: &str, value_type: ValueType, tzid: Option<&str>, line: usize) -> ParseResult<Value> {
    Ok(match value_type {
        ValueType::Text => Value::Text(unescape_text(raw)),
        ValueType::Date => parse_list(raw, |s| parse_date(s, line), Value::Date, Value::DateList)?,
        ValueType::DateTime => parse_list(
            raw,
            |s| parse_datetime(s, tzid, line),
            Value::DateTime,
            Value::DateTimeList,
        )?,
        ValueType::Period => parse_list(
            raw,
            |s| parse_period(s, tzid, line),
            Value::Period,
            Value::PeriodList,
        )?,
        ValueType::Duration => Value::Duration(parse_duration(raw, line)?),
        ValueType::Recur => Value::Recur(Box::new(parse_rrule(raw, line)?)),
        ValueType::UtcOffset => Value::UtcOffset(parse_utc_offset(raw, line)?),
        ValueType::Integer => Value::Integer(parse_integer(raw, line)?),
        ValueType::Float => Value::Float(parse_float(raw, line)?),
        ValueType::Boolean => Value::Boolean(parse_boolean(raw, line)?),
        ValueType::CalAddress => Value::CalAddress(raw.to_string()),
        ValueType::Uri => Value::Uri(raw.to_string()),
        ValueType::Binary => Value::Binary(STANDARD.decode(raw).map_err(|e| {
            ParseError::new(ParseErrorKind::InvalidValue, line, 1)
                .with_context(format!("invalid base64: {e}"))
        })?),
        ValueType::Unknown => Value::Unknown(raw.to_string()),
    })
}

/// Types a content line. A value that fails to parse is kept as
/// [`Value::Unknown`] so the rest of the document survives.
fn parse_property(cl: ContentLine, line: usize) -> Property {
    let value_type = value_type_of(&cl);
    let value = match parse_value(&cl.value, value_type, cl.param_value("TZID"), line) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(property = %cl.name, %err, "Keeping unparseable value as raw text");
            Value::Unknown(cl.value.clone())
        }
    };
    Property {
        name: cl.name,
        params: cl.params,
        value,
        raw_value: cl.value,
    }
}

type Lines = std::vec::IntoIter<(usize, ContentLine)>;

fn tokenize(input: &str) -> ParseResult<Lines> {
    let lines = split_lines(input);
    tracing::trace!(count = lines.len(), "Split lines");
    let content_lines = lines
        .into_iter()
        .map(|(n, line)| parse_content_line(&line, n).map(|cl| (n, cl)))
        .collect::<ParseResult<Vec<_>>>()?;
    Ok(content_lines.into_iter())
}

/// Reads the BEGIN line that must come next.
fn expect_begin(lines: &mut Lines) -> ParseResult<(usize, String)> {
    match lines.next() {
        Some((n, cl)) if cl.name == "BEGIN" => Ok((n, cl.value.to_ascii_uppercase())),
        Some((n, cl)) => Err(ParseError::new(ParseErrorKind::MissingBegin, n, 1)
            .with_context(format!("found {}", cl.name))),
        None => Err(ParseError::new(ParseErrorKind::MissingBegin, 1, 1).with_context("empty input")),
    }
}

/// Reads properties and children up to the END matching `name`.
fn read_component(lines: &mut Lines, name: &str, begin_line: usize) -> ParseResult<Component> {
    let mut component = Component::named(name);
    let mut last_line = begin_line;

    while let Some((n, cl)) = lines.next() {
        last_line = n;
        match cl.name.as_str() {
            "BEGIN" => {
                let child_name = cl.value.to_ascii_uppercase();
                let child = read_component(lines, &child_name, n)?;
                component.add_child(child);
            }
            "END" => {
                let end_name = cl.value.to_ascii_uppercase();
                if end_name != name {
                    return Err(ParseError::new(ParseErrorKind::MismatchedComponent, n, 1)
                        .with_context(format!("expected END:{name}, got END:{end_name}")));
                }
                return Ok(component);
            }
            _ => component.add_property(parse_property(cl, n)),
        }
    }

    Err(ParseError::new(ParseErrorKind::MissingEnd, last_line, 1)
        .with_context(format!("missing END:{name}")))
}

/// Parses a complete VCALENDAR document.
///
/// ## Errors
/// Returns an error for malformed content lines, unbalanced BEGIN/END, or a
/// root component other than VCALENDAR.
#[tracing::instrument(skip(input), fields(input_len = input.len()))]
pub fn parse(input: &str) -> ParseResult<ICalendar> {
    let root = parse_component_text(input)?;
    if root.kind != ComponentKind::Calendar {
        return Err(ParseError::new(ParseErrorKind::MissingBegin, 1, 1)
            .with_context(format!("expected VCALENDAR, got {}", root.name)));
    }
    tracing::debug!(children = root.children.len(), "Parsed iCalendar document");
    Ok(ICalendar { root })
}

/// Parses a single component of any kind, e.g. a standalone VTIMEZONE.
///
/// ## Errors
/// Returns an error for malformed content lines or unbalanced BEGIN/END.
pub fn parse_component_text(input: &str) -> ParseResult<Component> {
    let mut lines = tokenize(input)?;
    let (begin_line, name) = expect_begin(&mut lines)?;
    let component = read_component(&mut lines, &name, begin_line)?;
    if let Some((n, cl)) = lines.next() {
        tracing::warn!(line = n, name = %cl.name, "Ignoring content after the root component");
    }
    Ok(component)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfc::ical::core::{Frequency, TimeValue};

    const EVENT: &str = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Test//Test//EN\r\n\
BEGIN:VEVENT\r\n\
UID:standup@example.com\r\n\
DTSTAMP:20260123T120000Z\r\n\
DTSTART;TZID=Europe/Berlin:20260126T090000\r\n\
DURATION:PT15M\r\n\
RRULE:FREQ=WEEKLY;BYDAY=MO,WE,FR\r\n\
EXDATE;TZID=Europe/Berlin:20260128T090000,20260130T090000\r\n\
RDATE;VALUE=DATE:20260201\r\n\
SUMMARY:Daily\\, standup\r\n\
BEGIN:VALARM\r\n\
ACTION:DISPLAY\r\n\
TRIGGER:-PT5M\r\n\
END:VALARM\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

    #[test_log::test]
    fn parses_event_with_recurrence_properties() {
        let cal = parse(EVENT).unwrap();
        assert_eq!(cal.version(), Some("2.0"));

        let event = cal.series_members().next().unwrap();
        assert_eq!(event.uid(), Some("standup@example.com"));
        assert_eq!(event.summary(), Some("Daily, standup"));
        assert_eq!(event.start().unwrap().tzid(), Some("Europe/Berlin"));
        assert_eq!(event.duration().unwrap().seconds, 900);

        let rrule = event.get_property("RRULE").unwrap().value.as_recur().unwrap();
        assert_eq!(rrule.freq, Frequency::Weekly);

        let exdates = TimeValue::values_of(event.get_property("EXDATE").unwrap());
        assert_eq!(exdates.len(), 2);
        assert!(exdates.iter().all(|d| d.tzid() == Some("Europe/Berlin")));

        let rdate = event.get_property("RDATE").unwrap();
        assert!(matches!(rdate.value, Value::Date(_)));

        assert_eq!(event.children_of_kind(ComponentKind::Alarm).len(), 1);
    }

    #[test_log::test]
    fn bad_values_are_kept_raw() {
        let input = "BEGIN:VCALENDAR\nBEGIN:VEVENT\nUID:x\nRECURRENCE-ID:not-a-date\nEND:VEVENT\nEND:VCALENDAR\n";
        let cal = parse(input).unwrap();
        let event = cal.series_members().next().unwrap();
        let rid = event.get_property("RECURRENCE-ID").unwrap();
        assert_eq!(rid.value, Value::Unknown("not-a-date".to_string()));
        assert!(event.recurrence_id().is_none());
    }

    #[test]
    fn lenient_date_typing() {
        let input = "BEGIN:VCALENDAR\nBEGIN:VEVENT\nUID:x\nDTSTART:20190818\nEXDATE:20190825,20190901\nEND:VEVENT\nEND:VCALENDAR\n";
        let cal = parse(input).unwrap();
        let event = cal.series_members().next().unwrap();
        assert!(event.start().unwrap().is_date());
        assert!(matches!(event.get_property("EXDATE").unwrap().value, Value::DateList(ref d) if d.len() == 2));
    }

    #[test]
    fn structural_errors_are_fatal() {
        let err = parse("BEGIN:VCALENDAR\nBEGIN:VEVENT\nEND:VTODO\nEND:VCALENDAR\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MismatchedComponent);
        assert_eq!(err.line, 3);

        let err = parse("BEGIN:VCALENDAR\nBEGIN:VEVENT\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingEnd);

        let err = parse("").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingBegin);

        let err = parse("BEGIN:VEVENT\nEND:VEVENT\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingBegin);
    }

    #[test]
    fn standalone_component() {
        let tz = parse_component_text(
            "BEGIN:VTIMEZONE\nTZID:Custom/Zone\nBEGIN:STANDARD\nDTSTART:19700101T000000\nTZOFFSETFROM:+0100\nTZOFFSETTO:+0100\nEND:STANDARD\nEND:VTIMEZONE\n",
        )
        .unwrap();
        assert_eq!(tz.kind, ComponentKind::Timezone);
        assert_eq!(tz.children_of_kind(ComponentKind::Standard).len(), 1);
    }
}
