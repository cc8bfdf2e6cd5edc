//! Line unfolding and content-line tokenizing (RFC 5545 §3.1, RFC 6868).

use super::error::{ParseError, ParseErrorKind, ParseResult};
use crate::rfc::ical::core::Parameter;

/// One unfolded `name *(";" param) ":" value` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentLine {
    /// Upper-cased property name.
    pub name: String,
    pub params: Vec<Parameter>,
    /// Value text after the first unquoted colon, still escaped.
    pub value: String,
}

impl ContentLine {
    #[must_use]
    pub fn param_value(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))?
            .value()
    }
}

/// Splits text into unfolded logical lines tagged with their first physical
/// line number.
///
/// Accepts CRLF and bare LF. A line starting with SPACE or HTAB continues the
/// previous one with that single character removed. A line without any
/// colon is also treated as a continuation, which recovers text broken by
/// producers that forget to fold.
#[must_use]
pub fn split_lines(input: &str) -> Vec<(usize, String)> {
    let mut lines: Vec<(usize, String)> = Vec::new();

    for (idx, physical) in input.split('\n').enumerate() {
        let physical = physical.strip_suffix('\r').unwrap_or(physical);
        if physical.is_empty() {
            continue;
        }

        let continuation = physical
            .strip_prefix([' ', '\t'])
            .or_else(|| (!physical.contains(':')).then_some(physical));

        match (continuation, lines.last_mut()) {
            (Some(rest), Some((_, prev))) => prev.push_str(rest),
            (Some(rest), None) => lines.push((idx + 1, rest.to_string())),
            (None, _) => lines.push((idx + 1, physical.to_string())),
        }
    }

    lines
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-'
}

/// Tokenizes one unfolded content line.
///
/// ## Errors
/// Returns an error for an empty or malformed name, a malformed parameter,
/// an unclosed quote, or a missing value separator.
pub fn parse_content_line(line: &str, line_num: usize) -> ParseResult<ContentLine> {
    let column = |rest: &str| line.len() - rest.len() + 1;

    let name_end = line
        .find([';', ':'])
        .ok_or_else(|| ParseError::new(ParseErrorKind::MissingColon, line_num, line.len()))?;
    let name = &line[..name_end];
    if name.is_empty() {
        return Err(ParseError::new(ParseErrorKind::MissingPropertyName, line_num, 1));
    }
    if let Some(pos) = name.find(|c| !is_name_char(c)) {
        return Err(ParseError::new(ParseErrorKind::InvalidPropertyName, line_num, pos + 1));
    }

    let mut params = Vec::new();
    let mut rest = &line[name_end..];
    while let Some(param_text) = rest.strip_prefix(';') {
        let (param, remaining) = parse_parameter(param_text, line_num, column(param_text))?;
        params.push(param);
        rest = remaining;
    }

    let value = rest
        .strip_prefix(':')
        .ok_or_else(|| ParseError::new(ParseErrorKind::MissingColon, line_num, column(rest)))?;

    Ok(ContentLine {
        name: name.to_ascii_uppercase(),
        params,
        value: value.to_string(),
    })
}

/// Parses `name=value *("," value)` and returns the text after it, which
/// starts at the next `;` or `:`.
fn parse_parameter(input: &str, line_num: usize, col: usize) -> ParseResult<(Parameter, &str)> {
    let invalid = |offset: usize| ParseError::new(ParseErrorKind::InvalidParameter, line_num, col + offset);

    let eq = input.find('=').ok_or_else(|| invalid(0))?;
    let name = &input[..eq];
    if name.is_empty() || !name.chars().all(is_name_char) {
        return Err(invalid(0));
    }

    let mut values = Vec::new();
    let mut rest = &input[eq + 1..];
    loop {
        let offset = input.len() - rest.len();
        let (value, remaining) = if let Some(quoted) = rest.strip_prefix('"') {
            let close = quoted.find('"').ok_or_else(|| {
                ParseError::new(ParseErrorKind::UnclosedQuote, line_num, col + offset)
            })?;
            (decode_caret(&quoted[..close]), &quoted[close + 1..])
        } else {
            let end = rest.find([',', ';', ':']).unwrap_or(rest.len());
            (decode_caret(&rest[..end]), &rest[end..])
        };
        values.push(value);

        match remaining.chars().next() {
            Some(',') => rest = &remaining[1..],
            Some(';' | ':') => return Ok((Parameter::with_values(name, values), remaining)),
            Some(c) => {
                return Err(invalid(input.len() - remaining.len())
                    .with_context(format!("unexpected character '{c}'")));
            }
            None => {
                return Err(ParseError::new(
                    ParseErrorKind::MissingColon,
                    line_num,
                    col + input.len(),
                ));
            }
        }
    }
}

/// RFC 6868 caret decoding; unknown sequences are kept as written.
fn decode_caret(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '^' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('^') => out.push('^'),
            Some('n') => out.push('\n'),
            Some('\'') => out.push('"'),
            _ => {
                out.push('^');
                continue;
            }
        }
        chars.next();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_lines_unfolds_and_numbers() {
        let input = "BEGIN:VEVENT\r\nDESCRIPTION:long\r\n  text\r\n\tmore\nEND:VEVENT\r\n";
        let lines = split_lines(input);
        assert_eq!(
            lines,
            vec![
                (1, "BEGIN:VEVENT".to_string()),
                (2, "DESCRIPTION:long textmore".to_string()),
                (5, "END:VEVENT".to_string()),
            ]
        );
    }

    #[test]
    fn split_lines_recovers_unfolded_breaks() {
        let lines = split_lines("SUMMARY:broken\nacross lines\nUID:1\n");
        assert_eq!(lines[0].1, "SUMMARY:brokenacross lines");
        assert_eq!(lines[1], (3, "UID:1".to_string()));
    }

    #[test]
    fn parses_params() {
        let cl = parse_content_line("dtstart;TZID=America/New_York:20260123T120000", 1).unwrap();
        assert_eq!(cl.name, "DTSTART");
        assert_eq!(cl.param_value("tzid"), Some("America/New_York"));
        assert_eq!(cl.value, "20260123T120000");
    }

    #[test]
    fn parses_quoted_and_multi_valued_params() {
        let cl = parse_content_line(
            "ATTENDEE;CN=\"Doe, Jane: ^'J^'\";ROLE=CHAIR,REQ-PARTICIPANT:mailto:jane@example.com",
            1,
        )
        .unwrap();
        assert_eq!(cl.param_value("CN"), Some("Doe, Jane: \"J\""));
        assert_eq!(cl.params[1].values, vec!["CHAIR", "REQ-PARTICIPANT"]);
        assert_eq!(cl.value, "mailto:jane@example.com");
    }

    #[test]
    fn value_may_contain_colons() {
        let cl = parse_content_line("URL:https://example.com:8443/x", 1).unwrap();
        assert_eq!(cl.value, "https://example.com:8443/x");
    }

    #[test]
    fn reports_malformed_lines() {
        let err = parse_content_line("ATTENDEE;CN=\"open:mailto:x", 4).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnclosedQuote);
        assert_eq!(err.line, 4);

        let err = parse_content_line("NOCOLON", 1).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingColon);

        let err = parse_content_line(":value", 1).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingPropertyName);

        let err = parse_content_line("BAD NAME:value", 1).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidPropertyName);
    }
}
