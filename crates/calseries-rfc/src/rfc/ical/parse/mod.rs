//! iCalendar text parsing (RFC 5545 §3.1).
//!
//! Structural problems (bad content lines, unbalanced BEGIN/END) fail the
//! parse. Values that cannot be typed are kept as raw text so callers can
//! decide what to drop.

mod error;
mod lexer;
mod parser;
mod values;

pub use error::{ParseError, ParseErrorKind, ParseResult};
pub use lexer::{ContentLine, parse_content_line, split_lines};
pub use parser::{parse, parse_component_text};
pub use values::{
    parse_date, parse_datetime, parse_duration, parse_period, parse_rrule, parse_utc_offset,
    unescape_text,
};
