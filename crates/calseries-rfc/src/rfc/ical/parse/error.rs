use std::fmt;

use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

/// A parse failure with its 1-based position.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub line: usize,
    pub column: usize,
    pub context: Option<String>,
}

impl ParseError {
    #[must_use]
    pub const fn new(kind: ParseErrorKind, line: usize, column: usize) -> Self {
        Self {
            kind,
            line,
            column,
            context: None,
        }
    }

    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at line {}, column {}", self.kind, self.line, self.column)?;
        if let Some(context) = &self.context {
            write!(f, ": {context}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("missing property name")]
    MissingPropertyName,
    #[error("invalid property name")]
    InvalidPropertyName,
    #[error("missing colon separator")]
    MissingColon,
    #[error("invalid parameter")]
    InvalidParameter,
    #[error("unclosed quoted string")]
    UnclosedQuote,
    #[error("invalid date")]
    InvalidDate,
    #[error("invalid time")]
    InvalidTime,
    #[error("invalid date-time")]
    InvalidDateTime,
    #[error("invalid duration")]
    InvalidDuration,
    #[error("invalid period")]
    InvalidPeriod,
    #[error("invalid recurrence rule")]
    InvalidRRule,
    #[error("invalid recurrence frequency")]
    InvalidFrequency,
    #[error("UNTIL and COUNT are mutually exclusive")]
    UntilCountConflict,
    #[error("invalid UTC offset")]
    InvalidUtcOffset,
    #[error("invalid integer")]
    InvalidInteger,
    #[error("invalid float")]
    InvalidFloat,
    #[error("invalid boolean")]
    InvalidBoolean,
    #[error("invalid value")]
    InvalidValue,
    #[error("missing BEGIN")]
    MissingBegin,
    #[error("missing END")]
    MissingEnd,
    #[error("mismatched BEGIN/END")]
    MismatchedComponent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_position_and_context() {
        let err = ParseError::new(ParseErrorKind::MismatchedComponent, 7, 1)
            .with_context("expected END:VEVENT, got END:VTODO");
        assert_eq!(
            err.to_string(),
            "mismatched BEGIN/END at line 7, column 1: expected END:VEVENT, got END:VTODO"
        );
    }
}
