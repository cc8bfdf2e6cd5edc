use thiserror::Error;

use crate::rfc::ical::expand::{ExpansionError, TimezoneError};
use crate::rfc::ical::parse::ParseError;

#[derive(Error, Debug)]
pub enum RfcError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Timezone error: {0}")]
    Timezone(#[from] TimezoneError),

    #[error("Expansion error: {0}")]
    Expansion(#[from] ExpansionError),

    #[error("Recurrence rule error: {0}")]
    RRule(#[from] rrule::RRuleError),

    #[error(transparent)]
    Core(#[from] calseries_core::error::CoreError),
}

pub type RfcResult<T> = std::result::Result<T, RfcError>;
