use super::vtimezone::VTimezoneError;

/// Failures raised by the timezone registry.
#[derive(Debug, thiserror::Error)]
pub enum TimezoneError {
    #[error("Unknown timezone: {0}")]
    NotFound(String),

    #[error("Alias cycle detected while resolving {0}")]
    AliasCycle(String),

    #[error("Alias chain for {tzid} exceeds {limit} hops")]
    AliasDepthExceeded { tzid: String, limit: usize },

    #[error("Invalid timezone definition: {0}")]
    InvalidDefinition(#[from] VTimezoneError),

    #[error("Timezone database error: {0}")]
    Database(String),
}

/// Failures raised while expanding or editing a series.
#[derive(Debug, thiserror::Error)]
pub enum ExpansionError {
    #[error("Recurring series {uid} has no DTSTART")]
    MissingStart { uid: String },

    #[error("Series {uid} is locked and cannot be modified")]
    ModificationNotAllowed { uid: String },

    #[error("Component in series {uid} has no usable RECURRENCE-ID")]
    InvalidRecurrenceId { uid: String },
}

pub type ExpansionResult<T> = std::result::Result<T, ExpansionError>;
