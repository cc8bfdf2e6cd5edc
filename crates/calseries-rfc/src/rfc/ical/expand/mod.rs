//! Series assembly and recurrence expansion.
//!
//! - [`TimezoneRegistry`] resolves TZIDs, aliases and VTIMEZONE definitions.
//! - [`ComponentAssembler`] groups a document's objects by UID, forging
//!   masters for orphan exceptions.
//! - [`RecurrenceEngine`] merges a series' rules and dates into a timeline
//!   and materializes [`Occurrence`]s from it.

mod assembler;
mod cursor;
mod database;
mod engine;
mod error;
mod lock;
mod observer;
mod occurrence;
mod timezone;
mod vtimezone;

pub use assembler::{AssembledCalendar, ComponentAssembler};
pub use cursor::Occurrences;
pub use engine::{ExpansionOptions, MasterOrigin, RecurrenceEngine, RecurrenceException};
pub use error::{ExpansionError, ExpansionResult, TimezoneError};
pub use lock::Lockable;
pub use observer::{Observable, Observer, Observers, SeriesChange, SubscriptionId};
pub use occurrence::{Occurrence, OccurrenceSource};
pub use timezone::{TimezoneEntry, TimezoneRegistry, ZoneDefinition, normalize_tzid};
pub use vtimezone::{Observance, VTimezone, VTimezoneError};
