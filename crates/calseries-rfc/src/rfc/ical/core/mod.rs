//! iCalendar document model (RFC 5545).
//!
//! Components keep their properties in document order and every property
//! keeps its raw text next to the typed value, so unknown content survives
//! a parse untouched.

mod component;
mod datetime;
mod duration;
mod parameter;
mod property;
mod recur;
mod time;
mod value;

pub use component::{Component, ComponentKind, ICalendar};
pub use datetime::{DateTime, DateTimeForm, UtcOffset};
pub use duration::Duration;
pub use parameter::Parameter;
pub use property::{Property, names};
pub use recur::{Frequency, RRule, RecurUntil};
pub use time::TimeValue;
pub use value::{Period, Value};
