//! Start/end/recurrence instants as the recurrence machinery sees them.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

use super::{DateTime, DateTimeForm, Parameter, Property, Value, names};

/// A DATE or DATE-TIME value taken from DTSTART, RECURRENCE-ID, RDATE,
/// EXDATE and friends.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TimeValue {
    Date(NaiveDate),
    DateTime(DateTime),
}

impl TimeValue {
    /// Extracts a single value. A PERIOD contributes its start.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Date(d) => Some(Self::Date(*d)),
            Value::DateTime(dt) => Some(Self::DateTime(dt.clone())),
            Value::Period(p) => Some(Self::DateTime(p.start().clone())),
            Value::DateList(list) => list.first().map(|d| Self::Date(*d)),
            Value::DateTimeList(list) => list.first().cloned().map(Self::DateTime),
            Value::PeriodList(list) => list.first().map(|p| Self::DateTime(p.start().clone())),
            _ => None,
        }
    }

    /// Extracts every value of a possibly multi-valued property.
    #[must_use]
    pub fn values_of(prop: &Property) -> Vec<Self> {
        match &prop.value {
            Value::DateList(list) => list.iter().copied().map(Self::Date).collect(),
            Value::DateTimeList(list) => list.iter().cloned().map(Self::DateTime).collect(),
            Value::PeriodList(list) => list
                .iter()
                .map(|p| Self::DateTime(p.start().clone()))
                .collect(),
            other => Self::from_value(other).into_iter().collect(),
        }
    }

    #[must_use]
    pub const fn is_date(&self) -> bool {
        matches!(self, Self::Date(_))
    }

    /// TZID of a zoned DATE-TIME.
    #[must_use]
    pub fn tzid(&self) -> Option<&str> {
        match self {
            Self::Date(_) => None,
            Self::DateTime(dt) => dt.tzid(),
        }
    }

    /// Wall-clock reading; dates read as midnight.
    #[must_use]
    pub fn naive(&self) -> NaiveDateTime {
        match self {
            Self::Date(d) => d.and_time(NaiveTime::MIN),
            Self::DateTime(dt) => dt.local,
        }
    }

    /// Same kind and zone, different wall-clock reading.
    #[must_use]
    pub fn with_naive(&self, local: NaiveDateTime) -> Self {
        match self {
            Self::Date(_) => Self::Date(local.date()),
            Self::DateTime(dt) => Self::DateTime(DateTime::new(local, dt.form.clone())),
        }
    }

    /// Moves the wall-clock reading by `delta`. A shift past the
    /// representable range leaves the value unchanged.
    #[must_use]
    pub fn add_delta(&self, delta: TimeDelta) -> Self {
        match self.naive().checked_add_signed(delta) {
            Some(local) => self.with_naive(local),
            None => {
                tracing::warn!(value = %self, seconds = delta.num_seconds(), "Time shift out of range, keeping value");
                self.clone()
            }
        }
    }

    /// Renders as a property, adding `VALUE=DATE` or `TZID` as needed.
    #[must_use]
    pub fn to_property(&self, name: &str) -> Property {
        match self {
            Self::Date(d) => {
                Property::new(name, Value::Date(*d)).with_param(Parameter::value_type("DATE"))
            }
            Self::DateTime(dt) => {
                let prop = Property::new(name, Value::DateTime(dt.clone()));
                match &dt.form {
                    DateTimeForm::Zoned { tzid } => prop.with_param(Parameter::tzid(tzid.clone())),
                    DateTimeForm::Floating | DateTimeForm::Utc => prop,
                }
            }
        }
    }

    /// Property rendering that keeps the non-value parameters of `template`
    /// (e.g. `RANGE` on a RECURRENCE-ID).
    #[must_use]
    pub fn to_property_like(&self, template: &Property) -> Property {
        let mut prop = self.to_property(&template.name);
        for param in &template.params {
            if param.name != names::TZID && param.name != names::VALUE {
                prop.set_param(param.clone());
            }
        }
        prop
    }
}

impl fmt::Display for TimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(d) => write!(f, "{}", d.format("%Y%m%d")),
            Self::DateTime(dt) => write!(f, "{dt}"),
        }
    }
}
