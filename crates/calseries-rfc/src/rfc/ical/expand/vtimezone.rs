//! VTIMEZONE definitions (RFC 5545 §3.6.5) and offset lookup.

use chrono::{NaiveDateTime, TimeDelta};
use rrule::RRuleSet;

use crate::rfc::ical::core::{Component, ComponentKind, RecurUntil, TimeValue, UtcOffset, names};

#[derive(Debug, thiserror::Error)]
pub enum VTimezoneError {
    #[error("Component is a {0}, not a VTIMEZONE")]
    NotATimezone(ComponentKind),

    #[error("Missing required TZID property")]
    MissingTzid,

    #[error("VTIMEZONE {0} has no STANDARD or DAYLIGHT component")]
    NoObservances(String),

    #[error("Missing required property {0} in {1} component")]
    MissingProperty(&'static str, ComponentKind),

    #[error("Invalid {0} value: {1}")]
    InvalidValue(&'static str, String),
}

/// One STANDARD or DAYLIGHT block.
#[derive(Debug, Clone)]
pub struct Observance {
    pub kind: ComponentKind,
    pub offset_from: UtcOffset,
    pub offset_to: UtcOffset,
    /// First onset, as a wall-clock reading in `offset_from`.
    pub start: NaiveDateTime,
    pub rdates: Vec<NaiveDateTime>,
    pub name: Option<String>,
    rule: Option<RRuleSet>,
}

fn seconds(offset: UtcOffset) -> TimeDelta {
    TimeDelta::seconds(i64::from(offset.as_seconds()))
}

impl Observance {
    fn parse(component: &Component) -> Result<Self, VTimezoneError> {
        let kind = component.kind;
        let offset = |name: &'static str| {
            let prop = component
                .get_property(name)
                .ok_or(VTimezoneError::MissingProperty(name, kind))?;
            prop.value
                .as_utc_offset()
                .ok_or_else(|| VTimezoneError::InvalidValue(name, prop.raw_value.clone()))
        };
        let offset_from = offset(names::TZOFFSETFROM)?;
        let offset_to = offset(names::TZOFFSETTO)?;

        let start = component
            .start()
            .ok_or(VTimezoneError::MissingProperty(names::DTSTART, kind))?
            .naive();

        let rdates = component
            .get_properties(names::RDATE)
            .flat_map(TimeValue::values_of)
            .map(|v| v.naive())
            .collect();

        let rule = component
            .get_property(names::RRULE)
            .map(|prop| {
                let rule = prop
                    .value
                    .as_recur()
                    .ok_or_else(|| VTimezoneError::InvalidValue("RRULE", prop.raw_value.clone()))?;
                // UNTIL is written in UTC; shift it onto the wall clock it bounds.
                let until = rule.until.as_ref().map(|until| match until {
                    RecurUntil::Date(d) => d.and_time(chrono::NaiveTime::MIN),
                    RecurUntil::DateTime(dt) if dt.is_utc() => dt.local + seconds(offset_from),
                    RecurUntil::DateTime(dt) => dt.local,
                });
                rule.wall_clock_set(start, until)
                    .map_err(|e| VTimezoneError::InvalidValue("RRULE", e.to_string()))
            })
            .transpose()?;

        Ok(Self {
            kind,
            offset_from,
            offset_to,
            start,
            rdates,
            name: component
                .get_property(names::TZNAME)
                .and_then(|p| p.as_text())
                .map(String::from),
            rule,
        })
    }

    /// Latest onset at or before `local`, compared on the wall clock.
    fn last_onset(&self, local: NaiveDateTime) -> Option<NaiveDateTime> {
        if local < self.start {
            return None;
        }
        let from_rule = self.rule.as_ref().and_then(|set| {
            set.into_iter()
                .map(|d| d.naive_utc())
                .take_while(|onset| *onset <= local)
                .last()
        });
        let from_rdates = self.rdates.iter().copied().filter(|d| *d <= local).max();
        [Some(self.start), from_rule, from_rdates].into_iter().flatten().max()
    }
}

/// A parsed VTIMEZONE.
#[derive(Debug, Clone)]
pub struct VTimezone {
    pub tzid: String,
    pub observances: Vec<Observance>,
}

impl VTimezone {
    /// ## Summary
    /// Parses a VTIMEZONE component.
    ///
    /// ## Errors
    /// Returns an error if TZID is missing, there are no observances, or an
    /// observance lacks DTSTART/TZOFFSETFROM/TZOFFSETTO or has a bad RRULE.
    pub fn parse(component: &Component) -> Result<Self, VTimezoneError> {
        if component.kind != ComponentKind::Timezone {
            return Err(VTimezoneError::NotATimezone(component.kind));
        }
        let tzid = component
            .get_property(names::TZID)
            .map(|p| p.as_text().unwrap_or(&p.raw_value).to_string())
            .filter(|t| !t.is_empty())
            .ok_or(VTimezoneError::MissingTzid)?;

        let observances = component
            .children
            .iter()
            .filter(|c| matches!(c.kind, ComponentKind::Standard | ComponentKind::Daylight))
            .map(Observance::parse)
            .collect::<Result<Vec<_>, _>>()?;
        if observances.is_empty() {
            return Err(VTimezoneError::NoObservances(tzid));
        }

        Ok(Self { tzid, observances })
    }

    /// Offset in force at a wall-clock reading.
    ///
    /// Readings before every onset use the earliest observance's
    /// TZOFFSETFROM. Inside a fall-back fold the earlier offset wins, since
    /// onsets are written in the pre-transition wall clock.
    #[must_use]
    pub fn offset_at(&self, local: NaiveDateTime) -> UtcOffset {
        self.observances
            .iter()
            .filter_map(|obs| obs.last_onset(local).map(|onset| (onset, obs)))
            .max_by_key(|(onset, _)| *onset)
            .map_or_else(
                || {
                    self.observances
                        .iter()
                        .min_by_key(|o| o.start)
                        .map_or(UtcOffset::UTC, |o| o.offset_from)
                },
                |(_, obs)| obs.offset_to,
            )
    }

    #[must_use]
    pub fn to_utc(&self, local: NaiveDateTime) -> NaiveDateTime {
        local - seconds(self.offset_at(local))
    }

    #[must_use]
    pub fn from_utc(&self, utc: NaiveDateTime) -> NaiveDateTime {
        let guess = utc + seconds(self.offset_at(utc));
        utc + seconds(self.offset_at(guess))
    }
}
