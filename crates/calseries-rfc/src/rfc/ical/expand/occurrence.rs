//! Concrete occurrences produced from a series timeline.

use std::borrow::Cow;

use chrono::TimeDelta;

use crate::rfc::ical::core::{Component, TimeValue};

/// Which rule produced an occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OccurrenceSource {
    /// An exception whose RECURRENCE-ID matches the instant exactly.
    Exception,
    /// A fork of the nearest earlier THISANDFUTURE exception, shifted.
    RangeException,
    /// The master's own first instance.
    Master,
    /// A fork of the master at a rule or RDATE instant.
    Generated,
}

/// One materialized instance of a series.
#[derive(Debug, Clone)]
pub struct Occurrence<'a> {
    /// Nominal position on the timeline.
    pub recurrence_id: TimeValue,
    pub start: TimeValue,
    pub end: TimeValue,
    pub source: OccurrenceSource,
    pub component: Cow<'a, Component>,
}

impl<'a> Occurrence<'a> {
    /// Builds an occurrence, deriving its end from DTEND/DUE, then
    /// DURATION, then one day for all-day starts, else the start itself.
    #[must_use]
    pub fn new(
        recurrence_id: TimeValue,
        start: TimeValue,
        source: OccurrenceSource,
        component: Cow<'a, Component>,
    ) -> Self {
        let end = component
            .end()
            .or_else(|| {
                component
                    .duration()
                    .map(|d| start.add_delta(d.to_time_delta()))
            })
            .unwrap_or_else(|| {
                if start.is_date() {
                    start.add_delta(TimeDelta::days(1))
                } else {
                    start.clone()
                }
            });
        Self {
            recurrence_id,
            start,
            end,
            source,
            component,
        }
    }

    #[must_use]
    pub fn uid(&self) -> Option<&str> {
        self.component.uid()
    }

    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.component.summary()
    }

    #[must_use]
    pub const fn is_exception(&self) -> bool {
        matches!(
            self.source,
            OccurrenceSource::Exception | OccurrenceSource::RangeException
        )
    }

    /// Detaches the occurrence from the series it was read from.
    #[must_use]
    pub fn into_owned(self) -> Occurrence<'static> {
        Occurrence {
            recurrence_id: self.recurrence_id,
            start: self.start,
            end: self.end,
            source: self.source,
            component: Cow::Owned(self.component.into_owned()),
        }
    }
}
