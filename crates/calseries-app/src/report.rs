//! Window queries over an assembled calendar, rendered one occurrence per line.

use std::fmt;

use calseries_core::config::QueryConfig;
use calseries_rfc::rfc::ical::core::{DateTime, DateTimeForm, TimeValue};
use calseries_rfc::rfc::ical::expand::{AssembledCalendar, OccurrenceSource, RecurrenceEngine};
use calseries_rfc::rfc::ical::parse::{parse_date, parse_datetime};
use chrono::{Days, NaiveDate, NaiveTime};

use crate::error::{AppError, AppResult};

/// Days covered when no end bound is configured.
const DEFAULT_WINDOW_DAYS: u64 = 365;

/// Inclusive query window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryWindow {
    pub start: TimeValue,
    pub end: TimeValue,
}

impl QueryWindow {
    /// ## Summary
    /// Builds the window from `query.start` / `query.end`.
    ///
    /// Bounds are `YYYYMMDD` or `YYYYMMDDTHHMMSS[Z]`. A missing start is
    /// `today`; a missing end is a year after the start. A date-only end
    /// covers that whole day.
    ///
    /// ## Errors
    /// Returns [`AppError::InvalidWindow`] for unparseable bounds or an end
    /// before the start.
    pub fn from_config(query: &QueryConfig, today: NaiveDate) -> AppResult<Self> {
        let start = match query.start.as_deref() {
            Some(text) => parse_bound(text, false)?,
            None => TimeValue::Date(today),
        };
        let end = match query.end.as_deref() {
            Some(text) => parse_bound(text, true)?,
            None => {
                let last = start
                    .naive()
                    .date()
                    .checked_add_days(Days::new(DEFAULT_WINDOW_DAYS))
                    .ok_or_else(|| AppError::InvalidWindow("start is too late".to_string()))?;
                end_of_day(last)
            }
        };

        if end.naive() < start.naive() {
            return Err(AppError::InvalidWindow(format!("end {end} is before start {start}")));
        }
        Ok(Self { start, end })
    }
}

fn end_of_day(date: NaiveDate) -> TimeValue {
    let last_second = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
    TimeValue::DateTime(DateTime::new(date.and_time(last_second), DateTimeForm::Floating))
}

fn parse_bound(text: &str, is_end: bool) -> AppResult<TimeValue> {
    let text = text.trim();
    let invalid = |e: calseries_rfc::rfc::ical::parse::ParseError| {
        AppError::InvalidWindow(format!("'{text}': {e}"))
    };
    if text.contains('T') {
        return parse_datetime(text, None, 1).map(TimeValue::DateTime).map_err(invalid);
    }
    let date = parse_date(text, 1).map_err(invalid)?;
    Ok(if is_end { end_of_day(date) } else { TimeValue::Date(date) })
}

/// One printed occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    pub uid: String,
    pub recurrence_id: TimeValue,
    pub start: TimeValue,
    pub end: TimeValue,
    pub source: OccurrenceSource,
    pub summary: Option<String>,
}

const fn source_label(source: OccurrenceSource) -> &'static str {
    match source {
        OccurrenceSource::Exception => "exception",
        OccurrenceSource::RangeException => "range",
        OccurrenceSource::Master => "master",
        OccurrenceSource::Generated => "generated",
    }
}

impl fmt::Display for ReportLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}",
            self.uid,
            self.recurrence_id,
            self.start,
            self.end,
            source_label(self.source)
        )?;
        if let Some(summary) = &self.summary {
            write!(f, "\t{summary}")?;
        }
        Ok(())
    }
}

/// ## Summary
/// Up to `max_per_series` occurrences of one series inside `window`.
///
/// ## Errors
/// Propagates expansion failures such as a recurring series without DTSTART.
pub fn series_report(
    engine: &RecurrenceEngine,
    window: &QueryWindow,
    max_per_series: usize,
) -> AppResult<Vec<ReportLine>> {
    let occurrences = engine
        .occurrences_between(&window.start, &window.end)
        .map_err(calseries_rfc::error::RfcError::from)?;

    Ok(occurrences
        .take(max_per_series)
        .map(|occurrence| ReportLine {
            uid: engine.uid().to_string(),
            summary: occurrence.summary().map(str::to_string),
            recurrence_id: occurrence.recurrence_id,
            start: occurrence.start,
            end: occurrence.end,
            source: occurrence.source,
        })
        .collect())
}

/// Report for every series in UID order. Series that fail to expand are
/// logged and skipped.
#[must_use]
pub fn calendar_report(
    calendar: &AssembledCalendar,
    window: &QueryWindow,
    max_per_series: usize,
) -> Vec<ReportLine> {
    let mut lines = Vec::new();
    for engine in calendar.all_series() {
        match series_report(engine, window, max_per_series) {
            Ok(series_lines) => {
                tracing::debug!(uid = %engine.uid(), count = series_lines.len(), "Series expanded");
                lines.extend(series_lines);
            }
            Err(e) => tracing::warn!(uid = %engine.uid(), error = %e, "Skipping series"),
        }
    }
    lines
}
