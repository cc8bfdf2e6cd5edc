//! RECUR values (RFC 5545 §3.3.10).
//!
//! Only the parts that decide the bounds of a rule are modelled as fields.
//! BYxxx parts and WKST are carried through verbatim and validated when the
//! rule is handed to the `rrule` crate for iteration.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, TimeZone};
use rrule::{RRuleError, RRuleSet, Tz, Unvalidated};

use super::DateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Secondly,
    Minutely,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Secondly => "SECONDLY",
            Self::Minutely => "MINUTELY",
            Self::Hourly => "HOURLY",
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Yearly => "YEARLY",
        }
    }

    /// Case-insensitive parse.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_uppercase().as_str() {
            "SECONDLY" => Self::Secondly,
            "MINUTELY" => Self::Minutely,
            "HOURLY" => Self::Hourly,
            "DAILY" => Self::Daily,
            "WEEKLY" => Self::Weekly,
            "MONTHLY" => Self::Monthly,
            "YEARLY" => Self::Yearly,
            _ => return None,
        })
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// UNTIL bound of a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecurUntil {
    Date(NaiveDate),
    DateTime(DateTime),
}

impl fmt::Display for RecurUntil {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(d) => write!(f, "{}", d.format("%Y%m%d")),
            Self::DateTime(dt) => write!(f, "{dt}"),
        }
    }
}

/// A recurrence rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RRule {
    pub freq: Frequency,
    pub interval: Option<u32>,
    pub count: Option<u32>,
    pub until: Option<RecurUntil>,
    /// Remaining `NAME=VALUE` parts in their original order.
    pub parts: Vec<(String, String)>,
}

impl RRule {
    #[must_use]
    pub const fn new(freq: Frequency) -> Self {
        Self {
            freq,
            interval: None,
            count: None,
            until: None,
            parts: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_interval(mut self, interval: u32) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Sets COUNT, clearing any UNTIL.
    #[must_use]
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self.until = None;
        self
    }

    /// Sets UNTIL, clearing any COUNT.
    #[must_use]
    pub fn with_until(mut self, until: RecurUntil) -> Self {
        self.until = Some(until);
        self.count = None;
        self
    }

    #[must_use]
    pub fn with_part(mut self, name: &str, value: &str) -> Self {
        self.parts
            .push((name.to_ascii_uppercase(), value.to_ascii_uppercase()));
        self
    }

    /// Returns the value of a verbatim part such as `BYDAY`.
    #[must_use]
    pub fn part(&self, name: &str) -> Option<&str> {
        self.parts
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// A rule is finite when COUNT or UNTIL bounds it.
    #[must_use]
    pub const fn is_finite(&self) -> bool {
        self.count.is_some() || self.until.is_some()
    }

    /// Builds an `rrule` set that iterates wall-clock readings.
    ///
    /// `start` and `until` are wall-clock times in the series' own zone; both
    /// are handed to the `rrule` crate as if they were UTC so iteration never
    /// crosses a DST transition. Callers map the results back to instants.
    ///
    /// ## Errors
    /// Returns an error if the `rrule` crate rejects the rule.
    pub fn wall_clock_set(
        &self,
        start: NaiveDateTime,
        until: Option<NaiveDateTime>,
    ) -> Result<RRuleSet, RRuleError> {
        let mut parts = vec![format!("FREQ={}", self.freq)];
        if let Some(interval) = self.interval {
            parts.push(format!("INTERVAL={interval}"));
        }
        if let Some(count) = self.count {
            parts.push(format!("COUNT={count}"));
        }
        if let Some(until) = until {
            parts.push(format!("UNTIL={}Z", until.format("%Y%m%dT%H%M%S")));
        }
        parts.extend(self.parts.iter().map(|(name, value)| format!("{name}={value}")));

        let rule: rrule::RRule<Unvalidated> = parts.join(";").parse()?;
        rule.build(Tz::UTC.from_utc_datetime(&start))
    }
}

impl fmt::Display for RRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FREQ={}", self.freq)?;
        if let Some(interval) = self.interval {
            write!(f, ";INTERVAL={interval}")?;
        }
        if let Some(count) = self.count {
            write!(f, ";COUNT={count}")?;
        }
        if let Some(until) = &self.until {
            write!(f, ";UNTIL={until}")?;
        }
        for (name, value) in &self.parts {
            write!(f, ";{name}={value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_keeps_part_order() {
        let rule = RRule::new(Frequency::Monthly)
            .with_interval(2)
            .with_count(10)
            .with_part("byday", "1mo,-1fr")
            .with_part("WKST", "SU");
        assert_eq!(
            rule.to_string(),
            "FREQ=MONTHLY;INTERVAL=2;COUNT=10;BYDAY=1MO,-1FR;WKST=SU"
        );
        assert_eq!(rule.part("byday"), Some("1MO,-1FR"));
    }

    #[test]
    fn wall_clock_set_iterates_in_local_time() {
        let start = NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let until = start + chrono::TimeDelta::days(14);
        let set = RRule::new(Frequency::Weekly)
            .wall_clock_set(start, Some(until))
            .unwrap();
        let hits: Vec<NaiveDateTime> = (&set).into_iter().map(|d| d.naive_utc()).collect();
        assert_eq!(hits.len(), 3);
        assert!(hits.iter().all(|d| d.format("%H:%M").to_string() == "09:00"));
    }

    #[test]
    fn count_and_until_are_exclusive() {
        let until = RecurUntil::Date(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap());
        let rule = RRule::new(Frequency::Daily).with_count(3).with_until(until);
        assert_eq!(rule.count, None);
        assert!(rule.is_finite());
        assert!(!RRule::new(Frequency::Daily).is_finite());
    }
}
