//! DATE-TIME and UTC-OFFSET values (RFC 5545 §3.3.5, §3.3.14).

use std::fmt;

use chrono::{FixedOffset, NaiveDate, NaiveDateTime};

/// Which of the three RFC 5545 DATE-TIME forms a value uses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DateTimeForm {
    /// Same wall-clock time in every zone (`19980118T230000`).
    Floating,
    /// Absolute instant, written with a trailing `Z`.
    Utc,
    /// Wall-clock time in the zone named by a TZID parameter.
    Zoned { tzid: String },
}

/// DATE-TIME value: a wall-clock reading plus its form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DateTime {
    pub local: NaiveDateTime,
    pub form: DateTimeForm,
}

impl DateTime {
    #[must_use]
    pub const fn new(local: NaiveDateTime, form: DateTimeForm) -> Self {
        Self { local, form }
    }

    #[must_use]
    pub const fn floating(local: NaiveDateTime) -> Self {
        Self::new(local, DateTimeForm::Floating)
    }

    #[must_use]
    pub const fn utc(local: NaiveDateTime) -> Self {
        Self::new(local, DateTimeForm::Utc)
    }

    #[must_use]
    pub fn zoned(local: NaiveDateTime, tzid: impl Into<String>) -> Self {
        Self::new(local, DateTimeForm::Zoned { tzid: tzid.into() })
    }

    /// Builds a value from calendar fields, returning `None` for impossible
    /// dates or times.
    #[must_use]
    pub fn from_ymd_hms(
        (year, month, day): (i32, u32, u32),
        (hour, minute, second): (u32, u32, u32),
        form: DateTimeForm,
    ) -> Option<Self> {
        let local = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;
        Some(Self::new(local, form))
    }

    #[must_use]
    pub fn is_utc(&self) -> bool {
        matches!(self.form, DateTimeForm::Utc)
    }

    #[must_use]
    pub fn is_floating(&self) -> bool {
        matches!(self.form, DateTimeForm::Floating)
    }

    /// Returns the TZID for zoned values.
    #[must_use]
    pub fn tzid(&self) -> Option<&str> {
        match &self.form {
            DateTimeForm::Zoned { tzid } => Some(tzid),
            DateTimeForm::Floating | DateTimeForm::Utc => None,
        }
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.local.format("%Y%m%dT%H%M%S"))?;
        if self.is_utc() {
            write!(f, "Z")?;
        }
        Ok(())
    }
}

/// UTC-OFFSET value, stored as signed seconds east of UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UtcOffset {
    seconds: i32,
}

impl UtcOffset {
    pub const UTC: Self = Self { seconds: 0 };

    #[must_use]
    pub const fn from_seconds(seconds: i32) -> Self {
        Self { seconds }
    }

    #[must_use]
    pub const fn as_seconds(self) -> i32 {
        self.seconds
    }

    /// Returns the chrono offset, or `None` past ±24 hours.
    #[must_use]
    pub fn to_fixed(self) -> Option<FixedOffset> {
        FixedOffset::east_opt(self.seconds)
    }
}

impl fmt::Display for UtcOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.seconds < 0 { '-' } else { '+' };
        let abs = self.seconds.unsigned_abs();
        write!(f, "{sign}{:02}{:02}", abs / 3600, (abs % 3600) / 60)?;
        if abs % 60 != 0 {
            write!(f, "{:02}", abs % 60)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datetime_display() {
        let dt = DateTime::from_ymd_hms((2026, 1, 23), (12, 0, 0), DateTimeForm::Utc).unwrap();
        assert_eq!(dt.to_string(), "20260123T120000Z");

        let dt = DateTime::from_ymd_hms(
            (2026, 1, 23),
            (9, 30, 5),
            DateTimeForm::Zoned {
                tzid: "Europe/Berlin".to_string(),
            },
        )
        .unwrap();
        assert_eq!(dt.to_string(), "20260123T093005");
        assert_eq!(dt.tzid(), Some("Europe/Berlin"));
    }

    #[test]
    fn impossible_dates_are_rejected() {
        assert!(DateTime::from_ymd_hms((2026, 2, 30), (0, 0, 0), DateTimeForm::Floating).is_none());
    }

    #[test]
    fn utc_offset_display() {
        assert_eq!(UtcOffset::from_seconds(5 * 3600 + 30 * 60).to_string(), "+0530");
        assert_eq!(UtcOffset::from_seconds(-8 * 3600).to_string(), "-0800");
        assert_eq!(UtcOffset::from_seconds(-(3600 + 15)).to_string(), "-010015");
        assert_eq!(UtcOffset::UTC.to_string(), "+0000");
    }
}
