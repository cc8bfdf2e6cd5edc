//! DURATION value (RFC 5545 §3.3.6).

use std::fmt;

use chrono::TimeDelta;

/// Nominal duration as written in iCalendar text.
///
/// Weeks and days are kept apart from the exact part so that adding a
/// duration to a zoned wall-clock time moves whole days across DST changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Duration {
    pub negative: bool,
    pub weeks: u32,
    pub days: u32,
    /// Hours, minutes, and seconds folded into seconds.
    pub seconds: u32,
}

impl Duration {
    #[must_use]
    pub const fn zero() -> Self {
        Self {
            negative: false,
            weeks: 0,
            days: 0,
            seconds: 0,
        }
    }

    #[must_use]
    pub const fn days(days: u32) -> Self {
        Self {
            days,
            ..Self::zero()
        }
    }

    #[must_use]
    pub const fn hours(hours: u32) -> Self {
        Self {
            seconds: hours.saturating_mul(3600),
            ..Self::zero()
        }
    }

    #[must_use]
    pub const fn negate(mut self) -> Self {
        self.negative = !self.negative;
        self
    }

    /// Converts to a signed chrono delta.
    #[must_use]
    pub fn to_time_delta(self) -> TimeDelta {
        let delta = TimeDelta::weeks(i64::from(self.weeks))
            + TimeDelta::days(i64::from(self.days))
            + TimeDelta::seconds(i64::from(self.seconds));
        if self.negative { -delta } else { delta }
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            write!(f, "-")?;
        }
        write!(f, "P")?;
        if self.weeks > 0 && self.days == 0 && self.seconds == 0 {
            return write!(f, "{}W", self.weeks);
        }
        let days = u64::from(self.weeks) * 7 + u64::from(self.days);
        if days > 0 {
            write!(f, "{days}D")?;
        }
        if self.seconds > 0 {
            let (h, m, s) = (self.seconds / 3600, (self.seconds % 3600) / 60, self.seconds % 60);
            write!(f, "T")?;
            if h > 0 {
                write!(f, "{h}H")?;
            }
            if m > 0 {
                write!(f, "{m}M")?;
            }
            if s > 0 {
                write!(f, "{s}S")?;
            }
        } else if days == 0 {
            write!(f, "0D")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_forms() {
        assert_eq!(
            Duration {
                weeks: 2,
                ..Duration::zero()
            }
            .to_string(),
            "P2W"
        );
        assert_eq!(
            Duration {
                days: 1,
                seconds: 2 * 3600 + 30 * 60,
                ..Duration::zero()
            }
            .to_string(),
            "P1DT2H30M"
        );
        assert_eq!(Duration::hours(1).negate().to_string(), "-PT1H");
        assert_eq!(Duration::zero().to_string(), "P0D");
    }

    #[test]
    fn large_components_do_not_overflow() {
        let d = Duration {
            weeks: u32::MAX,
            days: 1,
            ..Duration::zero()
        };
        assert_eq!(d.to_string(), format!("P{}D", u64::from(u32::MAX) * 7 + 1));
        assert_eq!(Duration::hours(u32::MAX).seconds, u32::MAX);
    }

    #[test]
    fn converts_to_time_delta() {
        let d = Duration {
            weeks: 1,
            days: 1,
            seconds: 90,
            negative: true,
        };
        assert_eq!(d.to_time_delta(), -(TimeDelta::days(8) + TimeDelta::seconds(90)));
    }
}
