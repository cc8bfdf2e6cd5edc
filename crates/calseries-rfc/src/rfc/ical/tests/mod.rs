//! iCalendar fixtures and end-to-end series scenarios.

mod fixtures;
