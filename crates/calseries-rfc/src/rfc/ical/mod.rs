//! iCalendar (RFC 5545) support: document model, parser, and the
//! recurrence machinery that turns parsed components into occurrence series.

pub mod core;
pub mod expand;
pub mod parse;

#[cfg(test)]
mod tests;
