//! Pull-based cursors over a series timeline.
//!
//! A cursor borrows the engine it reads from, so the engine cannot be
//! mutated while one is open. Cursors are single-use; each query builds
//! its own.

use std::iter::Peekable;

use super::engine::RecurrenceEngine;
use super::occurrence::Occurrence;
use crate::rfc::ical::core::TimeValue;

pub(crate) type RuleIter<'a> = Peekable<Box<dyn Iterator<Item = i64> + 'a>>;

/// Merged, deduplicated, exclusion-filtered stream of instants (Unix
/// seconds) for a recurring series.
pub(crate) struct Timeline<'a> {
    rules: Vec<RuleIter<'a>>,
    inclusions: &'a [i64],
    inclusion_pos: usize,
    exclusions: &'a [i64],
    exclusion_pos: usize,
    last: Option<i64>,
}

impl<'a> Timeline<'a> {
    pub(crate) fn new(rules: Vec<RuleIter<'a>>, inclusions: &'a [i64], exclusions: &'a [i64]) -> Self {
        Self {
            rules,
            inclusions,
            inclusion_pos: 0,
            exclusions,
            exclusion_pos: 0,
            last: None,
        }
    }

    fn earliest_candidate(&mut self) -> Option<i64> {
        let from_rules = self.rules.iter_mut().filter_map(|r| r.peek().copied()).min();
        let from_inclusions = self.inclusions.get(self.inclusion_pos).copied();
        match (from_rules, from_inclusions) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Moves every source past `candidate`.
    fn consume(&mut self, candidate: i64) {
        for rule in &mut self.rules {
            while rule.next_if(|t| *t <= candidate).is_some() {}
        }
        while self
            .inclusions
            .get(self.inclusion_pos)
            .is_some_and(|t| *t <= candidate)
        {
            self.inclusion_pos += 1;
        }
    }

    fn is_excluded(&mut self, candidate: i64) -> bool {
        while self
            .exclusions
            .get(self.exclusion_pos)
            .is_some_and(|t| *t < candidate)
        {
            self.exclusion_pos += 1;
        }
        self.exclusions.get(self.exclusion_pos) == Some(&candidate)
    }
}

impl Iterator for Timeline<'_> {
    type Item = i64;

    fn next(&mut self) -> Option<i64> {
        loop {
            let candidate = self.earliest_candidate()?;
            self.consume(candidate);
            if self.last.is_some_and(|last| candidate <= last) {
                continue;
            }
            self.last = Some(candidate);
            if self.is_excluded(candidate) {
                continue;
            }
            return Some(candidate);
        }
    }
}

enum Cursor<'a> {
    Single(Option<Occurrence<'a>>),
    Timeline {
        engine: &'a RecurrenceEngine,
        timeline: Timeline<'a>,
        /// Series start, giving generated instants their form and zone.
        template: &'a TimeValue,
        start: i64,
        end: i64,
    },
    Done,
}

/// Occurrences of one series inside an inclusive window, in start order.
pub struct Occurrences<'a> {
    cursor: Cursor<'a>,
}

impl<'a> Occurrences<'a> {
    pub(crate) const fn single(occurrence: Option<Occurrence<'a>>) -> Self {
        Self {
            cursor: Cursor::Single(occurrence),
        }
    }

    pub(crate) const fn timeline(
        engine: &'a RecurrenceEngine,
        timeline: Timeline<'a>,
        template: &'a TimeValue,
        start: i64,
        end: i64,
    ) -> Self {
        Self {
            cursor: Cursor::Timeline {
                engine,
                timeline,
                template,
                start,
                end,
            },
        }
    }
}

impl<'a> Iterator for Occurrences<'a> {
    type Item = Occurrence<'a>;

    fn next(&mut self) -> Option<Occurrence<'a>> {
        let next = match &mut self.cursor {
            Cursor::Single(occurrence) => return occurrence.take(),
            Cursor::Done => return None,
            Cursor::Timeline {
                engine,
                timeline,
                template,
                start,
                end,
            } => {
                let engine: &'a RecurrenceEngine = *engine;
                let template: &'a TimeValue = *template;
                timeline
                    .find(|t| *t >= *start)
                    .filter(|t| *t <= *end)
                    .map(|t| (engine, template, t))
            }
        };
        if let Some((engine, template, t)) = next {
            Some(engine.materialize(t, template))
        } else {
            self.cursor = Cursor::Done;
            None
        }
    }
}
