//! Per-series recurrence engine.
//!
//! The engine owns a series' master component and its exceptions. It merges
//! RRULE instants, RDATEs and the master start into one timeline, removes
//! EXDATEs, and resolves each instant against the exceptions when an
//! occurrence is materialized.
//!
//! Timeline positions are Unix seconds. Rules are iterated on the series'
//! wall clock and then mapped to instants through the series' zone, so a
//! 09:00 weekly meeting stays at 09:00 across DST changes.

use std::borrow::Cow;
use std::cell::{OnceCell, RefCell};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::{NaiveDateTime, NaiveTime, TimeDelta};
use rrule::RRuleSet;

use super::cursor::{Occurrences, RuleIter, Timeline};
use super::error::{ExpansionError, ExpansionResult};
use super::lock::Lockable;
use super::observer::{Observable, Observer, Observers, SeriesChange, SubscriptionId};
use super::occurrence::{Occurrence, OccurrenceSource};
use super::timezone::{TimezoneEntry, TimezoneRegistry};
use crate::error::RfcResult;
use crate::rfc::ical::core::{
    Component, DateTime, Property, RRule, RecurUntil, TimeValue, Value, names,
};

/// Where a series' master component came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MasterOrigin {
    /// Present in the document and recurring (or without exceptions).
    #[default]
    Declared,
    /// Synthesized from an orphan exception. Carries one RDATE per related
    /// exception.
    Forged,
    /// Present in the document but not recurring, and given RDATEs for its
    /// exceptions.
    Promoted,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpansionOptions {
    /// Hand out owned copies of exact exceptions instead of borrowing them.
    pub fork_exceptions: bool,
}

/// An exception related into a series.
#[derive(Debug, Clone)]
pub struct RecurrenceException {
    pub component: Component,
    pub recurrence_id: TimeValue,
    /// `RANGE=THISANDFUTURE`.
    pub modifies_future: bool,
}

/// Rule sets and sorted instant lists, built on first expansion.
#[derive(Debug)]
struct Resolved {
    start: TimeValue,
    zone: Arc<TimezoneEntry>,
    rule_sets: Vec<RRuleSet>,
    inclusions: Vec<i64>,
    exclusions: Vec<i64>,
}

/// Recurrence state for one UID.
#[derive(Debug)]
pub struct RecurrenceEngine {
    uid: String,
    master: Component,
    origin: MasterOrigin,
    start: Option<TimeValue>,
    rules: Vec<RRule>,
    rdates: Vec<TimeValue>,
    exdates: Vec<TimeValue>,
    exceptions: BTreeMap<i64, RecurrenceException>,
    /// Keys of THISANDFUTURE exceptions, ascending.
    range_index: Vec<i64>,
    range_diffs: RefCell<HashMap<i64, TimeDelta>>,
    resolved: OnceCell<Resolved>,
    registry: Arc<TimezoneRegistry>,
    options: ExpansionOptions,
    locked: bool,
    observers: Observers<SeriesChange>,
}

fn same_clock(a: &TimeValue, b: &TimeValue) -> bool {
    match (a, b) {
        (TimeValue::Date(_), TimeValue::Date(_)) => true,
        (TimeValue::DateTime(x), TimeValue::DateTime(y)) => x.form == y.form,
        _ => false,
    }
}

impl RecurrenceEngine {
    /// ## Summary
    /// Reads the recurrence definition out of `master`.
    ///
    /// RRULE values that did not parse are ignored with a warning, which
    /// leaves the series with its explicit dates only.
    #[must_use]
    pub fn new(master: Component, registry: Arc<TimezoneRegistry>, options: ExpansionOptions) -> Self {
        let uid = master.uid().unwrap_or_default().to_string();
        let rules = master
            .get_properties(names::RRULE)
            .filter_map(|prop| {
                let rule = prop.value.as_recur().cloned();
                if rule.is_none() {
                    tracing::warn!(uid = %uid, value = %prop.raw_value, "Ignoring unparseable RRULE");
                }
                rule
            })
            .collect();
        let rdates = master
            .get_properties(names::RDATE)
            .flat_map(TimeValue::values_of)
            .collect();
        let exdates = master
            .get_properties(names::EXDATE)
            .flat_map(TimeValue::values_of)
            .collect();

        Self {
            start: master.start(),
            uid,
            master,
            origin: MasterOrigin::Declared,
            rules,
            rdates,
            exdates,
            exceptions: BTreeMap::new(),
            range_index: Vec::new(),
            range_diffs: RefCell::new(HashMap::new()),
            resolved: OnceCell::new(),
            registry,
            options,
            locked: false,
            observers: Observers::new(),
        }
    }

    pub(crate) fn set_origin(&mut self, origin: MasterOrigin) {
        self.origin = origin;
    }

    #[must_use]
    pub fn uid(&self) -> &str {
        &self.uid
    }

    #[must_use]
    pub const fn master(&self) -> &Component {
        &self.master
    }

    #[must_use]
    pub const fn origin(&self) -> MasterOrigin {
        self.origin
    }

    /// True when the master was synthesized or promoted to carry exceptions.
    #[must_use]
    pub fn is_forged(&self) -> bool {
        self.origin != MasterOrigin::Declared
    }

    #[must_use]
    pub const fn start(&self) -> Option<&TimeValue> {
        self.start.as_ref()
    }

    #[must_use]
    pub fn rules(&self) -> &[RRule] {
        &self.rules
    }

    #[must_use]
    pub fn rdates(&self) -> &[TimeValue] {
        &self.rdates
    }

    #[must_use]
    pub fn exdates(&self) -> &[TimeValue] {
        &self.exdates
    }

    #[must_use]
    pub const fn options(&self) -> ExpansionOptions {
        self.options
    }

    /// Exceptions ordered by recurrence-id.
    pub fn exceptions(&self) -> impl Iterator<Item = &RecurrenceException> {
        self.exceptions.values()
    }

    #[must_use]
    pub fn exception_at(&self, recurrence_id: &TimeValue) -> Option<&RecurrenceException> {
        self.exceptions.get(&self.key(recurrence_id))
    }

    /// THISANDFUTURE exceptions ordered by recurrence-id.
    pub fn range_exceptions(&self) -> impl Iterator<Item = &RecurrenceException> {
        self.range_index
            .iter()
            .filter_map(|key| self.exceptions.get(key))
    }

    /// The master followed by every exception.
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        std::iter::once(&self.master).chain(self.exceptions.values().map(|e| &e.component))
    }

    /// A series recurs when it has at least one rule or RDATE.
    #[must_use]
    pub fn is_recurring(&self) -> bool {
        !self.rules.is_empty() || !self.rdates.is_empty()
    }

    /// True iff every rule is bounded by COUNT or UNTIL.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.rules.iter().all(RRule::is_finite)
    }

    fn key(&self, value: &TimeValue) -> i64 {
        self.registry.unix_time(value)
    }

    fn sorted_keys(&self, values: &[TimeValue]) -> Vec<i64> {
        let mut keys: Vec<i64> = values.iter().map(|v| self.key(v)).collect();
        keys.sort_unstable();
        keys.dedup();
        keys
    }

    fn missing_start(&self) -> ExpansionError {
        ExpansionError::MissingStart {
            uid: self.uid.clone(),
        }
    }

    fn zone_of(&self, start: &TimeValue) -> Arc<TimezoneEntry> {
        start.tzid().map_or_else(
            || Arc::new(TimezoneEntry::utc()),
            |tzid| self.registry.zone_for(tzid),
        )
    }

    /// UNTIL as a reading on the series' wall clock.
    fn until_wall(&self, until: &RecurUntil, start: &TimeValue, zone: &TimezoneEntry) -> NaiveDateTime {
        match until {
            RecurUntil::Date(d) if start.is_date() => d.and_time(NaiveTime::MIN),
            RecurUntil::Date(d) => d.and_time(NaiveTime::MIN) + TimeDelta::seconds(86_399),
            RecurUntil::DateTime(dt) if dt.is_floating() => dt.local,
            RecurUntil::DateTime(dt) => zone.from_utc(self.registry.to_utc(&TimeValue::DateTime(dt.clone()))),
        }
    }

    fn rule_set(&self, rule: &RRule, start: &TimeValue, zone: &TimezoneEntry) -> Result<RRuleSet, rrule::RRuleError> {
        let until = rule.until.as_ref().map(|u| self.until_wall(u, start, zone));
        rule.wall_clock_set(start.naive(), until)
    }

    fn resolved(&self) -> ExpansionResult<&Resolved> {
        if let Some(resolved) = self.resolved.get() {
            return Ok(resolved);
        }

        let start = self.start.clone().ok_or_else(|| self.missing_start())?;
        let zone = self.zone_of(&start);
        let rule_sets = self
            .rules
            .iter()
            .filter_map(|rule| match self.rule_set(rule, &start, &zone) {
                Ok(set) => Some(set),
                Err(e) => {
                    tracing::warn!(uid = %self.uid, rule = %rule, error = %e, "Dropping recurrence rule");
                    None
                }
            })
            .collect();

        let mut inclusions = self.sorted_keys(&self.rdates);
        let start_key = self.key(&start);
        if let Err(pos) = inclusions.binary_search(&start_key) {
            inclusions.insert(pos, start_key);
        }
        let exclusions = self.sorted_keys(&self.exdates);

        tracing::trace!(
            uid = %self.uid,
            rules = self.rules.len(),
            inclusions = inclusions.len(),
            exclusions = exclusions.len(),
            "Built recurrence timeline"
        );
        Ok(self.resolved.get_or_init(|| Resolved {
            start,
            zone,
            rule_sets,
            inclusions,
            exclusions,
        }))
    }

    fn timeline(&self) -> ExpansionResult<(Timeline<'_>, &TimeValue)> {
        let resolved = self.resolved()?;
        let zone: &TimezoneEntry = &resolved.zone;
        let rules = resolved
            .rule_sets
            .iter()
            .map(|set| {
                let instants: Box<dyn Iterator<Item = i64> + '_> = Box::new(
                    set.into_iter()
                        .map(move |dt| zone.to_utc(dt.naive_utc()).and_utc().timestamp()),
                );
                instants.peekable()
            })
            .collect::<Vec<RuleIter<'_>>>();
        Ok((
            Timeline::new(rules, &resolved.inclusions, &resolved.exclusions),
            &resolved.start,
        ))
    }

    /// ## Summary
    /// Checks every rule against the `rrule` crate's validation.
    ///
    /// ## Errors
    /// Returns the first rule error, or `MissingStart` if the series recurs
    /// without a DTSTART.
    pub fn validate_rules(&self) -> RfcResult<()> {
        if !self.is_recurring() {
            return Ok(());
        }
        let start = self.start.as_ref().ok_or_else(|| self.missing_start())?;
        let zone = self.zone_of(start);
        for rule in &self.rules {
            self.rule_set(rule, start, &zone)?;
        }
        Ok(())
    }

    fn range_exception_for(&self, t: i64) -> Option<(i64, &RecurrenceException)> {
        let idx = self.range_index.partition_point(|key| *key <= t);
        let key = *self.range_index.get(idx.checked_sub(1)?)?;
        self.exceptions.get(&key).map(|e| (key, e))
    }

    /// Start shift of a range exception relative to its own recurrence-id.
    fn range_delta(&self, key: i64, exception: &RecurrenceException) -> TimeDelta {
        let cached = self.range_diffs.borrow().get(&key).copied();
        if let Some(delta) = cached {
            return delta;
        }
        let rid = &exception.recurrence_id;
        let delta = exception.component.start().map_or(TimeDelta::zero(), |start| {
            if same_clock(&start, rid) {
                start.naive() - rid.naive()
            } else {
                self.registry.subtract_with_timezone(&start, rid)
            }
        });
        self.range_diffs.borrow_mut().insert(key, delta);
        delta
    }

    /// Turns a timeline instant into an occurrence.
    ///
    /// Exact exceptions win, then the closest earlier THISANDFUTURE
    /// exception, then the master.
    pub(crate) fn materialize(&self, t: i64, template: &TimeValue) -> Occurrence<'_> {
        let nominal = self.registry.time_value_at(t, template);

        if let Some(exception) = self.exceptions.get(&t) {
            let component = if self.options.fork_exceptions {
                Cow::Owned(exception.component.clone())
            } else {
                Cow::Borrowed(&exception.component)
            };
            let start = exception.component.start().unwrap_or(nominal);
            return Occurrence::new(
                exception.recurrence_id.clone(),
                start,
                OccurrenceSource::Exception,
                component,
            );
        }

        if let Some((key, exception)) = self.range_exception_for(t) {
            let start = nominal.add_delta(self.range_delta(key, exception));
            let fork = exception.component.fork_at(&nominal, &start);
            return Occurrence::new(nominal, start, OccurrenceSource::RangeException, Cow::Owned(fork));
        }

        let own_start = self
            .start
            .as_ref()
            .filter(|s| self.origin == MasterOrigin::Declared && self.key(s) == t);
        let (start, source) = match own_start {
            Some(start) => (start.clone(), OccurrenceSource::Master),
            None => (nominal, OccurrenceSource::Generated),
        };
        let fork = self.master.fork_at(&start, &start);
        Occurrence::new(start.clone(), start, source, Cow::Owned(fork))
    }

    fn single_occurrence(&self) -> Option<Occurrence<'_>> {
        self.start.as_ref().map(|start| {
            Occurrence::new(
                start.clone(),
                start.clone(),
                OccurrenceSource::Master,
                Cow::Borrowed(&self.master),
            )
        })
    }

    /// ## Summary
    /// Occurrences starting inside `[start, end]`, in order.
    ///
    /// A non-recurring series yields its single instance if it overlaps
    /// the window.
    ///
    /// ## Errors
    /// Returns `MissingStart` for a recurring series without DTSTART.
    pub fn occurrences_between(&self, start: &TimeValue, end: &TimeValue) -> ExpansionResult<Occurrences<'_>> {
        let (window_start, window_end) = (self.key(start), self.key(end));
        if !self.is_recurring() {
            let single = self.single_occurrence().filter(|o| {
                let (s, e) = (self.key(&o.start), self.key(&o.end));
                s <= window_end && (e > window_start || s >= window_start)
            });
            return Ok(Occurrences::single(single));
        }
        let (timeline, template) = self.timeline()?;
        Ok(Occurrences::timeline(self, timeline, template, window_start, window_end))
    }

    /// ## Summary
    /// The occurrence whose nominal start is exactly `recurrence_id`.
    ///
    /// ## Errors
    /// Returns `MissingStart` for a recurring series without DTSTART.
    pub fn occurrence_at(&self, recurrence_id: &TimeValue) -> ExpansionResult<Option<Occurrence<'_>>> {
        let target = self.key(recurrence_id);
        if !self.is_recurring() {
            return Ok(self
                .single_occurrence()
                .filter(|o| self.key(&o.recurrence_id) == target));
        }
        let (mut timeline, template) = self.timeline()?;
        Ok(timeline
            .find(|t| *t >= target)
            .filter(|t| *t == target)
            .map(|t| self.materialize(t, template)))
    }

    /// ## Summary
    /// The first occurrence at or after `recurrence_id`, or the last one if
    /// the series ends before it.
    ///
    /// ## Errors
    /// Returns `MissingStart` for a recurring series without DTSTART.
    pub fn closest_occurrence(&self, recurrence_id: &TimeValue) -> ExpansionResult<Option<Occurrence<'_>>> {
        if !self.is_recurring() {
            return Ok(self.single_occurrence());
        }
        let target = self.key(recurrence_id);
        let (timeline, template) = self.timeline()?;
        let mut last = None;
        for t in timeline {
            if t >= target {
                return Ok(Some(self.materialize(t, template)));
            }
            last = Some(t);
        }
        Ok(last.map(|t| self.materialize(t, template)))
    }

    /// ## Summary
    /// True iff the series produces no occurrences at all.
    ///
    /// ## Errors
    /// Returns `MissingStart` for a recurring series without DTSTART.
    pub fn is_empty(&self) -> ExpansionResult<bool> {
        if !self.is_recurring() {
            return Ok(self.start.is_none());
        }
        let (mut timeline, _) = self.timeline()?;
        Ok(timeline.next().is_none())
    }

    fn reindex_ranges(&mut self) {
        self.range_index = self
            .exceptions
            .iter()
            .filter(|(_, e)| e.modifies_future)
            .map(|(key, _)| *key)
            .collect();
        self.range_diffs.get_mut().clear();
    }

    /// Rewrites the master's RRULE/RDATE/EXDATE from the structured state.
    fn write_back(&mut self) {
        for name in [names::RRULE, names::RDATE, names::EXDATE] {
            self.master.remove_properties(name);
        }
        for rule in &self.rules {
            self.master
                .add_property(Property::new(names::RRULE, Value::Recur(Box::new(rule.clone()))));
        }
        for rdate in &self.rdates {
            self.master.add_property(rdate.to_property(names::RDATE));
        }
        for exdate in &self.exdates {
            self.master.add_property(exdate.to_property(names::EXDATE));
        }
    }

    fn changed(&mut self, change: &SeriesChange) {
        self.write_back();
        self.resolved = OnceCell::new();
        self.range_diffs.get_mut().clear();
        self.observers.notify(change);
    }

    /// ## Errors
    /// Returns `ModificationNotAllowed` when locked.
    pub fn add_rule(&mut self, rule: RRule) -> ExpansionResult<()> {
        self.ensure_mutable()?;
        self.rules.push(rule);
        self.changed(&SeriesChange::RulesChanged);
        Ok(())
    }

    /// ## Errors
    /// Returns `ModificationNotAllowed` when locked.
    pub fn remove_rule(&mut self, rule: &RRule) -> ExpansionResult<bool> {
        self.ensure_mutable()?;
        let Some(pos) = self.rules.iter().position(|r| r == rule) else {
            return Ok(false);
        };
        self.rules.remove(pos);
        self.changed(&SeriesChange::RulesChanged);
        Ok(true)
    }

    /// ## Errors
    /// Returns `ModificationNotAllowed` when locked.
    pub fn clear_rules(&mut self) -> ExpansionResult<()> {
        self.ensure_mutable()?;
        self.rules.clear();
        self.changed(&SeriesChange::RulesChanged);
        Ok(())
    }

    /// Adds an RDATE unless one for the same instant exists.
    ///
    /// ## Errors
    /// Returns `ModificationNotAllowed` when locked.
    pub fn add_rdate(&mut self, value: TimeValue) -> ExpansionResult<()> {
        self.ensure_mutable()?;
        let key = self.key(&value);
        if self.rdates.iter().any(|v| self.key(v) == key) {
            return Ok(());
        }
        self.rdates.push(value);
        self.changed(&SeriesChange::InclusionsChanged);
        Ok(())
    }

    /// ## Errors
    /// Returns `ModificationNotAllowed` when locked.
    pub fn remove_rdate(&mut self, value: &TimeValue) -> ExpansionResult<bool> {
        self.ensure_mutable()?;
        let key = self.key(value);
        let kept: Vec<TimeValue> = self
            .rdates
            .iter()
            .filter(|v| self.key(v) != key)
            .cloned()
            .collect();
        if kept.len() == self.rdates.len() {
            return Ok(false);
        }
        self.rdates = kept;
        self.changed(&SeriesChange::InclusionsChanged);
        Ok(true)
    }

    /// Adds an EXDATE unless one for the same instant exists.
    ///
    /// ## Errors
    /// Returns `ModificationNotAllowed` when locked.
    pub fn add_exdate(&mut self, value: TimeValue) -> ExpansionResult<()> {
        self.ensure_mutable()?;
        let key = self.key(&value);
        if self.exdates.iter().any(|v| self.key(v) == key) {
            return Ok(());
        }
        self.exdates.push(value);
        self.changed(&SeriesChange::ExclusionsChanged);
        Ok(())
    }

    /// ## Errors
    /// Returns `ModificationNotAllowed` when locked.
    pub fn remove_exdate(&mut self, value: &TimeValue) -> ExpansionResult<bool> {
        self.ensure_mutable()?;
        let key = self.key(value);
        let kept: Vec<TimeValue> = self
            .exdates
            .iter()
            .filter(|v| self.key(v) != key)
            .cloned()
            .collect();
        if kept.len() == self.exdates.len() {
            return Ok(false);
        }
        self.exdates = kept;
        self.changed(&SeriesChange::ExclusionsChanged);
        Ok(true)
    }

    /// ## Summary
    /// Stores `component` as the exception at its RECURRENCE-ID, replacing
    /// any earlier one at the same instant.
    ///
    /// ## Errors
    /// `InvalidRecurrenceId` if the component has no usable RECURRENCE-ID,
    /// `ModificationNotAllowed` when locked.
    pub fn relate_exception(&mut self, component: Component) -> ExpansionResult<()> {
        self.ensure_mutable()?;
        let recurrence_id = component
            .recurrence_id()
            .ok_or_else(|| ExpansionError::InvalidRecurrenceId {
                uid: self.uid.clone(),
            })?;
        let key = self.key(&recurrence_id);
        let exception = RecurrenceException {
            modifies_future: component.modifies_future(),
            component,
            recurrence_id,
        };
        if self.exceptions.insert(key, exception).is_some() {
            tracing::debug!(uid = %self.uid, recurrence_id = key, "Replacing existing exception");
        }
        self.reindex_ranges();
        self.observers.notify(&SeriesChange::ExceptionRelated(key));
        Ok(())
    }

    /// ## Errors
    /// Returns `ModificationNotAllowed` when locked.
    pub fn remove_exception(&mut self, recurrence_id: &TimeValue) -> ExpansionResult<Option<Component>> {
        self.ensure_mutable()?;
        let key = self.key(recurrence_id);
        let removed = self.exceptions.remove(&key).map(|e| e.component);
        if removed.is_some() {
            self.reindex_ranges();
            self.observers.notify(&SeriesChange::ExceptionRemoved(key));
        }
        Ok(removed)
    }

    /// Moves EXDATEs and exception recurrence-ids that are not RDATEs, and
    /// every UNTIL, by `delta`.
    fn shift_dependents(&mut self, delta: TimeDelta) {
        let rdate_keys: HashSet<i64> = self.rdates.iter().map(|v| self.key(v)).collect();

        let exdates: Vec<TimeValue> = self
            .exdates
            .iter()
            .map(|v| {
                if rdate_keys.contains(&self.key(v)) {
                    v.clone()
                } else {
                    v.add_delta(delta)
                }
            })
            .collect();
        self.exdates = exdates;

        let exceptions = std::mem::take(&mut self.exceptions);
        for (key, mut exception) in exceptions {
            let key = if rdate_keys.contains(&key) {
                key
            } else {
                let shifted = exception.recurrence_id.add_delta(delta);
                let prop = exception
                    .component
                    .get_property(names::RECURRENCE_ID)
                    .map_or_else(
                        || shifted.to_property(names::RECURRENCE_ID),
                        |p| shifted.to_property_like(p),
                    );
                exception.component.set_property(prop);
                exception.recurrence_id = shifted;
                self.key(&exception.recurrence_id)
            };
            self.exceptions.insert(key, exception);
        }
        self.reindex_ranges();

        for rule in &mut self.rules {
            rule.until = rule.until.take().map(|until| match until {
                RecurUntil::Date(d) => RecurUntil::Date(
                    d.and_time(NaiveTime::MIN)
                        .checked_add_signed(delta)
                        .map_or(d, |moved| moved.date()),
                ),
                RecurUntil::DateTime(dt) => {
                    let local = dt.local.checked_add_signed(delta).unwrap_or(dt.local);
                    RecurUntil::DateTime(DateTime::new(local, dt.form))
                }
            });
        }
    }

    /// ## Summary
    /// Applies a change of the master start from `old_start` to `new_start`
    /// to the dependent recurrence data. RDATEs are never moved.
    ///
    /// ## Errors
    /// Returns `ModificationNotAllowed` when locked.
    pub fn update_start_date_shift(&mut self, new_start: &TimeValue, old_start: &TimeValue) -> ExpansionResult<()> {
        self.ensure_mutable()?;
        let delta = self.registry.subtract_with_timezone(new_start, old_start);
        if delta.is_zero() {
            return Ok(());
        }
        tracing::debug!(uid = %self.uid, seconds = delta.num_seconds(), "Shifting recurrence data");
        self.shift_dependents(delta);
        self.changed(&SeriesChange::StartChanged);
        Ok(())
    }

    /// ## Summary
    /// Sets DTSTART, moves DTEND/DUE by the same wall-clock distance and
    /// shifts the dependent recurrence data.
    ///
    /// ## Errors
    /// Returns `ModificationNotAllowed` when locked.
    pub fn set_start(&mut self, new_start: TimeValue) -> ExpansionResult<()> {
        self.ensure_mutable()?;
        let old_start = self.start.replace(new_start.clone());

        if let Some(old_start) = &old_start {
            let wall_shift = new_start.naive() - old_start.naive();
            for name in [names::DTEND, names::DUE] {
                let end = self
                    .master
                    .get_property(name)
                    .and_then(|p| TimeValue::from_value(&p.value));
                if let Some(end) = end {
                    self.master.set_property(end.add_delta(wall_shift).to_property(name));
                }
            }
            let delta = self.registry.subtract_with_timezone(&new_start, old_start);
            if !delta.is_zero() {
                self.shift_dependents(delta);
            }
        }

        self.master.set_property(new_start.to_property(names::DTSTART));
        self.changed(&SeriesChange::StartChanged);
        Ok(())
    }
}

impl Lockable for RecurrenceEngine {
    fn lock(&mut self) {
        self.locked = true;
    }

    fn is_locked(&self) -> bool {
        self.locked
    }

    fn ensure_mutable(&self) -> ExpansionResult<()> {
        if self.locked {
            return Err(ExpansionError::ModificationNotAllowed {
                uid: self.uid.clone(),
            });
        }
        Ok(())
    }
}

impl Observable for RecurrenceEngine {
    type Event = SeriesChange;

    fn subscribe(&mut self, observer: Observer<SeriesChange>) -> SubscriptionId {
        self.observers.add(observer)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.remove(id)
    }
}
