//! Groups the objects of a parsed document into UID-keyed series.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use calseries_core::constants::is_trivial_tzid;

use super::engine::{ExpansionOptions, MasterOrigin, RecurrenceEngine};
use super::error::ExpansionResult;
use super::lock::Lockable;
use super::timezone::{TimezoneEntry, TimezoneRegistry};
use crate::error::RfcResult;
use crate::rfc::ical::core::{Component, ICalendar, Property, names};
use crate::rfc::ical::parse::{parse, parse_component_text, split_lines};

/// Builds [`AssembledCalendar`]s against a shared timezone registry.
#[derive(Debug, Clone)]
pub struct ComponentAssembler {
    registry: Arc<TimezoneRegistry>,
    options: ExpansionOptions,
}

impl ComponentAssembler {
    #[must_use]
    pub fn new(registry: Arc<TimezoneRegistry>) -> Self {
        Self {
            registry,
            options: ExpansionOptions::default(),
        }
    }

    #[must_use]
    pub const fn with_options(mut self, options: ExpansionOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub const fn registry(&self) -> &Arc<TimezoneRegistry> {
        &self.registry
    }

    /// ## Summary
    /// Parses iCalendar text and assembles its series.
    ///
    /// VTIMEZONE blocks are registered before the document is parsed, so a
    /// zone defined after its first use still resolves.
    ///
    /// ## Errors
    /// Returns a parse error if the document is structurally malformed.
    #[tracing::instrument(skip(self, text), fields(text_len = text.len()))]
    pub fn assemble(&self, text: &str) -> RfcResult<AssembledCalendar> {
        let registered = self.register_embedded_timezones(text);
        tracing::debug!(timezones = registered, "Registered embedded timezones");
        let calendar = parse(text)?;
        Ok(self.assemble_calendar(&calendar))
    }

    /// Finds `BEGIN:VTIMEZONE` ... `END:VTIMEZONE` blocks in raw text and
    /// registers each. Blocks that fail to parse are logged and skipped.
    fn register_embedded_timezones(&self, text: &str) -> usize {
        let mut block: Option<Vec<String>> = None;
        let mut registered = 0;

        for (line_no, line) in split_lines(text) {
            let marker = line.trim_end().to_ascii_uppercase();
            if marker == "BEGIN:VTIMEZONE" {
                block = Some(Vec::new());
            }
            let Some(lines) = block.as_mut() else {
                continue;
            };
            lines.push(line);
            if marker != "END:VTIMEZONE" {
                continue;
            }

            let source = lines.join("\n");
            block = None;
            let result = parse_component_text(&source)
                .map_err(|e| e.to_string())
                .and_then(|component| {
                    self.registry
                        .register_vtimezone(&component)
                        .map_err(|e| e.to_string())
                });
            match result {
                Ok(entry) => {
                    tracing::trace!(tzid = %entry.id, "Registered VTIMEZONE");
                    registered += 1;
                }
                Err(error) => {
                    tracing::warn!(line = line_no, error = %error, "Skipping invalid VTIMEZONE");
                }
            }
        }

        registered
    }

    /// ## Summary
    /// Assembles the series of an already parsed calendar.
    ///
    /// Objects without a UID are skipped. Exceptions without a usable
    /// RECURRENCE-ID are dropped. Exceptions whose UID has no master get a
    /// forged one; a master that does not recur is promoted instead of
    /// replaced. Both carry one RDATE per exception.
    #[must_use]
    pub fn assemble_calendar(&self, calendar: &ICalendar) -> AssembledCalendar {
        let mut series: BTreeMap<String, RecurrenceEngine> = BTreeMap::new();
        let mut zone_ids: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut staged: Vec<(String, &Component)> = Vec::new();

        for component in calendar.series_members() {
            let Some(uid) = component.uid().map(str::to_string) else {
                tracing::warn!(kind = %component.kind, "Skipping component without UID");
                continue;
            };
            collect_zone_ids(component, zone_ids.entry(uid.clone()).or_default());

            if component.get_property(names::RECURRENCE_ID).is_some() {
                if component.recurrence_id().is_none() {
                    tracing::error!(uid = %uid, "Dropping exception with unparseable RECURRENCE-ID");
                    continue;
                }
                staged.push((uid, component));
                continue;
            }

            let engine = RecurrenceEngine::new(component.clone(), Arc::clone(&self.registry), self.options);
            if series.insert(uid.clone(), engine).is_some() {
                tracing::warn!(uid = %uid, "Duplicate master component, keeping the last one");
            }
        }

        for (uid, exception) in staged {
            let engine = series
                .entry(uid.clone())
                .or_insert_with(|| self.forge_master(&uid, exception));

            if engine.origin() == MasterOrigin::Declared && !engine.is_recurring() {
                tracing::debug!(uid = %uid, "Promoting non-recurring master to carry exceptions");
                engine.set_origin(MasterOrigin::Promoted);
            }

            if let Err(e) = relate(engine, exception) {
                tracing::error!(uid = %uid, error = %e, "Dropping exception");
            }
        }

        tracing::debug!(series = series.len(), "Assembled calendar");
        AssembledCalendar {
            series,
            zone_ids,
            registry: Arc::clone(&self.registry),
            locked: false,
        }
    }

    /// Minimal master standing in for a missing one: the exception's kind,
    /// UID and DTSTAMP, with DTSTART at its recurrence-id.
    fn forge_master(&self, uid: &str, exception: &Component) -> RecurrenceEngine {
        tracing::debug!(uid = %uid, "Forging master for orphan exception");
        let mut master = Component::named(&exception.name);
        master.add_property(Property::text(names::UID, uid));
        if let Some(stamp) = exception.get_property(names::DTSTAMP) {
            master.add_property(stamp.clone());
        }
        if let Some(recurrence_id) = exception.recurrence_id() {
            master.add_property(recurrence_id.to_property(names::DTSTART));
        }

        let mut engine = RecurrenceEngine::new(master, Arc::clone(&self.registry), self.options);
        engine.set_origin(MasterOrigin::Forged);
        engine
    }
}

/// Relates an exception, first giving forged and promoted masters an
/// RDATE at its recurrence-id. Each exception gets its own RDATE, so a
/// master standing in for several orphans keeps every one of them on the
/// timeline.
fn relate(engine: &mut RecurrenceEngine, exception: &Component) -> ExpansionResult<()> {
    if engine.is_forged()
        && let Some(recurrence_id) = exception.recurrence_id()
    {
        engine.add_rdate(recurrence_id)?;
    }
    engine.relate_exception(exception.clone())
}

/// Non-trivial TZIDs referenced by a component and its children.
fn collect_zone_ids(component: &Component, into: &mut BTreeSet<String>) {
    for tzid in component.properties.iter().filter_map(Property::tzid) {
        if !is_trivial_tzid(tzid) {
            into.insert(tzid.to_string());
        }
    }
    for child in &component.children {
        collect_zone_ids(child, into);
    }
}

/// The series of one document.
#[derive(Debug)]
pub struct AssembledCalendar {
    series: BTreeMap<String, RecurrenceEngine>,
    zone_ids: BTreeMap<String, BTreeSet<String>>,
    registry: Arc<TimezoneRegistry>,
    locked: bool,
}

impl AssembledCalendar {
    /// Every series, ordered by UID.
    pub fn all_series(&self) -> impl Iterator<Item = &RecurrenceEngine> {
        self.series.values()
    }

    #[must_use]
    pub fn series(&self, uid: &str) -> Option<&RecurrenceEngine> {
        self.series.get(uid)
    }

    pub fn series_mut(&mut self, uid: &str) -> Option<&mut RecurrenceEngine> {
        self.series.get_mut(uid)
    }

    pub fn uids(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Zone ids the series' components reference, excluding UTC, floating,
    /// `GMT` and `Z`.
    #[must_use]
    pub fn zone_ids(&self, uid: &str) -> Vec<&str> {
        self.zone_ids
            .get(uid)
            .map(|ids| ids.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Registry entries for [`Self::zone_ids`], skipping unknown ids.
    #[must_use]
    pub fn timezones_for(&self, uid: &str) -> Vec<Arc<TimezoneEntry>> {
        self.zone_ids(uid)
            .into_iter()
            .filter_map(|tzid| self.registry.resolve(tzid))
            .collect()
    }

    #[must_use]
    pub const fn registry(&self) -> &Arc<TimezoneRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn into_series(self) -> Vec<RecurrenceEngine> {
        self.series.into_values().collect()
    }
}

impl Lockable for AssembledCalendar {
    /// Locks the calendar and every series in it.
    fn lock(&mut self) {
        self.locked = true;
        for engine in self.series.values_mut() {
            engine.lock();
        }
    }

    fn is_locked(&self) -> bool {
        self.locked
    }

    fn ensure_mutable(&self) -> ExpansionResult<()> {
        self.series.values().try_for_each(Lockable::ensure_mutable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfc::ical::core::TimeValue;
    use crate::rfc::ical::expand::ExpansionError;

    fn assemble(text: &str) -> AssembledCalendar {
        ComponentAssembler::new(Arc::new(TimezoneRegistry::new()))
            .assemble(text)
            .unwrap()
    }

    #[test_log::test]
    fn skips_missing_uid_and_bad_recurrence_id() {
        let calendar = assemble(
            "BEGIN:VCALENDAR\n\
BEGIN:VEVENT\n\
DTSTART:20240101T090000Z\n\
END:VEVENT\n\
BEGIN:VEVENT\n\
UID:bad-rid\n\
RECURRENCE-ID:not-a-date\n\
DTSTART:20240101T090000Z\n\
END:VEVENT\n\
BEGIN:VEVENT\n\
UID:ok\n\
DTSTART:20240101T090000Z\n\
END:VEVENT\n\
END:VCALENDAR\n",
        );
        assert_eq!(calendar.uids().collect::<Vec<_>>(), vec!["ok"]);
    }

    #[test_log::test]
    fn duplicate_master_keeps_last() {
        let calendar = assemble(
            "BEGIN:VCALENDAR\n\
BEGIN:VEVENT\n\
UID:dup\n\
SUMMARY:first\n\
DTSTART:20240101T090000Z\n\
END:VEVENT\n\
BEGIN:VEVENT\n\
UID:dup\n\
SUMMARY:second\n\
DTSTART:20240102T090000Z\n\
END:VEVENT\n\
END:VCALENDAR\n",
        );
        assert_eq!(calendar.len(), 1);
        assert_eq!(calendar.series("dup").unwrap().master().summary(), Some("second"));
    }

    #[test]
    fn forged_master_carries_recurrence_id() {
        let calendar = assemble(
            "BEGIN:VCALENDAR\n\
BEGIN:VTODO\n\
UID:orphan\n\
DTSTAMP:20240101T000000Z\n\
RECURRENCE-ID:20240105T100000Z\n\
DTSTART:20240105T120000Z\n\
END:VTODO\n\
END:VCALENDAR\n",
        );
        let series = calendar.series("orphan").unwrap();
        assert_eq!(series.origin(), MasterOrigin::Forged);
        assert!(series.is_forged());
        assert!(series.is_recurring());
        assert_eq!(series.master().name, "VTODO");
        assert!(series.master().get_property("DTSTAMP").is_some());

        let rid = series.exceptions().next().unwrap().recurrence_id.clone();
        assert_eq!(series.rdates(), std::slice::from_ref(&rid));
        assert_eq!(series.start(), Some(&rid));

        let occurrence = series.occurrence_at(&rid).unwrap().unwrap();
        assert_eq!(occurrence.start.to_string(), "20240105T120000Z");
    }

    #[test]
    fn non_recurring_master_is_promoted() {
        let calendar = assemble(
            "BEGIN:VCALENDAR\n\
BEGIN:VEVENT\n\
UID:single\n\
SUMMARY:master\n\
DTSTART:20240301T090000Z\n\
END:VEVENT\n\
BEGIN:VEVENT\n\
UID:single\n\
SUMMARY:moved\n\
RECURRENCE-ID:20240308T090000Z\n\
DTSTART:20240308T110000Z\n\
END:VEVENT\n\
END:VCALENDAR\n",
        );
        let series = calendar.series("single").unwrap();
        assert_eq!(series.origin(), MasterOrigin::Promoted);
        assert_eq!(series.master().summary(), Some("master"));

        let window = (
            TimeValue::Date(chrono::NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()),
            TimeValue::Date(chrono::NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()),
        );
        let summaries: Vec<String> = series
            .occurrences_between(&window.0, &window.1)
            .unwrap()
            .map(|o| o.summary().unwrap_or_default().to_string())
            .collect();
        assert_eq!(summaries, vec!["master", "moved"]);
    }

    #[test]
    fn collects_zone_ids_and_registers_late_timezones() {
        let calendar = assemble(
            "BEGIN:VCALENDAR\n\
BEGIN:VEVENT\n\
UID:zoned\n\
DTSTART;TZID=Custom/Zone:20240101T090000\n\
DTEND;TZID=UTC:20240101T100000\n\
BEGIN:VALARM\n\
TRIGGER;VALUE=DATE-TIME;TZID=Alarm/Zone:20240101T080000\n\
END:VALARM\n\
END:VEVENT\n\
BEGIN:VTIMEZONE\n\
TZID:Custom/Zone\n\
BEGIN:STANDARD\n\
DTSTART:19700101T000000\n\
TZOFFSETFROM:+0300\n\
TZOFFSETTO:+0300\n\
END:STANDARD\n\
END:VTIMEZONE\n\
END:VCALENDAR\n",
        );
        assert_eq!(calendar.zone_ids("zoned"), vec!["Alarm/Zone", "Custom/Zone"]);
        let zones = calendar.timezones_for("zoned");
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].id, "Custom/Zone");
        assert!(zones[0].definition.is_some());
        assert!(calendar.zone_ids("missing").is_empty());
    }

    #[test]
    fn locking_calendar_locks_series() {
        let mut calendar = assemble(
            "BEGIN:VCALENDAR\n\
BEGIN:VEVENT\n\
UID:locked\n\
DTSTART:20240101T090000Z\n\
END:VEVENT\n\
END:VCALENDAR\n",
        );
        assert!(calendar.ensure_mutable().is_ok());
        calendar.lock();
        assert!(calendar.is_locked());
        assert!(matches!(
            calendar.ensure_mutable(),
            Err(ExpansionError::ModificationNotAllowed { .. })
        ));
        let series = calendar.series_mut("locked").unwrap();
        assert!(series.clear_rules().is_err());
    }
}
