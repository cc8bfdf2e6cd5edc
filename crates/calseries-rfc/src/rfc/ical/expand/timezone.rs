//! Timezone registry: known zones, name aliases, and UTC conversion.
//!
//! Uses ICU4X for Windows timezone ID to IANA mapping and timezone
//! canonicalization, and `chrono-tz` for the IANA database itself.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::str::FromStr;
use std::sync::{Arc, LazyLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use calseries_core::constants::{
    FLOATING_TZID, MAX_ALIAS_DEPTH, UTC_ALIASES, UTC_TZID, VENDOR_TZID_PREFIXES,
};
use chrono::{NaiveDateTime, TimeDelta, TimeZone};
use chrono_tz::Tz;
use icu::time::zone::WindowsParser;
use icu::time::zone::iana::IanaParserExtended;

use super::error::TimezoneError;
use super::vtimezone::VTimezone;
use crate::rfc::ical::core::{Component, DateTime, DateTimeForm, TimeValue};

/// How an entry turns wall-clock readings into instants.
#[derive(Debug, Clone)]
pub enum ZoneDefinition {
    Utc,
    Floating,
    Iana(Tz),
    Custom(VTimezone),
}

/// A registered zone.
#[derive(Debug, Clone)]
pub struct TimezoneEntry {
    pub id: String,
    /// The VTIMEZONE this entry was built from, if any.
    pub definition: Option<Component>,
    pub zone: ZoneDefinition,
}

impl TimezoneEntry {
    #[must_use]
    pub fn utc() -> Self {
        Self {
            id: UTC_TZID.to_string(),
            definition: None,
            zone: ZoneDefinition::Utc,
        }
    }

    #[must_use]
    pub fn floating() -> Self {
        Self {
            id: FLOATING_TZID.to_string(),
            definition: None,
            zone: ZoneDefinition::Floating,
        }
    }

    #[must_use]
    pub fn iana(tz: Tz) -> Self {
        Self {
            id: tz.name().to_string(),
            definition: None,
            zone: ZoneDefinition::Iana(tz),
        }
    }

    /// ## Summary
    /// Builds an entry from a VTIMEZONE component, keyed by its TZID.
    ///
    /// ## Errors
    /// Returns `TimezoneError::InvalidDefinition` if the component is not a
    /// usable VTIMEZONE.
    pub fn from_vtimezone(component: Component) -> Result<Self, TimezoneError> {
        let vtimezone = VTimezone::parse(&component)?;
        Ok(Self {
            id: vtimezone.tzid.clone(),
            definition: Some(component),
            zone: ZoneDefinition::Custom(vtimezone),
        })
    }

    #[must_use]
    pub const fn is_floating(&self) -> bool {
        matches!(self.zone, ZoneDefinition::Floating)
    }

    /// Converts a wall-clock reading to UTC.
    ///
    /// Times inside a DST gap are moved forward one hour; times inside a
    /// fold resolve to the earlier instant. Floating readings are taken
    /// as UTC.
    #[must_use]
    pub fn to_utc(&self, local: NaiveDateTime) -> NaiveDateTime {
        match &self.zone {
            ZoneDefinition::Utc | ZoneDefinition::Floating => local,
            ZoneDefinition::Custom(vtimezone) => vtimezone.to_utc(local),
            ZoneDefinition::Iana(tz) => tz
                .from_local_datetime(&local)
                .earliest()
                .or_else(|| {
                    tz.from_local_datetime(&(local + TimeDelta::hours(1)))
                        .earliest()
                })
                .map_or(local, |dt| dt.naive_utc()),
        }
    }

    /// Converts a UTC instant to this zone's wall clock.
    #[must_use]
    pub fn from_utc(&self, utc: NaiveDateTime) -> NaiveDateTime {
        match &self.zone {
            ZoneDefinition::Utc | ZoneDefinition::Floating => utc,
            ZoneDefinition::Custom(vtimezone) => vtimezone.from_utc(utc),
            ZoneDefinition::Iana(tz) => tz.from_utc_datetime(&utc).naive_local(),
        }
    }
}

#[derive(Debug, Default)]
struct RegistryState {
    zones: HashMap<String, Arc<TimezoneEntry>>,
    aliases: HashMap<String, String>,
    /// Aliases whose target is not registered yet.
    pending: HashMap<String, String>,
}

impl RegistryState {
    fn with_builtins() -> Self {
        let mut state = Self::default();
        for entry in [TimezoneEntry::utc(), TimezoneEntry::floating()] {
            state.zones.insert(entry.id.clone(), Arc::new(entry));
        }
        for alias in UTC_ALIASES {
            state.aliases.insert(alias.to_string(), UTC_TZID.to_string());
        }
        state
    }

    fn knows(&self, id: &str) -> bool {
        self.zones.contains_key(id) || self.aliases.contains_key(id)
    }

    /// Promotes pending aliases whose target has become known. Repeats
    /// until stable so chains of pending aliases fill in one call.
    fn fill_pending(&mut self) {
        loop {
            let ready: Vec<String> = self
                .pending
                .iter()
                .filter(|(_, target)| self.knows(target))
                .map(|(name, _)| name.clone())
                .collect();
            if ready.is_empty() {
                break;
            }
            for name in ready {
                if let Some(target) = self.pending.remove(&name) {
                    tracing::debug!(alias = %name, target = %target, "Pending timezone alias resolved");
                    self.aliases.insert(name, target);
                }
            }
        }
    }

    fn resolve(&self, id: &str) -> Result<Arc<TimezoneEntry>, TimezoneError> {
        let mut visited = HashSet::new();
        let mut current = id;
        let mut hops = 0;
        loop {
            if let Some(entry) = self.zones.get(current) {
                return Ok(Arc::clone(entry));
            }
            let Some(next) = self.aliases.get(current) else {
                return Err(TimezoneError::NotFound(id.to_string()));
            };
            if !visited.insert(current) {
                return Err(TimezoneError::AliasCycle(id.to_string()));
            }
            hops += 1;
            if hops > MAX_ALIAS_DEPTH {
                return Err(TimezoneError::AliasDepthExceeded {
                    tzid: id.to_string(),
                    limit: MAX_ALIAS_DEPTH,
                });
            }
            current = next;
        }
    }
}

/// Registry of known zones and aliases.
///
/// State sits behind an internal `RwLock`, so an `Arc<TimezoneRegistry>` can
/// be shared between the assembler, every engine it creates, and other
/// threads. Construct one explicitly and pass it in; [`TimezoneRegistry::global`]
/// exists for call sites that have nothing to inject.
#[derive(Debug)]
pub struct TimezoneRegistry {
    state: RwLock<RegistryState>,
}

static GLOBAL: LazyLock<Arc<TimezoneRegistry>> = LazyLock::new(|| Arc::new(TimezoneRegistry::new()));

impl TimezoneRegistry {
    /// Creates a registry holding the built-in zones.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RegistryState::with_builtins()),
        }
    }

    /// Process-wide shared registry.
    #[must_use]
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL)
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// ## Summary
    /// Stores or replaces an entry and resolves any pending alias that was
    /// waiting for it.
    pub fn register(&self, entry: TimezoneEntry) -> Arc<TimezoneEntry> {
        let entry = Arc::new(entry);
        let mut state = self.write();
        tracing::debug!(tzid = %entry.id, "Registering timezone");
        state.zones.insert(entry.id.clone(), Arc::clone(&entry));
        state.fill_pending();
        entry
    }

    /// ## Summary
    /// Stores an entry under an explicit id, which may differ from the
    /// TZID inside its definition.
    pub fn register_as(&self, id: &str, mut entry: TimezoneEntry) -> Arc<TimezoneEntry> {
        id.clone_into(&mut entry.id);
        self.register(entry)
    }

    /// ## Summary
    /// Parses and registers a VTIMEZONE component.
    ///
    /// ## Errors
    /// Returns `TimezoneError::InvalidDefinition` if the component is not a
    /// usable VTIMEZONE.
    pub fn register_vtimezone(&self, component: &Component) -> Result<Arc<TimezoneEntry>, TimezoneError> {
        let entry = TimezoneEntry::from_vtimezone(component.clone())?;
        Ok(self.register(entry))
    }

    /// ## Summary
    /// Registers `name` as an alias of `target`. If `target` is not known
    /// yet the alias is queued and promoted once it is registered.
    pub fn register_alias(&self, name: &str, target: &str) {
        let mut state = self.write();
        if state.knows(target) {
            state.pending.remove(name);
            state.aliases.insert(name.to_string(), target.to_string());
            state.fill_pending();
        } else {
            tracing::debug!(alias = %name, target = %target, "Queueing timezone alias until target is registered");
            state.pending.insert(name.to_string(), target.to_string());
        }
    }

    /// ## Summary
    /// Resolves an id to its entry, following aliases.
    ///
    /// ## Errors
    /// `NotFound` for unknown ids, `AliasCycle` or `AliasDepthExceeded`
    /// when the alias chain does not terminate within [`MAX_ALIAS_DEPTH`]
    /// hops.
    pub fn try_resolve(&self, id: &str) -> Result<Arc<TimezoneEntry>, TimezoneError> {
        self.read().resolve(id)
    }

    /// Like [`Self::try_resolve`], but logs and returns `None` on failure.
    #[must_use]
    pub fn resolve(&self, id: &str) -> Option<Arc<TimezoneEntry>> {
        match self.try_resolve(id) {
            Ok(entry) => Some(entry),
            Err(TimezoneError::NotFound(_)) => {
                tracing::trace!(tzid = %id, "Timezone not registered");
                None
            }
            Err(e) => {
                tracing::warn!(tzid = %id, error = %e, "Timezone alias resolution failed");
                None
            }
        }
    }

    #[must_use]
    pub fn has(&self, id: &str) -> bool {
        self.read().knows(id)
    }

    /// Registered ids in sorted order, optionally with aliases (pending
    /// aliases included).
    #[must_use]
    pub fn list_all(&self, include_aliases: bool) -> Vec<String> {
        let state = self.read();
        let mut ids: BTreeSet<&String> = state.zones.keys().collect();
        if include_aliases {
            ids.extend(state.aliases.keys());
            ids.extend(state.pending.keys());
        }
        ids.into_iter().cloned().collect()
    }

    pub fn unregister(&self, id: &str) -> Option<Arc<TimezoneEntry>> {
        self.write().zones.remove(id)
    }

    pub fn unregister_alias(&self, name: &str) -> bool {
        let mut state = self.write();
        let removed = state.aliases.remove(name).is_some();
        state.pending.remove(name).is_some() || removed
    }

    /// Drops everything and reinstates the built-in zones.
    pub fn reset(&self) {
        *self.write() = RegistryState::with_builtins();
    }

    /// ## Summary
    /// Returns the entry a DATE-TIME's TZID refers to.
    ///
    /// Unregistered ids are normalized and looked up in the IANA database;
    /// a hit is registered for next time. Anything else falls back to the
    /// floating zone.
    pub fn zone_for(&self, tzid: &str) -> Arc<TimezoneEntry> {
        if let Some(entry) = self.resolve(tzid) {
            return entry;
        }

        let normalized = normalize_tzid(tzid);
        if let Ok(tz) = Tz::from_str(&normalized) {
            let entry = self.register(TimezoneEntry::iana(tz));
            if entry.id != tzid {
                self.register_alias(tzid, &entry.id);
            }
            return entry;
        }

        tracing::warn!(tzid = %tzid, "Unknown timezone, treating as floating");
        self.resolve(FLOATING_TZID)
            .unwrap_or_else(|| Arc::new(TimezoneEntry::floating()))
    }

    fn zone_of(&self, value: &TimeValue) -> Option<Arc<TimezoneEntry>> {
        value.tzid().map(|tzid| self.zone_for(tzid))
    }

    /// UTC reading of a value. DATE and floating values read as UTC.
    #[must_use]
    pub fn to_utc(&self, value: &TimeValue) -> NaiveDateTime {
        let local = value.naive();
        self.zone_of(value).map_or(local, |zone| zone.to_utc(local))
    }

    /// Seconds since the Unix epoch.
    #[must_use]
    pub fn unix_time(&self, value: &TimeValue) -> i64 {
        self.to_utc(value).and_utc().timestamp()
    }

    /// Builds a value for the instant `unix` in the same form as `template`
    /// (DATE, floating, UTC, or the template's zone).
    #[must_use]
    pub fn time_value_at(&self, unix: i64, template: &TimeValue) -> TimeValue {
        let utc = chrono::DateTime::from_timestamp(unix, 0)
            .unwrap_or_default()
            .naive_utc();
        match template {
            TimeValue::Date(_) => TimeValue::Date(utc.date()),
            TimeValue::DateTime(dt) => match &dt.form {
                DateTimeForm::Utc | DateTimeForm::Floating => {
                    TimeValue::DateTime(DateTime::new(utc, dt.form.clone()))
                }
                DateTimeForm::Zoned { tzid } => {
                    let local = self.zone_for(tzid).from_utc(utc);
                    TimeValue::DateTime(DateTime::zoned(local, tzid.clone()))
                }
            },
        }
    }

    /// Absolute difference `a - b`, honoring each value's zone.
    #[must_use]
    pub fn subtract_with_timezone(&self, a: &TimeValue, b: &TimeValue) -> TimeDelta {
        self.to_utc(a) - self.to_utc(b)
    }
}

impl Default for TimezoneRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalizes common CalDAV/iCalendar timezone identifiers to IANA names.
///
/// Strips vendor prefixes, maps Windows zone names through ICU and
/// canonicalizes IANA aliases (`Europe/Kiev` -> `Europe/Kyiv`).
#[must_use]
pub fn normalize_tzid(tzid: &str) -> String {
    let stripped = VENDOR_TZID_PREFIXES
        .iter()
        .find_map(|prefix| tzid.strip_prefix(prefix))
        .unwrap_or(tzid)
        .trim_start_matches('/');

    let windows_parser = WindowsParser::new();
    if let Some(tz) = windows_parser.parse(stripped, None) {
        let iana_parser = IanaParserExtended::new();
        for entry in iana_parser.iter() {
            if entry.time_zone == tz {
                return entry.canonical.to_string();
            }
        }
    }

    let iana_parser = IanaParserExtended::new();
    let parsed = iana_parser.parse(stripped);
    if parsed.time_zone != icu::time::TimeZone::UNKNOWN {
        return parsed.canonical.to_string();
    }

    stripped.to_string()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn builtins_present_after_reset() {
        let registry = TimezoneRegistry::new();
        registry.register(TimezoneEntry::iana(Tz::Europe__Berlin));
        registry.register_alias("Berlin", "Europe/Berlin");
        registry.reset();

        assert!(!registry.has("Europe/Berlin"));
        assert!(!registry.has("Berlin"));
        assert_eq!(registry.resolve("GMT").unwrap().id, UTC_TZID);
        assert_eq!(registry.resolve("Z").unwrap().id, UTC_TZID);
        assert!(registry.resolve(FLOATING_TZID).unwrap().is_floating());
        assert_eq!(
            registry.list_all(true),
            vec!["GMT".to_string(), "UTC".to_string(), "Z".to_string(), "floating".to_string()]
        );
        assert_eq!(registry.list_all(false), vec!["UTC".to_string(), "floating".to_string()]);
    }

    #[test_log::test]
    fn pending_alias_fills_on_register() {
        let registry = TimezoneRegistry::new();
        registry.register_alias("Foo/Bar", "America/New_York");
        assert!(registry.resolve("Foo/Bar").is_none());

        registry.register(TimezoneEntry::iana(Tz::America__New_York));
        let alias = registry.resolve("Foo/Bar").unwrap();
        let target = registry.resolve("America/New_York").unwrap();
        assert!(Arc::ptr_eq(&alias, &target));
    }

    #[test]
    fn pending_alias_chain_fills() {
        let registry = TimezoneRegistry::new();
        registry.register_alias("A", "B");
        registry.register_alias("B", "C");
        registry.register(TimezoneEntry::iana(Tz::Asia__Tokyo));
        registry.register_alias("C", "Asia/Tokyo");
        assert_eq!(registry.resolve("A").unwrap().id, "Asia/Tokyo");
    }

    #[test_log::test]
    fn alias_cycles_terminate() {
        let registry = TimezoneRegistry::new();
        registry.register_alias("A", "UTC");
        registry.register_alias("B", "A");
        registry.register_alias("A", "B");
        assert!(matches!(registry.try_resolve("A"), Err(TimezoneError::AliasCycle(_))));
        assert!(registry.resolve("B").is_none());
    }

    #[test]
    fn long_chains_hit_depth_bound() {
        let registry = TimezoneRegistry::new();
        registry.register_alias("link0", "UTC");
        for i in 1..=MAX_ALIAS_DEPTH + 1 {
            registry.register_alias(&format!("link{i}"), &format!("link{}", i - 1));
        }
        assert!(registry.resolve(&format!("link{}", MAX_ALIAS_DEPTH - 1)).is_some());
        assert!(matches!(
            registry.try_resolve(&format!("link{}", MAX_ALIAS_DEPTH + 1)),
            Err(TimezoneError::AliasDepthExceeded { .. })
        ));
    }

    #[test]
    fn unregister_alias_removes_pending() {
        let registry = TimezoneRegistry::new();
        registry.register_alias("Later", "Nowhere/Yet");
        assert!(!registry.has("Later"));
        assert!(registry.list_all(true).contains(&"Later".to_string()));
        assert!(registry.unregister_alias("Later"));
        assert!(!registry.list_all(true).contains(&"Later".to_string()));
        assert!(!registry.unregister_alias("Later"));
    }

    #[test]
    fn zone_for_falls_back_to_iana_then_floating() {
        let registry = TimezoneRegistry::new();
        let zone = registry.zone_for("Europe/Paris");
        assert!(matches!(zone.zone, ZoneDefinition::Iana(Tz::Europe__Paris)));
        assert!(registry.has("Europe/Paris"));

        let windows = registry.zone_for("Eastern Standard Time");
        assert_eq!(windows.id, "America/New_York");
        assert!(registry.has("Eastern Standard Time"));

        assert!(registry.zone_for("Not/AZone").is_floating());
    }

    #[test]
    fn normalizes_vendor_prefixes() {
        assert_eq!(normalize_tzid("/mozilla.org/20050126_1/America/New_York"), "America/New_York");
        assert_eq!(normalize_tzid("Pacific Standard Time"), "America/Los_Angeles");
    }

    #[test]
    fn gaps_move_forward_and_folds_pick_earlier() {
        let entry = TimezoneEntry::iana(Tz::America__New_York);
        // 02:30 does not exist on 2024-03-10.
        assert_eq!(entry.to_utc(at(2024, 3, 10, 2, 30)), at(2024, 3, 10, 7, 30));
        // 01:30 happens twice on 2024-11-03; EDT first.
        assert_eq!(entry.to_utc(at(2024, 11, 3, 1, 30)), at(2024, 11, 3, 5, 30));
    }

    #[test]
    fn time_values_round_trip_through_instants() {
        let registry = TimezoneRegistry::new();
        let value = TimeValue::DateTime(DateTime::zoned(at(2024, 7, 4, 9, 0), "America/New_York"));
        let unix = registry.unix_time(&value);
        assert_eq!(unix, at(2024, 7, 4, 13, 0).and_utc().timestamp());
        assert_eq!(registry.time_value_at(unix, &value), value);

        let date = TimeValue::Date(NaiveDate::from_ymd_opt(2019, 8, 18).unwrap());
        assert_eq!(registry.unix_time(&date), at(2019, 8, 18, 0, 0).and_utc().timestamp());

        let utc = TimeValue::DateTime(DateTime::utc(at(2024, 7, 4, 12, 0)));
        assert_eq!(
            registry.subtract_with_timezone(&value, &utc),
            TimeDelta::hours(1)
        );
    }
}
