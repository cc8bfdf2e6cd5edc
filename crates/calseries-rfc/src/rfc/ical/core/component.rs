//! Components (RFC 5545 §3.4-3.6).

use calseries_core::constants::DEFAULT_PRODID;

use super::{Property, TimeValue, names};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Calendar,
    Event,
    Todo,
    Journal,
    FreeBusy,
    Timezone,
    Alarm,
    Standard,
    Daylight,
    Unknown,
}

impl ComponentKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Calendar => "VCALENDAR",
            Self::Event => "VEVENT",
            Self::Todo => "VTODO",
            Self::Journal => "VJOURNAL",
            Self::FreeBusy => "VFREEBUSY",
            Self::Timezone => "VTIMEZONE",
            Self::Alarm => "VALARM",
            Self::Standard => "STANDARD",
            Self::Daylight => "DAYLIGHT",
            Self::Unknown => "X-UNKNOWN",
        }
    }

    /// Case-insensitive parse; anything unrecognised is [`Self::Unknown`].
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "VCALENDAR" => Self::Calendar,
            "VEVENT" => Self::Event,
            "VTODO" => Self::Todo,
            "VJOURNAL" => Self::Journal,
            "VFREEBUSY" => Self::FreeBusy,
            "VTIMEZONE" => Self::Timezone,
            "VALARM" => Self::Alarm,
            "STANDARD" => Self::Standard,
            "DAYLIGHT" => Self::Daylight,
            _ => Self::Unknown,
        }
    }

    /// Kinds that form UID-keyed series.
    #[must_use]
    pub const fn is_series_member(self) -> bool {
        matches!(self, Self::Event | Self::Todo | Self::Journal | Self::FreeBusy)
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A component with its properties in document order and nested children.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub kind: ComponentKind,
    /// Name as written, preserved for X- components.
    pub name: String,
    pub properties: Vec<Property>,
    pub children: Vec<Component>,
}

impl Component {
    #[must_use]
    pub fn new(kind: ComponentKind) -> Self {
        Self {
            kind,
            name: kind.as_str().to_string(),
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Creates a component from its written name.
    #[must_use]
    pub fn named(name: &str) -> Self {
        Self {
            kind: ComponentKind::parse(name),
            name: name.to_ascii_uppercase(),
            properties: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn add_property(&mut self, prop: Property) {
        self.properties.push(prop);
    }

    /// Replaces every property named like `prop` with `prop`.
    pub fn set_property(&mut self, prop: Property) {
        self.remove_properties(&prop.name);
        self.properties.push(prop);
    }

    pub fn remove_properties(&mut self, name: &str) {
        self.properties.retain(|p| !p.name.eq_ignore_ascii_case(name));
    }

    pub fn add_child(&mut self, child: Component) {
        self.children.push(child);
    }

    #[must_use]
    pub fn get_property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn get_properties<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Property> + 'a {
        self.properties
            .iter()
            .filter(move |p| p.name.eq_ignore_ascii_case(name))
    }

    #[must_use]
    pub fn children_of_kind(&self, kind: ComponentKind) -> Vec<&Component> {
        self.children.iter().filter(|c| c.kind == kind).collect()
    }

    #[must_use]
    pub fn uid(&self) -> Option<&str> {
        let uid = self.get_property(names::UID)?;
        uid.as_text().or(Some(uid.raw_value.as_str()))
    }

    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.get_property(names::SUMMARY)?.as_text()
    }

    fn time_value(&self, name: &str) -> Option<TimeValue> {
        TimeValue::from_value(&self.get_property(name)?.value)
    }

    /// DTSTART.
    #[must_use]
    pub fn start(&self) -> Option<TimeValue> {
        self.time_value(names::DTSTART)
    }

    /// DTEND, or DUE for to-dos.
    #[must_use]
    pub fn end(&self) -> Option<TimeValue> {
        self.time_value(names::DTEND)
            .or_else(|| self.time_value(names::DUE))
    }

    #[must_use]
    pub fn duration(&self) -> Option<super::Duration> {
        self.get_property(names::DURATION)?.value.as_duration().copied()
    }

    #[must_use]
    pub fn recurrence_id(&self) -> Option<TimeValue> {
        self.time_value(names::RECURRENCE_ID)
    }

    /// Whether the RECURRENCE-ID carries `RANGE=THISANDFUTURE`.
    #[must_use]
    pub fn modifies_future(&self) -> bool {
        self.get_property(names::RECURRENCE_ID)
            .and_then(|p| p.get_param(names::RANGE))
            .is_some_and(|r| r.has_value(names::THISANDFUTURE))
    }

    /// Clones this component as the instance at `recurrence_id` starting at
    /// `start`.
    ///
    /// Recurrence definitions are removed, RECURRENCE-ID and DTSTART are set,
    /// and DTEND/DUE move by the same wall-clock distance as DTSTART.
    #[must_use]
    pub fn fork_at(&self, recurrence_id: &TimeValue, start: &TimeValue) -> Self {
        let mut fork = self.clone();
        for name in [names::RRULE, names::RDATE, names::EXDATE, names::EXRULE] {
            fork.remove_properties(name);
        }

        let shift = self.start().map(|old| start.naive() - old.naive());
        for name in [names::DTEND, names::DUE] {
            if let (Some(shift), Some(end)) = (shift, self.time_value(name)) {
                fork.set_property(end.add_delta(shift).to_property(name));
            }
        }

        fork.set_property(start.to_property(names::DTSTART));
        fork.set_property(recurrence_id.to_property(names::RECURRENCE_ID));
        fork
    }
}

/// A parsed VCALENDAR.
#[derive(Debug, Clone, PartialEq)]
pub struct ICalendar {
    pub root: Component,
}

impl ICalendar {
    #[must_use]
    pub fn new(prodid: impl Into<String>) -> Self {
        let mut root = Component::new(ComponentKind::Calendar);
        root.add_property(Property::text("VERSION", "2.0"));
        root.add_property(Property::text("PRODID", prodid));
        Self { root }
    }

    #[must_use]
    pub fn prodid(&self) -> Option<&str> {
        self.root.get_property("PRODID")?.as_text()
    }

    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.root.get_property("VERSION")?.as_text()
    }

    #[must_use]
    pub fn timezones(&self) -> Vec<&Component> {
        self.root.children_of_kind(ComponentKind::Timezone)
    }

    /// Direct children that belong to a UID-keyed series.
    pub fn series_members(&self) -> impl Iterator<Item = &Component> {
        self.root
            .children
            .iter()
            .filter(|c| c.kind.is_series_member())
    }
}

impl Default for ICalendar {
    fn default() -> Self {
        Self::new(DEFAULT_PRODID)
    }
}
