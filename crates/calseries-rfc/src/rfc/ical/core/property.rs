//! Properties (RFC 5545 §3.1, §3.8).

use super::{Parameter, Value};

/// A parsed property: name, parameters, typed value, and the raw text it
/// was parsed from.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Upper-cased property name.
    pub name: String,
    pub params: Vec<Parameter>,
    pub value: Value,
    pub raw_value: String,
}

impl Property {
    /// Creates a property whose raw text is rendered from `value`.
    #[must_use]
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        let raw_value = value.to_string();
        Self {
            name: name.into().to_ascii_uppercase(),
            params: Vec::new(),
            value,
            raw_value,
        }
    }

    #[must_use]
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, Value::Text(value.into()))
    }

    #[must_use]
    pub fn with_param(mut self, param: Parameter) -> Self {
        self.set_param(param);
        self
    }

    #[must_use]
    pub fn get_param(&self, name: &str) -> Option<&Parameter> {
        self.params.iter().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    #[must_use]
    pub fn param_value(&self, name: &str) -> Option<&str> {
        self.get_param(name)?.value()
    }

    /// Replaces any parameter with the same name.
    pub fn set_param(&mut self, param: Parameter) {
        self.params.retain(|p| p.name != param.name);
        self.params.push(param);
    }

    pub fn remove_param(&mut self, name: &str) {
        self.params.retain(|p| !p.name.eq_ignore_ascii_case(name));
    }

    #[must_use]
    pub fn tzid(&self) -> Option<&str> {
        self.param_value(names::TZID)
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        self.value.as_text()
    }
}

/// Property and parameter names used by the recurrence machinery.
pub mod names {
    pub const UID: &str = "UID";
    pub const DTSTAMP: &str = "DTSTAMP";
    pub const DTSTART: &str = "DTSTART";
    pub const DTEND: &str = "DTEND";
    pub const DUE: &str = "DUE";
    pub const DURATION: &str = "DURATION";
    pub const SUMMARY: &str = "SUMMARY";
    pub const RECURRENCE_ID: &str = "RECURRENCE-ID";
    pub const RRULE: &str = "RRULE";
    pub const EXRULE: &str = "EXRULE";
    pub const RDATE: &str = "RDATE";
    pub const EXDATE: &str = "EXDATE";

    pub const TZID: &str = "TZID";
    pub const TZOFFSETFROM: &str = "TZOFFSETFROM";
    pub const TZOFFSETTO: &str = "TZOFFSETTO";
    pub const TZNAME: &str = "TZNAME";

    pub const VALUE: &str = "VALUE";
    pub const RANGE: &str = "RANGE";
    pub const THISANDFUTURE: &str = "THISANDFUTURE";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_param_replaces() {
        let mut prop = Property::text("SUMMARY", "Standup")
            .with_param(Parameter::new("LANGUAGE", "en"));
        prop.set_param(Parameter::new("language", "de"));
        assert_eq!(prop.params.len(), 1);
        assert_eq!(prop.param_value("LANGUAGE"), Some("de"));
        prop.remove_param("Language");
        assert!(prop.params.is_empty());
    }

    #[test]
    fn raw_value_follows_value() {
        let prop = Property::new("SEQUENCE", Value::Integer(3));
        assert_eq!(prop.raw_value, "3");
        assert_eq!(prop.value.as_integer(), Some(3));
    }
}
