//! Seeding the registry from a timezone database file.
//!
//! The file is JSON of the form
//! `{"version": "...", "zones": {"<id>": {"ics": [...]}}, "aliases": {"<id>": {"aliasTo": "<id>"}}}`.
//! `ics` holds either a whole VTIMEZONE block or the lines that go inside one.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::error::TimezoneError;
use super::timezone::{TimezoneEntry, TimezoneRegistry};
use crate::rfc::ical::parse::parse_component_text;

#[derive(Debug, Deserialize)]
struct TimezoneDatabase {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    zones: BTreeMap<String, ZoneRecord>,
    #[serde(default)]
    aliases: BTreeMap<String, AliasRecord>,
}

#[derive(Debug, Deserialize)]
struct ZoneRecord {
    ics: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AliasRecord {
    alias_to: String,
}

fn vtimezone_text(id: &str, ics: &[String]) -> String {
    let body = ics.join("\r\n");
    if body.trim_start().to_ascii_uppercase().starts_with("BEGIN:VTIMEZONE") {
        body
    } else {
        format!("BEGIN:VTIMEZONE\r\nTZID:{id}\r\n{body}\r\nEND:VTIMEZONE\r\n")
    }
}

impl TimezoneRegistry {
    /// ## Summary
    /// Registers every zone and alias in a timezone database document and
    /// returns the number of zones loaded.
    ///
    /// Zones whose definition fails to parse are skipped with a warning.
    ///
    /// ## Errors
    /// Returns `TimezoneError::Database` if the document is not valid
    /// database JSON.
    #[tracing::instrument(skip(self, json), fields(json_len = json.len()))]
    pub fn load_database(&self, json: &str) -> Result<usize, TimezoneError> {
        let database: TimezoneDatabase =
            serde_json::from_str(json).map_err(|e| TimezoneError::Database(e.to_string()))?;

        let mut loaded = 0;
        for (id, record) in &database.zones {
            let text = vtimezone_text(id, &record.ics);
            let entry = parse_component_text(&text)
                .map_err(|e| TimezoneError::Database(e.to_string()))
                .and_then(TimezoneEntry::from_vtimezone);
            match entry {
                Ok(entry) => {
                    self.register_as(id, entry);
                    loaded += 1;
                }
                Err(e) => tracing::warn!(tzid = %id, error = %e, "Skipping timezone database entry"),
            }
        }

        for (name, alias) in &database.aliases {
            self.register_alias(name, &alias.alias_to);
        }

        tracing::info!(
            version = database.version.as_deref().unwrap_or("unknown"),
            zones = loaded,
            aliases = database.aliases.len(),
            "Loaded timezone database"
        );
        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATABASE: &str = r#"{
        "version": "2024a",
        "zones": {
            "Test/Plus2": {
                "ics": [
                    "BEGIN:STANDARD",
                    "TZOFFSETFROM:+0200",
                    "TZOFFSETTO:+0200",
                    "DTSTART:19700101T000000",
                    "END:STANDARD"
                ]
            },
            "Test/Whole": {
                "ics": ["BEGIN:VTIMEZONE\r\nTZID:Test/Whole\r\nBEGIN:STANDARD\r\nTZOFFSETFROM:-0300\r\nTZOFFSETTO:-0300\r\nDTSTART:19700101T000000\r\nEND:STANDARD\r\nEND:VTIMEZONE"]
            },
            "Test/Broken": { "ics": ["BEGIN:STANDARD", "END:STANDARD"] }
        },
        "aliases": {
            "Test/Alias": { "aliasTo": "Test/Plus2" },
            "Test/Later": { "aliasTo": "Test/Missing" }
        }
    }"#;

    #[test_log::test]
    fn loads_zones_and_aliases() {
        let registry = TimezoneRegistry::new();
        let loaded = registry.load_database(DATABASE).unwrap();
        assert_eq!(loaded, 2);

        assert!(registry.has("Test/Plus2"));
        assert!(registry.has("Test/Whole"));
        assert!(!registry.has("Test/Broken"));
        assert_eq!(registry.resolve("Test/Alias").unwrap().id, "Test/Plus2");
        assert!(registry.resolve("Test/Later").is_none());
        assert!(registry.list_all(true).contains(&"Test/Later".to_string()));
    }

    #[test]
    fn rejects_malformed_json() {
        let registry = TimezoneRegistry::new();
        assert!(matches!(
            registry.load_database("{\"zones\": []}"),
            Err(TimezoneError::Database(_))
        ));
    }
}
