//! Drives the public API the way the `calseries` binary does.

use std::sync::Arc;

use calseries_rfc::error::RfcError;
use calseries_rfc::rfc::ical::core::{DateTime, TimeValue};
use calseries_rfc::rfc::ical::expand::{
    ComponentAssembler, ExpansionError, ExpansionOptions, Lockable, OccurrenceSource,
    TimezoneRegistry,
};
use chrono::NaiveDate;

const DATABASE: &str = r#"{
    "version": "test",
    "zones": {
        "Office/Local": {
            "ics": [
                "BEGIN:STANDARD",
                "TZOFFSETFROM:+0530",
                "TZOFFSETTO:+0530",
                "TZNAME:IST",
                "DTSTART:19700101T000000",
                "END:STANDARD"
            ]
        }
    },
    "aliases": {
        "Office": { "aliasTo": "Office/Local" }
    }
}"#;

const CALENDAR: &str = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Example//Example//EN\r\n\
BEGIN:VEVENT\r\n\
UID:review@example.com\r\n\
DTSTAMP:20240101T000000Z\r\n\
DTSTART;TZID=Office:20240108T100000\r\n\
DTEND;TZID=Office:20240108T110000\r\n\
RRULE:FREQ=WEEKLY;BYDAY=MO;COUNT=4\r\n\
SUMMARY:Review\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:review@example.com\r\n\
DTSTAMP:20240101T000000Z\r\n\
RECURRENCE-ID;TZID=Office:20240115T100000\r\n\
DTSTART;TZID=Office:20240116T100000\r\n\
DTEND;TZID=Office:20240116T110000\r\n\
SUMMARY:Review (Tuesday)\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

fn day(y: i32, m: u32, d: u32) -> TimeValue {
    TimeValue::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
}

#[test_log::test]
fn database_zones_drive_expansion() {
    let registry = Arc::new(TimezoneRegistry::new());
    assert_eq!(registry.load_database(DATABASE).unwrap(), 1);

    let calendar = ComponentAssembler::new(Arc::clone(&registry))
        .with_options(ExpansionOptions {
            fork_exceptions: true,
        })
        .assemble(CALENDAR)
        .unwrap();
    assert_eq!(calendar.uids().collect::<Vec<_>>(), vec!["review@example.com"]);
    assert_eq!(calendar.zone_ids("review@example.com"), vec!["Office"]);
    assert_eq!(calendar.timezones_for("review@example.com")[0].id, "Office/Local");

    let series = calendar.series("review@example.com").unwrap();
    series.validate_rules().unwrap();
    let occurrences: Vec<_> = series
        .occurrences_between(&day(2024, 1, 1), &day(2024, 2, 29))
        .unwrap()
        .map(|o| (registry.to_utc(&o.start), o.source))
        .collect();

    let at = |d: u32, h: u32, m: u32| {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    };
    assert_eq!(
        occurrences,
        vec![
            (at(8, 4, 30), OccurrenceSource::Master),
            (at(16, 4, 30), OccurrenceSource::Exception),
            (at(22, 4, 30), OccurrenceSource::Generated),
            (at(29, 4, 30), OccurrenceSource::Generated),
        ]
    );
}

#[test]
fn edits_apply_until_locked() {
    let registry = Arc::new(TimezoneRegistry::new());
    registry.load_database(DATABASE).unwrap();
    let mut calendar = ComponentAssembler::new(registry).assemble(CALENDAR).unwrap();

    let exdate = TimeValue::DateTime(DateTime::zoned(
        NaiveDate::from_ymd_opt(2024, 1, 22)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap(),
        "Office/Local",
    ));
    let series = calendar.series_mut("review@example.com").unwrap();
    series.add_exdate(exdate.clone()).unwrap();
    assert_eq!(
        series
            .occurrences_between(&day(2024, 1, 1), &day(2024, 2, 29))
            .unwrap()
            .count(),
        3
    );

    calendar.lock();
    let series = calendar.series_mut("review@example.com").unwrap();
    let err = series.remove_exdate(&exdate).unwrap_err();
    assert!(matches!(err, ExpansionError::ModificationNotAllowed { .. }));
    assert!(matches!(RfcError::from(err), RfcError::Expansion(_)));
}

#[test]
fn malformed_documents_fail_to_parse() {
    let assembler = ComponentAssembler::new(TimezoneRegistry::global());
    let result = assembler.assemble("BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nUID:x\r\nEND:VCALENDAR\r\n");
    assert!(matches!(result, Err(RfcError::Parse(_))));
}
