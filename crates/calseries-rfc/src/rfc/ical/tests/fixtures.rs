//! iCalendar documents exercising series assembly and expansion.

/// All-day event with no recurrence.
pub const ALL_DAY_SINGLE: &str = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Example//Example//EN\r\n\
BEGIN:VEVENT\r\n\
UID:all-day@example.com\r\n\
DTSTAMP:20190801T120000Z\r\n\
DTSTART;VALUE=DATE:20190818\r\n\
DTEND;VALUE=DATE:20190819\r\n\
SUMMARY:Sunday off\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

/// Two UIDs, each with two exceptions and no master.
pub const ORPHAN_EXCEPTIONS: &str = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Example//Example//EN\r\n\
BEGIN:VEVENT\r\n\
UID:orphan-a@example.com\r\n\
DTSTAMP:20200101T000000Z\r\n\
RECURRENCE-ID:20200106T090000Z\r\n\
DTSTART:20200106T100000Z\r\n\
DTEND:20200106T110000Z\r\n\
SUMMARY:A moved\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:orphan-a@example.com\r\n\
DTSTAMP:20200101T000000Z\r\n\
RECURRENCE-ID:20200113T090000Z\r\n\
DTSTART:20200113T090000Z\r\n\
DTEND:20200113T100000Z\r\n\
SUMMARY:A renamed\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:orphan-b@example.com\r\n\
DTSTAMP:20200101T000000Z\r\n\
RECURRENCE-ID;VALUE=DATE:20200201\r\n\
DTSTART;VALUE=DATE:20200202\r\n\
SUMMARY:B moved\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:orphan-b@example.com\r\n\
DTSTAMP:20200101T000000Z\r\n\
RECURRENCE-ID;VALUE=DATE:20200301\r\n\
DTSTART;VALUE=DATE:20200301\r\n\
SUMMARY:B kept\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

/// Weekly meeting from 2020-04-01 with a +1h THISANDFUTURE edit at the
/// third instance, an exact move at the fifth, and a +2h THISANDFUTURE edit
/// at the seventh.
pub const WEEKLY_WITH_RANGES: &str = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Example//Example//EN\r\n\
BEGIN:VEVENT\r\n\
UID:weekly@example.com\r\n\
DTSTAMP:20200301T000000Z\r\n\
DTSTART;TZID=Europe/Berlin:20200401T100000\r\n\
DTEND;TZID=Europe/Berlin:20200401T110000\r\n\
RRULE:FREQ=WEEKLY;COUNT=8\r\n\
SUMMARY:Weekly sync\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:weekly@example.com\r\n\
DTSTAMP:20200301T000000Z\r\n\
RECURRENCE-ID;RANGE=THISANDFUTURE;TZID=Europe/Berlin:20200415T100000\r\n\
DTSTART;TZID=Europe/Berlin:20200415T110000\r\n\
DTEND;TZID=Europe/Berlin:20200415T120000\r\n\
SUMMARY:Weekly sync (later)\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:weekly@example.com\r\n\
DTSTAMP:20200301T000000Z\r\n\
RECURRENCE-ID;TZID=Europe/Berlin:20200429T100000\r\n\
DTSTART;TZID=Europe/Berlin:20200429T150000\r\n\
DTEND;TZID=Europe/Berlin:20200429T160000\r\n\
SUMMARY:Weekly sync (one-off)\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:weekly@example.com\r\n\
DTSTAMP:20200301T000000Z\r\n\
RECURRENCE-ID;RANGE=THISANDFUTURE;TZID=Europe/Berlin:20200513T100000\r\n\
DTSTART;TZID=Europe/Berlin:20200513T120000\r\n\
DTEND;TZID=Europe/Berlin:20200513T130000\r\n\
SUMMARY:Weekly sync (lunch)\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

/// Daily stand-up in a zone whose VTIMEZONE comes after the event.
pub const LATE_VTIMEZONE: &str = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Example//Example//EN\r\n\
BEGIN:VEVENT\r\n\
UID:standup@example.com\r\n\
DTSTAMP:20240101T000000Z\r\n\
DTSTART;TZID=Example/Plus3:20240102T090000\r\n\
DURATION:PT15M\r\n\
RRULE:FREQ=DAILY;UNTIL=20240105T060000Z\r\n\
EXDATE;TZID=Example/Plus3:20240103T090000\r\n\
SUMMARY:Stand-up\r\n\
BEGIN:VALARM\r\n\
ACTION:DISPLAY\r\n\
TRIGGER:-PT5M\r\n\
END:VALARM\r\n\
END:VEVENT\r\n\
BEGIN:VTIMEZONE\r\n\
TZID:Example/Plus3\r\n\
BEGIN:STANDARD\r\n\
DTSTART:19700101T000000\r\n\
TZOFFSETFROM:+0300\r\n\
TZOFFSETTO:+0300\r\n\
TZNAME:+03\r\n\
END:STANDARD\r\n\
END:VTIMEZONE\r\n\
END:VCALENDAR\r\n";

/// Recurring master without DTSTART next to a well-formed event.
pub const MISSING_START: &str = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Example//Example//EN\r\n\
BEGIN:VEVENT\r\n\
UID:no-start@example.com\r\n\
DTSTAMP:20240101T000000Z\r\n\
RRULE:FREQ=WEEKLY\r\n\
SUMMARY:Broken\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:fine@example.com\r\n\
DTSTAMP:20240101T000000Z\r\n\
DTSTART:20240110T120000Z\r\n\
SUMMARY:Fine\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

/// Monthly to-do with RDATE periods and EXDATEs hitting rule instants.
pub const MONTHLY_TODO: &str = "\
BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Example//Example//EN\r\n\
BEGIN:VTODO\r\n\
UID:rent@example.com\r\n\
DTSTAMP:20240101T000000Z\r\n\
DTSTART:20240101T080000Z\r\n\
DUE:20240101T170000Z\r\n\
RRULE:FREQ=MONTHLY;BYMONTHDAY=1\r\n\
RDATE;VALUE=PERIOD:20240215T080000Z/PT9H\r\n\
EXDATE:20240301T080000Z\r\n\
EXDATE:20240501T080000Z,20240601T080000Z\r\n\
SUMMARY:Pay rent\r\n\
END:VTODO\r\n\
END:VCALENDAR\r\n";
