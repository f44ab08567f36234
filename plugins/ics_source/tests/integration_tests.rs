//! Integration tests for loading calendars from files and directories.

use std::fs;

use chrono::{Datelike, FixedOffset, NaiveDate};

use ics_source::{EventStart, IcsError, SOURCE_NAME, SOURCE_VERSION, load, load_dir, parse_calendar};

const CLINIC: &str = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//test//EN\r\n\
X-WR-CALNAME:Tokyo Clinic\r\n\
BEGIN:VEVENT\r\n\
UID:1\r\n\
DTSTAMP:20250101T000000Z\r\n\
DTSTART;TZID=Asia/Tokyo:20250106T093000\r\n\
SUMMARY:Dr. Sato\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:2\r\n\
DTSTAMP:20250101T000000Z\r\n\
DTSTART;VALUE=DATE:20250107\r\n\
SUMMARY:0930\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:3\r\n\
DTSTAMP:20250101T000000Z\r\n\
DTSTART;VALUE=DATE:20250108\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

const NO_NAME: &str = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//test//EN\r\n\
BEGIN:VEVENT\r\n\
UID:9\r\n\
DTSTAMP:20250101T000000Z\r\n\
DTSTART:20250110T010000Z\r\n\
SUMMARY:Night shift\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

const WEEKLY: &str = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//test//EN\r\n\
X-WR-CALNAME:Rounds\r\n\
BEGIN:VEVENT\r\n\
UID:weekly\r\n\
DTSTAMP:20241101T000000Z\r\n\
DTSTART:20241202T090000\r\n\
RRULE:FREQ=WEEKLY;BYDAY=MO\r\n\
EXDATE:20250113T090000\r\n\
SUMMARY:Monday rounds\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:weekly\r\n\
DTSTAMP:20241101T000000Z\r\n\
RECURRENCE-ID:20250120T090000\r\n\
DTSTART:20250121T090000\r\n\
SUMMARY:Monday rounds (moved)\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";

#[test]
fn parses_events_in_file_order() {
    let calendar = parse_calendar(CLINIC, "unused").unwrap();
    assert_eq!(calendar.name, "Tokyo Clinic");
    let summaries: Vec<&str> = calendar.events.iter().map(|e| e.summary.as_str()).collect();
    assert_eq!(summaries, ["Dr. Sato", "0930", ""]);
    assert_eq!(
        calendar.events[1].start,
        EventStart::Date(NaiveDate::from_ymd_opt(2025, 1, 7).unwrap())
    );
}

#[test]
fn missing_start_is_an_error() {
    let raw = CLINIC.replace("DTSTART;VALUE=DATE:20250108\r\n", "");
    match parse_calendar(&raw, "x") {
        Err(IcsError::InvalidStart { calendar, .. }) => assert_eq!(calendar, "Tokyo Clinic"),
        other => panic!("expected InvalidStart, got {other:?}"),
    }
}

#[test]
fn weekly_event_expands_with_exceptions() {
    let calendar = parse_calendar(WEEKLY, "unused").unwrap();
    let jst = FixedOffset::east_opt(9 * 3600).unwrap();
    let jan = |d| NaiveDate::from_ymd_opt(2025, 1, d).unwrap();

    let master = &calendar.events[0];
    assert_eq!(master.rrule.as_deref(), Some("FREQ=WEEKLY;BYDAY=MO"));
    let days: Vec<u32> = master
        .occurrences(jst, jan(1), jan(31))
        .unwrap()
        .iter()
        .map(|s| s.date().day())
        .collect();
    // 13th excluded, 20th moved to its own VEVENT
    assert_eq!(days, [6, 27]);

    let moved = calendar.events[1].occurrences(jst, jan(1), jan(31)).unwrap();
    assert_eq!(moved.len(), 1);
    assert_eq!(moved[0].date(), jan(21));
}

#[test]
fn bad_exdate_is_an_error() {
    let raw = WEEKLY.replace("EXDATE:20250113T090000", "EXDATE:someday");
    match parse_calendar(&raw, "x") {
        Err(IcsError::InvalidDate { property, value, .. }) => {
            assert_eq!(property, "EXDATE");
            assert_eq!(value, "someday");
        }
        other => panic!("expected InvalidDate, got {other:?}"),
    }
}

#[test]
fn directory_loads_only_ics_files_sorted() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("b_clinic.ics"), CLINIC).unwrap();
    fs::write(dir.path().join("a_night.ICS"), NO_NAME).unwrap();
    fs::write(dir.path().join("notes.txt"), "not a calendar").unwrap();

    let calendars = load_dir(dir.path()).unwrap();
    let names: Vec<&str> = calendars.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["a_night", "Tokyo Clinic"]);
}

#[test]
fn load_dispatches_on_path_kind() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("clinic.ics");
    fs::write(&file, CLINIC).unwrap();

    let from_file = load(file.to_str().unwrap()).unwrap();
    assert_eq!(from_file.len(), 1);
    let from_dir = load(dir.path().to_str().unwrap()).unwrap();
    assert_eq!(from_dir, from_file);
}

#[test]
fn missing_file_reports_path() {
    let err = load("/definitely/not/here.ics").unwrap_err();
    assert!(matches!(err, IcsError::Io { .. }));
    assert!(err.to_string().contains("/definitely/not/here.ics"));
}

#[test]
fn metadata_from_cargo() {
    assert_eq!(SOURCE_NAME, "ics_source");
    assert_eq!(SOURCE_VERSION, "0.1.0");
}
