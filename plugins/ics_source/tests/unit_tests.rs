//! Unit tests for iCalendar value parsing.

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, Timelike};

use ics_source::{
    EventStart, IcsError, IcsEvent, fallback_name_from_url, parse_calendar, parse_date_value,
    unescape_text,
};

fn jst() -> FixedOffset {
    FixedOffset::east_opt(9 * 3600).unwrap()
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
}

fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
    day(d).and_hms_opt(h, m, 0).unwrap()
}

fn weekly(start: &str, rule: &str) -> IcsEvent {
    IcsEvent {
        rrule: Some(rule.to_string()),
        ..IcsEvent::single(parse_date_value(start).unwrap(), "weekly")
    }
}

// ---------------------------------------------------------------------------
// DTSTART values
// ---------------------------------------------------------------------------

#[test]
fn date_value_is_all_day() {
    let start = parse_date_value("20250106").unwrap();
    assert_eq!(
        start,
        EventStart::Date(NaiveDate::from_ymd_opt(2025, 1, 6).unwrap())
    );
    assert_eq!(start.local(jst()).hour(), 0);
}

#[test]
fn floating_time_is_kept_as_written() {
    let start = parse_date_value("20250106T233000").unwrap();
    let local = start.local(jst());
    assert_eq!(local.date(), NaiveDate::from_ymd_opt(2025, 1, 6).unwrap());
    assert_eq!(local.hour(), 23);
}

#[test]
fn utc_time_crosses_midnight_with_offset() {
    // 2025-01-31 20:00 UTC is 2025-02-01 05:00 JST
    let start = parse_date_value("20250131T200000Z").unwrap();
    assert!(matches!(start, EventStart::Utc(_)));
    let local = start.local(jst());
    assert_eq!(local.date(), NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());
    assert_eq!(local.hour(), 5);
}

#[test]
fn garbage_values_are_rejected() {
    assert_eq!(parse_date_value(""), None);
    assert_eq!(parse_date_value("2025-01-06"), None);
    assert_eq!(parse_date_value("20251306"), None);
    assert_eq!(parse_date_value("20250106T25"), None);
}

// ---------------------------------------------------------------------------
// Calendar names
// ---------------------------------------------------------------------------

#[test]
fn calendar_name_falls_back_when_header_missing() {
    let raw = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//test//EN\r\nEND:VCALENDAR\r\n";
    let calendar = parse_calendar(raw, "fallback").unwrap();
    assert_eq!(calendar.name, "fallback");
    assert!(calendar.events.is_empty());
}

#[test]
fn event_level_name_property_is_ignored() {
    let raw = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//test//EN\r\n\
BEGIN:VEVENT\r\n\
UID:1\r\n\
X-WR-CALNAME:not the calendar\r\n\
DTSTART;VALUE=DATE:20250106\r\n\
SUMMARY:A\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n";
    let calendar = parse_calendar(raw, "stem").unwrap();
    assert_eq!(calendar.name, "stem");
}

#[test]
fn folded_calendar_name_is_unfolded() {
    let raw = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//test//EN\r\n\
X-WR-CALNAME:Tokyo \r\n Clinic\r\n\
END:VCALENDAR\r\n";
    let calendar = parse_calendar(raw, "stem").unwrap();
    assert_eq!(calendar.name, "Tokyo Clinic");
}

#[test]
fn escaped_calendar_name_is_unescaped() {
    let raw = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//test//EN\r\n\
X-WR-CALNAME:Sato\\, Tanaka\r\n\
END:VCALENDAR\r\n";
    let calendar = parse_calendar(raw, "stem").unwrap();
    assert_eq!(calendar.name, "Sato, Tanaka");
}

#[test]
fn text_unescaping() {
    assert_eq!(unescape_text(r"a\,b\;c"), "a,b;c");
    assert_eq!(unescape_text(r"line\nbreak"), "line break");
    assert_eq!(unescape_text(r"back\\slash"), r"back\slash");
    assert_eq!(unescape_text(r"trailing\"), r"trailing\");
}

#[test]
fn url_fallback_names() {
    assert_eq!(
        fallback_name_from_url("https://example.com/cals/clinic.ics"),
        "clinic"
    );
    assert_eq!(
        fallback_name_from_url("https://example.com/cals/clinic.ics?token=abc"),
        "clinic"
    );
    assert_eq!(fallback_name_from_url("https://example.com/"), "example.com");
}

// ---------------------------------------------------------------------------
// Recurrence
// ---------------------------------------------------------------------------

#[test]
fn weekly_rule_started_last_year_fills_the_month() {
    let event = weekly("20241202T090000", "FREQ=WEEKLY;BYDAY=MO");
    assert!(event.is_recurring());
    let starts = event.occurrences(jst(), day(1), day(31)).unwrap();
    assert_eq!(starts, [at(6, 9, 0), at(13, 9, 0), at(20, 9, 0), at(27, 9, 0)]);
}

#[test]
fn count_and_until_end_the_series() {
    let counted = weekly("20250106T090000", "FREQ=WEEKLY;COUNT=2");
    assert_eq!(
        counted.occurrences(jst(), day(1), day(31)).unwrap(),
        [at(6, 9, 0), at(13, 9, 0)]
    );

    let until = weekly("20250106T090000", "FREQ=WEEKLY;UNTIL=20250120");
    assert_eq!(
        until.occurrences(jst(), day(1), day(31)).unwrap(),
        [at(6, 9, 0), at(13, 9, 0), at(20, 9, 0)]
    );
}

#[test]
fn exdate_removes_an_occurrence() {
    let mut event = weekly("20241202T090000", "FREQ=WEEKLY;BYDAY=MO");
    event.exdates.push(EventStart::Local(at(13, 9, 0)));
    event.exdates.push(EventStart::Date(day(27)));
    assert_eq!(
        event.occurrences(jst(), day(1), day(31)).unwrap(),
        [at(6, 9, 0), at(20, 9, 0)]
    );
}

#[test]
fn rdate_adds_an_occurrence() {
    let mut event = IcsEvent::single(EventStart::Date(day(6)), "rounds");
    event.rdates.push(EventStart::Date(day(9)));
    assert!(event.is_recurring());
    assert_eq!(
        event.occurrences(jst(), day(1), day(31)).unwrap(),
        [at(6, 0, 0), at(9, 0, 0)]
    );
}

#[test]
fn utc_rule_is_expanded_before_shifting() {
    // Sunday 23:00 UTC is Monday 08:00 JST
    let event = weekly("20241229T230000Z", "FREQ=WEEKLY;BYDAY=SU");
    let starts = event.occurrences(jst(), day(1), day(31)).unwrap();
    assert_eq!(starts, [at(6, 8, 0), at(13, 8, 0), at(20, 8, 0), at(27, 8, 0)]);
}

#[test]
fn single_event_outside_range_yields_nothing() {
    let event = IcsEvent::single(EventStart::Local(at(6, 9, 0)), "once");
    assert!(!event.is_recurring());
    assert!(
        event
            .occurrences(jst(), day(7), day(31))
            .unwrap()
            .is_empty()
    );
    assert_eq!(event.occurrences(jst(), day(1), day(6)).unwrap(), [at(6, 9, 0)]);
}

#[test]
fn invalid_rule_is_an_error() {
    let event = weekly("20250106T090000", "FREQ=SOMETIMES");
    match event.occurrences(jst(), day(1), day(31)) {
        Err(IcsError::InvalidRule { rule, .. }) => assert_eq!(rule, "FREQ=SOMETIMES"),
        other => panic!("expected InvalidRule, got {other:?}"),
    }
}
