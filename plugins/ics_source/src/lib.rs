//! iCalendar source for calgrid.
//!
//! Loads `VEVENT` start times and summaries from `.ics` files, directories of
//! `.ics` files, or http(s) URLs. Recurring events (`RRULE`, `RDATE`,
//! `EXDATE`, overridden instances) are expanded per query range.

use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use icalendar::{Calendar, CalendarComponent, Component, Event};
use rrule::RRuleSet;
use thiserror::Error;

pub const SOURCE_NAME: &str = env!("CARGO_PKG_NAME");
pub const SOURCE_VERSION: &str = env!("CARGO_PKG_VERSION");

const ICS_EXTENSION: &str = "ics";
const UTC_FORMAT: &str = "%Y%m%dT%H%M%SZ";
// UTC occurrences near a range edge can shift into it once made local
const EXPANSION_MARGIN_DAYS: i64 = 2;

#[derive(Debug, Error)]
pub enum IcsError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch {url}: {message}")]
    Http { url: String, message: String },

    #[error("invalid calendar {name}: {message}")]
    Parse { name: String, message: String },

    #[error("event {summary:?} in {calendar} has invalid DTSTART {value:?}")]
    InvalidStart {
        calendar: String,
        summary: String,
        value: String,
    },

    #[error("event {summary:?} in {calendar} has invalid {property} {value:?}")]
    InvalidDate {
        calendar: String,
        summary: String,
        property: String,
        value: String,
    },

    #[error("event {summary:?} has invalid RRULE {rule:?}: {message}")]
    InvalidRule {
        summary: String,
        rule: String,
        message: String,
    },
}

/// DTSTART of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStart {
    /// All-day event (`VALUE=DATE`).
    Date(NaiveDate),
    /// Wall-clock time, either floating or qualified by a TZID.
    Local(NaiveDateTime),
    Utc(DateTime<Utc>),
}

impl EventStart {
    /// Local wall-clock start; UTC times are shifted by `offset`.
    pub fn local(&self, offset: FixedOffset) -> NaiveDateTime {
        match self {
            EventStart::Date(date) => date.and_time(NaiveTime::MIN),
            EventStart::Local(dt) => *dt,
            EventStart::Utc(dt) => dt.with_timezone(&offset).naive_local(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcsEvent {
    pub start: EventStart,
    pub summary: String,
    /// `RRULE` value, without the property name.
    pub rrule: Option<String>,
    pub rdates: Vec<EventStart>,
    /// `EXDATE`s plus the `RECURRENCE-ID`s of overridden instances.
    pub exdates: Vec<EventStart>,
}

impl IcsEvent {
    /// Event happening once, at `start`.
    pub fn single(start: EventStart, summary: impl Into<String>) -> Self {
        IcsEvent {
            start,
            summary: summary.into(),
            rrule: None,
            rdates: Vec::new(),
            exdates: Vec::new(),
        }
    }

    pub fn is_recurring(&self) -> bool {
        self.rrule.is_some() || !self.rdates.is_empty()
    }

    /// Local wall-clock starts of every occurrence on a day in `from..=to`,
    /// ascending.
    ///
    /// A rule is expanded in the frame of its DTSTART: UTC for UTC starts,
    /// wall-clock time otherwise. An all-day `EXDATE` removes every
    /// occurrence on that date.
    pub fn occurrences(
        &self,
        offset: FixedOffset,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<NaiveDateTime>, IcsError> {
        let frame = Frame::of(&self.start, offset);
        let first = frame.naive(&self.start);

        let mut starts = match &self.rrule {
            Some(rule) => {
                let upper = to
                    .checked_add_signed(Duration::days(EXPANSION_MARGIN_DAYS))
                    .unwrap_or(NaiveDate::MAX)
                    .and_time(NaiveTime::MIN);
                expand_rule(first, rule, frame, upper).map_err(|message| {
                    IcsError::InvalidRule {
                        summary: self.summary.clone(),
                        rule: rule.clone(),
                        message,
                    }
                })?
            }
            None => vec![first],
        };
        starts.extend(self.rdates.iter().map(|d| frame.naive(d)));
        starts.retain(|&s| !self.exdates.iter().any(|ex| frame.excludes(ex, s)));

        let mut local: Vec<NaiveDateTime> = starts
            .into_iter()
            .map(|s| frame.local(s))
            .filter(|s| (from..=to).contains(&s.date()))
            .collect();
        local.sort();
        local.dedup();
        Ok(local)
    }
}

/// Time axis a recurrence is computed on.
#[derive(Debug, Clone, Copy)]
enum Frame {
    Utc(FixedOffset),
    Local(FixedOffset),
}

impl Frame {
    fn of(start: &EventStart, offset: FixedOffset) -> Self {
        match start {
            EventStart::Utc(_) => Frame::Utc(offset),
            _ => Frame::Local(offset),
        }
    }

    fn shift(offset: FixedOffset) -> Duration {
        Duration::seconds(i64::from(offset.local_minus_utc()))
    }

    /// `start` expressed on this frame's axis.
    fn naive(&self, start: &EventStart) -> NaiveDateTime {
        match (self, start) {
            (Frame::Utc(_), EventStart::Utc(dt)) => dt.naive_utc(),
            (Frame::Utc(offset), other) => other.local(*offset) - Frame::shift(*offset),
            (Frame::Local(offset), other) => other.local(*offset),
        }
    }

    /// Local wall-clock time of a point on this frame's axis.
    fn local(&self, at: NaiveDateTime) -> NaiveDateTime {
        match self {
            Frame::Utc(offset) => at + Frame::shift(*offset),
            Frame::Local(_) => at,
        }
    }

    fn excludes(&self, exdate: &EventStart, occurrence: NaiveDateTime) -> bool {
        match exdate {
            EventStart::Date(date) => self.local(occurrence).date() == *date,
            other => self.naive(other) == occurrence,
        }
    }
}

/// Occurrences of `rule` from `first` up to (not including) `upper`, all on
/// the frame's axis.
fn expand_rule(
    first: NaiveDateTime,
    rule: &str,
    frame: Frame,
    upper: NaiveDateTime,
) -> Result<Vec<NaiveDateTime>, String> {
    // The frame's axis is written as UTC so no zone rules shift occurrences
    let text = format!(
        "DTSTART:{}\nRRULE:{}\n",
        first.format(UTC_FORMAT),
        normalize_until(rule, frame)
    );
    let set = RRuleSet::from_str(&text).map_err(|e| e.to_string())?;
    Ok(set
        .into_iter()
        .map(|dt| dt.naive_utc())
        .take_while(|dt| *dt < upper)
        .collect())
}

/// Rewrite UNTIL onto the frame's axis as a UTC DATE-TIME, matching DTSTART.
fn normalize_until(rule: &str, frame: Frame) -> String {
    let rule = rule.trim();
    let rule = rule
        .strip_prefix("RRULE:")
        .or_else(|| rule.strip_prefix("rrule:"))
        .unwrap_or(rule);
    rule.split(';')
        .map(|part| {
            let Some((key, value)) = part.split_once('=') else {
                return part.to_string();
            };
            if !key.trim().eq_ignore_ascii_case("UNTIL") {
                return part.to_string();
            }
            let until = match parse_date_value(value) {
                Some(EventStart::Date(date)) => date.and_hms_opt(23, 59, 59).map(EventStart::Local),
                other => other,
            };
            match until {
                Some(until) => format!("UNTIL={}", frame.naive(&until).format(UTC_FORMAT)),
                None => part.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(";")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcsCalendar {
    pub name: String,
    pub events: Vec<IcsEvent>,
}

/// Parse an iCalendar DATE or DATE-TIME value.
pub fn parse_date_value(val: &str) -> Option<EventStart> {
    let val = val.trim();
    if val.len() == 8 {
        NaiveDate::parse_from_str(val, "%Y%m%d")
            .ok()
            .map(EventStart::Date)
    } else if let Some(utc) = val.strip_suffix('Z') {
        NaiveDateTime::parse_from_str(utc, "%Y%m%dT%H%M%S")
            .ok()
            .map(|dt| EventStart::Utc(dt.and_utc()))
    } else {
        NaiveDateTime::parse_from_str(val, "%Y%m%dT%H%M%S")
            .ok()
            .map(EventStart::Local)
    }
}

/// Undo TEXT escaping (`\,` `\;` `\\` `\n`); line breaks become spaces.
pub fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push(' '),
            Some(escaped @ (',' | ';' | ':' | '\\')) => out.push(escaped),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Every DATE / DATE-TIME listed under `key`, across repeated properties and
/// comma-separated values. A PERIOD counts from its start.
fn date_list(
    event: &Event,
    key: &str,
    calendar: &str,
    summary: &str,
) -> Result<Vec<EventStart>, IcsError> {
    let single = event.properties().get(key).into_iter();
    let multi = event.multi_properties().get(key).into_iter().flatten();

    let mut dates = Vec::new();
    for prop in single.chain(multi) {
        for part in prop.value().split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let value = part.split('/').next().unwrap_or(part);
            let date = parse_date_value(value).ok_or_else(|| IcsError::InvalidDate {
                calendar: calendar.to_string(),
                summary: summary.to_string(),
                property: key.to_string(),
                value: part.to_string(),
            })?;
            dates.push(date);
        }
    }
    Ok(dates)
}

/// Parse calendar text. `fallback_name` names calendars without
/// `NAME` / `X-WR-CALNAME`.
pub fn parse_calendar(raw: &str, fallback_name: &str) -> Result<IcsCalendar, IcsError> {
    let calendar: Calendar = raw.parse().map_err(|e| IcsError::Parse {
        name: fallback_name.to_string(),
        message: format!("{}", e),
    })?;
    let name = calendar
        .get_name()
        .map(|n| unescape_text(n).trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| fallback_name.to_string());

    let mut events = Vec::new();
    let mut uids = Vec::new();
    let mut overrides = Vec::new();
    for component in &calendar.components {
        let CalendarComponent::Event(event) = component else {
            continue;
        };
        let summary = event.get_summary().unwrap_or("").to_string();
        let value = event
            .properties()
            .get("DTSTART")
            .map(|p| p.value().to_string())
            .unwrap_or_default();
        let start = parse_date_value(&value).ok_or_else(|| IcsError::InvalidStart {
            calendar: name.clone(),
            summary: summary.clone(),
            value: value.clone(),
        })?;

        let uid = event.get_uid().map(str::to_string);
        if let Some(recurrence_id) = event.properties().get("RECURRENCE-ID") {
            let original = parse_date_value(recurrence_id.value()).ok_or_else(|| {
                IcsError::InvalidDate {
                    calendar: name.clone(),
                    summary: summary.clone(),
                    property: "RECURRENCE-ID".to_string(),
                    value: recurrence_id.value().to_string(),
                }
            })?;
            if let Some(uid) = &uid {
                overrides.push((uid.clone(), original));
            }
        }

        let rrule = event
            .properties()
            .get("RRULE")
            .map(|p| p.value().trim().to_string())
            .filter(|r| !r.is_empty());
        let rdates = date_list(event, "RDATE", &name, &summary)?;
        let exdates = date_list(event, "EXDATE", &name, &summary)?;

        events.push(IcsEvent {
            start,
            summary,
            rrule,
            rdates,
            exdates,
        });
        uids.push(uid);
    }

    // An overridden instance is listed as its own VEVENT
    for (uid, original) in overrides {
        for (event, event_uid) in events.iter_mut().zip(&uids) {
            if event.is_recurring() && event_uid.as_deref() == Some(uid.as_str()) {
                event.exdates.push(original);
            }
        }
    }

    Ok(IcsCalendar { name, events })
}

pub fn load_file(path: &Path) -> Result<IcsCalendar, IcsError> {
    let raw = std::fs::read_to_string(path).map_err(|source| IcsError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    parse_calendar(&raw, &stem)
}

/// Every `.ics` file directly inside `dir`, ordered by file name.
pub fn load_dir(dir: &Path) -> Result<Vec<IcsCalendar>, IcsError> {
    let io_err = |source| IcsError::Io {
        path: dir.display().to_string(),
        source,
    };
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let is_ics = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(ICS_EXTENSION));
        if path.is_file() && is_ics {
            paths.push(path);
        }
    }
    paths.sort();
    paths.iter().map(|p| load_file(p)).collect()
}

/// Fetch a calendar over http(s).
pub fn fetch_url(url: &str) -> Result<IcsCalendar, IcsError> {
    let http_err = |e: ureq::Error| IcsError::Http {
        url: url.to_string(),
        message: e.to_string(),
    };
    let raw = ureq::get(url)
        .call()
        .map_err(http_err)?
        .into_body()
        .read_to_string()
        .map_err(http_err)?;
    parse_calendar(&raw, &fallback_name_from_url(url))
}

/// Last non-empty path segment without `.ics`, or the whole URL.
pub fn fallback_name_from_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/')
        .find(|segment| !segment.is_empty() && !segment.contains(':'))
        .map(|segment| {
            segment
                .strip_suffix(".ics")
                .unwrap_or(segment)
                .to_string()
        })
        .unwrap_or_else(|| url.to_string())
}

/// Load one input: URL, directory, or single file.
pub fn load(input: &str) -> Result<Vec<IcsCalendar>, IcsError> {
    if input.starts_with("http://") || input.starts_with("https://") {
        return Ok(vec![fetch_url(input)?]);
    }
    let path = Path::new(input);
    if path.is_dir() {
        load_dir(path)
    } else {
        Ok(vec![load_file(path)?])
    }
}
