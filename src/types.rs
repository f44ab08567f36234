//! Type definitions and constants for the weekday grid export.

use chrono::NaiveDateTime;

/// Target period (year, month) read from the home sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

/// A calendar as listed by a [`crate::source::CalendarSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarInfo {
    pub name: String,
}

impl CalendarInfo {
    pub fn new(name: impl Into<String>) -> Self {
        CalendarInfo { name: name.into() }
    }
}

/// Calendar event. Only the start date and the title reach the sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub start: NaiveDateTime,
    pub title: String,
}

/// Event titles grouped by day of month, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayBucket {
    pub(crate) days: Vec<Vec<String>>,
}

/// Monday-Friday slots of one calendar week.
///
/// `leading_blanks` empty slots precede the first day; only the first week of
/// a month has any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeekRow {
    pub leading_blanks: usize,
    pub days: Vec<u32>,
}

/// Options controlling a whole export run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// Name of the sheet holding year (A2) and month (B2).
    pub home_sheet: String,
    /// Calendars whose name contains any of these substrings are skipped.
    pub exclusions: Vec<String>,
    /// Record per-calendar failures and continue instead of aborting.
    pub keep_going: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        ExportOptions {
            home_sheet: HOME_SHEET_NAME.to_string(),
            exclusions: DEFAULT_EXCLUSIONS.iter().map(|s| s.to_string()).collect(),
            keep_going: false,
        }
    }
}

// Grid geometry
pub const MAX_COL_SIZE: u32 = 10;
pub const TITLE_ROW: u32 = 1;
pub const WEEKDAY_HEADER_ROW: u32 = 2;
pub const CALENDAR_START_ROW: u32 = 3;
pub const WEEKDAY_COLUMNS: usize = 5;
pub const COLUMNS_PER_DAY: u32 = 2;
pub const EVENTS_PER_ROW: usize = 2;
pub const MIN_EVENT_ROWS: u32 = 5;
pub const FOOTER_ROWS: u32 = 7;

// Home sheet layout
pub const HOME_SHEET_NAME: &str = "ホーム";
pub const YEAR_CELL: (u32, u32) = (2, 1);
pub const MONTH_CELL: (u32, u32) = (2, 2);
pub const HOME_LABELS: [&str; 2] = ["年", "月"];

// Birthdays, Japanese public holidays, and account-provided calendars
pub const DEFAULT_EXCLUSIONS: [&str; 3] = ["誕生日", "日本の祝日", "com"];

// Labels
pub const MONTH_SUFFIX: &str = "月";
pub const TITLE_SUFFIX: &str = "診療予定";
pub const FOOTER_LABEL: &str = "検査予定";
pub const WEEKDAY_LABELS: [&str; WEEKDAY_COLUMNS] = ["月", "火", "水", "木", "金"];

// Styling
pub const TITLE_FONT_SIZE: u32 = 21;
pub const WEEKDAY_FONT_SIZE: u32 = 14;
pub const BODY_FONT_SIZE: u32 = 11;
pub const DAY_ROW_COLOR: &str = "#d9ead3";
pub const FOOTER_COLOR: &str = "#d4cccb";
/// Literal-text number format: titles like "0930" stay strings.
pub const TEXT_FORMAT: &str = "@";

// UTC event times are shifted into the clinic's zone (JST) unless overridden
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 9;
