//! Calendar arithmetic: leap years, month lengths, Zeller's weekday, and the
//! Monday-Friday week rows a month is laid out in.

use chrono::{Datelike, NaiveDate, Weekday};

use crate::error::ExportError;
use crate::types::{DayBucket, Event, Period, WEEKDAY_COLUMNS, WeekRow};

/// Proleptic Gregorian leap year rule.
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 30,
    }
}

/// Weekday of a date, computed with Zeller's congruence.
pub fn weekday_of(year: i32, month: u32, day: u32) -> Weekday {
    let m = (if month < 3 { month + 12 } else { month }) as i32;
    let year_i = if month < 3 { year - 1 } else { year };
    let q = day as i32;
    let k = year_i.rem_euclid(100);
    let j = year_i.div_euclid(100);

    let h = (q + (13 * (m + 1)) / 5 + k + k / 4 + j / 4 - 2 * j).rem_euclid(7);
    // h: 0=Sat, 1=Sun, 2=Mon, 3=Tue, 4=Wed, 5=Thu, 6=Fri
    match h {
        0 => Weekday::Sat,
        1 => Weekday::Sun,
        2 => Weekday::Mon,
        3 => Weekday::Tue,
        4 => Weekday::Wed,
        5 => Weekday::Thu,
        _ => Weekday::Fri,
    }
}

pub fn is_weekend(weekday: Weekday) -> bool {
    matches!(weekday, Weekday::Sat | Weekday::Sun)
}

/// Blank weekday slots before day 1 in a Monday-first five-column week.
///
/// Sunday yields 5, every other day `weekday - 1` counted from Sunday = 0, so
/// a Saturday start also yields 5.
pub fn initial_blanks(first_weekday: Weekday) -> usize {
    match first_weekday.num_days_from_sunday() {
        0 => 5,
        n => (n - 1) as usize,
    }
}

impl Period {
    /// Validate a year/month pair.
    pub fn new(year: i32, month: u32) -> Result<Self, ExportError> {
        if !(1..=12).contains(&month) {
            return Err(ExportError::InvalidPeriod(format!(
                "month {} (must be 1-12)",
                month
            )));
        }
        if !(1..=9999).contains(&year) {
            return Err(ExportError::InvalidPeriod(format!(
                "year {} (must be 1-9999)",
                year
            )));
        }
        Ok(Period { year, month })
    }

    pub fn days_in_month(&self) -> u32 {
        days_in_month(self.year, self.month)
    }

    pub fn weekday(&self, day: u32) -> Weekday {
        weekday_of(self.year, self.month, day)
    }

    pub fn initial_blanks(&self) -> usize {
        initial_blanks(self.weekday(1))
    }

    /// First and last date of the month.
    pub fn date_range(&self) -> Result<(NaiveDate, NaiveDate), ExportError> {
        let first = NaiveDate::from_ymd_opt(self.year, self.month, 1);
        let last = NaiveDate::from_ymd_opt(self.year, self.month, self.days_in_month());
        match (first, last) {
            (Some(first), Some(last)) => Ok((first, last)),
            _ => Err(ExportError::InvalidPeriod(format!(
                "{}-{:02}",
                self.year, self.month
            ))),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Split the month into Monday-Friday rows.
    ///
    /// A row closes on each Friday and after the last day of the month. A full
    /// week of leading blanks (month starting on a weekend) has no days in it,
    /// so the first row starts at Monday instead.
    pub fn week_rows(&self) -> Vec<WeekRow> {
        let days_in_month = self.days_in_month();
        let mut rows = Vec::with_capacity(6);
        let mut current = WeekRow {
            leading_blanks: self.initial_blanks() % WEEKDAY_COLUMNS,
            days: Vec::with_capacity(WEEKDAY_COLUMNS),
        };

        for day in 1..=days_in_month {
            let weekday = self.weekday(day);
            if !is_weekend(weekday) {
                current.days.push(day);
            }
            if weekday == Weekday::Fri || day == days_in_month {
                let row = std::mem::take(&mut current);
                if !row.is_empty() {
                    rows.push(row);
                }
            }
        }

        rows
    }
}

impl WeekRow {
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Number of sheet columns the row's header occupies.
    pub fn width(&self) -> u32 {
        ((self.leading_blanks + self.days.len()) * 2) as u32
    }

    /// (column, day) pairs, columns 1-based: Monday = 1 ... Friday = 9.
    pub fn columns(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.days
            .iter()
            .enumerate()
            .map(|(i, &day)| (((self.leading_blanks + i) * 2 + 1) as u32, day))
    }
}

impl DayBucket {
    pub fn new(days_in_month: u32) -> Self {
        DayBucket {
            days: vec![Vec::new(); days_in_month as usize],
        }
    }

    /// Bucket event titles by start day, keeping source order.
    ///
    /// Events starting outside `period` are dropped.
    pub fn from_events(period: Period, events: &[Event]) -> Self {
        let mut bucket = DayBucket::new(period.days_in_month());
        for event in events {
            let date = event.start.date();
            if period.contains(date) {
                bucket.push(date.day(), event.title.clone());
            }
        }
        bucket
    }

    /// Append a title to `day`; out-of-range days are ignored.
    pub fn push(&mut self, day: u32, title: String) -> bool {
        match day
            .checked_sub(1)
            .and_then(|idx| self.days.get_mut(idx as usize))
        {
            Some(titles) => {
                titles.push(title);
                true
            }
            None => false,
        }
    }

    pub fn events(&self, day: u32) -> &[String] {
        day.checked_sub(1)
            .and_then(|idx| self.days.get(idx as usize))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn total(&self) -> usize {
        self.days.iter().map(Vec::len).sum()
    }
}
