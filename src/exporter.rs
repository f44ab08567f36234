//! Export driver: reads the period from the home sheet and writes one grid
//! sheet per calendar.

use tracing::{debug, info, warn};

use crate::error::ExportError;
use crate::layout::{finishing_directives, plan_sheet, sheet_name};
use crate::sheet::{CellValue, SheetBackend};
use crate::source::CalendarSource;
use crate::types::{CalendarInfo, DayBucket, ExportOptions, MONTH_CELL, Period, YEAR_CELL};

/// What one calendar's sheet ended up containing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetSummary {
    pub calendar: String,
    pub sheet_name: String,
    pub day_rows: Vec<u32>,
    pub events_placed: usize,
    pub last_row: u32,
}

/// A calendar that failed while `keep_going` was set.
#[derive(Debug)]
pub struct CalendarFailure {
    pub calendar: String,
    pub error: ExportError,
}

#[derive(Debug, Default)]
pub struct ExportReport {
    pub period: Option<Period>,
    pub exported: Vec<SheetSummary>,
    pub excluded: Vec<String>,
    pub failures: Vec<CalendarFailure>,
}

impl ExportReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct GridExporter {
    options: ExportOptions,
}

impl GridExporter {
    pub fn new(options: ExportOptions) -> Self {
        GridExporter { options }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// True when the calendar name contains an exclusion substring.
    pub fn is_excluded(&self, name: &str) -> bool {
        self.options
            .exclusions
            .iter()
            .any(|omit| name.contains(omit.as_str()))
    }

    /// Year (A2) and month (B2) of the home sheet.
    pub fn read_period<B: SheetBackend>(&self, backend: &B) -> Result<Period, ExportError> {
        let home = &self.options.home_sheet;
        if !backend.has_sheet(home) {
            return Err(ExportError::MissingSheet(home.clone()));
        }

        let year = backend.cell_value(home, YEAR_CELL.0, YEAR_CELL.1)?;
        let month = backend.cell_value(home, MONTH_CELL.0, MONTH_CELL.1)?;
        if year.is_falsy() || month.is_falsy() {
            return Err(ExportError::MissingPeriod(home.clone()));
        }

        let year = parse_component("year", &year)?;
        let month = parse_component("month", &month)?;
        let year = i32::try_from(year)
            .map_err(|_| ExportError::InvalidPeriod(format!("year {}", year)))?;
        let month = u32::try_from(month)
            .map_err(|_| ExportError::InvalidPeriod(format!("month {}", month)))?;
        Period::new(year, month)
    }

    /// Export every calendar that passes the exclusion filter.
    ///
    /// Precondition failures return before any sheet is touched. A calendar
    /// failure aborts the run unless `keep_going` is set.
    pub fn export<B, S>(&self, backend: &mut B, source: &S) -> Result<ExportReport, ExportError>
    where
        B: SheetBackend,
        S: CalendarSource,
    {
        let period = self.read_period(backend)?;
        info!(year = period.year, month = period.month, "exporting calendars");

        let mut report = ExportReport {
            period: Some(period),
            ..Default::default()
        };

        for calendar in source.calendars()? {
            if self.is_excluded(&calendar.name) {
                debug!(calendar = %calendar.name, "excluded");
                report.excluded.push(calendar.name);
                continue;
            }

            match self.export_calendar(backend, source, period, &calendar) {
                Ok(summary) => report.exported.push(summary),
                Err(error) if self.options.keep_going => {
                    warn!(calendar = %calendar.name, %error, "calendar export failed, continuing");
                    report.failures.push(CalendarFailure {
                        calendar: calendar.name,
                        error,
                    });
                }
                Err(error) => return Err(error),
            }
        }

        Ok(report)
    }

    /// Recreate one calendar's sheet from scratch.
    pub fn export_calendar<B, S>(
        &self,
        backend: &mut B,
        source: &S,
        period: Period,
        calendar: &CalendarInfo,
    ) -> Result<SheetSummary, ExportError>
    where
        B: SheetBackend,
        S: CalendarSource,
    {
        let name = sheet_name(&calendar.name, period.month);
        if backend.has_sheet(&name) {
            backend.delete_sheet(&name)?;
        }
        backend.insert_sheet(&name)?;

        let (start, end) = period.date_range()?;
        let events = source.events(calendar, start, end)?;
        let buckets = DayBucket::from_events(period, &events);
        if buckets.total() < events.len() {
            debug!(
                calendar = %calendar.name,
                dropped = events.len() - buckets.total(),
                "events outside the month dropped"
            );
        }

        let plan = plan_sheet(&calendar.name, period, &buckets);
        for directive in &plan.directives {
            backend.apply(&name, directive)?;
        }

        let min_rows = plan.min_rows();
        let rows = backend.row_count(&name)?;
        if rows < min_rows {
            backend.insert_rows_after(&name, rows, min_rows - rows)?;
        }
        let last_row = min_rows.max(backend.last_row(&name)?);

        for directive in finishing_directives(&plan.day_rows, last_row) {
            backend.apply(&name, &directive)?;
        }

        info!(
            calendar = %calendar.name,
            sheet = %name,
            weeks = plan.day_rows.len(),
            events = plan.events_placed,
            "exported sheet"
        );

        Ok(SheetSummary {
            calendar: calendar.name.clone(),
            sheet_name: name,
            day_rows: plan.day_rows,
            events_placed: plan.events_placed,
            last_row,
        })
    }
}

/// Integer held by a home-sheet cell, numeric or text.
fn parse_component(what: &str, value: &CellValue) -> Result<i64, ExportError> {
    let invalid = || ExportError::InvalidPeriod(format!("{} {:?}", what, value.as_text()));
    match value {
        CellValue::Number(n) if n.fract() == 0.0 && n.is_finite() => Ok(*n as i64),
        CellValue::Text(s) => s.trim().parse::<i64>().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}
