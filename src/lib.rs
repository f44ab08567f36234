//! Export calendar events into a Monday-Friday grid spreadsheet.
//!
//! Features:
//! - Pure month layout: week rows, two-per-row event sub-grids, borders
//! - Pluggable calendar sources and spreadsheet backends
//! - In-memory workbook with JSON persistence and XLSX rendering
//! - iCalendar input from files, directories and URLs (feature `ics`)

pub mod args;
pub mod calendar;
pub mod error;
pub mod exporter;
pub mod layout;
pub mod sheet;
pub mod source;
pub mod types;
pub mod workbook;
pub mod xlsx;
