//! Command-line argument parsing using clap.

use std::path::PathBuf;

use chrono::FixedOffset;
use clap::{ArgAction, Parser, ValueHint};

use crate::types::{
    DEFAULT_EXCLUSIONS, DEFAULT_UTC_OFFSET_HOURS, ExportOptions, HOME_SHEET_NAME, Period,
};

#[derive(Parser, Debug)]
#[command(name = "calgrid")]
#[command(about = "Exports calendar events into a weekday grid spreadsheet", long_about = None)]
#[command(version)]
#[command(after_help = HELP_MESSAGE)]
pub struct Args {
    /// Workbook document (JSON); read, updated in place, created if missing.
    #[arg(
        short = 'w',
        long,
        help_heading = "Workbook options",
        value_name = "file",
        value_hint = ValueHint::FilePath
    )]
    pub workbook: String,

    /// Name of the sheet holding the year (A2) and month (B2).
    #[arg(
        long,
        default_value = HOME_SHEET_NAME,
        help_heading = "Workbook options",
        value_name = "name"
    )]
    pub home: String,

    /// Write this year into the home sheet before exporting.
    #[arg(long, help_heading = "Workbook options", value_name = "year")]
    pub year: Option<String>,

    /// Write this month (1-12 or name) into the home sheet before exporting.
    #[arg(long, help_heading = "Workbook options", value_name = "month")]
    pub month: Option<String>,

    /// Also render the workbook as an .xlsx file.
    #[arg(
        long,
        help_heading = "Workbook options",
        value_name = "file",
        value_hint = ValueHint::FilePath
    )]
    pub xlsx: Option<String>,

    /// Calendar input: .ics file, directory of .ics files, or http(s) URL.
    #[arg(
        short = 'c',
        long = "calendar",
        help_heading = "Calendar options",
        value_name = "path|url",
        value_hint = ValueHint::AnyPath
    )]
    pub calendars: Vec<String>,

    /// Skip calendars whose name contains this text (repeatable).
    #[arg(
        short = 'x',
        long = "exclude",
        help_heading = "Calendar options",
        value_name = "text"
    )]
    pub exclude: Vec<String>,

    /// Do not apply the built-in exclusions (birthdays, holidays, "com").
    #[arg(long, help_heading = "Calendar options")]
    pub no_default_excludes: bool,

    /// Hours added to UTC event times before bucketing by day.
    #[arg(
        long,
        default_value_t = DEFAULT_UTC_OFFSET_HOURS,
        allow_negative_numbers = true,
        help_heading = "Calendar options",
        value_name = "hours"
    )]
    pub utc_offset: i32,

    /// Keep exporting other calendars when one fails and save the rest.
    /// Without it the first failure aborts and nothing is saved.
    #[arg(long, help_heading = "Output options")]
    pub keep_going: bool,

    /// Log progress to stderr (-v info, -vv debug).
    #[arg(short = 'v', long, action = ArgAction::Count, help_heading = "Output options")]
    pub verbose: u8,
}

/// Help message displayed with --help.
const HELP_MESSAGE: &str = "Each calendar becomes a sheet named <calendar>【<month>月】 holding a
Monday-Friday grid of the month, events listed two per row under each day.

Examples:
  calgrid -w book.json -c clinic.ics                 Export for the period in the home sheet
  calgrid -w book.json -c cals/ --year 2025 --month 4
  calgrid -w book.json -c cals/ --xlsx book.xlsx     Also write an Excel file
  calgrid -w book.json -c cals/ -x Private           Skip calendars named *Private*";

impl Args {
    pub fn parse() -> Self {
        Parser::parse()
    }
}

impl ExportOptions {
    pub fn new(args: &Args) -> Result<Self, String> {
        if args.home.trim().is_empty() {
            return Err("Home sheet name must not be empty".to_string());
        }

        let mut exclusions: Vec<String> = if args.no_default_excludes {
            Vec::new()
        } else {
            DEFAULT_EXCLUSIONS.iter().map(|s| s.to_string()).collect()
        };
        for text in &args.exclude {
            if text.is_empty() {
                return Err("Exclusion text must not be empty".to_string());
            }
            if !exclusions.contains(text) {
                exclusions.push(text.clone());
            }
        }

        Ok(ExportOptions {
            home_sheet: args.home.clone(),
            exclusions,
            keep_going: args.keep_going,
        })
    }
}

/// Expand `~` the way a shell would.
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

pub fn get_utc_offset(args: &Args) -> Result<FixedOffset, String> {
    if !(-12..=14).contains(&args.utc_offset) {
        return Err(format!(
            "Invalid UTC offset: {} (must be -12 to 14)",
            args.utc_offset
        ));
    }
    FixedOffset::east_opt(args.utc_offset * 3600)
        .ok_or_else(|| format!("Invalid UTC offset: {}", args.utc_offset))
}

/// Period given on the command line, if any.
///
/// Year and month must be given together.
pub fn get_period_override(args: &Args) -> Result<Option<Period>, String> {
    match (&args.year, &args.month) {
        (None, None) => Ok(None),
        (Some(year), Some(month)) => {
            let year = year
                .trim()
                .parse::<i32>()
                .map_err(|_| format!("Invalid year: {}", year))?;
            let month = parse_month(month).ok_or_else(|| format!("Invalid month: {}", month))?;
            Period::new(year, month)
                .map(Some)
                .map_err(|e| e.to_string())
        }
        _ => Err("Options --year and --month must be used together".to_string()),
    }
}

/// Parse month from string (1-12, `4月`, or an English name).
pub fn parse_month(s: &str) -> Option<u32> {
    let s = s.trim();
    let digits = s.strip_suffix('月').unwrap_or(s);
    if let Ok(n) = digits.parse::<u32>()
        && (1..=12).contains(&n)
    {
        return Some(n);
    }

    let s_lower = s.to_lowercase();
    let month_names: [(&str, u32); 23] = [
        ("january", 1),
        ("february", 2),
        ("march", 3),
        ("april", 4),
        ("may", 5),
        ("june", 6),
        ("july", 7),
        ("august", 8),
        ("september", 9),
        ("october", 10),
        ("november", 11),
        ("december", 12),
        ("jan", 1),
        ("feb", 2),
        ("mar", 3),
        ("apr", 4),
        ("jun", 6),
        ("jul", 7),
        ("aug", 8),
        ("sep", 9),
        ("oct", 10),
        ("nov", 11),
        ("dec", 12),
    ];
    month_names
        .iter()
        .find(|(name, _)| *name == s_lower)
        .map(|(_, num)| *num)
}
